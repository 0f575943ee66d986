use crate::collection::Document;
use crate::common::{Convertible, Value};
use crate::errors::{ErrorKind, QueryError, QueryResult};
use crate::store::DocumentCursor;
use std::marker::PhantomData;

/// Lazily maps the documents of a [DocumentCursor] into entities.
pub struct EntityCursor<T> {
    cursor: DocumentCursor,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> EntityCursor<T>
where
    T: Convertible<Output = T>,
{
    pub fn new(cursor: DocumentCursor) -> Self {
        EntityCursor {
            cursor,
            _phantom: PhantomData,
        }
    }

    /// First entity, or `None` when nothing matched.
    pub fn first(self) -> QueryResult<Option<T>> {
        match self.cursor.first()? {
            Some(document) => to_entity(document).map(Some),
            None => Ok(None),
        }
    }

    pub fn to_list(self) -> QueryResult<Vec<T>> {
        self.collect()
    }
}

impl<T> Iterator for EntityCursor<T>
where
    T: Convertible<Output = T>,
{
    type Item = QueryResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor
            .next()
            .map(|document| document.and_then(to_entity))
    }
}

pub(crate) fn to_entity<T>(document: Document) -> QueryResult<T>
where
    T: Convertible<Output = T>,
{
    T::from_value(&Value::Document(document))
}

pub(crate) fn to_document<T>(entity: &T) -> QueryResult<Document>
where
    T: Convertible,
{
    match entity.to_value()? {
        Value::Document(document) => Ok(document),
        other => {
            log::error!("Entity converted to {} instead of a document", other.type_name());
            Err(QueryError::new(
                &format!("Entity converted to {} instead of a document", other.type_name()),
                ErrorKind::ObjectMappingError,
            ))
        }
    }
}
