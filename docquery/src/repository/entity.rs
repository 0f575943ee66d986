use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::collection::IndexType;
use crate::common::Convertible;
use crate::errors::QueryResult;
use crate::filter::{field, Filter};
use crate::store::{CollectionHandle, Database};

/// A type stored as one document per value, identified by a key field.
///
/// Usually derived:
///
/// ```rust,ignore
/// use docquery_derive::{Convertible, Entity};
///
/// #[derive(Convertible, Entity)]
/// #[entity(name = "people", key = "id", index(type = "non-unique", fields = "name"))]
/// struct Person {
///     id: String,
///     name: String,
/// }
/// ```
pub trait Entity: Convertible<Output = Self> + Send + 'static {
    type Key: Convertible<Output = Self::Key> + Send + Sync + 'static;

    /// Name of the collection holding this entity.
    fn entity_name() -> String {
        simple_type_name::<Self>()
    }

    /// Document field that stores the key.
    fn key_field() -> String;

    fn key(&self) -> Self::Key;

    /// Secondary indexes beyond the key.
    fn entity_indexes() -> Vec<EntityIndex> {
        Vec::new()
    }
}

#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct EntityIndex {
    fields: Vec<String>,
    index_type: IndexType,
}

impl EntityIndex {
    pub fn new(fields: Vec<&str>, index_type: IndexType) -> Self {
        EntityIndex {
            fields: fields.iter().map(|field| field.to_string()).collect(),
            index_type,
        }
    }

    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub(crate) fn create_on(&self, collection: &CollectionHandle) -> QueryResult<()> {
        let fields: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        collection.create_index(&fields, self.index_type)
    }
}

/// Per-entity query definition: how to derive a key, how to select by key,
/// and how the backing collection is named and configured.
///
/// Only [EntityQuery::entity_key] and [EntityQuery::key_expression] are
/// required. Both must be pure, and the key expression must translate into a
/// store filter.
pub trait EntityQuery: Send + Sync + 'static {
    type Entity: Convertible<Output = Self::Entity> + Send + 'static;
    type Key: Convertible<Output = Self::Key> + Send + Sync + 'static;

    fn entity_key(&self, entity: &Self::Entity) -> Self::Key;

    fn key_expression(&self, key: &Self::Key) -> QueryResult<Filter>;

    /// Naming hook. Defaults to the entity's simple type name.
    fn collection_name(&self) -> String {
        simple_type_name::<Self::Entity>()
    }

    /// Collection-creation hook. Defaults to asking the database, which
    /// creates the collection if it is absent.
    fn create_collection(&self, database: &Database, name: &str) -> QueryResult<CollectionHandle> {
        database.collection(name)
    }

    /// Index hook, run once right after the collection is obtained.
    fn ensure_indexes(&self, _collection: &CollectionHandle) -> QueryResult<()> {
        Ok(())
    }
}

/// The [EntityQuery] of any [Entity]: selects on the key field and indexes it
/// uniquely together with the declared entity indexes.
pub struct DefaultQuery<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> DefaultQuery<T> {
    pub fn new() -> Self {
        DefaultQuery {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for DefaultQuery<T> {
    fn default() -> Self {
        DefaultQuery::new()
    }
}

impl<T> Clone for DefaultQuery<T> {
    fn clone(&self) -> Self {
        DefaultQuery::new()
    }
}

impl<T: Entity> EntityQuery for DefaultQuery<T> {
    type Entity = T;
    type Key = T::Key;

    fn entity_key(&self, entity: &T) -> T::Key {
        entity.key()
    }

    fn key_expression(&self, key: &T::Key) -> QueryResult<Filter> {
        Ok(field(&T::key_field()).eq(key.to_value()?))
    }

    fn collection_name(&self) -> String {
        T::entity_name()
    }

    fn ensure_indexes(&self, collection: &CollectionHandle) -> QueryResult<()> {
        let key_field = T::key_field();
        collection.create_index(&[key_field.as_str()], IndexType::Unique)?;
        for index in T::entity_indexes() {
            index.create_on(collection)?;
        }
        Ok(())
    }
}

type KeyFn<T, K> = Arc<dyn Fn(&T) -> K + Send + Sync>;
type KeyExpressionFn<K> = Arc<dyn Fn(&K) -> Filter + Send + Sync>;
type IndexSetupFn = Arc<dyn Fn(&CollectionHandle) -> QueryResult<()> + Send + Sync>;

/// An [EntityQuery] assembled from injected functions instead of a dedicated type.
///
/// ```rust,ignore
/// let query = FnQuery::new(
///     |person: &Person| person.id.clone(),
///     |id: &String| field("id").eq(id.as_str()),
/// )
/// .named("people");
/// ```
pub struct FnQuery<T, K> {
    entity_key: KeyFn<T, K>,
    key_expression: KeyExpressionFn<K>,
    collection_name: Option<String>,
    index_setup: Option<IndexSetupFn>,
}

impl<T, K> FnQuery<T, K> {
    pub fn new<E, X>(entity_key: E, key_expression: X) -> Self
    where
        E: Fn(&T) -> K + Send + Sync + 'static,
        X: Fn(&K) -> Filter + Send + Sync + 'static,
    {
        FnQuery {
            entity_key: Arc::new(entity_key),
            key_expression: Arc::new(key_expression),
            collection_name: None,
            index_setup: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.collection_name = Some(name.to_string());
        self
    }

    pub fn with_index_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&CollectionHandle) -> QueryResult<()> + Send + Sync + 'static,
    {
        self.index_setup = Some(Arc::new(setup));
        self
    }
}

impl<T, K> Clone for FnQuery<T, K> {
    fn clone(&self) -> Self {
        FnQuery {
            entity_key: self.entity_key.clone(),
            key_expression: self.key_expression.clone(),
            collection_name: self.collection_name.clone(),
            index_setup: self.index_setup.clone(),
        }
    }
}

impl<T, K> EntityQuery for FnQuery<T, K>
where
    T: Convertible<Output = T> + Send + 'static,
    K: Convertible<Output = K> + Send + Sync + 'static,
{
    type Entity = T;
    type Key = K;

    fn entity_key(&self, entity: &T) -> K {
        (self.entity_key)(entity)
    }

    fn key_expression(&self, key: &K) -> QueryResult<Filter> {
        Ok((self.key_expression)(key))
    }

    fn collection_name(&self) -> String {
        match &self.collection_name {
            Some(name) => name.clone(),
            None => simple_type_name::<T>(),
        }
    }

    fn ensure_indexes(&self, collection: &CollectionHandle) -> QueryResult<()> {
        match &self.index_setup {
            Some(setup) => setup(collection),
            None => Ok(()),
        }
    }
}

/// Last path segment of `T`'s type name, generic arguments stripped.
///
/// `my_app::model::Person` becomes `Person`, `Wrapper<my_app::Person>` becomes `Wrapper`.
pub fn simple_type_name<T: ?Sized>() -> String {
    let full = type_name::<T>();
    let without_generics = match full.find('<') {
        Some(index) => &full[..index],
        None => full,
    };
    match without_generics.rsplit_once("::") {
        Some((_, name)) => name.to_string(),
        None => without_generics.to_string(),
    }
}
