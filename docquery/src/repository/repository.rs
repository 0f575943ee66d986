use std::ops::Deref;

use crate::errors::QueryResult;
use crate::filter::Filter;
use crate::store::Database;

use super::{to_document, EntityQuery, QueryEngine};

/// A [QueryEngine] that also writes.
///
/// All reads come from the wrapped engine through `Deref`, so a repository
/// can stand in wherever an engine is expected. Writes go through the same
/// resolved collection and the same key expression as the reads.
///
/// ```rust,ignore
/// let people = Repository::open(database, DefaultQuery::<Person>::new())?;
/// people.insert(&Person { id: "A".into(), name: "x".into() })?;
/// people.save(&Person { id: "A".into(), name: "renamed".into() })?;
/// assert_eq!(people.find_by_key(&"A".into())?.unwrap().name, "renamed");
/// ```
pub struct Repository<Q: EntityQuery> {
    engine: QueryEngine<Q>,
}

impl<Q: EntityQuery> Repository<Q> {
    pub fn new(engine: QueryEngine<Q>) -> Self {
        Repository { engine }
    }

    pub fn open(database: Database, query: Q) -> QueryResult<Self> {
        Ok(Repository::new(QueryEngine::new(database, query)?))
    }

    pub fn engine(&self) -> &QueryEngine<Q> {
        &self.engine
    }

    pub fn into_engine(self) -> QueryEngine<Q> {
        self.engine
    }

    /// Inserts one entity and returns the id the store assigned.
    pub fn insert(&self, entity: &Q::Entity) -> QueryResult<String> {
        let document = to_document(entity)?;
        let mut ids = self.engine.collection()?.insert(vec![document])?;
        Ok(ids.pop().unwrap_or_default())
    }

    pub fn insert_many(&self, entities: &[Q::Entity]) -> QueryResult<Vec<String>> {
        let documents = entities
            .iter()
            .map(to_document)
            .collect::<QueryResult<Vec<_>>>()?;
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        self.engine.collection()?.insert(documents)
    }

    /// Replaces the stored entity with the same key, inserting it if there is none.
    pub fn save(&self, entity: &Q::Entity) -> QueryResult<u64> {
        let key = self.engine.entity_key(entity);
        let expr = self.engine.key_filter(&key)?;
        let document = to_document(entity)?;
        log::trace!("save {}", expr);
        self.engine.collection()?.replace_one(&expr, document, true)
    }

    /// Removes the entity with `key`. Returns the number removed, 0 or 1.
    pub fn delete_by_key(&self, key: &Q::Key) -> QueryResult<u64> {
        let expr = self.engine.key_filter(key)?;
        log::trace!("delete_by_key {}", expr);
        self.engine.collection()?.delete(&expr, true)
    }

    pub fn delete(&self, filter: &Filter) -> QueryResult<u64> {
        let expr = self.engine.translate(filter)?;
        log::trace!("delete {}", expr);
        self.engine.collection()?.delete(&expr, false)
    }
}

impl<Q: EntityQuery> Deref for Repository<Q> {
    type Target = QueryEngine<Q>;

    fn deref(&self) -> &Self::Target {
        &self.engine
    }
}
