use tokio_util::sync::CancellationToken;

use crate::collection::FindOptions;
use crate::common::Convertible;
use crate::engine_config::EngineConfig;
use crate::errors::{QueryError, QueryResult};
use crate::filter::{all, Filter, FilterExpr};
use crate::store::{CollectionHandle, Database};

use super::{to_entity, CollectionResolver, EntityCursor, EntityQuery};

/// Typed, read-only access to the collection behind one entity type.
///
/// The engine validates arguments, translates filters into their store form
/// and runs them against a collection handle that is resolved on first use
/// and cached for the engine's lifetime. Entity-specific decisions (key
/// derivation, key expression, naming, indexes) come from the [EntityQuery].
///
/// Every read has a blocking form and an `_async` form that takes a
/// [CancellationToken]. Both return the same results and the same errors.
///
/// # Errors
///
/// * `InvalidArgument` for an absent key (one that converts to null) or a
///   filter that selects on nothing, raised before any store call
/// * `Cancelled` when the token of an async call fires
/// * store failures exactly as the store reported them
///
/// ```rust,ignore
/// let engine = QueryEngine::new(database, DefaultQuery::<Person>::new())?;
/// let person = engine.find_by_key(&"A".to_string())?;
/// let adults = engine.count_where(&field("age").gte(18))?;
/// ```
pub struct QueryEngine<Q: EntityQuery> {
    database: Database,
    query: Q,
    config: EngineConfig,
    resolver: CollectionResolver,
}

impl<Q: EntityQuery> QueryEngine<Q> {
    pub fn new(database: Database, query: Q) -> QueryResult<Self> {
        QueryEngine::with_config(database, query, EngineConfig::default())
    }

    /// # Errors
    ///
    /// `InvalidArgument` if `database` is closed. With eager resolution, any
    /// resolution failure.
    pub fn with_config(database: Database, query: Q, config: EngineConfig) -> QueryResult<Self> {
        if database.is_closed() {
            log::error!("Cannot build a query engine on closed database {}", database.name());
            return Err(QueryError::invalid_argument(&format!(
                "Cannot build a query engine on closed database {}",
                database.name()
            )));
        }

        let engine = QueryEngine {
            database,
            query,
            config,
            resolver: CollectionResolver::new(),
        };
        if engine.config.is_eager() {
            engine.collection()?;
        }
        Ok(engine)
    }

    pub fn builder() -> QueryEngineBuilder<Q> {
        QueryEngineBuilder::new()
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The key of `entity`, as derived by the query definition.
    pub fn entity_key(&self, entity: &Q::Entity) -> Q::Key {
        self.query.entity_key(entity)
    }

    /// The filter selecting the entity whose key is `key`.
    pub fn key_expression(&self, key: &Q::Key) -> QueryResult<Filter> {
        self.query.key_expression(key)
    }

    /// Name of the backing collection, with prefix and namespace applied.
    pub fn collection_name(&self) -> QueryResult<String> {
        self.config.collection_name(&self.query.collection_name())
    }

    /// The collection handle, resolving it on first call.
    pub fn collection(&self) -> QueryResult<CollectionHandle> {
        self.resolver.resolve(|| self.resolve_collection())
    }

    pub async fn collection_async(&self, token: &CancellationToken) -> QueryResult<CollectionHandle> {
        self.resolver
            .resolve_async(token, || self.resolve_collection())
            .await
    }

    pub fn is_resolved(&self) -> bool {
        self.resolver.is_resolved()
    }

    pub fn resolution_count(&self) -> usize {
        self.resolver.resolution_count()
    }

    /// Finds the entity with `key`. `Ok(None)` when no entity has it.
    pub fn find_by_key(&self, key: &Q::Key) -> QueryResult<Option<Q::Entity>> {
        let expr = self.key_filter(key)?;
        log::trace!("find_by_key {}", expr);
        self.first_matching(&expr)
    }

    /// First entity matching `filter`, in store order.
    pub fn find_one(&self, filter: &Filter) -> QueryResult<Option<Q::Entity>> {
        let expr = self.translate(filter)?;
        log::trace!("find_one {}", expr);
        self.first_matching(&expr)
    }

    pub fn find(&self, filter: &Filter) -> QueryResult<EntityCursor<Q::Entity>> {
        self.find_with_options(filter, &FindOptions::default())
    }

    pub fn find_with_options(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> QueryResult<EntityCursor<Q::Entity>> {
        let expr = self.translate(filter)?;
        log::trace!("find {}", expr);
        let cursor = self.collection()?.find(&expr, options)?;
        Ok(EntityCursor::new(cursor))
    }

    pub fn find_all(&self) -> QueryResult<EntityCursor<Q::Entity>> {
        self.find(&all())
    }

    /// Number of documents in the collection.
    pub fn count(&self) -> QueryResult<u64> {
        log::trace!("count");
        self.collection()?.count_documents(&FilterExpr::All)
    }

    pub fn count_where(&self, filter: &Filter) -> QueryResult<u64> {
        let expr = self.translate(filter)?;
        log::trace!("count {}", expr);
        self.collection()?.count_documents(&expr)
    }

    /// `true` if at least one document matches `filter`.
    pub fn exists(&self, filter: &Filter) -> QueryResult<bool> {
        let expr = self.translate(filter)?;
        log::trace!("exists {}", expr);
        let cursor = self.collection()?.find(&expr, &FindOptions::new().limit(1))?;
        Ok(cursor.first()?.is_some())
    }

    pub fn exists_by_key(&self, key: &Q::Key) -> QueryResult<bool> {
        let expr = self.key_filter(key)?;
        let cursor = self.collection()?.find(&expr, &FindOptions::new().limit(1))?;
        Ok(cursor.first()?.is_some())
    }

    pub async fn find_by_key_async(
        &self,
        key: &Q::Key,
        token: &CancellationToken,
    ) -> QueryResult<Option<Q::Entity>> {
        let expr = self.key_filter(key)?;
        log::trace!("find_by_key_async {}", expr);
        self.first_matching_async(&expr, token).await
    }

    pub async fn find_one_async(
        &self,
        filter: &Filter,
        token: &CancellationToken,
    ) -> QueryResult<Option<Q::Entity>> {
        let expr = self.translate(filter)?;
        log::trace!("find_one_async {}", expr);
        self.first_matching_async(&expr, token).await
    }

    pub async fn find_async(
        &self,
        filter: &Filter,
        token: &CancellationToken,
    ) -> QueryResult<EntityCursor<Q::Entity>> {
        self.find_with_options_async(filter, &FindOptions::default(), token)
            .await
    }

    pub async fn find_with_options_async(
        &self,
        filter: &Filter,
        options: &FindOptions,
        token: &CancellationToken,
    ) -> QueryResult<EntityCursor<Q::Entity>> {
        let expr = self.translate(filter)?;
        log::trace!("find_async {}", expr);
        let collection = self.collection_async(token).await?;
        let cursor = collection.find_async(&expr, options, token).await?;
        Ok(EntityCursor::new(cursor))
    }

    pub async fn find_all_async(&self, token: &CancellationToken) -> QueryResult<EntityCursor<Q::Entity>> {
        self.find_async(&all(), token).await
    }

    pub async fn count_async(&self, token: &CancellationToken) -> QueryResult<u64> {
        log::trace!("count_async");
        let collection = self.collection_async(token).await?;
        collection.count_documents_async(&FilterExpr::All, token).await
    }

    pub async fn count_where_async(&self, filter: &Filter, token: &CancellationToken) -> QueryResult<u64> {
        let expr = self.translate(filter)?;
        log::trace!("count_async {}", expr);
        let collection = self.collection_async(token).await?;
        collection.count_documents_async(&expr, token).await
    }

    pub async fn exists_async(&self, filter: &Filter, token: &CancellationToken) -> QueryResult<bool> {
        let expr = self.translate(filter)?;
        log::trace!("exists_async {}", expr);
        let collection = self.collection_async(token).await?;
        let cursor = collection
            .find_async(&expr, &FindOptions::new().limit(1), token)
            .await?;
        Ok(cursor.first()?.is_some())
    }

    pub async fn exists_by_key_async(&self, key: &Q::Key, token: &CancellationToken) -> QueryResult<bool> {
        let expr = self.key_filter(key)?;
        let collection = self.collection_async(token).await?;
        let cursor = collection
            .find_async(&expr, &FindOptions::new().limit(1), token)
            .await?;
        Ok(cursor.first()?.is_some())
    }

    // name -> create -> ensure indexes; runs under the resolver
    fn resolve_collection(&self) -> QueryResult<CollectionHandle> {
        let name = self.collection_name()?;
        log::debug!("Collection name for {} is {}", std::any::type_name::<Q::Entity>(), name);
        let collection = self.query.create_collection(&self.database, &name)?;
        log::debug!("Fetched collection {} from {}", name, self.database.name());
        self.query.ensure_indexes(&collection)?;
        log::debug!("Indexes ensured on {}", name);
        Ok(collection)
    }

    /// Validates and translates `filter` before any store call.
    pub(crate) fn translate(&self, filter: &Filter) -> QueryResult<FilterExpr> {
        filter.validate()?;
        filter.translate()
    }

    pub(crate) fn key_filter(&self, key: &Q::Key) -> QueryResult<FilterExpr> {
        if key.to_value()?.is_null() {
            log::error!("Key must be present for a lookup");
            return Err(QueryError::invalid_argument("Key must be present for a lookup"));
        }
        let filter = self.query.key_expression(key)?;
        self.translate(&filter)
    }

    fn first_matching(&self, expr: &FilterExpr) -> QueryResult<Option<Q::Entity>> {
        let cursor = self.collection()?.find(expr, &FindOptions::new().limit(1))?;
        cursor.first()?.map(to_entity).transpose()
    }

    async fn first_matching_async(
        &self,
        expr: &FilterExpr,
        token: &CancellationToken,
    ) -> QueryResult<Option<Q::Entity>> {
        let collection = self.collection_async(token).await?;
        let cursor = collection
            .find_async(expr, &FindOptions::new().limit(1), token)
            .await?;
        cursor.first()?.map(to_entity).transpose()
    }
}

/// Builds a [QueryEngine], failing when the database connection is missing.
///
/// ```rust,ignore
/// let engine = QueryEngine::builder()
///     .database(database)
///     .query(DefaultQuery::<Person>::new())
///     .config(EngineConfig::new().namespace("tenant-a"))
///     .build()?;
/// ```
pub struct QueryEngineBuilder<Q: EntityQuery> {
    database: Option<Database>,
    query: Option<Q>,
    config: EngineConfig,
}

impl<Q: EntityQuery> QueryEngineBuilder<Q> {
    pub fn new() -> Self {
        QueryEngineBuilder {
            database: None,
            query: None,
            config: EngineConfig::default(),
        }
    }

    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn query(mut self, query: Q) -> Self {
        self.query = Some(query);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// # Errors
    ///
    /// `InvalidArgument` when no database or no query was given, or the
    /// database is closed.
    pub fn build(self) -> QueryResult<QueryEngine<Q>> {
        let database = self.database.ok_or_else(|| {
            log::error!("A query engine needs a database connection");
            QueryError::invalid_argument("A query engine needs a database connection")
        })?;
        let query = self.query.ok_or_else(|| {
            log::error!("A query engine needs a query definition");
            QueryError::invalid_argument("A query engine needs a query definition")
        })?;
        QueryEngine::with_config(database, query, self.config)
    }
}

impl<Q: EntityQuery> Default for QueryEngineBuilder<Q> {
    fn default() -> Self {
        QueryEngineBuilder::new()
    }
}
