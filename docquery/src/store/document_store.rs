use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::collection::{Document, FindOptions, IndexDescriptor, IndexType};
use crate::errors::{QueryError, QueryResult};
use crate::filter::FilterExpr;

use super::DocumentCursor;

/// Shared handle to a database connection. Owned by the caller, shared by
/// every engine built on it.
pub type Database = Arc<dyn DocumentDatabase>;

/// Handle to one named collection within a [Database].
pub type CollectionHandle = Arc<dyn DocumentCollection>;

/// A document database connection as seen by the query engine.
///
/// Implementations must be safe to call concurrently. [DocumentDatabase::collection]
/// must not require the collection to exist: a missing collection is created
/// on demand and a handle is returned either way.
pub trait DocumentDatabase: Send + Sync {
    fn name(&self) -> &str;

    fn is_closed(&self) -> bool;

    /// Returns the handle for `name`, creating the collection if it is absent.
    fn collection(&self, name: &str) -> QueryResult<CollectionHandle>;

    fn has_collection(&self, name: &str) -> QueryResult<bool>;

    fn list_collection_names(&self) -> QueryResult<Vec<String>>;
}

/// Operations a store executes against one collection.
///
/// Filters arrive in their translated [FilterExpr] form. Each read has a
/// blocking and a suspending variant; the suspending one takes a
/// [CancellationToken] and fails with `ErrorKind::Cancelled` once it fires.
/// The default suspending variants check the token and run the blocking call,
/// which suits stores without a native async client.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    fn name(&self) -> &str;

    fn find(&self, filter: &FilterExpr, options: &FindOptions) -> QueryResult<DocumentCursor>;

    fn count_documents(&self, filter: &FilterExpr) -> QueryResult<u64>;

    /// Creates an index over `fields`. Creating an index that already exists
    /// with the same type is a no-op.
    fn create_index(&self, fields: &[&str], index_type: IndexType) -> QueryResult<()>;

    fn list_indexes(&self) -> QueryResult<Vec<IndexDescriptor>>;

    /// Inserts documents and returns their ids in input order.
    fn insert(&self, documents: Vec<Document>) -> QueryResult<Vec<String>>;

    /// Replaces the first document matching `filter`. With `upsert` the
    /// document is inserted when nothing matches. Returns the number of
    /// documents written.
    fn replace_one(&self, filter: &FilterExpr, document: Document, upsert: bool) -> QueryResult<u64>;

    /// Removes matching documents, or only the first one with `just_once`.
    fn delete(&self, filter: &FilterExpr, just_once: bool) -> QueryResult<u64>;

    async fn find_async(
        &self,
        filter: &FilterExpr,
        options: &FindOptions,
        token: &CancellationToken,
    ) -> QueryResult<DocumentCursor> {
        ensure_not_cancelled(token, "find")?;
        self.find(filter, options)
    }

    async fn count_documents_async(
        &self,
        filter: &FilterExpr,
        token: &CancellationToken,
    ) -> QueryResult<u64> {
        ensure_not_cancelled(token, "count")?;
        self.count_documents(filter)
    }
}

/// Fails with `ErrorKind::Cancelled` if `token` has fired.
pub fn ensure_not_cancelled(token: &CancellationToken, operation: &str) -> QueryResult<()> {
    if token.is_cancelled() {
        return Err(QueryError::cancelled(&format!(
            "Operation {} was cancelled",
            operation
        )));
    }
    Ok(())
}
