use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::collection::{Document, FindOptions, IndexDescriptor, IndexType};
use crate::common::{Value, DOC_ID};
use crate::errors::{ErrorKind, QueryError, QueryResult};
use crate::filter::FilterExpr;
use crate::store::{DocumentCollection, DocumentCursor};

/// A collection held in process memory.
///
/// Documents are kept in insertion order. Every document gets a uuid `_id` on
/// insert unless it carries one. Unique indexes are enforced on every write.
#[derive(Clone)]
pub struct InMemoryCollection {
    inner: Arc<InMemoryCollectionInner>,
}

struct InMemoryCollectionInner {
    name: String,
    documents: RwLock<Vec<Document>>,
    indexes: RwLock<Vec<IndexDescriptor>>,
    closed: Arc<AtomicBool>,
    latency: Option<Duration>,
}

impl InMemoryCollection {
    pub(crate) fn new(name: &str, closed: Arc<AtomicBool>, latency: Option<Duration>) -> Self {
        InMemoryCollection {
            inner: Arc::new(InMemoryCollectionInner {
                name: name.to_string(),
                documents: RwLock::new(Vec::new()),
                indexes: RwLock::new(Vec::new()),
                closed,
                latency,
            }),
        }
    }

    pub fn size(&self) -> usize {
        self.inner.documents.read().len()
    }

    fn check_opened(&self) -> QueryResult<()> {
        if self.inner.closed.load(Ordering::Acquire) {
            log::error!("Collection {} belongs to a closed database", self.inner.name);
            return Err(QueryError::new(
                &format!("Collection {} belongs to a closed database", self.inner.name),
                ErrorKind::StoreClosed,
            ));
        }
        Ok(())
    }

    fn matching(&self, filter: &FilterExpr) -> QueryResult<Vec<Document>> {
        let matcher = filter.matcher()?;
        let documents = self.inner.documents.read();
        let mut matched = Vec::new();
        for document in documents.iter() {
            if matcher.matches(document)? {
                matched.push(document.clone());
            }
        }
        Ok(matched)
    }

    // waits out the simulated round trip, aborting if the token fires first
    async fn round_trip(&self, token: &CancellationToken, operation: &str) -> QueryResult<()> {
        let delay = async {
            match self.inner.latency {
                Some(latency) => tokio::time::sleep(latency).await,
                None => tokio::task::yield_now().await,
            }
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                log::debug!("{} on {} cancelled", operation, self.inner.name);
                Err(QueryError::cancelled(&format!(
                    "Operation {} on collection {} was cancelled",
                    operation, self.inner.name
                )))
            }
            _ = delay => Ok(()),
        }
    }
}

fn index_key(document: &Document, index: &IndexDescriptor) -> QueryResult<Option<Vec<Value>>> {
    let mut key = Vec::with_capacity(index.fields().len());
    for field in index.fields() {
        key.push(document.get(field)?);
    }
    // documents without any indexed value are never in conflict
    if key.iter().all(Value::is_null) {
        Ok(None)
    } else {
        Ok(Some(key))
    }
}

fn unique_violation(index: &IndexDescriptor, key: &[Value]) -> QueryError {
    let values = key.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
    log::error!(
        "Unique index on {:?} of {} already contains [{}]",
        index.fields(),
        index.collection_name(),
        values
    );
    QueryError::new(
        &format!(
            "Unique index on {:?} of {} already contains [{}]",
            index.fields(),
            index.collection_name(),
            values
        ),
        ErrorKind::UniqueConstraintViolation,
    )
}

/// Checks `candidates` against each other and against `existing`, skipping the
/// existing document at `replacing`.
fn check_unique(
    indexes: &[IndexDescriptor],
    existing: &[Document],
    replacing: Option<usize>,
    candidates: &[Document],
) -> QueryResult<()> {
    let mut ids: Vec<&str> = Vec::new();
    for (position, candidate) in candidates.iter().enumerate() {
        if let Some(id) = candidate.id() {
            let taken = existing
                .iter()
                .enumerate()
                .any(|(i, d)| Some(i) != replacing && d.id() == Some(id));
            if taken || ids.contains(&id) {
                return Err(QueryError::new(
                    &format!("Document with id {} already exists", id),
                    ErrorKind::UniqueConstraintViolation,
                ));
            }
            ids.push(id);
        }

        for index in indexes.iter().filter(|i| i.index_type() == IndexType::Unique) {
            let key = match index_key(candidate, index)? {
                Some(key) => key,
                None => continue,
            };
            for (i, document) in existing.iter().enumerate() {
                if Some(i) != replacing && index_key(document, index)?.as_ref() == Some(&key) {
                    return Err(unique_violation(index, &key));
                }
            }
            for earlier in &candidates[..position] {
                if index_key(earlier, index)?.as_ref() == Some(&key) {
                    return Err(unique_violation(index, &key));
                }
            }
        }
    }
    Ok(())
}

fn assign_id(document: &mut Document) -> QueryResult<String> {
    match document.id() {
        Some(id) => Ok(id.to_string()),
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            document.put(DOC_ID, id.clone())?;
            Ok(id)
        }
    }
}

#[async_trait]
impl DocumentCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn find(&self, filter: &FilterExpr, options: &FindOptions) -> QueryResult<DocumentCursor> {
        self.check_opened()?;
        let matched = self.matching(filter)?;
        log::trace!("find {} on {} matched {} documents", filter, self.inner.name, matched.len());
        Ok(DocumentCursor::from_documents(options.apply(matched)))
    }

    fn count_documents(&self, filter: &FilterExpr) -> QueryResult<u64> {
        self.check_opened()?;
        if let FilterExpr::All = filter {
            return Ok(self.size() as u64);
        }
        Ok(self.matching(filter)?.len() as u64)
    }

    fn create_index(&self, fields: &[&str], index_type: IndexType) -> QueryResult<()> {
        self.check_opened()?;
        if fields.is_empty() || fields.iter().any(|f| f.is_empty()) {
            log::error!("Index on {} needs at least one non-empty field", self.inner.name);
            return Err(QueryError::new(
                &format!("Index on {} needs at least one non-empty field", self.inner.name),
                ErrorKind::IndexingError,
            ));
        }

        let mut indexes = self.inner.indexes.write();
        if let Some(existing) = indexes.iter().find(|i| i.covers(fields)) {
            if existing.index_type() == index_type {
                return Ok(());
            }
            log::error!(
                "Index on {:?} of {} already exists as {}",
                fields,
                self.inner.name,
                existing.index_type()
            );
            return Err(QueryError::new(
                &format!(
                    "Index on {:?} of {} already exists as {}",
                    fields,
                    self.inner.name,
                    existing.index_type()
                ),
                ErrorKind::IndexingError,
            ));
        }

        let descriptor = IndexDescriptor::new(
            index_type,
            fields.iter().map(|f| f.to_string()).collect(),
            &self.inner.name,
        );
        if index_type == IndexType::Unique {
            let documents = self.inner.documents.read();
            check_unique(std::slice::from_ref(&descriptor), &[], None, &documents).map_err(|e| {
                QueryError::new_with_cause(
                    &format!("Cannot create unique index on {:?} of {}", fields, self.inner.name),
                    ErrorKind::IndexingError,
                    e,
                )
            })?;
        }

        log::debug!("Created {} index on {:?} of {}", index_type, fields, self.inner.name);
        indexes.push(descriptor);
        Ok(())
    }

    fn list_indexes(&self) -> QueryResult<Vec<IndexDescriptor>> {
        self.check_opened()?;
        Ok(self.inner.indexes.read().clone())
    }

    fn insert(&self, mut documents: Vec<Document>) -> QueryResult<Vec<String>> {
        self.check_opened()?;
        let mut ids = Vec::with_capacity(documents.len());
        for document in documents.iter_mut() {
            ids.push(assign_id(document)?);
        }

        let indexes = self.inner.indexes.read();
        let mut stored = self.inner.documents.write();
        check_unique(&indexes, &stored, None, &documents)?;
        stored.extend(documents);
        Ok(ids)
    }

    fn replace_one(&self, filter: &FilterExpr, mut document: Document, upsert: bool) -> QueryResult<u64> {
        self.check_opened()?;
        let matcher = filter.matcher()?;
        let indexes = self.inner.indexes.read();
        let mut stored = self.inner.documents.write();

        let mut position = None;
        for (i, existing) in stored.iter().enumerate() {
            if matcher.matches(existing)? {
                position = Some(i);
                break;
            }
        }

        match position {
            Some(i) => {
                if let Some(id) = stored[i].id() {
                    document.put(DOC_ID, id.to_string())?;
                }
                check_unique(&indexes, &stored, Some(i), std::slice::from_ref(&document))?;
                stored[i] = document;
                Ok(1)
            }
            None if upsert => {
                assign_id(&mut document)?;
                check_unique(&indexes, &stored, None, std::slice::from_ref(&document))?;
                stored.push(document);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete(&self, filter: &FilterExpr, just_once: bool) -> QueryResult<u64> {
        self.check_opened()?;
        let matcher = filter.matcher()?;
        let mut stored = self.inner.documents.write();
        // evaluate everything first so a failing filter leaves the collection untouched
        let mut doomed = vec![false; stored.len()];
        let mut removed = 0u64;
        for (i, document) in stored.iter().enumerate() {
            if matcher.matches(document)? {
                doomed[i] = true;
                removed += 1;
                if just_once {
                    break;
                }
            }
        }

        let mut position = 0;
        stored.retain(|_| {
            let keep = !doomed[position];
            position += 1;
            keep
        });
        Ok(removed)
    }

    async fn find_async(
        &self,
        filter: &FilterExpr,
        options: &FindOptions,
        token: &CancellationToken,
    ) -> QueryResult<DocumentCursor> {
        self.round_trip(token, "find").await?;
        self.find(filter, options)
    }

    async fn count_documents_async(
        &self,
        filter: &FilterExpr,
        token: &CancellationToken,
    ) -> QueryResult<u64> {
        self.round_trip(token, "count").await?;
        self.count_documents(filter)
    }
}
