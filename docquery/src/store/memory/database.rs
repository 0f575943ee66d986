use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::errors::{ErrorKind, QueryError, QueryResult};
use crate::store::{CollectionHandle, DocumentDatabase};

use super::InMemoryCollection;

/// A database whose collections live in process memory.
///
/// Meant for tests and embedding; collections are created on first request and
/// dropped with the database.
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use docquery::store::{Database, InMemoryDatabase};
///
/// let memory = Arc::new(InMemoryDatabase::new("test"));
/// let database: Database = memory.clone();
/// ```
pub struct InMemoryDatabase {
    name: String,
    collections: DashMap<String, InMemoryCollection>,
    closed: Arc<AtomicBool>,
    latency: Option<Duration>,
}

impl InMemoryDatabase {
    pub fn new(name: &str) -> Self {
        InMemoryDatabase {
            name: name.to_string(),
            collections: DashMap::new(),
            closed: Arc::new(AtomicBool::new(false)),
            latency: None,
        }
    }

    /// Makes every async collection call wait `latency` before running, so a
    /// cancellation can land while the call is in flight.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Closes the database. Handles already given out fail from now on.
    pub fn close(&self) {
        log::debug!("Closing in-memory database {}", self.name);
        self.closed.store(true, Ordering::Release);
    }

    fn check_opened(&self) -> QueryResult<()> {
        if self.closed.load(Ordering::Acquire) {
            log::error!("Database {} is closed", self.name);
            return Err(QueryError::new(
                &format!("Database {} is closed", self.name),
                ErrorKind::StoreClosed,
            ));
        }
        Ok(())
    }
}

impl DocumentDatabase for InMemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn collection(&self, name: &str) -> QueryResult<CollectionHandle> {
        self.check_opened()?;
        if name.trim().is_empty() {
            log::error!("Collection name cannot be empty");
            return Err(QueryError::new(
                "Collection name cannot be empty",
                ErrorKind::StoreFailure,
            ));
        }

        let collection = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                log::debug!("Creating collection {} in {}", name, self.name);
                InMemoryCollection::new(name, self.closed.clone(), self.latency)
            })
            .clone();
        Ok(Arc::new(collection))
    }

    fn has_collection(&self, name: &str) -> QueryResult<bool> {
        self.check_opened()?;
        Ok(self.collections.contains_key(name))
    }

    fn list_collection_names(&self) -> QueryResult<Vec<String>> {
        self.check_opened()?;
        let mut names: Vec<String> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }
}
