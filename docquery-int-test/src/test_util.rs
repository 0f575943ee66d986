use docquery::collection::Document;
use docquery::errors::{ErrorKind, QueryError, QueryResult};
use docquery::store::{CollectionHandle, Database, DocumentDatabase, InMemoryDatabase};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Runs `test` between `before` and `after`. `after` runs even when the test
/// fails, and the failure is reported once cleanup is done.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> QueryResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> QueryResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> QueryResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| test(ctx.clone())));
    let cleanup = after(ctx);

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic) => std::panic::resume_unwind(panic),
    }
    if let Err(e) = cleanup {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    db: Arc<CountingDatabase>,
}

impl TestContext {
    pub fn new(db: CountingDatabase) -> Self {
        TestContext { db: Arc::new(db) }
    }

    /// The database as the engine sees it.
    pub fn db(&self) -> Database {
        self.db.clone()
    }

    pub fn counting(&self) -> Arc<CountingDatabase> {
        self.db.clone()
    }

    /// Inserts raw documents, bypassing any engine.
    pub fn seed(&self, collection: &str, documents: Vec<Document>) -> QueryResult<()> {
        self.db.inner().collection(collection)?.insert(documents)?;
        Ok(())
    }
}

pub fn random_name() -> String {
    format!("db-{}", uuid::Uuid::new_v4())
}

pub fn create_test_context() -> QueryResult<TestContext> {
    Ok(TestContext::new(CountingDatabase::new(InMemoryDatabase::new(&random_name()))))
}

pub fn cleanup(ctx: TestContext) -> QueryResult<()> {
    ctx.counting().inner().close();
    Ok(())
}

/// An in-memory database that counts collection lookups and can be told to
/// fail or stall them.
pub struct CountingDatabase {
    inner: InMemoryDatabase,
    lookups: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl CountingDatabase {
    pub fn new(inner: InMemoryDatabase) -> Self {
        CountingDatabase {
            inner,
            lookups: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// The next `count` lookups fail with a store failure.
    pub fn failing(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    /// Every lookup blocks for `delay` first.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &InMemoryDatabase {
        &self.inner
    }
}

impl DocumentDatabase for CountingDatabase {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn collection(&self, name: &str) -> QueryResult<CollectionHandle> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(QueryError::new(
                "Simulated connection failure",
                ErrorKind::StoreFailure,
            ));
        }
        self.inner.collection(name)
    }

    fn has_collection(&self, name: &str) -> QueryResult<bool> {
        self.inner.has_collection(name)
    }

    fn list_collection_names(&self) -> QueryResult<Vec<String>> {
        self.inner.list_collection_names()
    }
}
