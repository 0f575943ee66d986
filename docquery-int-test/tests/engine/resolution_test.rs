use docquery::collection::IndexType;
use docquery::errors::ErrorKind;
use docquery::filter::field;
use docquery::repository::{DefaultQuery, FnQuery, QueryEngine};
use docquery::store::{Database, DocumentDatabase, InMemoryDatabase};
use docquery::EngineConfig;
use docquery_int_test::models::Person;
use docquery_int_test::test_util::{random_name, CountingDatabase};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn person_query(hook_runs: Arc<AtomicUsize>) -> FnQuery<Person, String> {
    FnQuery::new(|p: &Person| p.id.clone(), |id: &String| field("id").eq(id.as_str()))
        .with_index_setup(move |collection| {
            hook_runs.fetch_add(1, Ordering::SeqCst);
            collection.create_index(&["id"], IndexType::Unique)
        })
}

#[test]
fn test_concurrent_first_use_resolves_once() {
    let database = Arc::new(
        CountingDatabase::new(InMemoryDatabase::new(&random_name())).slow(Duration::from_millis(50)),
    );
    let hook_runs = Arc::new(AtomicUsize::new(0));
    let engine = Arc::new(QueryEngine::new(database.clone(), person_query(hook_runs.clone())).unwrap());

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                if i % 2 == 0 {
                    engine.count()
                } else {
                    engine.find_all().map(|cursor| cursor.count() as u64)
                }
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 0);
    }
    assert_eq!(database.lookups(), 1);
    assert_eq!(hook_runs.load(Ordering::SeqCst), 1);
    assert_eq!(engine.resolution_count(), 1);
}

#[test]
fn test_failed_resolution_is_retried() {
    let database = Arc::new(CountingDatabase::new(InMemoryDatabase::new(&random_name())).failing(1));
    let engine = QueryEngine::new(database.clone(), DefaultQuery::<Person>::new()).unwrap();

    let err = engine.count().unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::StoreFailure);
    assert!(err.is_store_failure());
    assert!(!engine.is_resolved());

    assert_eq!(engine.count().unwrap(), 0);
    assert!(engine.is_resolved());
    assert_eq!(database.lookups(), 2);

    engine.find_all().unwrap();
    assert_eq!(database.lookups(), 2);
}

#[test]
fn test_failing_index_hook_is_retried() {
    let database: Database = Arc::new(InMemoryDatabase::new(&random_name()));
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let query = FnQuery::new(|p: &Person| p.id.clone(), |id: &String| field("id").eq(id.as_str()))
        .with_index_setup(move |collection| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                // a unique and a non-unique index on the same field conflict
                collection.create_index(&["name"], IndexType::NonUnique)?;
                collection.create_index(&["name"], IndexType::Unique)
            } else {
                Ok(())
            }
        });
    let engine = QueryEngine::new(database, query).unwrap();

    let err = engine.find_all().err().unwrap();
    assert_eq!(err.kind(), &ErrorKind::IndexingError);
    assert!(!engine.is_resolved());

    assert!(engine.find_all().is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_index_hook_runs_once() {
    let database: Database = Arc::new(InMemoryDatabase::new(&random_name()));
    let hook_runs = Arc::new(AtomicUsize::new(0));
    let engine = QueryEngine::new(database, person_query(hook_runs.clone())).unwrap();

    for _ in 0..5 {
        engine.count().unwrap();
        engine.exists(&field("id").eq("A")).unwrap();
    }
    assert_eq!(hook_runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_default_query_creates_declared_indexes() {
    let database: Database = Arc::new(InMemoryDatabase::new(&random_name()));
    let engine = QueryEngine::new(database, DefaultQuery::<Person>::new()).unwrap();

    let indexes = engine.collection().unwrap().list_indexes().unwrap();
    assert_eq!(indexes.len(), 2);
    assert!(indexes
        .iter()
        .any(|index| index.covers(&["id"]) && index.index_type() == IndexType::Unique));
    assert!(indexes
        .iter()
        .any(|index| index.covers(&["name"]) && index.index_type() == IndexType::NonUnique));
}

#[test]
fn test_builder_without_database() {
    let err = QueryEngine::builder()
        .query(DefaultQuery::<Person>::new())
        .build()
        .err()
        .unwrap();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_closed_database() {
    let memory = Arc::new(InMemoryDatabase::new(&random_name()));
    memory.close();
    let err = QueryEngine::new(memory, DefaultQuery::<Person>::new()).err().unwrap();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_database_closed_after_resolution() {
    let memory = Arc::new(InMemoryDatabase::new(&random_name()));
    let engine = QueryEngine::builder()
        .database(memory.clone())
        .query(DefaultQuery::<Person>::new())
        .config(EngineConfig::new().eager_resolution(true))
        .build()
        .unwrap();
    assert!(engine.is_resolved());

    memory.close();
    let err = engine.count().unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::StoreClosed);
    assert!(err.is_store_failure());
}
