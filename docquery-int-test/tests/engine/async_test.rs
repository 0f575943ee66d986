use docquery::collection::order_by;
use docquery::common::SortOrder;
use docquery::doc;
use docquery::errors::ErrorKind;
use docquery::filter::{and, field, or};
use docquery::repository::{DefaultQuery, FnQuery, QueryEngine};
use docquery::store::{Database, DocumentDatabase, InMemoryDatabase};
use docquery_int_test::models::Person;
use docquery_int_test::test_util::{random_name, CountingDatabase};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn seeded(database: &InMemoryDatabase) {
    database
        .collection("Person")
        .unwrap()
        .insert(vec![
            doc! { "id": "A", name: "x" },
            doc! { "id": "B", name: "y", age: 30 },
            doc! { "id": "C", name: "y", age: 50 },
        ])
        .unwrap();
}

#[tokio::test]
async fn test_async_matches_sync() {
    let memory = InMemoryDatabase::new(&random_name());
    seeded(&memory);
    let engine = QueryEngine::new(Arc::new(memory), DefaultQuery::<Person>::new()).unwrap();
    let token = CancellationToken::new();

    for key in ["A", "B", "Z"] {
        let key = key.to_string();
        assert_eq!(
            engine.find_by_key_async(&key, &token).await.unwrap(),
            engine.find_by_key(&key).unwrap()
        );
    }

    let filters = vec![field("name").eq("y"), field("age").gt(40), field("name").eq("q")];
    for filter in &filters {
        assert_eq!(
            engine.find_one_async(filter, &token).await.unwrap(),
            engine.find_one(filter).unwrap()
        );
        assert_eq!(
            engine.count_where_async(filter, &token).await.unwrap(),
            engine.count_where(filter).unwrap()
        );
        assert_eq!(
            engine.exists_async(filter, &token).await.unwrap(),
            engine.exists(filter).unwrap()
        );
        assert_eq!(
            engine.find_async(filter, &token).await.unwrap().to_list().unwrap(),
            engine.find(filter).unwrap().to_list().unwrap()
        );
    }

    for key in ["A", "Z"] {
        let key = key.to_string();
        assert_eq!(
            engine.exists_by_key_async(&key, &token).await.unwrap(),
            engine.exists_by_key(&key).unwrap()
        );
    }

    let by_id_desc = order_by("id", SortOrder::Descending).limit(2);
    let named_y = field("name").eq("y");
    let sorted = engine
        .find_with_options_async(&named_y, &by_id_desc, &token)
        .await
        .unwrap()
        .to_list()
        .unwrap();
    assert_eq!(
        sorted,
        engine.find_with_options(&named_y, &by_id_desc).unwrap().to_list().unwrap()
    );
    assert_eq!(sorted.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), vec!["C", "B"]);

    assert_eq!(engine.count_async(&token).await.unwrap(), engine.count().unwrap());
    assert_eq!(
        engine.find_all_async(&token).await.unwrap().to_list().unwrap(),
        engine.find_all().unwrap().to_list().unwrap()
    );
}

#[tokio::test]
async fn test_async_rejects_invalid_arguments_first() {
    let database = Arc::new(CountingDatabase::new(InMemoryDatabase::new(&random_name())));
    let engine = QueryEngine::new(database.clone(), DefaultQuery::<Person>::new()).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    // argument checks come before the cancellation check
    let err = engine.exists_async(&and(vec![]), &token).await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
    assert_eq!(database.lookups(), 0);
}

#[tokio::test]
async fn test_async_invalid_arguments_match_sync() {
    let database = Arc::new(CountingDatabase::new(InMemoryDatabase::new(&random_name())));
    let query = FnQuery::new(
        |p: &Person| Some(p.id.clone()),
        |key: &Option<String>| field("id").eq(key.clone()),
    );
    let engine = QueryEngine::new(database.clone(), query).unwrap();
    let token = CancellationToken::new();

    let err = engine.find_by_key_async(&None, &token).await.unwrap_err();
    assert_eq!(err.kind(), engine.find_by_key(&None).unwrap_err().kind());
    assert!(err.is_invalid_argument());
    assert!(engine.exists_by_key_async(&None, &token).await.unwrap_err().is_invalid_argument());

    let no_field = field("").eq("A");
    let empty_and = and(vec![]);
    let empty_or = or(vec![]);
    for filter in [&no_field, &empty_and, &empty_or] {
        let err = engine.find_one_async(filter, &token).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
        assert_eq!(err.kind(), engine.find_one(filter).unwrap_err().kind());

        let err = engine.find_async(filter, &token).await.err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);

        let err = engine
            .find_with_options_async(filter, &order_by("id", SortOrder::Ascending), &token)
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);

        let err = engine.count_where_async(filter, &token).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
        assert_eq!(err.kind(), engine.count_where(filter).unwrap_err().kind());
    }

    assert_eq!(database.lookups(), 0);
    assert!(!engine.is_resolved());
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let database = Arc::new(CountingDatabase::new(InMemoryDatabase::new(&random_name())));
    let engine = QueryEngine::new(database.clone(), DefaultQuery::<Person>::new()).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let err = engine.find_by_key_async(&"A".to_string(), &token).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(!err.is_store_failure());
    assert_eq!(database.lookups(), 0);
    assert!(!engine.is_resolved());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_mid_flight() {
    let memory = InMemoryDatabase::new(&random_name()).with_latency(Duration::from_millis(500));
    seeded(&memory);
    let engine = QueryEngine::new(Arc::new(memory), DefaultQuery::<Person>::new()).unwrap();
    engine.collection().unwrap();

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = engine.count_async(&token).await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::Cancelled);
    assert!(started.elapsed() < Duration::from_millis(500));

    // the engine stays usable with a fresh token
    let fresh = CancellationToken::new();
    assert_eq!(engine.count_async(&fresh).await.unwrap(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_async_first_use_resolves_once() {
    let database = Arc::new(
        CountingDatabase::new(InMemoryDatabase::new(&random_name())).slow(Duration::from_millis(30)),
    );
    let shared: Database = database.clone();
    let engine = Arc::new(QueryEngine::new(shared, DefaultQuery::<Person>::new()).unwrap());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let token = CancellationToken::new();
                engine.count_async(&token).await
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), 0);
    }
    assert_eq!(database.lookups(), 1);
    assert_eq!(engine.resolution_count(), 1);
}
