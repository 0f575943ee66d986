use docquery::engine_config::split_namespace;
use docquery::filter::field;
use docquery::repository::{DefaultQuery, FnQuery, QueryEngine, Repository};
use docquery::store::{Database, DocumentDatabase, InMemoryDatabase};
use docquery::EngineConfig;
use docquery_int_test::models::Person;
use docquery_int_test::test_util::{cleanup, create_test_context, random_name, run_test};
use std::sync::Arc;

#[test]
fn test_namespaces_are_isolated() {
    run_test(
        create_test_context,
        |ctx| {
            let prod = Repository::new(QueryEngine::with_config(
                ctx.db(),
                DefaultQuery::<Person>::new(),
                EngineConfig::new().namespace("prod"),
            )?);
            let test = Repository::new(QueryEngine::with_config(
                ctx.db(),
                DefaultQuery::<Person>::new(),
                EngineConfig::new().namespace("test"),
            )?);

            prod.insert(&Person::new("A", "x", None))?;
            assert_eq!(prod.count()?, 1);
            assert_eq!(test.count()?, 0);
            assert!(test.find_by_key(&"A".to_string())?.is_none());

            let names = ctx.db().list_collection_names()?;
            assert_eq!(names, vec!["Person+prod".to_string(), "Person+test".to_string()]);
            assert_eq!(split_namespace(&names[0]), ("Person", Some("prod")));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_prefix_applies() {
    let database: Database = Arc::new(InMemoryDatabase::new(&random_name()));
    let engine = QueryEngine::with_config(
        database.clone(),
        DefaultQuery::<Person>::new(),
        EngineConfig::new().collection_prefix("app_"),
    )
    .unwrap();
    assert_eq!(engine.collection_name().unwrap(), "app_Person");
    engine.count().unwrap();
    assert!(database.has_collection("app_Person").unwrap());
}

#[test]
fn test_eager_resolution() {
    run_test(
        create_test_context,
        |ctx| {
            let engine = QueryEngine::with_config(
                ctx.db(),
                DefaultQuery::<Person>::new(),
                EngineConfig::new().eager_resolution(true),
            )?;
            assert!(engine.is_resolved());
            assert_eq!(ctx.counting().lookups(), 1);

            engine.count()?;
            assert_eq!(ctx.counting().lookups(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_collection_name() {
    let database: Database = Arc::new(InMemoryDatabase::new(&random_name()));
    let query = FnQuery::new(|p: &Person| p.id.clone(), |id: &String| field("id").eq(id.as_str())).named("a+b");
    let engine = QueryEngine::new(database, query).unwrap();

    let err = engine.count().unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(!engine.is_resolved());
}
