use docquery::collection::FindOptions;
use docquery::common::SortOrder;
use docquery::doc;
use docquery::errors::ErrorKind;
use docquery::filter::{and, field, or, where_fn};
use docquery::repository::{DefaultQuery, FnQuery, QueryEngine};
use docquery_int_test::models::Person;
use docquery_int_test::test_util::{cleanup, create_test_context, run_test, TestContext};

fn seed_people(ctx: &TestContext) -> docquery::errors::QueryResult<()> {
    ctx.seed(
        "Person",
        vec![
            doc! { "id": "A", name: "x" },
            doc! { "id": "B", name: "y", age: 30 },
            doc! { "id": "C", name: "y", age: 41 },
            doc! { "id": "D", name: "z", age: 17 },
        ],
    )
}

#[test]
fn test_find_by_key() {
    run_test(
        create_test_context,
        |ctx| {
            seed_people(&ctx)?;
            let engine = QueryEngine::new(ctx.db(), DefaultQuery::<Person>::new())?;

            let found = engine.find_by_key(&"A".to_string())?;
            assert_eq!(found, Some(Person::new("A", "x", None)));
            assert_eq!(engine.find_by_key(&"Q".to_string())?, None);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_by_absent_key_fails_without_store_access() {
    run_test(
        create_test_context,
        |ctx| {
            let query = FnQuery::new(
                |p: &Person| Some(p.id.clone()),
                |id: &Option<String>| field("id").eq(id.clone()),
            );
            let engine = QueryEngine::new(ctx.db(), query)?;

            let err = engine.find_by_key(&None).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
            assert_eq!(ctx.counting().lookups(), 0);
            assert!(!engine.is_resolved());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_empty_criteria_fails_without_store_access() {
    run_test(
        create_test_context,
        |ctx| {
            let engine = QueryEngine::new(ctx.db(), DefaultQuery::<Person>::new())?;

            assert!(engine.find_one(&field("").eq("x")).unwrap_err().is_invalid_argument());
            assert!(engine.find(&and(vec![])).err().unwrap().is_invalid_argument());
            assert!(engine.count_where(&or(vec![])).unwrap_err().is_invalid_argument());
            assert!(engine.exists(&field(" ").exists()).unwrap_err().is_invalid_argument());
            assert_eq!(ctx.counting().lookups(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_one_and_find() {
    run_test(
        create_test_context,
        |ctx| {
            seed_people(&ctx)?;
            let engine = QueryEngine::new(ctx.db(), DefaultQuery::<Person>::new())?;

            let one = engine.find_one(&field("name").eq("z"))?;
            assert_eq!(one.map(|p| p.id), Some("D".to_string()));
            assert_eq!(engine.find_one(&field("name").eq("none"))?, None);

            let adults: Vec<Person> = engine.find(&field("age").gte(18))?.to_list()?;
            assert_eq!(adults.len(), 2);

            let all = engine.find_all()?.to_list()?;
            assert_eq!(all.len(), 4);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_options() {
    run_test(
        create_test_context,
        |ctx| {
            seed_people(&ctx)?;
            let engine = QueryEngine::new(ctx.db(), DefaultQuery::<Person>::new())?;

            let options = FindOptions::new()
                .sort_by("id", SortOrder::Descending)
                .skip(1)
                .limit(2);
            let ids: Vec<String> = engine
                .find_with_options(&field("id").exists(), &options)?
                .map(|p| p.map(|p| p.id))
                .collect::<Result<_, _>>()?;
            assert_eq!(ids, vec!["C".to_string(), "B".to_string()]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_untranslatable_criteria() {
    run_test(
        create_test_context,
        |ctx| {
            seed_people(&ctx)?;
            let engine = QueryEngine::new(ctx.db(), DefaultQuery::<Person>::new())?;

            let err = engine.find_one(&where_fn(|_| true)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::FilterError);
            assert!(!err.is_invalid_argument());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_mapping_failure_surfaces() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.seed("Person", vec![doc! { "id": "bad", name: 12 }])?;
            let engine = QueryEngine::new(ctx.db(), DefaultQuery::<Person>::new())?;

            let err = engine.find_by_key(&"bad".to_string()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
            Ok(())
        },
        cleanup,
    )
}
