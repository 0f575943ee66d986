use docquery::doc;
use docquery::errors::ErrorKind;
use docquery::filter::{all, field, Filter};
use docquery::repository::{DefaultQuery, QueryEngine};
use docquery_int_test::models::Person;
use docquery_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_count_matches_find_all() {
    run_test(
        create_test_context,
        |ctx| {
            let engine = QueryEngine::new(ctx.db(), DefaultQuery::<Person>::new())?;
            assert_eq!(engine.count()?, 0);
            assert!(!engine.exists(&all())?);

            let documents = (0..25)
                .map(|i| doc! { "id": (format!("p{}", i)), name: (format!("n{}", i % 5)) })
                .collect();
            ctx.seed("Person", documents)?;

            assert_eq!(engine.count()?, 25);
            assert_eq!(engine.count()?, engine.find_all()?.count() as u64);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_exists_agrees_with_count_where() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.seed(
                "Person",
                vec![
                    doc! { "id": "A", name: "x", age: 3 },
                    doc! { "id": "B", name: "y", age: 30 },
                    doc! { "id": "C", name: "y" },
                ],
            )?;
            let engine = QueryEngine::new(ctx.db(), DefaultQuery::<Person>::new())?;

            let criteria: Vec<Filter> = vec![
                all(),
                field("name").eq("y"),
                field("name").eq("missing"),
                field("age").gt(10),
                field("age").lt(0),
                field("age").exists(),
                field("name").regex("^[xy]$"),
                field("name").in_array(vec!["x", "q"]),
                field("name").not_in(vec!["x", "y"]),
                field("name").eq("x").or(field("age").gte(30)),
                field("name").eq("y").and(field("age").exists().not()),
            ];
            for filter in &criteria {
                let count = engine.count_where(filter)?;
                assert_eq!(engine.exists(filter)?, count > 0, "criteria {}", filter);
                assert_eq!(engine.find(filter)?.count() as u64, count, "criteria {}", filter);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_exists_by_key() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.seed("Person", vec![doc! { "id": "A", name: "x" }])?;
            let engine = QueryEngine::new(ctx.db(), DefaultQuery::<Person>::new())?;

            assert!(engine.exists_by_key(&"A".to_string())?);
            assert!(!engine.exists_by_key(&"B".to_string())?);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_regex_fails_regardless_of_contents() {
    run_test(
        create_test_context,
        |ctx| {
            let engine = QueryEngine::new(ctx.db(), DefaultQuery::<Person>::new())?;
            let broken = field("id").regex("[");

            let on_empty = engine.exists(&broken).unwrap_err();
            assert_eq!(on_empty.kind(), &ErrorKind::FilterError);
            assert!(on_empty.is_store_failure());

            ctx.seed("Person", vec![doc! { "id": "A", name: "x" }])?;
            let on_seeded = engine.exists(&broken).unwrap_err();
            assert_eq!(on_seeded.kind(), on_empty.kind());
            assert_eq!(engine.count_where(&broken).unwrap_err().kind(), &ErrorKind::FilterError);
            assert_eq!(engine.find(&broken).err().unwrap().kind(), &ErrorKind::FilterError);
            Ok(())
        },
        cleanup,
    )
}
