use docquery::errors::ErrorKind;
use docquery::filter::field;
use docquery::repository::{DefaultQuery, QueryEngine, Repository};
use docquery_int_test::models::Person;
use docquery_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_insert_and_read_back() {
    run_test(
        create_test_context,
        |ctx| {
            let people = Repository::open(ctx.db(), DefaultQuery::<Person>::new())?;
            people.insert_many(&[
                Person::new("A", "x", Some(20)),
                Person::new("B", "y", None),
            ])?;

            assert_eq!(people.count()?, 2);
            assert_eq!(people.find_by_key(&"B".to_string())?, Some(Person::new("B", "y", None)));
            assert!(people.exists(&field("age").eq(20u32))?);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_save_replaces_by_key() {
    run_test(
        create_test_context,
        |ctx| {
            let people = Repository::open(ctx.db(), DefaultQuery::<Person>::new())?;
            people.save(&Person::new("A", "x", None))?;
            people.save(&Person::new("A", "renamed", Some(5)))?;

            assert_eq!(people.count()?, 1);
            let found = people.find_by_key(&"A".to_string())?;
            assert_eq!(found, Some(Person::new("A", "renamed", Some(5))));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_duplicate_key_is_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let people = Repository::open(ctx.db(), DefaultQuery::<Person>::new())?;
            people.insert(&Person::new("A", "x", None))?;

            let err = people.insert(&Person::new("A", "other", None)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);
            assert_eq!(people.count()?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete() {
    run_test(
        create_test_context,
        |ctx| {
            let people = Repository::open(ctx.db(), DefaultQuery::<Person>::new())?;
            people.insert_many(&[
                Person::new("A", "x", None),
                Person::new("B", "y", None),
                Person::new("C", "y", None),
            ])?;

            assert_eq!(people.delete_by_key(&"A".to_string())?, 1);
            assert!(!people.exists_by_key(&"A".to_string())?);
            assert_eq!(people.delete(&field("name").eq("y"))?, 2);
            assert_eq!(people.count()?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_repository_and_engine_share_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let people = Repository::open(ctx.db(), DefaultQuery::<Person>::new())?;
            let reader = QueryEngine::new(ctx.db(), DefaultQuery::<Person>::new())?;

            people.insert(&Person::new("A", "x", None))?;
            assert_eq!(reader.find_by_key(&"A".to_string())?.map(|p| p.name), Some("x".to_string()));
            Ok(())
        },
        cleanup,
    )
}
