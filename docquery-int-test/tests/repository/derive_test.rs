use docquery::collection::IndexType;
use docquery::common::{Convertible, Value};
use docquery::errors::ErrorKind;
use docquery::filter::field;
use docquery::repository::{DefaultQuery, Entity, EntityQuery, Repository};
use docquery_int_test::models::{Employee, Person, Status};
use docquery_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_derived_entity_metadata() {
    assert_eq!(Person::entity_name(), "Person");
    assert_eq!(Person::key_field(), "id");
    assert_eq!(Employee::entity_name(), "employees");
    assert_eq!(Employee::key_field(), "emp_id");

    let indexes = Employee::entity_indexes();
    assert_eq!(indexes.len(), 2);
    assert_eq!(indexes[0].field_names(), &["email".to_string()]);
    assert_eq!(indexes[0].index_type(), IndexType::Unique);
    assert_eq!(indexes[1].field_names(), &["dept".to_string(), "status".to_string()]);
    assert_eq!(indexes[1].index_type(), IndexType::NonUnique);

    let query = DefaultQuery::<Employee>::new();
    assert_eq!(query.collection_name(), "employees");
    assert_eq!(query.entity_key(&Employee::new(9, "e@x", "ops")), 9);
}

#[test]
fn test_derived_convertible() {
    let mut employee = Employee::new(1, "a@x", "eng");
    employee.status = Status::OnLeave;
    employee.manager = Some(7);
    employee.skills = vec!["rust".to_string()];
    employee.session = vec!["token".to_string()];

    let value = employee.to_value().unwrap();
    let doc = value.as_document().unwrap();
    assert_eq!(doc.get("status").unwrap(), Value::from("OnLeave"));
    assert_eq!(doc.get("manager").unwrap(), Value::from(7u64));
    assert!(!doc.contains_key("session"));

    let back = Employee::from_value(&value).unwrap();
    assert_eq!(back.status, Status::OnLeave);
    assert_eq!(back.skills, vec!["rust".to_string()]);
    assert!(back.session.is_empty());

    let err = Employee::from_value(&Value::from("nope")).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
    let err = Status::from_value(&Value::from("Fired")).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
}

#[test]
fn test_derived_entity_through_repository() {
    run_test(
        create_test_context,
        |ctx| {
            let employees = Repository::open(ctx.db(), DefaultQuery::<Employee>::new())?;
            employees.insert(&Employee::new(1, "a@x", "eng"))?;
            employees.insert(&Employee::new(2, "b@x", "eng"))?;

            let err = employees.insert(&Employee::new(3, "a@x", "ops")).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);

            assert_eq!(employees.find_by_key(&2)?.map(|e| e.email), Some("b@x".to_string()));
            assert_eq!(employees.count_where(&field("status").eq("Active"))?, 2);
            assert_eq!(employees.collection()?.name(), "employees");
            assert_eq!(employees.collection()?.list_indexes()?.len(), 3);
            Ok(())
        },
        cleanup,
    )
}
