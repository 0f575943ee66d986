use docquery_derive::{Convertible, Entity};

#[derive(Debug, Clone, PartialEq, Convertible, Entity)]
#[entity(index(type = "non-unique", fields = "name"))]
pub struct Person {
    pub id: String,
    pub name: String,
    pub age: Option<u32>,
}

impl Person {
    pub fn new(id: &str, name: &str, age: Option<u32>) -> Self {
        Person {
            id: id.to_string(),
            name: name.to_string(),
            age,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Convertible)]
pub enum Status {
    #[default]
    Active,
    OnLeave,
    Retired,
}

#[derive(Debug, Clone, PartialEq, Default, Convertible, Entity)]
#[converter(ignored = "session")]
#[entity(
    name = "employees",
    key = "emp_id",
    index(type = "unique", fields = "email"),
    index(type = "non-unique", fields = "dept, status")
)]
pub struct Employee {
    pub emp_id: u64,
    pub email: String,
    pub dept: String,
    pub status: Status,
    pub manager: Option<u64>,
    pub skills: Vec<String>,
    pub session: Vec<String>,
}

impl Employee {
    pub fn new(emp_id: u64, email: &str, dept: &str) -> Self {
        Employee {
            emp_id,
            email: email.to_string(),
            dept: dept.to_string(),
            ..Default::default()
        }
    }
}
