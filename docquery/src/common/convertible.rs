use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, QueryError, QueryResult};

/// Two-way mapping between a Rust type and a [Value].
///
/// Entities, keys and field values all cross the store boundary through this trait.
/// `#[derive(Convertible)]` from `docquery_derive` implements it for structs with
/// named fields; the impls below cover primitives, strings, options and vectors.
pub trait Convertible {
    type Output;

    fn to_value(&self) -> QueryResult<Value>;
    fn from_value(value: &Value) -> QueryResult<Self::Output>;
}

/// Converts a [Value] back into `T`. Used by the derive macros.
pub fn from_value<T>(value: &Value) -> QueryResult<T>
where
    T: Convertible<Output = T>,
{
    T::from_value(value)
}

fn mapping_error(value: &Value, target: &str) -> QueryError {
    QueryError::new(
        &format!("Value {} of type {} is not a {}", value, value.type_name(), target),
        ErrorKind::ObjectMappingError,
    )
}

macro_rules! convertible_signed {
    ($($t:ty),*) => {
        $(impl Convertible for $t {
            type Output = $t;

            fn to_value(&self) -> QueryResult<Value> {
                Ok(Value::I64(*self as i64))
            }

            fn from_value(value: &Value) -> QueryResult<Self::Output> {
                value
                    .as_i64()
                    .and_then(|v| <$t>::try_from(v).ok())
                    .ok_or_else(|| mapping_error(value, stringify!($t)))
            }
        })*
    };
}

macro_rules! convertible_unsigned {
    ($($t:ty),*) => {
        $(impl Convertible for $t {
            type Output = $t;

            fn to_value(&self) -> QueryResult<Value> {
                Ok(Value::U64(*self as u64))
            }

            fn from_value(value: &Value) -> QueryResult<Self::Output> {
                value
                    .as_u64()
                    .and_then(|v| <$t>::try_from(v).ok())
                    .ok_or_else(|| mapping_error(value, stringify!($t)))
            }
        })*
    };
}

convertible_signed!(i8, i16, i32, i64, isize);
convertible_unsigned!(u8, u16, u32, u64, usize);

impl Convertible for f64 {
    type Output = f64;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::F64(*self))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        value.as_f64().ok_or_else(|| mapping_error(value, "f64"))
    }
}

impl Convertible for f32 {
    type Output = f32;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::F64(*self as f64))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| mapping_error(value, "f32"))
    }
}

impl Convertible for bool {
    type Output = bool;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        value.as_bool().ok_or_else(|| mapping_error(value, "bool"))
    }
}

impl Convertible for char {
    type Output = char;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::String(self.to_string()))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        let mut chars = value
            .as_str()
            .ok_or_else(|| mapping_error(value, "char"))?
            .chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(mapping_error(value, "char")),
        }
    }
}

impl Convertible for String {
    type Output = String;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        value
            .as_string()
            .cloned()
            .ok_or_else(|| mapping_error(value, "string"))
    }
}

impl Convertible for Value {
    type Output = Value;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(self.clone())
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        Ok(value.clone())
    }
}

impl Convertible for Document {
    type Output = Document;

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::Document(self.clone()))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        value
            .as_document()
            .cloned()
            .ok_or_else(|| mapping_error(value, "document"))
    }
}

impl Convertible for () {
    type Output = ();

    fn to_value(&self) -> QueryResult<Value> {
        Ok(Value::Null)
    }

    fn from_value(_value: &Value) -> QueryResult<Self::Output> {
        Ok(())
    }
}

impl<T> Convertible for Option<T>
where
    T: Convertible<Output = T>,
{
    type Output = Option<T>;

    fn to_value(&self) -> QueryResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T> Convertible for Vec<T>
where
    T: Convertible<Output = T>,
{
    type Output = Vec<T>;

    fn to_value(&self) -> QueryResult<Value> {
        let mut values = Vec::with_capacity(self.len());
        for item in self {
            values.push(item.to_value()?);
        }
        Ok(Value::Array(values))
    }

    fn from_value(value: &Value) -> QueryResult<Self::Output> {
        match value {
            Value::Array(values) => values.iter().map(T::from_value).collect(),
            // a missing list field reads back as an empty list
            Value::Null => Ok(Vec::new()),
            other => Err(mapping_error(other, "array")),
        }
    }
}
