use im::OrdMap;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::common::{Value, DOC_ID, FIELD_SEPARATOR, RESERVED_FIELDS};
use crate::errors::{ErrorKind, QueryError, QueryResult};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

pub type FieldVec = SmallVec<[String; 8]>;

/// A schemaless record stored in a collection.
///
/// A document is an ordered map of [String] keys to [Value]s. Values can be
/// nested documents; a nested value is addressed with a dotted path, so the
/// `b` inside `{"a": {"b": 1}}` is read with `document.get("a.b")`. A numeric
/// path segment indexes into an array, any other segment is applied to every
/// element of the array and the distinct results are collected.
///
/// `_id` is reserved for the store-assigned identifier and must hold a string.
///
/// Backed by `im::OrdMap`, so cloning a document is O(1) and every mutation
/// leaves earlier clones untouched.
#[derive(Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of top level entries.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Puts a value under `key`, creating intermediate documents for a dotted key.
    ///
    /// # Errors
    ///
    /// [ErrorKind::InvalidArgument] for an empty key or path segment, or when
    /// `_id` is given a non-string value.
    pub fn put<'a, T: Into<Value>>(&mut self, key: impl Into<Cow<'a, str>>, value: T) -> QueryResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(QueryError::invalid_argument(
                "Document does not support empty key",
            ));
        }

        let value = value.into();
        if key == DOC_ID && !value.is_string() {
            log::error!("Document id must be a string, found {}", value.type_name());
            return Err(QueryError::invalid_argument(&format!(
                "Document id must be a string, found {}",
                value.type_name()
            )));
        }

        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.data.insert(key.into_owned(), value);
            Ok(())
        }
    }

    /// Reads the value at `key`. A missing key, or a path that runs into a
    /// scalar, yields [Value::Null].
    ///
    /// # Errors
    ///
    /// [ErrorKind::InvalidArgument] for an empty path segment or an array index
    /// outside the array.
    pub fn get(&self, key: &str) -> QueryResult<Value> {
        match self.data.get(key) {
            Some(value) => Ok(value.clone()),
            None if key.contains(FIELD_SEPARATOR) => self.deep_get(key),
            None => Ok(Value::Null),
        }
    }

    /// The store-assigned identifier, if the document has been persisted.
    pub fn id(&self) -> Option<&str> {
        self.data.get(DOC_ID).and_then(|v| v.as_str())
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Removes the value at `key`. Removing the last field of a nested document
    /// removes the nested document as well.
    pub fn remove(&mut self, key: &str) -> QueryResult<()> {
        if self.data.contains_key(key) {
            self.data.remove(key);
            return Ok(());
        }
        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_remove(&splits)
        } else {
            Ok(())
        }
    }

    /// Returns `true` if the top level of the document has `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns `true` if `field` (dotted paths allowed) is one of [Document::fields].
    pub fn contains_field(&self, field: &str) -> bool {
        self.contains_key(field) || self.fields().iter().any(|f| f == field)
    }

    /// All leaf field paths, reserved fields excluded.
    pub fn fields(&self) -> FieldVec {
        self.fields_with_prefix("")
    }

    /// Copies every entry of `other` into this document, merging nested
    /// documents key by key instead of replacing them.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            match (self.data.get_mut(key), value) {
                (Some(Value::Document(mine)), Value::Document(theirs)) => mine.merge(theirs),
                _ => {
                    self.data.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> + '_ {
        self.data.iter()
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn fields_with_prefix(&self, prefix: &str) -> FieldVec {
        let mut fields = FieldVec::new();
        for (key, value) in self.data.iter() {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                continue;
            }

            let field = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
            };

            match value {
                Value::Document(doc) => fields.extend(doc.fields_with_prefix(&field)),
                _ => fields.push(field),
            }
        }
        fields
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> QueryResult<()> {
        let (key, rest) = match splits.split_first() {
            Some((key, rest)) if !key.is_empty() => (*key, rest),
            _ => {
                log::error!("Document does not support empty key");
                return Err(QueryError::invalid_argument(
                    "Document does not support empty key",
                ));
            }
        };

        if rest.is_empty() {
            self.data.insert(key.to_string(), value);
            return Ok(());
        }

        // a scalar in the way is replaced by a new nested document
        let mut nested = match self.data.get(key) {
            Some(Value::Document(doc)) => doc.clone(),
            _ => Document::new(),
        };
        nested.deep_put(rest, value)?;
        self.data.insert(key.to_string(), Value::Document(nested));
        Ok(())
    }

    fn deep_get(&self, key: &str) -> QueryResult<Value> {
        let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        match splits.split_first() {
            Some((first, rest)) if !first.is_empty() => recursive_get(self.data.get(*first), rest),
            _ => Err(QueryError::invalid_argument(
                "Document does not support empty key",
            )),
        }
    }

    fn deep_remove(&mut self, splits: &[&str]) -> QueryResult<()> {
        let (key, rest) = match splits.split_first() {
            Some((key, rest)) if !key.is_empty() => (*key, rest),
            _ => {
                return Err(QueryError::invalid_argument(
                    "Document does not support empty key",
                ))
            }
        };

        if rest.is_empty() {
            self.data.remove(key);
            return Ok(());
        }

        if let Some(Value::Document(doc)) = self.data.get(key) {
            let mut nested = doc.clone();
            nested.deep_remove(rest)?;
            if nested.is_empty() {
                self.data.remove(key);
            } else {
                self.data.insert(key.to_string(), Value::Document(nested));
            }
        }
        Ok(())
    }

    fn write_json(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", key, value)?;
        }
        write!(f, "}}")
    }
}

fn recursive_get(value: Option<&Value>, splits: &[&str]) -> QueryResult<Value> {
    let value = match value {
        None => return Ok(Value::Null),
        Some(v) => v,
    };

    let (key, rest) = match splits.split_first() {
        None => return Ok(value.clone()),
        Some((key, _)) if key.is_empty() => {
            return Err(QueryError::invalid_argument(
                "Document does not support empty key",
            ))
        }
        Some((key, rest)) => (*key, rest),
    };

    match value {
        Value::Document(doc) => recursive_get(doc.data.get(key), rest),
        Value::Array(items) => match key.parse::<usize>() {
            Ok(index) => match items.get(index) {
                Some(item) => recursive_get(Some(item), rest),
                None => {
                    log::error!("Array index {} out of bound", index);
                    Err(QueryError::new(
                        &format!("Array index {} out of bound", index),
                        ErrorKind::InvalidArgument,
                    ))
                }
            },
            Err(_) => decompose(items, splits),
        },
        _ => Ok(Value::Null),
    }
}

// applies the remaining path to every array element and flattens the distinct results
fn decompose(items: &[Value], splits: &[&str]) -> QueryResult<Value> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        match recursive_get(Some(item), splits)? {
            Value::Array(nested) => values.extend(nested),
            Value::Null => {}
            value => values.push(value),
        }
    }
    Ok(Value::Array(values.into_iter().unique().collect()))
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.write_json(f)
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.write_json(f)
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Document {
            data: map.into_iter().collect(),
        }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

/// Strips the quotes `stringify!` leaves around a string literal key.
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// ```rust,ignore
/// use docquery::doc;
///
/// let id = "A";
/// let document = doc! {
///     "id": id,
///     name: "x",
///     address: { city: "Pune" },
///     tags: ["a", "b"]
/// };
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            let mut doc = $crate::collection::Document::new();
            $(
                doc.put($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Value position helper for [doc!].
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
