use crate::common::{NON_UNIQUE_INDEX, UNIQUE_INDEX};
use crate::errors::{QueryError, QueryResult};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Kind of secondary index a collection maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// Rejects a second document with the same field values
    Unique,
    NonUnique,
}

impl Display for IndexType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexType::Unique => write!(f, "{}", UNIQUE_INDEX),
            IndexType::NonUnique => write!(f, "{}", NON_UNIQUE_INDEX),
        }
    }
}

impl FromStr for IndexType {
    type Err = QueryError;

    fn from_str(s: &str) -> QueryResult<Self> {
        match s {
            UNIQUE_INDEX => Ok(IndexType::Unique),
            NON_UNIQUE_INDEX => Ok(IndexType::NonUnique),
            other => Err(QueryError::invalid_argument(&format!(
                "Unknown index type {}",
                other
            ))),
        }
    }
}

/// Describes an index on one or more fields of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexDescriptor {
    index_type: IndexType,
    fields: Vec<String>,
    collection_name: String,
}

impl IndexDescriptor {
    pub fn new(index_type: IndexType, fields: Vec<String>, collection_name: &str) -> Self {
        IndexDescriptor {
            index_type,
            fields,
            collection_name: collection_name.to_string(),
        }
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Returns `true` if this index covers exactly `fields`, in order.
    pub fn covers(&self, fields: &[&str]) -> bool {
        self.fields.len() == fields.len() && self.fields.iter().zip(fields).all(|(a, b)| a == b)
    }
}
