use crate::collection::Document;
use crate::common::{SortOrder, Value};
use std::cmp::Ordering;

/// Options for controlling find operations on documents.
///
/// `FindOptions` specifies sorting and pagination for query results and
/// supports method chaining.
///
/// # Examples
///
/// ```rust,ignore
/// use docquery::collection::{FindOptions, order_by, skip_by};
/// use docquery::common::SortOrder;
///
/// let options = FindOptions::new()
///     .sort_by("age", SortOrder::Descending)
///     .skip(10)
///     .limit(20);
///
/// let options = order_by("name", SortOrder::Ascending);
/// let options = skip_by(5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) sort_by: Vec<(String, SortOrder)>,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
}

/// Creates `FindOptions` sorted by a field.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

/// Creates `FindOptions` that skip the first `skip` documents.
pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions::new().skip(skip)
}

/// Creates `FindOptions` that return at most `limit` documents.
pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Adds a sort key. Earlier keys take precedence over later ones.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        self.sort_by.push((field_name.to_string(), sort_order));
        self
    }

    pub fn sort_order(&self) -> &[(String, SortOrder)] {
        &self.sort_by
    }

    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }

    /// Sorts, skips and limits `documents` in place of a store-side cursor.
    pub(crate) fn apply(&self, mut documents: Vec<Document>) -> Vec<Document> {
        if !self.sort_by.is_empty() {
            documents.sort_by(|a, b| self.compare(a, b));
        }

        let skip = self.skip.unwrap_or(0) as usize;
        let limit = self.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        documents.into_iter().skip(skip).take(limit).collect()
    }

    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, order) in &self.sort_by {
            let left = a.get(field).unwrap_or(Value::Null);
            let right = b.get(field).unwrap_or(Value::Null);
            let ordering = match order {
                SortOrder::Ascending => left.cmp(&right),
                SortOrder::Descending => right.cmp(&left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
