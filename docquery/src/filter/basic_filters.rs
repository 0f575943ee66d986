use std::any::Any;
use std::fmt::Display;
use std::sync::Arc;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{QueryError, QueryResult};

use super::{FilterExpr, FilterProvider};

/// Fails with `InvalidArgument` when a field filter has no field to select on.
pub(crate) fn validate_field_name(field_name: &str, filter: &dyn Display) -> QueryResult<()> {
    if field_name.trim().is_empty() {
        log::error!("Filter {} has an empty field name", filter);
        return Err(QueryError::invalid_argument(&format!(
            "Filter {} has an empty field name",
            filter
        )));
    }
    Ok(())
}

pub(crate) struct AllFilter;

impl FilterProvider for AllFilter {
    fn apply(&self, _entry: &Document) -> QueryResult<bool> {
        Ok(true)
    }

    fn translate(&self) -> QueryResult<FilterExpr> {
        Ok(FilterExpr::All)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Display for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ALL")
    }
}

pub(crate) struct EqualsFilter {
    field_name: String,
    field_value: Value,
}

impl EqualsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        EqualsFilter {
            field_name,
            field_value,
        }
    }
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for EqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> QueryResult<bool> {
        Ok(entry.get(&self.field_name)? == self.field_value)
    }

    fn translate(&self) -> QueryResult<FilterExpr> {
        Ok(FilterExpr::Eq {
            field: self.field_name.clone(),
            value: self.field_value.clone(),
        })
    }

    fn validate(&self) -> QueryResult<()> {
        validate_field_name(&self.field_name, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct NotEqualsFilter {
    field_name: String,
    field_value: Value,
}

impl NotEqualsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        NotEqualsFilter {
            field_name,
            field_value,
        }
    }
}

impl Display for NotEqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} != {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for NotEqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> QueryResult<bool> {
        Ok(entry.get(&self.field_name)? != self.field_value)
    }

    fn translate(&self) -> QueryResult<FilterExpr> {
        Ok(FilterExpr::Ne {
            field: self.field_name.clone(),
            value: self.field_value.clone(),
        })
    }

    fn validate(&self) -> QueryResult<()> {
        validate_field_name(&self.field_name, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct ExistsFilter {
    field_name: String,
}

impl ExistsFilter {
    pub(crate) fn new(field_name: String) -> Self {
        ExistsFilter { field_name }
    }
}

impl Display for ExistsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} exists)", self.field_name)
    }
}

impl FilterProvider for ExistsFilter {
    fn apply(&self, entry: &Document) -> QueryResult<bool> {
        Ok(!entry.get(&self.field_name)?.is_null())
    }

    fn translate(&self) -> QueryResult<FilterExpr> {
        Ok(FilterExpr::Exists {
            field: self.field_name.clone(),
        })
    }

    fn validate(&self) -> QueryResult<()> {
        validate_field_name(&self.field_name, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type Predicate = Arc<dyn Fn(&Document) -> bool + Send + Sync>;

pub(crate) struct WhereFilter {
    predicate: Predicate,
}

impl WhereFilter {
    pub(crate) fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Document) -> bool + Send + Sync + 'static,
    {
        WhereFilter {
            predicate: Arc::new(predicate),
        }
    }
}

impl Display for WhereFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(where <closure>)")
    }
}

// no translate override: closures stay in process
impl FilterProvider for WhereFilter {
    fn apply(&self, entry: &Document) -> QueryResult<bool> {
        Ok((self.predicate)(entry))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
