use std::{any::Any, fmt::Display};

use crate::{
    collection::Document,
    errors::{QueryError, QueryResult},
};

use super::{Filter, FilterExpr, FilterProvider};

fn write_joined(
    f: &mut std::fmt::Formatter<'_>,
    filters: &[Filter],
    op: &str,
) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", filter)?;
    }
    write!(f, ")")
}

fn validate_group(filters: &[Filter], group: &dyn Display) -> QueryResult<()> {
    if filters.is_empty() {
        log::error!("Logical filter {} has no operands", group);
        return Err(QueryError::invalid_argument(&format!(
            "Logical filter {} has no operands",
            group
        )));
    }
    filters.iter().try_for_each(|filter| filter.validate())
}

fn translate_all(filters: &[Filter]) -> QueryResult<Vec<FilterExpr>> {
    filters.iter().map(|filter| filter.translate()).collect()
}

pub(crate) struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        AndFilter { filters }
    }
}

impl Display for AndFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_joined(f, &self.filters, "&&")
    }
}

impl FilterProvider for AndFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> QueryResult<bool> {
        for filter in &self.filters {
            if !filter.apply(entry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn translate(&self) -> QueryResult<FilterExpr> {
        Ok(FilterExpr::And(translate_all(&self.filters)?))
    }

    fn validate(&self) -> QueryResult<()> {
        validate_group(&self.filters, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        OrFilter { filters }
    }
}

impl Display for OrFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_joined(f, &self.filters, "||")
    }
}

impl FilterProvider for OrFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> QueryResult<bool> {
        for filter in &self.filters {
            if filter.apply(entry)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn translate(&self) -> QueryResult<FilterExpr> {
        Ok(FilterExpr::Or(translate_all(&self.filters)?))
    }

    fn validate(&self) -> QueryResult<()> {
        validate_group(&self.filters, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct NotFilter {
    filter: Filter,
}

impl NotFilter {
    pub(crate) fn new(filter: Filter) -> Self {
        NotFilter { filter }
    }
}

impl Display for NotFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!{}", self.filter)
    }
}

impl FilterProvider for NotFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> QueryResult<bool> {
        Ok(!self.filter.apply(entry)?)
    }

    fn translate(&self) -> QueryResult<FilterExpr> {
        Ok(FilterExpr::Not(Box::new(self.filter.translate()?)))
    }

    fn validate(&self) -> QueryResult<()> {
        self.filter.validate()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
