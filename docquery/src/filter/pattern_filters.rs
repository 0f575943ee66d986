use std::any::Any;
use std::fmt::Display;

use regex::Regex;

use crate::collection::Document;
use crate::errors::{QueryError, QueryResult};

use super::expr::regex_matches;
use super::{validate_field_name, FilterExpr, FilterProvider};

/// Matches string fields against a regular expression.
///
/// The pattern is compiled once when the filter is built. An invalid pattern
/// is kept as its compile error and reported by `apply` and `translate`, so it
/// never reaches a store.
pub(crate) struct RegexFilter {
    field_name: String,
    pattern: String,
    compiled: Result<Regex, QueryError>,
}

impl RegexFilter {
    pub(crate) fn new(field_name: String, pattern: String) -> Self {
        let compiled = Regex::new(&pattern).map_err(QueryError::from);
        RegexFilter {
            field_name,
            pattern,
            compiled,
        }
    }
}

impl Display for RegexFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} regex {})", self.field_name, self.pattern)
    }
}

impl FilterProvider for RegexFilter {
    fn apply(&self, entry: &Document) -> QueryResult<bool> {
        match &self.compiled {
            Ok(regex) => regex_matches(entry, &self.field_name, regex),
            Err(err) => Err(err.clone()),
        }
    }

    fn translate(&self) -> QueryResult<FilterExpr> {
        if let Err(err) = &self.compiled {
            log::error!("Cannot translate ({} regex {}): {}", self.field_name, self.pattern, err);
            return Err(err.clone());
        }
        Ok(FilterExpr::Regex {
            field: self.field_name.clone(),
            pattern: self.pattern.clone(),
        })
    }

    fn validate(&self) -> QueryResult<()> {
        validate_field_name(&self.field_name, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
