use std::any::Any;
use std::cmp::Ordering;
use std::fmt::Display;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::QueryResult;

use super::expr::compare_field;
use super::{validate_field_name, FilterExpr, FilterProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComparisonMode {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl ComparisonMode {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            ComparisonMode::Greater => ordering == Ordering::Greater,
            ComparisonMode::GreaterEqual => ordering != Ordering::Less,
            ComparisonMode::Lesser => ordering == Ordering::Less,
            ComparisonMode::LesserEqual => ordering != Ordering::Greater,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            ComparisonMode::Greater => ">",
            ComparisonMode::GreaterEqual => ">=",
            ComparisonMode::Lesser => "<",
            ComparisonMode::LesserEqual => "<=",
        }
    }
}

/// Ordering comparison of a field against a value of the same kind.
pub(crate) struct ComparisonFilter {
    field_name: String,
    field_value: Value,
    mode: ComparisonMode,
}

impl ComparisonFilter {
    pub(crate) fn new(field_name: String, field_value: Value, mode: ComparisonMode) -> Self {
        ComparisonFilter {
            field_name,
            field_value,
            mode,
        }
    }
}

impl Display for ComparisonFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({} {} {})",
            self.field_name,
            self.mode.symbol(),
            self.field_value
        )
    }
}

impl FilterProvider for ComparisonFilter {
    fn apply(&self, entry: &Document) -> QueryResult<bool> {
        let mode = self.mode;
        compare_field(entry, &self.field_name, &self.field_value, |o| mode.accepts(o))
    }

    fn translate(&self) -> QueryResult<FilterExpr> {
        let field = self.field_name.clone();
        let value = self.field_value.clone();
        Ok(match self.mode {
            ComparisonMode::Greater => FilterExpr::Gt { field, value },
            ComparisonMode::GreaterEqual => FilterExpr::Gte { field, value },
            ComparisonMode::Lesser => FilterExpr::Lt { field, value },
            ComparisonMode::LesserEqual => FilterExpr::Lte { field, value },
        })
    }

    fn validate(&self) -> QueryResult<()> {
        validate_field_name(&self.field_name, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Membership test against a fixed set of values.
pub(crate) struct InFilter {
    field_name: String,
    values: Vec<Value>,
    negated: bool,
}

impl InFilter {
    pub(crate) fn new(field_name: String, values: Vec<Value>) -> Self {
        InFilter {
            field_name,
            values,
            negated: false,
        }
    }

    pub(crate) fn not_in(field_name: String, values: Vec<Value>) -> Self {
        InFilter {
            field_name,
            values,
            negated: true,
        }
    }
}

impl Display for InFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = if self.negated { "not in" } else { "in" };
        write!(f, "({} {} [", self.field_name, op)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "])")
    }
}

impl FilterProvider for InFilter {
    fn apply(&self, entry: &Document) -> QueryResult<bool> {
        let value = entry.get(&self.field_name)?;
        Ok(self.values.contains(&value) != self.negated)
    }

    fn translate(&self) -> QueryResult<FilterExpr> {
        let field = self.field_name.clone();
        let values = self.values.clone();
        if self.negated {
            Ok(FilterExpr::NotIn { field, values })
        } else {
            Ok(FilterExpr::In { field, values })
        }
    }

    fn validate(&self) -> QueryResult<()> {
        validate_field_name(&self.field_name, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
