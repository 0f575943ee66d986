use crate::collection::Document;
use crate::common::Value;
use crate::errors::QueryResult;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Store-side form of a predicate.
///
/// A [crate::filter::Filter] is translated into a `FilterExpr` before it is handed to a
/// store. The enum is plain data: it can be serialized, sent to a server and
/// evaluated there. Every shape below is guaranteed to translate; host-language
/// closures built with [crate::filter::where_fn] have no `FilterExpr` form.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FilterExpr {
    All,
    Eq { field: String, value: Value },
    Ne { field: String, value: Value },
    Gt { field: String, value: Value },
    Gte { field: String, value: Value },
    Lt { field: String, value: Value },
    Lte { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    NotIn { field: String, values: Vec<Value> },
    Regex { field: String, pattern: String },
    Exists { field: String },
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    /// Compiles the expression for evaluation against many documents.
    ///
    /// Every regular expression is compiled here, once, so a broken pattern
    /// fails even when there is nothing to evaluate it against.
    ///
    /// # Errors
    ///
    /// `FilterError` for an invalid regular expression.
    pub fn matcher(&self) -> QueryResult<ExprMatcher<'_>> {
        let mut regexes = HashMap::new();
        self.compile_patterns(&mut regexes)?;
        Ok(ExprMatcher { expr: self, regexes })
    }

    /// Evaluates the expression against a single stored document.
    ///
    /// # Errors
    ///
    /// `FilterError` for an invalid regular expression, `InvalidArgument` for a
    /// malformed field path.
    pub fn matches(&self, document: &Document) -> QueryResult<bool> {
        self.matcher()?.matches(document)
    }

    fn compile_patterns<'a>(&'a self, regexes: &mut HashMap<&'a str, Regex>) -> QueryResult<()> {
        match self {
            FilterExpr::Regex { pattern, .. } => {
                if !regexes.contains_key(pattern.as_str()) {
                    regexes.insert(pattern.as_str(), Regex::new(pattern)?);
                }
                Ok(())
            }
            FilterExpr::And(exprs) | FilterExpr::Or(exprs) => {
                exprs.iter().try_for_each(|e| e.compile_patterns(regexes))
            }
            FilterExpr::Not(expr) => expr.compile_patterns(regexes),
            _ => Ok(()),
        }
    }

    /// Fields the expression reads, in order of appearance.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, fields: &mut Vec<&'a str>) {
        match self {
            FilterExpr::All => {}
            FilterExpr::Eq { field, .. }
            | FilterExpr::Ne { field, .. }
            | FilterExpr::Gt { field, .. }
            | FilterExpr::Gte { field, .. }
            | FilterExpr::Lt { field, .. }
            | FilterExpr::Lte { field, .. }
            | FilterExpr::In { field, .. }
            | FilterExpr::NotIn { field, .. }
            | FilterExpr::Regex { field, .. }
            | FilterExpr::Exists { field } => fields.push(field),
            FilterExpr::And(exprs) | FilterExpr::Or(exprs) => {
                exprs.iter().for_each(|e| e.collect_fields(fields))
            }
            FilterExpr::Not(expr) => expr.collect_fields(fields),
        }
    }
}

/// A [FilterExpr] with its regular expressions compiled.
pub struct ExprMatcher<'a> {
    expr: &'a FilterExpr,
    regexes: HashMap<&'a str, Regex>,
}

impl ExprMatcher<'_> {
    pub fn matches(&self, document: &Document) -> QueryResult<bool> {
        self.evaluate(self.expr, document)
    }

    fn evaluate(&self, expr: &FilterExpr, document: &Document) -> QueryResult<bool> {
        match expr {
            FilterExpr::All => Ok(true),
            FilterExpr::Eq { field, value } => Ok(&document.get(field)? == value),
            FilterExpr::Ne { field, value } => Ok(&document.get(field)? != value),
            FilterExpr::Gt { field, value } => {
                compare_field(document, field, value, |o| o == Ordering::Greater)
            }
            FilterExpr::Gte { field, value } => {
                compare_field(document, field, value, |o| o != Ordering::Less)
            }
            FilterExpr::Lt { field, value } => {
                compare_field(document, field, value, |o| o == Ordering::Less)
            }
            FilterExpr::Lte { field, value } => {
                compare_field(document, field, value, |o| o != Ordering::Greater)
            }
            FilterExpr::In { field, values } => {
                let actual = document.get(field)?;
                Ok(values.contains(&actual))
            }
            FilterExpr::NotIn { field, values } => {
                let actual = document.get(field)?;
                Ok(!values.contains(&actual))
            }
            FilterExpr::Regex { field, pattern } => match self.regexes.get(pattern.as_str()) {
                Some(regex) => regex_matches(document, field, regex),
                None => regex_matches(document, field, &Regex::new(pattern)?),
            },
            FilterExpr::Exists { field } => Ok(!document.get(field)?.is_null()),
            FilterExpr::And(exprs) => {
                for expr in exprs {
                    if !self.evaluate(expr, document)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            FilterExpr::Or(exprs) => {
                for expr in exprs {
                    if self.evaluate(expr, document)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            FilterExpr::Not(expr) => Ok(!self.evaluate(expr, document)?),
        }
    }
}

/// Orders the value at `field` against `value`. Values of different kinds never
/// compare, so `age > "10"` matches nothing instead of ordering by type.
pub(crate) fn compare_field(
    document: &Document,
    field: &str,
    value: &Value,
    accept: impl Fn(Ordering) -> bool,
) -> QueryResult<bool> {
    let actual = document.get(field)?;
    if !same_kind(&actual, value) {
        return Ok(false);
    }
    Ok(accept(actual.cmp(value)))
}

pub(crate) fn regex_matches(document: &Document, field: &str, regex: &Regex) -> QueryResult<bool> {
    match document.get(field)? {
        Value::String(s) => Ok(regex.is_match(&s)),
        _ => Ok(false),
    }
}

fn same_kind(left: &Value, right: &Value) -> bool {
    if !left.is_comparable() || !right.is_comparable() {
        return false;
    }
    (left.is_number() && right.is_number()) || left.type_name() == right.type_name()
}

fn write_values(f: &mut Formatter<'_>, values: &[Value]) -> std::fmt::Result {
    write!(f, "[")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", value)?;
    }
    write!(f, "]")
}

fn write_group(f: &mut Formatter<'_>, exprs: &[FilterExpr], op: &str) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", expr)?;
    }
    write!(f, ")")
}

impl Display for FilterExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterExpr::All => write!(f, "ALL"),
            FilterExpr::Eq { field, value } => write!(f, "({} == {})", field, value),
            FilterExpr::Ne { field, value } => write!(f, "({} != {})", field, value),
            FilterExpr::Gt { field, value } => write!(f, "({} > {})", field, value),
            FilterExpr::Gte { field, value } => write!(f, "({} >= {})", field, value),
            FilterExpr::Lt { field, value } => write!(f, "({} < {})", field, value),
            FilterExpr::Lte { field, value } => write!(f, "({} <= {})", field, value),
            FilterExpr::In { field, values } => {
                write!(f, "({} in ", field)?;
                write_values(f, values)?;
                write!(f, ")")
            }
            FilterExpr::NotIn { field, values } => {
                write!(f, "({} not in ", field)?;
                write_values(f, values)?;
                write!(f, ")")
            }
            FilterExpr::Regex { field, pattern } => write!(f, "({} regex {})", field, pattern),
            FilterExpr::Exists { field } => write!(f, "({} exists)", field),
            FilterExpr::And(exprs) => write_group(f, exprs, "&&"),
            FilterExpr::Or(exprs) => write_group(f, exprs, "||"),
            FilterExpr::Not(expr) => write!(f, "!{}", expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::errors::ErrorKind;

    fn eq(field: &str, value: impl Into<Value>) -> FilterExpr {
        FilterExpr::Eq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    #[test]
    fn eq_matches_across_integer_widths() {
        let document = doc! { "id": "A", n: 5 };
        assert!(eq("id", "A").matches(&document).unwrap());
        assert!(eq("n", 5u64).matches(&document).unwrap());
        assert!(!eq("id", "Z").matches(&document).unwrap());
    }

    #[test]
    fn comparisons_skip_other_kinds() {
        let document = doc! { age: 30, name: "x" };
        let gt = |field: &str, value: Value| FilterExpr::Gt {
            field: field.to_string(),
            value,
        };
        assert!(gt("age", Value::from(20)).matches(&document).unwrap());
        assert!(!gt("age", Value::from(30)).matches(&document).unwrap());
        assert!(!gt("age", Value::from("1")).matches(&document).unwrap());
        assert!(!gt("missing", Value::from(1)).matches(&document).unwrap());
        let lte = FilterExpr::Lte {
            field: "age".into(),
            value: Value::F64(30.0),
        };
        assert!(lte.matches(&document).unwrap());
    }

    #[test]
    fn membership_and_existence() {
        let document = doc! { color: "red" };
        let within = FilterExpr::In {
            field: "color".into(),
            values: vec![Value::from("red"), Value::from("blue")],
        };
        assert!(within.matches(&document).unwrap());
        let outside = FilterExpr::NotIn {
            field: "color".into(),
            values: vec![Value::from("red")],
        };
        assert!(!outside.matches(&document).unwrap());
        assert!(FilterExpr::Exists { field: "color".into() }.matches(&document).unwrap());
        assert!(!FilterExpr::Exists { field: "size".into() }.matches(&document).unwrap());
    }

    #[test]
    fn regex_compiles_once_per_matcher() {
        let expr = FilterExpr::Or(vec![
            FilterExpr::Regex {
                field: "name".into(),
                pattern: "^al".into(),
            },
            FilterExpr::Not(Box::new(FilterExpr::Regex {
                field: "nick".into(),
                pattern: "^al".into(),
            })),
        ]);
        let matcher = expr.matcher().unwrap();
        assert_eq!(matcher.regexes.len(), 1);
        assert!(matcher.matches(&doc! { name: "alice" }).unwrap());
        assert!(!matcher.matches(&doc! { name: "bob", nick: "al" }).unwrap());
    }

    #[test]
    fn broken_regex_fails_without_a_document() {
        let broken = FilterExpr::And(vec![
            eq("id", "A"),
            FilterExpr::Regex {
                field: "name".into(),
                pattern: "(".into(),
            },
        ]);
        assert_eq!(broken.matcher().err().unwrap().kind(), &ErrorKind::FilterError);
        let document = doc! { "id": "B" };
        assert_eq!(broken.matches(&document).unwrap_err().kind(), &ErrorKind::FilterError);
    }

    #[test]
    fn logical_groups() {
        let document = doc! { a: 1, b: 2 };
        let both = FilterExpr::And(vec![eq("a", 1), eq("b", 2)]);
        let either = FilterExpr::Or(vec![eq("a", 9), eq("b", 2)]);
        assert!(both.matches(&document).unwrap());
        assert!(either.matches(&document).unwrap());
        assert!(!FilterExpr::Not(Box::new(both.clone())).matches(&document).unwrap());
        assert_eq!(both.fields(), vec!["a", "b"]);
    }

    #[test]
    fn display_reads_like_an_expression() {
        let expr = FilterExpr::And(vec![eq("id", "A"), FilterExpr::Exists { field: "n".into() }]);
        assert_eq!(expr.to_string(), "((id == \"A\") && (n exists))");
    }
}
