use crate::collection::Document;
use crate::errors::{ErrorKind, QueryError, QueryResult};
use std::any::Any;
use std::fmt::{Debug, Display};
use std::ops::Deref;
use std::sync::Arc;

use super::{AllFilter, AndFilter, FilterExpr, NotFilter, OrFilter, WhereFilter};

/// A predicate over documents.
///
/// Every filter has two forms. [FilterProvider::apply] evaluates it in process
/// against a [Document]; [FilterProvider::translate] produces the [FilterExpr] a
/// store executes on its side. Filters built from the fluent API translate;
/// [where_fn] closures only apply.
pub trait FilterProvider: Any + Send + Sync + Display {
    fn apply(&self, entry: &Document) -> QueryResult<bool>;

    fn translate(&self) -> QueryResult<FilterExpr> {
        log::error!("Filter {} cannot be translated into a store filter", self);
        Err(QueryError::new(
            &format!("Filter {} cannot be translated into a store filter", self),
            ErrorKind::FilterError,
        ))
    }

    /// Rejects filters that select on nothing, such as an empty field name or an
    /// empty logical group.
    fn validate(&self) -> QueryResult<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
}

/// Cheaply cloneable handle to a [FilterProvider].
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter {
            inner: Arc::new(inner),
        }
    }

    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    pub fn or(&self, filter: Filter) -> Self {
        Filter::new(OrFilter::new(vec![self.clone(), filter]))
    }

    pub fn not(&self) -> Self {
        Filter::new(NotFilter::new(self.clone()))
    }

    pub fn is_all(&self) -> bool {
        self.inner.as_any().is::<AllFilter>()
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Filter{}", self.inner)
    }
}

impl Deref for Filter {
    type Target = Arc<dyn FilterProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Matches every document.
pub fn all() -> Filter {
    Filter::new(AllFilter)
}

pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::new(AndFilter::new(filters))
}

pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::new(OrFilter::new(filters))
}

pub fn not(filter: Filter) -> Filter {
    Filter::new(NotFilter::new(filter))
}

/// In-process predicate backed by a closure.
///
/// Useful against documents already in memory. A store cannot run host code,
/// so handing this filter to a query fails with `FilterError`.
pub fn where_fn<F>(predicate: F) -> Filter
where
    F: Fn(&Document) -> bool + Send + Sync + 'static,
{
    Filter::new(WhereFilter::new(predicate))
}
