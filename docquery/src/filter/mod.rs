//! Predicates for selecting documents.
//!
//! A [Filter] has two forms. The in-process form evaluates against a
//! [crate::collection::Document] through [FilterProvider::apply]. The store form is the
//! [FilterExpr] returned by [FilterProvider::translate], plain data that a store
//! executes on its side.
//!
//! # Creating Filters
//!
//! - `field("age").gt(30)`: comparison operators
//! - `field("name").eq("Alice")`: equality
//! - `all()`: match every document
//! - `field("age").gt(30).and(field("name").eq("Alice"))`: logical combination
//! - `where_fn(|doc| ...)`: in-process closure, never translated
//!
//! ```rust,ignore
//! use docquery::filter::{field, all};
//!
//! let filter = field("age").gt(30).and(field("status").eq("active"));
//! let expr = filter.translate()?;
//! ```
//!
//! # Translatable shapes
//!
//! - **Equality**: `eq`, `ne`
//! - **Comparison**: `gt`, `gte`, `lt`, `lte`
//! - **Membership**: `in_array`, `not_in`
//! - **Pattern**: `regex`
//! - **Presence**: `exists`
//! - **Logical**: `and`, `or`, `not` over translatable operands
//! - **Special**: `all`

mod expr;
mod filter;
mod fluent;

mod basic_filters;
mod logical_filters;
mod pattern_filters;
mod range_filters;

pub use basic_filters::*;
pub use expr::{ExprMatcher, FilterExpr};
pub use filter::*;
pub use fluent::*;
pub use logical_filters::*;
pub use pattern_filters::*;
pub use range_filters::*;
