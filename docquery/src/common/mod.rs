//! Shared value model: [Value], the [Convertible] mapping trait, sort order and
//! reserved names.

mod constants;
mod convertible;
mod sort_order;
mod value;

pub use constants::*;
pub use convertible::*;
pub use sort_order::*;
pub use value::*;
