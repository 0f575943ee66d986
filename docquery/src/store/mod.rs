//! The store boundary.
//!
//! The query engine talks to a document store only through the traits in this
//! module: [DocumentDatabase] hands out [CollectionHandle]s, and
//! [DocumentCollection] executes translated filters. Connection management,
//! wire protocols and query execution belong to the implementation.
//!
//! [InMemoryDatabase] is a complete implementation kept in process memory.

mod cursor;
mod document_store;
pub mod memory;

pub use cursor::*;
pub use document_store::*;
pub use memory::{InMemoryCollection, InMemoryDatabase};
