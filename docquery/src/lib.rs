//! # docquery - typed queries over a document database
//!
//! docquery gives each entity type a small, typed query surface over a
//! document database: find by key, find by criteria, count, existence. The
//! collection behind an entity is resolved lazily the first time it is
//! needed, exactly once, even under concurrent first use.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docquery::filter::field;
//! use docquery::repository::{DefaultQuery, QueryEngine};
//! use docquery::store::InMemoryDatabase;
//! use docquery_derive::{Convertible, Entity};
//!
//! #[derive(Convertible, Entity)]
//! #[entity(key = "id")]
//! struct Person {
//!     id: String,
//!     name: String,
//! }
//!
//! # fn main() -> docquery::errors::QueryResult<()> {
//! let database = Arc::new(InMemoryDatabase::new("app"));
//! let people = QueryEngine::new(database, DefaultQuery::<Person>::new())?;
//!
//! let a = people.find_by_key(&"A".to_string())?;
//! let named_x = people.count_where(&field("name").eq("x"))?;
//! # Ok(())
//! # }
//! ```
//!
//! Every read also has an `_async` form taking a
//! `tokio_util::sync::CancellationToken`.
//!
//! ## Module Organization
//!
//! - [`collection`] - Documents, find options and index descriptors
//! - [`common`] - Values, the [`common::Convertible`] mapping trait, constants
//! - [`engine_config`] - Naming and resolution settings
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Predicates and their store translation
//! - [`repository`] - Query engines, entity queries and repositories
//! - [`store`] - The store boundary and an in-memory store

pub mod collection;
pub mod common;
pub mod engine_config;
pub mod errors;
pub mod filter;
pub mod repository;
pub mod store;

pub use engine_config::EngineConfig;
pub use errors::{ErrorKind, QueryError, QueryResult};
pub use repository::{DefaultQuery, Entity, EntityQuery, FnQuery, QueryEngine, Repository};
