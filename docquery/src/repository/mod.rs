//! Typed access to entity collections.
//!
//! A [QueryEngine] reads entities of one type through an [EntityQuery], which
//! says how keys are derived, how a key becomes a filter, and how the backing
//! collection is named and indexed. The collection is resolved lazily, once,
//! by a [CollectionResolver]. A [Repository] adds writes on top.
//!
//! ```rust,ignore
//! use docquery::repository::{DefaultQuery, QueryEngine};
//!
//! let engine = QueryEngine::new(database, DefaultQuery::<User>::new())?;
//! let user = engine.find_by_key(&"u-1".to_string())?;
//!
//! // keyed collections for multiple instances of the same entity
//! let prod = QueryEngine::with_config(database.clone(), DefaultQuery::<User>::new(),
//!     EngineConfig::new().namespace("prod"))?;
//! ```

mod cursor;
mod engine;
mod entity;
mod repository;
mod resolver;

pub use cursor::EntityCursor;
pub(crate) use cursor::{to_document, to_entity};
pub use engine::*;
pub use entity::*;
pub use repository::*;
pub use resolver::*;
