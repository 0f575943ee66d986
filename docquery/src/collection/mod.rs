//! Documents and the options that shape a find.
//!
//! A [Document] is an ordered key-value map with dotted-path access into
//! nested documents. Stores persist documents, filters match them and the
//! query engine maps them to entities.
//!
//! ```rust,ignore
//! use docquery::collection::Document;
//!
//! let mut doc = Document::new();
//! doc.put("name", "Alice")?;
//! doc.put("address.city", "Pune")?;
//! assert_eq!(doc.get("address.city")?, Value::from("Pune"));
//! ```

mod document;
mod find_options;
mod index;

pub use document::*;
pub use find_options::*;
pub use index::*;
