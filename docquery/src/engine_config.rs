//! Configuration shared by query engines and repositories.

use crate::common::KEY_OBJ_SEPARATOR;
use crate::errors::{QueryError, QueryResult};

/// Settings that shape how a [crate::repository::QueryEngine] resolves its collection.
///
/// ```rust,ignore
/// use docquery::engine_config::EngineConfig;
///
/// let config = EngineConfig::new()
///     .collection_prefix("app_")
///     .namespace("tenant-a")
///     .eager_resolution(true);
/// assert_eq!(config.collection_name("Person")?, "app_Person+tenant-a");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    namespace: Option<String>,
    collection_prefix: Option<String>,
    eager_resolution: bool,
}

impl EngineConfig {
    pub fn new() -> Self {
        EngineConfig::default()
    }

    /// Keys the collection: an entity named `Person` in namespace `a` lives in
    /// the collection `Person+a`.
    pub fn namespace(mut self, key: &str) -> Self {
        self.namespace = Some(key.to_string());
        self
    }

    pub fn collection_prefix(mut self, prefix: &str) -> Self {
        self.collection_prefix = Some(prefix.to_string());
        self
    }

    /// Resolves the collection while the engine is constructed instead of on
    /// first use.
    pub fn eager_resolution(mut self, eager: bool) -> Self {
        self.eager_resolution = eager;
        self
    }

    pub fn namespace_key(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.collection_prefix.as_deref()
    }

    pub fn is_eager(&self) -> bool {
        self.eager_resolution
    }

    /// Applies prefix and namespace to the name produced by the naming hook.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the name is empty, or when the name, prefix or
    /// namespace contains the `+` separator.
    pub fn collection_name(&self, entity_name: &str) -> QueryResult<String> {
        if entity_name.trim().is_empty() {
            log::error!("Collection name cannot be empty");
            return Err(QueryError::invalid_argument("Collection name cannot be empty"));
        }

        let prefix = self.collection_prefix.as_deref().unwrap_or("");
        for part in [entity_name, prefix] {
            if part.contains(KEY_OBJ_SEPARATOR) {
                log::error!("{} is not a valid collection name", part);
                return Err(QueryError::invalid_argument(&format!(
                    "{} is not a valid collection name",
                    part
                )));
            }
        }

        let mut name = String::with_capacity(prefix.len() + entity_name.len());
        name.push_str(prefix);
        name.push_str(entity_name);

        match self.namespace.as_deref() {
            Some(key) if key.is_empty() || key.contains(KEY_OBJ_SEPARATOR) => {
                log::error!("{} is not a valid namespace", key);
                Err(QueryError::invalid_argument(&format!(
                    "{} is not a valid namespace",
                    key
                )))
            }
            Some(key) => {
                name.push_str(KEY_OBJ_SEPARATOR);
                name.push_str(key);
                Ok(name)
            }
            None => Ok(name),
        }
    }
}

/// Splits a keyed collection name into its base name and namespace.
pub fn split_namespace(name: &str) -> (&str, Option<&str>) {
    match name.split_once(KEY_OBJ_SEPARATOR) {
        Some((base, key)) => (base, Some(key)),
        None => (name, None),
    }
}
