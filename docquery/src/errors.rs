use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for query engine and store operations.
///
/// The kinds group into three families that callers usually branch on:
///
/// * caller mistakes: [ErrorKind::InvalidArgument], raised before any I/O
/// * cancellation: [ErrorKind::Cancelled], raised when a cancellation token fires
/// * store failures: everything the store client surfaces, see [QueryError::is_store_failure]
///
/// # Examples
///
/// ```rust,ignore
/// use docquery::errors::{QueryError, ErrorKind, QueryResult};
///
/// fn example() -> QueryResult<()> {
///     Err(QueryError::new("key must be present", ErrorKind::InvalidArgument))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// An absent key, absent criteria or absent database connection
    InvalidArgument,
    /// The operation was aborted through its cancellation token
    Cancelled,

    /// Generic failure reported by the store client
    StoreFailure,
    /// The store has been closed
    StoreClosed,
    /// A predicate could not be evaluated or translated into a store filter
    FilterError,
    /// An index could not be created or used
    IndexingError,
    /// A unique index rejected a write
    UniqueConstraintViolation,
    /// The named collection does not exist
    CollectionNotFound,

    /// A document could not be mapped to or from an entity
    ObjectMappingError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidArgument => write!(f, "Invalid argument"),
            ErrorKind::Cancelled => write!(f, "Cancelled"),
            ErrorKind::StoreFailure => write!(f, "Store failure"),
            ErrorKind::StoreClosed => write!(f, "Store closed"),
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::IndexingError => write!(f, "Indexing error"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::CollectionNotFound => write!(f, "Collection not found"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type shared by the query engine, the repository and store implementations.
///
/// `QueryError` carries a message, an [ErrorKind], an optional cause and the
/// backtrace captured where it was created. Errors coming out of the store are
/// handed to the caller unchanged: the engine neither wraps nor retries them.
///
/// # Examples
///
/// ```rust,ignore
/// use docquery::errors::{QueryError, ErrorKind};
///
/// let cause = QueryError::new("connection reset", ErrorKind::StoreFailure);
/// let err = QueryError::new_with_cause("index setup failed", ErrorKind::IndexingError, cause);
/// assert!(err.is_store_failure());
/// ```
#[derive(Clone)]
pub struct QueryError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<QueryError>>,
    backtrace: Arc<Backtrace>,
}

impl QueryError {
    /// Creates a new `QueryError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        QueryError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `QueryError` that keeps `cause` in its error chain.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: QueryError) -> Self {
        QueryError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Shorthand for an [ErrorKind::InvalidArgument] error.
    pub fn invalid_argument(message: &str) -> Self {
        QueryError::new(message, ErrorKind::InvalidArgument)
    }

    /// Shorthand for an [ErrorKind::Cancelled] error.
    pub fn cancelled(message: &str) -> Self {
        QueryError::new(message, ErrorKind::Cancelled)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&QueryError> {
        self.cause.as_deref()
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.error_kind == ErrorKind::InvalidArgument
    }

    pub fn is_cancelled(&self) -> bool {
        self.error_kind == ErrorKind::Cancelled
    }

    /// Returns `true` for every kind a store client can surface.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self.error_kind,
            ErrorKind::StoreFailure
                | ErrorKind::StoreClosed
                | ErrorKind::FilterError
                | ErrorKind::IndexingError
                | ErrorKind::UniqueConstraintViolation
                | ErrorKind::CollectionNotFound
        )
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // message and kind, then either the cause chain or the stack trace
        match &self.cause {
            Some(cause) => write!(
                f,
                "{} ({})\nCaused by: {:?}",
                self.message, self.error_kind, cause
            ),
            None => write!(
                f,
                "{} ({})\n{:?}",
                self.message, self.error_kind, self.backtrace
            ),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for query and store operations.
pub type QueryResult<T> = Result<T, QueryError>;

impl de::Error for QueryError {
    fn custom<T: Display>(msg: T) -> Self {
        QueryError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl ser::Error for QueryError {
    fn custom<T: Display>(msg: T) -> Self {
        QueryError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl From<std::fmt::Error> for QueryError {
    fn from(err: std::fmt::Error) -> Self {
        QueryError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<regex::Error> for QueryError {
    fn from(err: regex::Error) -> Self {
        QueryError::new(
            &format!("Invalid regular expression: {}", err),
            ErrorKind::FilterError,
        )
    }
}

impl From<String> for QueryError {
    fn from(msg: String) -> Self {
        QueryError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for QueryError {
    fn from(msg: &str) -> Self {
        QueryError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_new_creates_error() {
        let error = QueryError::new("An error occurred", ErrorKind::StoreFailure);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::StoreFailure);
        assert!(error.cause().is_none());
    }

    #[test]
    fn query_error_new_with_cause_keeps_chain() {
        let cause = QueryError::new("socket closed", ErrorKind::StoreFailure);
        let error = QueryError::new_with_cause("find failed", ErrorKind::StoreFailure, cause);
        assert_eq!(error.cause().map(|c| c.message()), Some("socket closed"));
        assert!(error.source().is_some());
    }

    #[test]
    fn display_shows_message_only() {
        let error = QueryError::invalid_argument("key must be present");
        assert_eq!(format!("{}", error), "key must be present");
    }

    #[test]
    fn debug_includes_kind_and_cause() {
        let cause = QueryError::new("timeout", ErrorKind::StoreFailure);
        let error = QueryError::new_with_cause("count failed", ErrorKind::StoreFailure, cause);
        let debug = format!("{:?}", error);
        assert!(debug.contains("count failed"));
        assert!(debug.contains("Caused by"));
        assert!(debug.contains("timeout"));
    }

    #[test]
    fn taxonomy_helpers() {
        assert!(QueryError::invalid_argument("x").is_invalid_argument());
        assert!(QueryError::cancelled("x").is_cancelled());
        assert!(!QueryError::cancelled("x").is_store_failure());
        assert!(QueryError::new("x", ErrorKind::FilterError).is_store_failure());
        assert!(QueryError::new("x", ErrorKind::StoreClosed).is_store_failure());
        assert!(!QueryError::new("x", ErrorKind::ObjectMappingError).is_store_failure());
        assert!(!QueryError::invalid_argument("x").is_store_failure());
    }

    #[test]
    fn from_str_and_string_are_internal() {
        let err: QueryError = "boom".into();
        assert_eq!(err.kind(), &ErrorKind::InternalError);
        let err: QueryError = String::from("boom").into();
        assert_eq!(err.kind(), &ErrorKind::InternalError);
    }

    #[test]
    fn regex_error_is_filter_error() {
        let err: QueryError = regex::Regex::new("(").unwrap_err().into();
        assert_eq!(err.kind(), &ErrorKind::FilterError);
    }

    #[test]
    fn serde_custom_errors_are_mapping_errors() {
        let err = <QueryError as de::Error>::custom("missing field");
        assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
        let err = <QueryError as ser::Error>::custom("bad value");
        assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(format!("{}", ErrorKind::InvalidArgument), "Invalid argument");
        assert_eq!(format!("{}", ErrorKind::Cancelled), "Cancelled");
        assert_eq!(
            format!("{}", ErrorKind::UniqueConstraintViolation),
            "Unique constraint violation"
        );
    }
}
