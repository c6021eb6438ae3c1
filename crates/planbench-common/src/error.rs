//! Error definitions for planbench

use thiserror::Error;

/// Represents errors that can occur while benchmarking a collection.
///
/// # Example
/// ```rust
/// use planbench_common::BenchError;
///
/// fn example() -> planbench_common::Result<()> {
///     Err(BenchError::Config("empty index specification".into()))
/// }
///
/// match example() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error occurred: {e}"),
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum BenchError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Explain error: {0}")]
    Explain(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, BenchError>;

impl BenchError {
    /// Get the inner message without the type prefix.
    /// Useful when re-wrapping errors to avoid "Index error: Index error: ..."
    pub fn message(&self) -> &str {
        match self {
            BenchError::Io(msg) => msg,
            BenchError::Config(msg) => msg,
            BenchError::Network(msg) => msg,
            BenchError::Protocol(msg) => msg,
            BenchError::Explain(msg) => msg,
            BenchError::Index(msg) => msg,
            BenchError::Store(msg) => msg,
            BenchError::NotFound(msg) => msg,
        }
    }

    /// Get a short error kind name
    pub fn kind(&self) -> &'static str {
        match self {
            BenchError::Io(_) => "io_error",
            BenchError::Config(_) => "config_error",
            BenchError::Network(_) => "network_error",
            BenchError::Protocol(_) => "protocol_error",
            BenchError::Explain(_) => "explain_error",
            BenchError::Index(_) => "index_error",
            BenchError::Store(_) => "store_error",
            BenchError::NotFound(_) => "not_found",
        }
    }
}

/// Convert std::io::Error to BenchError
///
/// Shortcut as it's a common error we need
/// to convert from.
impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        BenchError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::Protocol(format!("JSON error: {err}"))
    }
}
