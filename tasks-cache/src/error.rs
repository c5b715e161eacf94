//! Error types for cache operations
//!
//! Cache faults never reach API callers: the read-through layer absorbs
//! them. They still carry enough detail to be logged usefully.

use thiserror::Error;

/// Main error type for the caching layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A URL or identifier could not be turned into a cache key
    #[error("Malformed cache input: {0}")]
    MalformedInput(String),

    /// Connectivity fault talking to the key-value service
    #[error("Key-value service unavailable: {0}")]
    Unavailable(String),

    /// Key-value call exceeded its deadline
    #[error("Key-value operation timed out after {timeout_ms}ms: {context}")]
    Timeout { timeout_ms: u64, context: String },

    /// The key-value service refused the write
    #[error("Key-value quota exceeded: {0}")]
    QuotaExceeded(String),

    /// JSON encode/decode of a cached value failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid cache configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Whether this error belongs to the "cache unavailable" class.
    ///
    /// These are always recovered locally: a miss on read, a no-op on write.
    pub fn is_cache_unavailable(&self) -> bool {
        matches!(
            self,
            CacheError::Unavailable(_)
                | CacheError::Timeout { .. }
                | CacheError::QuotaExceeded(_)
                | CacheError::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for CacheError {
    fn from(e: url::ParseError) -> Self {
        CacheError::MalformedInput(e.to_string())
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
