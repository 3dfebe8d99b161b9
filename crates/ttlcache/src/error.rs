//! Error types for ttlcache

use std::io;

use thiserror::Error;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors returned by cache construction and mutation
#[derive(Debug, Error)]
pub enum CacheError {
    /// Configuration rejected at construction
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// The cache has been shut down
    #[error("cache is shut down")]
    Closed,

    /// A background thread could not be started
    #[error("failed to spawn background thread: {0}")]
    Spawn(#[from] io::Error),
}

impl CacheError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        CacheError::InvalidConfig(msg.into())
    }
}
