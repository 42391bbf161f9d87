//! Error types for editslabs.
//!
//! Only the cache produces errors. They never cross the [`ChunkStore`](crate::ChunkStore)
//! boundary: stores log them and degrade to a cache miss.

/// Errors that can occur while persisting or loading chunks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem access to the cache directory failed.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cache entry could not be serialized or deserialized.
    #[error("cache entry is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache keys are exactly 8 lowercase hex characters.
    #[error("invalid cache key: {0:?}")]
    InvalidKey(String),

    /// No live entry exists under the key.
    #[error("no cached chunks for key {0:?}")]
    CacheMiss(String),

    /// Requested chunk index is outside `1..=total`.
    #[error("chunk index {index} out of range (1 to {total})")]
    InvalidChunkIndex {
        /// The 1-based index that was requested.
        index: usize,
        /// Number of chunks available.
        total: usize,
    },
}

/// Result type for editslabs operations.
pub type Result<T> = std::result::Result<T, Error>;
