//! Error types for preference storage and region switching
//!
//! This module defines the error types used throughout the appstore-switcher
//! library. Fallible public functions return [`Result<T, Error>`]; the pure
//! addressing and catalog functions never fail and report inapplicable input
//! through `Option`/`bool` instead.

/// Errors that can occur while reading or writing preferences and while
/// talking to other contexts
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The durable key-value store cannot be reached from this context
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A region code is not part of the catalog
    #[error("Unsupported region: {0}")]
    InvalidRegion(String),

    /// A cross-context message could not be delivered or timed out
    #[error("Messaging unavailable: {0}")]
    MessagingUnavailable(String),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid glob pattern in a region query
    #[error("Invalid glob pattern: {0}")]
    InvalidGlobPattern(String),
}

impl Error {
    /// Whether the failure came from the storage layer rather than from input
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::StorageUnavailable(_) | Error::Io(_) | Error::Serialization(_)
        )
    }
}

/// Result type alias for convenience
///
/// # Example
///
/// ```rust
/// use appstore_switcher::{MemoryStore, PreferenceStore, Result};
///
/// fn favorites_count(store: &PreferenceStore<MemoryStore>) -> Result<usize> {
///     let record = store.read()?;
///     Ok(record.favorites.len())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;
