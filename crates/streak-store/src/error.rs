//! Error types for streak-store.

use std::path::PathBuf;

/// Result type for streak-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in streak-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to create the store directory.
    #[error("Failed to create store directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read the store file.
    #[error("Failed to read store file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The store file is not a valid record mapping.
    #[error("Failed to parse store file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to write the store file.
    #[error("Failed to write store file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
