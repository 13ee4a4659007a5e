//! Error types for streak-core.

/// Result type for streak-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in streak-core.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A component id that is not a leaderboard page button.
    #[error("Unknown button id: {0}")]
    UnknownButton(String),
}
