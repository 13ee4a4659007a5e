//! Error types for streak-types.

use thiserror::Error;

/// Errors that can occur when parsing streak bot identifiers.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The value is not a Discord snowflake.
    #[error("Invalid user id '{0}': expected a decimal snowflake")]
    InvalidUserId(String),

    /// Timestamp outside the representable range.
    #[error("Timestamp out of range: {0} ms")]
    TimestampOutOfRange(i64),
}

/// Result type alias using streak-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
