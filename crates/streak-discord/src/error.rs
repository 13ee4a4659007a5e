//! Error types for streak-discord.

use std::time::Duration;

/// Result type for streak-discord operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to Discord.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// HTTP transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Discord answered with a non-success status.
    #[error("Discord API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Websocket transport failure.
    #[error("Gateway websocket error: {0}")]
    WebSocket(String),

    /// The gateway sent something we could not make sense of.
    #[error("Gateway protocol error: {0}")]
    Protocol(String),

    /// The gateway closed with a code that must not be retried.
    #[error("Gateway closed with fatal code {code}: {reason}")]
    FatalClose { code: u16, reason: String },

    /// Operation timed out.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Injected failure from the mock platform.
    #[error("Mock failure: {0}")]
    Mock(String),
}

impl Error {
    /// Whether the error came from Discord rejecting the request (4xx).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Api { status, .. } if (400..500).contains(status))
    }
}
