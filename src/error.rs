//! Error types for the chat widget.

use thiserror::Error;

/// Errors produced while sending a message to the chat backend.
#[derive(Error, Debug)]
pub enum ChatError {
    /// HTTP request failed (connect, timeout, transport).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body was not a `{"reply": ...}` object.
    #[error("Malformed reply: {0}")]
    Decode(#[from] serde_json::Error),

    /// Backend returned an error status without a usable reply.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        message: String,
    },

    /// The send was abandoned before a reply arrived.
    #[error("Request cancelled")]
    Cancelled,
}

/// Result type alias for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;
