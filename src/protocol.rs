//! Wire types for the `/chat` endpoint.

use serde::{Deserialize, Serialize};

/// Request body sent to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Trimmed, non-empty user text.
    pub message: String,
}

impl ChatRequest {
    /// Build a request from raw input, trimming surrounding whitespace.
    ///
    /// Returns `None` when nothing is left after trimming.
    pub fn from_input(raw: &str) -> Option<Self> {
        let message = raw.trim();
        (!message.is_empty()).then(|| Self {
            message: message.to_string(),
        })
    }
}

/// Response body returned by the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant text to display.
    pub reply: String,
}
