//! Translation layer between the two dialects
//!
//! Requests and complete responses are translated here; streams are handled by
//! [`crate::streaming`], which shares the stop-reason tables below.

pub mod request;
pub mod response;

use thiserror::Error;

pub use request::{chat_to_messages, messages_to_chat, DEFAULT_MAX_TOKENS};
pub use response::{chat_response_to_messages, messages_response_to_chat};

/// Errors that can occur during translation
#[derive(Debug, Error)]
pub enum TranslationError {
    /// Message format is invalid for the target dialect
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    /// A required field is missing from the input
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Malformed arguments in a tool call
    #[error("Malformed tool call arguments: {0}")]
    MalformedArguments(String),
}

/// Map a chat-completions finish reason to a messages stop reason
pub fn finish_to_stop_reason(reason: &str) -> &'static str {
    match reason {
        "stop" => "end_turn",
        "length" => "max_tokens",
        "tool_calls" => "tool_use",
        "content_filter" => "content_filter",
        _ => "end_turn",
    }
}

/// Map a messages stop reason to a chat-completions finish reason
pub fn stop_to_finish_reason(reason: &str) -> &'static str {
    match reason {
        "end_turn" => "stop",
        "max_tokens" => "length",
        "stop_sequence" => "stop",
        "tool_use" => "tool_calls",
        "refusal" | "content_filter" => "content_filter",
        _ => "stop",
    }
}

/// Current unix time in seconds
pub(crate) fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
