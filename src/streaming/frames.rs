//! SSE frame formatting for both dialects

use bytes::Bytes;
use serde_json::json;

use crate::dialect::anthropic::StreamEvent;
use crate::dialect::openai::StreamChunk;

/// Error code carried by every in-band stream error
pub const STREAM_FAILED_CODE: &str = "stream_failed";

/// Error type carried by every in-band stream error
pub const STREAM_ERROR_TYPE: &str = "stream_error";

/// Format a chat-completions chunk: `data: {json}\n\n`
pub fn format_chat_chunk(chunk: &StreamChunk) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(chunk)?;
    Ok(Bytes::from(format!("data: {}\n\n", json)))
}

/// Format the chat-completions termination marker
pub fn format_sse_done() -> Bytes {
    Bytes::from_static(b"data: [DONE]\n\n")
}

/// Format a chat-completions in-band error
pub fn format_chat_error(message: &str) -> Bytes {
    let body = json!({
        "error": {
            "message": message,
            "type": STREAM_ERROR_TYPE,
            "code": STREAM_FAILED_CODE,
        }
    });
    Bytes::from(format!("data: {}\n\n", body))
}

/// Format a messages event: `event: <type>\ndata: {json}\n\n`
pub fn format_messages_event(event: &StreamEvent) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(Bytes::from(format!(
        "event: {}\ndata: {}\n\n",
        event.event_type(),
        json
    )))
}

/// Format a messages in-band error
pub fn format_messages_error(message: &str) -> Bytes {
    let body = json!({
        "type": "error",
        "error": {
            "message": message,
            "type": STREAM_ERROR_TYPE,
            "code": STREAM_FAILED_CODE,
        }
    });
    Bytes::from(format!("event: error\ndata: {}\n\n", body))
}
