//! Mock infrastructure for upstream providers
//!
//! wiremock-based stand-ins for the two provider dialects:
//! - Chat-completions provider (`POST /chat/completions`)
//! - Messages provider (`POST /v1/messages`)
//!
//! Both support non-streaming, streaming (SSE) and error responses.

pub mod chat_provider;
pub mod messages_provider;

pub use chat_provider::*;
pub use messages_provider::*;
