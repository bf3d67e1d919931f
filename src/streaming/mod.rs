//! SSE (Server-Sent Events) stream translation
//!
//! Upstream bodies are decoded into frames by [`SseFrameDecoder`], parsed into
//! typed events by an [`EventSource`], fed through a per-direction
//! [`StreamTranslator`] and written to the client through a bounded channel.
//! [`session::run_session`] owns the whole lifecycle and is the only place a
//! translation failure is turned into something the client sees.

pub mod anthropic_to_openai;
pub mod frames;
pub mod openai_to_anthropic;
pub mod session;
pub mod sink;
pub mod source;

pub use anthropic_to_openai::MessagesToChatTranslator;
pub use openai_to_anthropic::ChatToMessagesTranslator;
pub use session::{
    passthrough_response, sse_headers, stream_response, Direction, SessionOutcome, Step,
    StreamTranslator,
};
pub use sink::{ChannelSink, SinkMessage};
pub use source::{Decoded, DecodeFrame, EventSource, SseEventSource, StreamError};

/// One dispatched SSE frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if any
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
}

/// Incremental SSE frame decoder.
///
/// Bytes arrive in chunks that need not align with line or frame boundaries.
/// Partial lines are kept as raw bytes so multi-byte characters split across
/// chunks decode correctly. A frame is dispatched on the blank line that
/// terminates it.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    incomplete: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every frame they complete
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.incomplete.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(newline_pos) = self.incomplete.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.incomplete.drain(..=newline_pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = text.strip_suffix('\r').unwrap_or(&*text);

            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Flush a final frame left unterminated at end of stream
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.incomplete.is_empty() {
            let text = String::from_utf8_lossy(&self.incomplete).into_owned();
            self.incomplete.clear();
            let line = text.strip_suffix('\r').unwrap_or(&text);
            if let Some(frame) = self.process_line(line) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    /// Check if there's any undispatched data remaining
    pub fn has_incomplete(&self) -> bool {
        !self.incomplete.is_empty() || !self.data.is_empty()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data })
    }
}
