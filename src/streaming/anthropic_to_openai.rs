//! Messages events in, chat-completions chunks out
//!
//! Used when a chat-completions client is served by a messages provider.
//! Only text blocks are relayed; `tool_use` blocks are dropped and the terminal
//! chunk always carries `finish_reason: "stop"`.

use bytes::Bytes;

use super::frames::{format_chat_chunk, format_chat_error, format_sse_done};
use super::session::{Direction, Step, StreamTranslator};
use super::source::StreamError;
use crate::dialect::anthropic::{BlockDelta, ContentBlock, StreamEvent};
use crate::dialect::openai::{Delta, Role, StreamChunk, Usage};
use crate::dialect::translate::unix_now;

/// Per-session state for messages → chat-completions translation
#[derive(Debug)]
pub struct MessagesToChatTranslator {
    id: String,
    created: u64,
    model: String,
    /// Text of the current content block
    text: String,
    input_tokens: u32,
    usage: Option<Usage>,
    finished: bool,
}

impl MessagesToChatTranslator {
    /// `model` is echoed in every chunk
    pub fn new(model: &str) -> Self {
        let created = unix_now();
        Self {
            id: format!("chatcmpl-{}", created),
            created,
            model: model.to_string(),
            text: String::new(),
            input_tokens: 0,
            usage: None,
            finished: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn chunk(&self, delta: Delta, finish_reason: Option<String>) -> StreamChunk {
        StreamChunk::new(&self.id, self.created, &self.model, delta, finish_reason)
    }

    fn finish(&mut self) -> Result<Vec<Bytes>, StreamError> {
        let mut chunk = self.chunk(Delta::default(), Some("stop".to_string()));
        chunk.usage = self.usage;

        self.finished = true;
        Ok(vec![format_chat_chunk(&chunk)?, format_sse_done()])
    }
}

impl StreamTranslator for MessagesToChatTranslator {
    type Event = StreamEvent;

    fn direction(&self) -> Direction {
        Direction::AnthropicToOpenAi
    }

    fn start(&mut self) -> Result<Vec<Bytes>, StreamError> {
        Ok(Vec::new())
    }

    fn translate(&mut self, event: StreamEvent) -> Result<Step, StreamError> {
        if self.finished {
            return Err(StreamError::Protocol("event after message_stop".to_string()));
        }

        match event {
            StreamEvent::MessageStart { message } => {
                self.input_tokens = message.usage.input_tokens;
                let delta = Delta {
                    role: Some(Role::Assistant),
                    content: Some(String::new()),
                    tool_calls: None,
                };
                Ok(Step::frames(vec![format_chat_chunk(&self.chunk(delta, None))?]))
            }

            StreamEvent::ContentBlockStart { content_block, .. } => {
                if let ContentBlock::Text { .. } = content_block {
                    self.text.clear();
                }
                Ok(Step::empty())
            }

            StreamEvent::ContentBlockDelta { delta, .. } => match delta {
                BlockDelta::TextDelta { text } if !text.is_empty() => {
                    self.text.push_str(&text);
                    let delta = Delta {
                        content: Some(text),
                        ..Delta::default()
                    };
                    Ok(Step::frames(vec![format_chat_chunk(&self.chunk(delta, None))?]))
                }
                _ => Ok(Step::empty()),
            },

            StreamEvent::ContentBlockStop { .. } | StreamEvent::Ping => Ok(Step::empty()),

            StreamEvent::MessageDelta { usage, .. } => {
                if let Some(usage) = usage {
                    let input = usage.input_tokens.filter(|n| *n > 0);
                    if usage.output_tokens > 0 || input.is_some() {
                        self.usage = Some(Usage::new(
                            input.unwrap_or(self.input_tokens),
                            usage.output_tokens,
                        ));
                    }
                }
                Ok(Step::empty())
            }

            StreamEvent::MessageStop => Ok(Step::done(self.finish()?)),

            StreamEvent::Error { error } => Err(StreamError::Upstream {
                message: error.message,
            }),
        }
    }

    fn error_frame(&self, message: &str) -> Bytes {
        format_chat_error(message)
    }
}
