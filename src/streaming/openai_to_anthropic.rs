//! Chat-completions chunks in, messages events out
//!
//! Used when a messages client is served by a chat-completions provider.
//!
//! Content-block indices come from one cursor that only moves forward. Text
//! claims the cursor the first time it appears, which is index 0 unless tool
//! calls opened earlier. A tool call at upstream index `i` opens at
//! `max(cursor, i)`, so a text block that started first pushes tool blocks
//! up by one rather than colliding with them.

use std::collections::BTreeMap;

use bytes::Bytes;

use super::frames::{format_messages_error, format_messages_event};
use super::session::{Direction, Step, StreamTranslator};
use super::source::StreamError;
use crate::dialect::anthropic::{
    BlockDelta, ContentBlock, DeltaUsage, MessageDeltaBody, MessagesResponse, StreamEvent,
};
use crate::dialect::openai::{StreamChunk, ToolCallDelta};
use crate::dialect::translate::{finish_to_stop_reason, unix_now};

/// A tool call still receiving argument fragments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToolCall {
    pub block_index: u32,
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Per-session state for chat-completions → messages translation
#[derive(Debug)]
pub struct ChatToMessagesTranslator {
    id: String,
    model: String,
    text_index: Option<u32>,
    cursor: u32,
    input_tokens: u32,
    output_tokens: u32,
    /// Open tool calls keyed by upstream index
    tools: BTreeMap<u32, PendingToolCall>,
    finished: bool,
}

impl ChatToMessagesTranslator {
    /// `model` is echoed in `message_start`
    pub fn new(model: &str) -> Self {
        Self {
            id: format!("msg_{}", unix_now()),
            model: model.to_string(),
            text_index: None,
            cursor: 0,
            input_tokens: 0,
            output_tokens: 0,
            tools: BTreeMap::new(),
            finished: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn harvest_usage(&mut self, chunk: &StreamChunk) {
        if let Some(usage) = chunk.usage {
            self.input_tokens = usage.prompt_tokens;
            self.output_tokens = usage.completion_tokens;
        }
    }

    fn text(&mut self, text: String, frames: &mut Vec<Bytes>) -> Result<(), StreamError> {
        let index = match self.text_index {
            Some(index) => index,
            None => {
                let index = self.cursor;
                self.cursor += 1;
                self.text_index = Some(index);
                frames.push(format_messages_event(&StreamEvent::ContentBlockStart {
                    index,
                    content_block: ContentBlock::Text {
                        text: String::new(),
                    },
                })?);
                index
            }
        };

        frames.push(format_messages_event(&StreamEvent::ContentBlockDelta {
            index,
            delta: BlockDelta::TextDelta { text },
        })?);
        Ok(())
    }

    fn tool_call(&mut self, call: ToolCallDelta, frames: &mut Vec<Bytes>) -> Result<(), StreamError> {
        let function = call.function.unwrap_or_default();

        if !self.tools.contains_key(&call.index) {
            let block_index = self.cursor.max(call.index);
            self.cursor = block_index + 1;

            let pending = PendingToolCall {
                block_index,
                id: call
                    .id
                    .unwrap_or_else(|| format!("toolu_{}", uuid::Uuid::new_v4().simple())),
                name: function.name.clone().unwrap_or_default(),
                arguments: String::new(),
            };
            frames.push(format_messages_event(&StreamEvent::ContentBlockStart {
                index: block_index,
                content_block: ContentBlock::ToolUse {
                    id: pending.id.clone(),
                    name: pending.name.clone(),
                    input: serde_json::json!({}),
                },
            })?);
            self.tools.insert(call.index, pending);
        }

        let fragment = match function.arguments {
            Some(fragment) if !fragment.is_empty() => fragment,
            _ => return Ok(()),
        };
        let Some(pending) = self.tools.get_mut(&call.index) else {
            return Err(StreamError::Protocol(format!(
                "tool call {} vanished mid-stream",
                call.index
            )));
        };
        pending.arguments.push_str(&fragment);
        frames.push(format_messages_event(&StreamEvent::ContentBlockDelta {
            index: pending.block_index,
            delta: BlockDelta::InputJsonDelta {
                partial_json: fragment,
            },
        })?);
        Ok(())
    }

    fn finish(&mut self, finish_reason: &str, frames: &mut Vec<Bytes>) -> Result<(), StreamError> {
        if let Some(index) = self.text_index {
            frames.push(format_messages_event(&StreamEvent::ContentBlockStop { index })?);
        }

        let mut open: Vec<u32> = self.tools.values().map(|t| t.block_index).collect();
        open.sort_unstable();
        for index in open {
            frames.push(format_messages_event(&StreamEvent::ContentBlockStop { index })?);
        }

        frames.push(format_messages_event(&StreamEvent::MessageDelta {
            delta: MessageDeltaBody {
                stop_reason: Some(finish_to_stop_reason(finish_reason).to_string()),
                stop_sequence: None,
            },
            usage: Some(DeltaUsage {
                input_tokens: None,
                output_tokens: self.output_tokens,
            }),
        })?);
        frames.push(format_messages_event(&StreamEvent::MessageStop)?);

        self.finished = true;
        Ok(())
    }
}

impl StreamTranslator for ChatToMessagesTranslator {
    type Event = StreamChunk;

    fn direction(&self) -> Direction {
        Direction::OpenAiToAnthropic
    }

    fn start(&mut self) -> Result<Vec<Bytes>, StreamError> {
        let message = MessagesResponse::empty(&self.id, &self.model);
        Ok(vec![format_messages_event(&StreamEvent::MessageStart { message })?])
    }

    fn translate(&mut self, mut chunk: StreamChunk) -> Result<Step, StreamError> {
        if self.finished {
            return Err(StreamError::Protocol("chunk after finish_reason".to_string()));
        }

        self.harvest_usage(&chunk);

        if chunk.choices.is_empty() {
            return Ok(Step::empty());
        }
        let choice = chunk.choices.swap_remove(0);

        let mut frames = Vec::new();

        if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
            self.text(text, &mut frames)?;
        }

        for call in choice.delta.tool_calls.into_iter().flatten() {
            self.tool_call(call, &mut frames)?;
        }

        match choice.finish_reason.filter(|r| !r.is_empty()) {
            Some(reason) => {
                self.finish(&reason, &mut frames)?;
                Ok(Step::done(frames))
            }
            None => Ok(Step::frames(frames)),
        }
    }

    fn error_frame(&self, message: &str) -> Bytes {
        format_messages_error(message)
    }
}
