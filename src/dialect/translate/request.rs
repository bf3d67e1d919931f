//! Request translation
//!
//! Chat-completions requests keep system prompts and tool results inline in
//! the message list. The messages dialect lifts the system prompt into its own
//! field, carries tool calls as `tool_use` blocks and tool results as
//! `tool_result` blocks inside a user turn, and requires consecutive turns of
//! the same role to be merged.

use super::TranslationError;
use crate::dialect::anthropic::{
    self, ContentBlock, Message, MessageContent, MessageRole, MessagesRequest, SystemPrompt, Tool,
    ToolResultContent,
};
use crate::dialect::openai::{
    self, ChatCompletionRequest, ChatMessage, Content, ContentPart, FunctionCall,
    FunctionDefinition, ImageUrl, Role, StopSequence, StreamOptions, ToolCall, ToolDefinition,
};

/// `max_tokens` sent upstream when the client did not set one
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Translate a chat-completions request into a messages request for `model`
pub fn chat_to_messages(
    request: &ChatCompletionRequest,
    model: &str,
) -> Result<MessagesRequest, TranslationError> {
    let mut system_texts = Vec::new();
    let mut turns: Vec<Message> = Vec::new();

    for message in &request.messages {
        match message.role {
            Role::System | Role::Developer => system_texts.push(message.text_content()),
            Role::User => {
                let blocks = user_blocks(message.content.as_ref());
                push_turn(&mut turns, MessageRole::User, blocks);
            }
            Role::Assistant => {
                let blocks = assistant_blocks(message)?;
                push_turn(&mut turns, MessageRole::Assistant, blocks);
            }
            Role::Tool => {
                let tool_use_id = message
                    .tool_call_id
                    .clone()
                    .ok_or_else(|| TranslationError::MissingRequiredField("tool_call_id".to_string()))?;
                let block = ContentBlock::ToolResult {
                    tool_use_id,
                    content: Some(ToolResultContent::Text(message.text_content())),
                    is_error: None,
                };
                push_turn(&mut turns, MessageRole::User, vec![block]);
            }
        }
    }

    if turns.is_empty() {
        return Err(TranslationError::InvalidMessageFormat(
            "conversation has no user or assistant messages".to_string(),
        ));
    }

    let system = if system_texts.is_empty() {
        None
    } else {
        Some(SystemPrompt::Text(system_texts.join("\n")))
    };

    let tools = request.tools.as_ref().map(|tools| {
        tools
            .iter()
            .map(|tool| Tool {
                name: tool.function.name.clone(),
                description: tool.function.description.clone(),
                input_schema: tool.function.parameters.clone(),
            })
            .collect()
    });

    Ok(MessagesRequest {
        model: model.to_string(),
        messages: turns,
        system,
        max_tokens: request
            .max_tokens
            .or(request.max_completion_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS),
        temperature: request.temperature,
        top_p: request.top_p,
        top_k: None,
        stop_sequences: request.stop.clone().map(StopSequence::into_vec),
        stream: request.stream,
        tools,
        tool_choice: request.tool_choice.as_ref().map(|choice| match choice {
            openai::ToolChoice::Auto => anthropic::ToolChoice::Auto,
            openai::ToolChoice::None => anthropic::ToolChoice::None,
            openai::ToolChoice::Required => anthropic::ToolChoice::Any,
            openai::ToolChoice::Function { name } => anthropic::ToolChoice::Tool { name: name.clone() },
        }),
        metadata: None,
    })
}

/// Append blocks as a turn, merging into the previous turn when roles match
fn push_turn(turns: &mut Vec<Message>, role: MessageRole, blocks: Vec<ContentBlock>) {
    if blocks.is_empty() {
        return;
    }

    if let Some(last) = turns.last_mut() {
        if last.role == role {
            let mut merged = std::mem::replace(&mut last.content, MessageContent::Blocks(Vec::new()))
                .into_blocks();
            merged.extend(blocks);
            last.content = MessageContent::Blocks(merged);
            return;
        }
    }

    let content = match blocks.as_slice() {
        [ContentBlock::Text { text }] => MessageContent::Text(text.clone()),
        _ => MessageContent::Blocks(blocks),
    };
    turns.push(Message { role, content });
}

fn user_blocks(content: Option<&Content>) -> Vec<ContentBlock> {
    match content {
        None => Vec::new(),
        Some(Content::Text(text)) => vec![ContentBlock::Text { text: text.clone() }],
        Some(Content::Parts(parts)) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => ContentBlock::Text { text: text.clone() },
                ContentPart::ImageUrl { image_url } => ContentBlock::Image {
                    source: image_source(&image_url.url),
                },
            })
            .collect(),
    }
}

/// Image source for a data URL or a remote URL
fn image_source(url: &str) -> serde_json::Value {
    if let Some(rest) = url.strip_prefix("data:") {
        if let Some((media_type, data)) = rest.split_once(";base64,") {
            return serde_json::json!({
                "type": "base64",
                "media_type": media_type,
                "data": data,
            });
        }
    }
    serde_json::json!({ "type": "url", "url": url })
}

fn assistant_blocks(message: &ChatMessage) -> Result<Vec<ContentBlock>, TranslationError> {
    let mut blocks = Vec::new();

    let text = message.text_content();
    if !text.is_empty() {
        blocks.push(ContentBlock::Text { text });
    }

    for call in message.tool_calls.iter().flatten() {
        let input = if call.function.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.function.arguments)
                .map_err(|e| TranslationError::MalformedArguments(format!("{}: {}", call.id, e)))?
        };
        blocks.push(ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.function.name.clone(),
            input,
        });
    }

    Ok(blocks)
}

/// Translate a messages request into a chat-completions request for `model`
pub fn messages_to_chat(
    request: &MessagesRequest,
    model: &str,
) -> Result<ChatCompletionRequest, TranslationError> {
    let mut messages = Vec::new();

    if let Some(system) = &request.system {
        let text = system.as_text();
        if !text.is_empty() {
            messages.push(ChatMessage::text(Role::System, text));
        }
    }

    for message in &request.messages {
        let blocks = message.content.clone().into_blocks();
        match message.role {
            MessageRole::User => push_user_message(&mut messages, blocks),
            MessageRole::Assistant => messages.push(assistant_message(blocks)),
        }
    }

    let tools = request.tools.as_ref().map(|tools| {
        tools
            .iter()
            .map(|tool| ToolDefinition {
                tool_type: "function".to_string(),
                function: FunctionDefinition {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.input_schema.clone(),
                },
            })
            .collect()
    });

    Ok(ChatCompletionRequest {
        model: model.to_string(),
        messages,
        max_tokens: Some(request.max_tokens),
        max_completion_tokens: None,
        temperature: request.temperature,
        top_p: request.top_p,
        stop: request.stop_sequences.clone().map(StopSequence::Multiple),
        stream: request.stream,
        stream_options: request.stream.then_some(StreamOptions { include_usage: true }),
        tools,
        tool_choice: request.tool_choice.as_ref().map(|choice| match choice {
            anthropic::ToolChoice::Auto => openai::ToolChoice::Auto,
            anthropic::ToolChoice::Any => openai::ToolChoice::Required,
            anthropic::ToolChoice::None => openai::ToolChoice::None,
            anthropic::ToolChoice::Tool { name } => openai::ToolChoice::Function { name: name.clone() },
        }),
        user: None,
    })
}

/// Tool results become `tool` messages ahead of whatever else the turn carries
fn push_user_message(messages: &mut Vec<ChatMessage>, blocks: Vec<ContentBlock>) {
    let mut parts = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => {
                let text = content.map(|c| c.as_text()).unwrap_or_default();
                let mut message = ChatMessage::text(Role::Tool, text);
                message.tool_call_id = Some(tool_use_id);
                messages.push(message);
            }
            ContentBlock::Text { text } => parts.push(ContentPart::Text { text }),
            ContentBlock::Image { source } => {
                if let Some(url) = image_url(&source) {
                    parts.push(ContentPart::ImageUrl {
                        image_url: ImageUrl { url, detail: None },
                    });
                }
            }
            _ => {}
        }
    }

    if parts.is_empty() {
        return;
    }

    let content = if parts.iter().all(|p| matches!(p, ContentPart::Text { .. })) {
        Content::Text(Content::Parts(parts).as_text())
    } else {
        Content::Parts(parts)
    };
    messages.push(ChatMessage {
        role: Role::User,
        content: Some(content),
        name: None,
        tool_call_id: None,
        tool_calls: None,
    });
}

fn image_url(source: &serde_json::Value) -> Option<String> {
    match source.get("type").and_then(|t| t.as_str()) {
        Some("base64") => {
            let media_type = source.get("media_type")?.as_str()?;
            let data = source.get("data")?.as_str()?;
            Some(format!("data:{};base64,{}", media_type, data))
        }
        Some("url") => source.get("url")?.as_str().map(str::to_string),
        _ => None,
    }
}

fn assistant_message(blocks: Vec<ContentBlock>) -> ChatMessage {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text: t } => text.push_str(&t),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                id,
                call_type: "function".to_string(),
                function: FunctionCall {
                    name,
                    arguments: input.to_string(),
                },
            }),
            _ => {}
        }
    }

    ChatMessage {
        role: Role::Assistant,
        content: if text.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(Content::Text(text))
        },
        name: None,
        tool_call_id: None,
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
    }
}
