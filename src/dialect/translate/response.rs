//! Response translation for non-streaming calls

use super::{finish_to_stop_reason, stop_to_finish_reason, unix_now, TranslationError};
use crate::dialect::anthropic::{ContentBlock, MessageRole, MessagesResponse, MessagesUsage};
use crate::dialect::openai::{
    ChatCompletionResponse, Choice, ChoiceMessage, FunctionCall, Role, ToolCall, Usage,
    COMPLETION_OBJECT,
};

/// Translate a messages response into a chat-completions response.
///
/// `model` is the model string the client sent.
pub fn messages_response_to_chat(response: MessagesResponse, model: &str) -> ChatCompletionResponse {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in response.content {
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

    let finish_reason = response
        .stop_reason
        .as_deref()
        .map(|reason| stop_to_finish_reason(reason).to_string());

    ChatCompletionResponse {
        id: response.id,
        object: COMPLETION_OBJECT.to_string(),
        created: unix_now(),
        model: model.to_string(),
        choices: vec![Choice {
            index: 0,
            message: ChoiceMessage {
                role: Role::Assistant,
                content: if text.is_empty() && !tool_calls.is_empty() {
                    None
                } else {
                    Some(text)
                },
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls)
                },
            },
            finish_reason,
        }],
        usage: Usage::new(response.usage.input_tokens, response.usage.output_tokens),
    }
}

/// Translate a chat-completions response into a messages response.
///
/// Only the first choice is kept. `model` is the model string the client sent.
pub fn chat_response_to_messages(
    response: ChatCompletionResponse,
    model: &str,
) -> Result<MessagesResponse, TranslationError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| TranslationError::MissingRequiredField("choices".to_string()))?;

    let mut content = Vec::new();
    if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
        content.push(ContentBlock::Text { text });
    }
    for call in choice.message.tool_calls.into_iter().flatten() {
        let input = if call.function.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.function.arguments)
                .map_err(|e| TranslationError::MalformedArguments(format!("{}: {}", call.id, e)))?
        };
        content.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    let stop_reason = finish_to_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop"));

    Ok(MessagesResponse {
        id: response.id,
        object_type: "message".to_string(),
        role: MessageRole::Assistant,
        content,
        model: model.to_string(),
        stop_reason: Some(stop_reason.to_string()),
        stop_sequence: None,
        usage: MessagesUsage {
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
        },
    })
}
