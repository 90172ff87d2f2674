//! Mapping between abstraction types and OpenAI-specific types

use std::time::Duration;

use crate::llm::core::{
    error::LlmError,
    types::{ChatMessage, ChatRole, Completion, FinishReason, GenerateRequest, StreamEvent, UsageMetadata},
};

use super::types::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ErrorEnvelope,
    OpenAiErrorData, OpenAiMessage, OpenAiSseEvent, OpenAiUsage,
};

/// Convert our abstraction request to the Chat Completions request format
pub fn to_openai_request(request: GenerateRequest, stream: bool) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: request.config.model.as_str().to_string(),
        messages: request.messages.into_iter().map(to_openai_message).collect(),
        temperature: request.config.temperature,
        max_tokens: request.config.max_tokens,
        stream,
    }
}

fn to_openai_message(message: ChatMessage) -> OpenAiMessage {
    OpenAiMessage {
        role: message.role.as_str().to_string(),
        content: message.content,
    }
}

fn from_openai_usage(usage: OpenAiUsage) -> UsageMetadata {
    UsageMetadata::new(usage.prompt_tokens, usage.completion_tokens)
}

/// Convert one SSE payload to our abstraction's events
///
/// `started` tracks whether `MessageStart` has been emitted for this response.
pub fn from_openai_event(event: OpenAiSseEvent, started: &mut bool) -> Vec<StreamEvent> {
    match event {
        OpenAiSseEvent::Chunk(chunk) => from_openai_chunk(chunk, started),
        OpenAiSseEvent::Error(error) => vec![StreamEvent::Error {
            error: format!("{}: {}", error.code_str(), error.message),
        }],
        // The byte stream closes right after; nothing to emit
        OpenAiSseEvent::Done => vec![],
    }
}

fn from_openai_chunk(chunk: ChatCompletionChunk, started: &mut bool) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    if !*started {
        *started = true;
        events.push(StreamEvent::MessageStart {
            id: chunk.id.clone(),
            model: chunk.model.clone(),
        });
    }

    let usage = chunk.usage.map(from_openai_usage);

    for choice in chunk.choices {
        if let Some(text) = choice.delta.content {
            events.push(StreamEvent::ContentDelta {
                index: choice.index,
                text,
            });
        }

        if let Some(reason) = choice.finish_reason {
            events.push(StreamEvent::MessageEnd {
                finish_reason: FinishReason::from(reason.as_str()),
                usage,
            });
        }
    }

    events
}

/// Convert a non-streamed response into a `Completion`
pub fn from_openai_response(response: ChatCompletionResponse) -> Result<Completion, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::ProviderError {
            code: "empty_response".to_string(),
            message: "Response contained no choices".to_string(),
        })?;

    let role = match choice.message.role.as_str() {
        "system" => ChatRole::System,
        "user" => ChatRole::User,
        _ => ChatRole::Assistant,
    };

    Ok(Completion {
        id: response.id,
        model: response.model,
        role,
        content: choice.message.content,
        finish_reason: choice.finish_reason.as_deref().map(FinishReason::from),
        usage: response.usage.map(from_openai_usage),
    })
}

/// Classify a non-2xx response
pub fn from_error_response(status: u16, retry_after: Option<Duration>, body: &str) -> LlmError {
    let error: Option<OpenAiErrorData> = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);
    let message = error
        .as_ref()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| body.to_string());

    match status {
        401 | 403 => LlmError::AuthenticationError(message),
        429 => LlmError::RateLimitExceeded { retry_after },
        400 | 404 | 422 => match error {
            Some(error) => LlmError::ProviderError {
                code: error.code_str(),
                message: error.message,
            },
            None => LlmError::InvalidRequest(message),
        },
        _ => LlmError::HttpError {
            status,
            body: message,
        },
    }
}
