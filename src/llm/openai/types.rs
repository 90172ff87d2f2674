//! OpenAI-specific request and response types
//!
//! These types map directly to the Chat Completions API schema.

use serde::{Deserialize, Serialize};

/// Request body for `POST /chat/completions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model identifier
    pub model: String,
    /// Array of messages in the conversation, system prompt first
    pub messages: Vec<OpenAiMessage>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Whether the response is sent as SSE chunks
    pub stream: bool,
}

/// A single message on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    pub content: String,
}

/// One `chat.completion.chunk` object from the stream
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: usize,
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental update; the first chunk carries the role, later ones the text
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Non-streamed `chat.completion` object
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ResponseChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseChoice {
    #[serde(default)]
    pub index: usize,
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Usage metadata
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OpenAiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

/// `{"error": {...}}` envelope used by error responses and in-stream errors
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: OpenAiErrorData,
}

/// Error data
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiErrorData {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// String in practice, but the API has returned numbers and null
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

impl OpenAiErrorData {
    /// Most specific identifier available for this error
    pub fn code_str(&self) -> String {
        match &self.code {
            Some(serde_json::Value::String(code)) => code.clone(),
            Some(serde_json::Value::Null) | None => self
                .error_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            Some(other) => other.to_string(),
        }
    }
}

/// One parsed `data:` payload from the SSE stream
#[derive(Debug, Clone)]
pub enum OpenAiSseEvent {
    /// A completion chunk
    Chunk(ChatCompletionChunk),
    /// An error envelope sent mid-stream
    Error(OpenAiErrorData),
    /// The `[DONE]` sentinel
    Done,
}
