// Request and response bodies for the HTTP and socket surfaces

use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

/// Conversation history entry as sent by clients
pub type Message = ChatMessage;

// Request Types
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<Message>,
}

/// `messages` field of the CopilotKit passthrough body; other fields are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Inbound socket frame
#[derive(Debug, Clone, Deserialize)]
pub struct SocketRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<Message>,
}

// Response Types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LivenessResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

/// Result of the CopilotKit passthrough; always sent with status 200
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AgentResponse {
    Reply { role: String, content: String },
    Failed { error: String },
}

// Socket Frame Types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SocketFrame {
    Chunk { content: String },
    Done,
    Error { content: String },
}
