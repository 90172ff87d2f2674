//! LLM Abstraction Layer
//!
//! This module provides a provider-neutral interface for chat completions and
//! an implementation for the OpenAI Chat Completions API.

pub mod core;
pub mod openai;

// Re-export commonly used types
pub use self::core::{
    config::{GenerationConfig, DEFAULT_TEMPERATURE},
    error::LlmError,
    provider::{create_provider, EventStream, LlmProvider},
    types::{
        ChatMessage, ChatRole, Completion, FinishReason, GenerateRequest, Model, StreamEvent,
        UsageMetadata,
    },
};
