//! OpenAI provider implementation
//!
//! This module provides a client for the OpenAI Chat Completions API and any
//! server that speaks the same protocol.

pub mod client;
pub mod mapper;
pub mod sse;
pub mod types;

// Re-export commonly used types
pub use client::{OpenAiClient, DEFAULT_BASE_URL};
