// Knowledge-base chat relay: HTTP and WebSocket front ends over a streaming LLM provider

pub mod config;
pub mod frames;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod registry;
pub mod relay;
pub mod routes;
pub mod state;

// LLM abstraction layer
pub mod llm;
