// Shared application state injected into every route

use std::sync::Arc;

use crate::llm::{GenerationConfig, LlmProvider};
use crate::registry::ConnectionRegistry;
use crate::relay::ChatRelay;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ChatRelay>,
    pub registry: ConnectionRegistry,
}

impl AppState {
    pub fn new(provider: Arc<dyn LlmProvider>, config: GenerationConfig) -> Self {
        Self {
            relay: Arc::new(ChatRelay::new(provider, config)),
            registry: ConnectionRegistry::new(),
        }
    }
}
