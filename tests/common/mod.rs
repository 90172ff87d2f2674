//! Shared helpers for integration tests: an in-process provider that replays
//! a fixed script instead of calling the network.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use kb_relay::llm::{
    ChatRole, Completion, EventStream, GenerateRequest, GenerationConfig, LlmError, LlmProvider,
    Model, StreamEvent,
};
use kb_relay::state::AppState;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted upstream event
#[derive(Debug, Clone)]
pub enum Step {
    /// A content delta
    Delta(&'static str),
    /// An in-stream error event reported by the provider
    ErrorEvent(&'static str),
    /// A transport failure surfaced as a stream item
    Fail(&'static str),
    /// Never yields; holds the stream open
    Hang,
}

pub struct ScriptedProvider {
    steps: Vec<Step>,
    /// Fail `stream_generate` before any event
    reject: Option<&'static str>,
    /// Reply for `generate`; `None` fails with a rate-limit error
    completion: Option<Option<&'static str>>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            reject: None,
            completion: Some(Some("scripted reply")),
            delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn deltas(texts: &[&'static str]) -> Self {
        Self::new(texts.iter().copied().map(Step::Delta).collect())
    }

    pub fn rejecting(message: &'static str) -> Self {
        let mut provider = Self::new(vec![]);
        provider.reject = Some(message);
        provider.completion = None;
        provider
    }

    pub fn with_completion(mut self, content: Option<&'static str>) -> Self {
        self.completion = Some(content);
        self
    }

    /// Sleep before each scripted event
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handle to every request the provider has received
    pub fn requests(&self) -> Arc<Mutex<Vec<GenerateRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        self.requests.lock().unwrap().push(request);

        if let Some(message) = self.reject {
            return Err(LlmError::AuthenticationError(message.to_string()));
        }

        let delay = self.delay;
        let start = StreamEvent::MessageStart {
            id: "chatcmpl-test".to_string(),
            model: "gpt-4o-mini".to_string(),
        };
        let steps = self.steps.clone();

        let events = stream::once(async move { Ok::<_, LlmError>(start) }).chain(
            stream::iter(steps.into_iter().enumerate()).then(move |(index, step)| async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                match step {
                    Step::Delta(text) => Ok(StreamEvent::ContentDelta {
                        index,
                        text: text.to_string(),
                    }),
                    Step::ErrorEvent(message) => Ok(StreamEvent::Error {
                        error: message.to_string(),
                    }),
                    Step::Fail(message) => Err(LlmError::StreamError(message.to_string())),
                    Step::Hang => std::future::pending().await,
                }
            }),
        );

        Ok(Box::pin(events))
    }

    async fn generate(&self, request: GenerateRequest) -> Result<Completion, LlmError> {
        self.requests.lock().unwrap().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.completion {
            Some(content) => Ok(Completion {
                id: "chatcmpl-test".to_string(),
                model: "gpt-4o-mini".to_string(),
                role: ChatRole::Assistant,
                content: content.map(str::to_string),
                finish_reason: None,
                usage: None,
            }),
            None => Err(LlmError::RateLimitExceeded { retry_after: None }),
        }
    }
}

pub fn test_config() -> GenerationConfig {
    GenerationConfig::new(Model::Gpt4oMini).with_temperature(0.7)
}

/// Application state backed by `provider`
pub fn app_state(provider: ScriptedProvider) -> AppState {
    AppState::new(Arc::new(provider), test_config())
}
