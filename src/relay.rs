//! Chat relay
//!
//! Builds the upstream transcript (`[system] ++ history ++ [message]`),
//! requests a streamed completion and re-emits the non-empty text deltas in
//! arrival order. Upstream failures never escape as errors: they end the
//! stream with a single [`RelayFragment::Failed`] that each surface renders in
//! its own way.

use async_stream::stream;
use futures::stream::Stream;
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::llm::{
    ChatMessage, Completion, GenerateRequest, GenerationConfig, LlmError, LlmProvider,
    StreamEvent,
};

/// System prompt for `POST /api/chat`
pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant for a knowledge base system. Provide clear, concise, and accurate answers.";

/// System prompt for the socket surface
pub const SOCKET_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// One item of relayed output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFragment {
    /// Generated text, never empty
    Text(String),
    /// Description of the upstream failure that ended the stream
    Failed(String),
}

impl RelayFragment {
    /// Render for the plain-text HTTP body, where failures are inlined
    pub fn into_plain_text(self) -> String {
        match self {
            RelayFragment::Text(text) => text,
            RelayFragment::Failed(error) => format!("Error: {}", error),
        }
    }
}

/// Assemble the transcript sent upstream, preserving history order
pub fn build_transcript(
    system_prompt: &str,
    history: Vec<ChatMessage>,
    message: String,
) -> Vec<ChatMessage> {
    let mut transcript = Vec::with_capacity(history.len() + 2);
    transcript.push(ChatMessage::system(system_prompt));
    transcript.extend(history);
    transcript.push(ChatMessage::user(message));
    transcript
}

/// Forwards transcripts to the upstream provider
pub struct ChatRelay {
    provider: Arc<dyn LlmProvider>,
    config: GenerationConfig,
}

impl ChatRelay {
    pub fn new(provider: Arc<dyn LlmProvider>, config: GenerationConfig) -> Self {
        Self { provider, config }
    }

    /// Stream the completion for `transcript`
    ///
    /// The returned stream is lazy and single-use. It ends when the upstream
    /// stream ends, after the first failure, or as soon as `cancel` fires.
    /// When the config carries a timeout, the whole call (first byte to last)
    /// must finish within it.
    pub fn stream(
        &self,
        transcript: Vec<ChatMessage>,
        cancel: CancellationToken,
    ) -> impl Stream<Item = RelayFragment> + Send + 'static {
        let provider = Arc::clone(&self.provider);
        let timeout = self.config.timeout;
        let request = GenerateRequest::new(transcript, self.config.clone());

        stream! {
            let deadline = timeout.map(|t| Instant::now() + t);

            let started = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = with_deadline(deadline, provider.stream_generate(request)) => {
                    Some(result.and_then(|inner| inner))
                }
            };

            let mut upstream = match started {
                None => {
                    debug!("Relay cancelled before upstream responded");
                    return;
                }
                Some(Ok(upstream)) => upstream,
                Some(Err(e)) => {
                    warn!(error = %e, "Upstream request failed");
                    yield RelayFragment::Failed(e.to_string());
                    return;
                }
            };

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    next = with_deadline(deadline, upstream.next()) => Some(next),
                };

                let item = match next {
                    None => {
                        debug!("Relay cancelled mid-stream");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Upstream stream timed out");
                        yield RelayFragment::Failed(e.to_string());
                        break;
                    }
                    Some(Ok(item)) => item,
                };

                match item {
                    None => break,
                    Some(Ok(StreamEvent::ContentDelta { text, .. })) => {
                        if !text.is_empty() {
                            yield RelayFragment::Text(text);
                        }
                    }
                    Some(Ok(StreamEvent::Error { error })) => {
                        warn!(error = %error, "Upstream reported an error mid-stream");
                        yield RelayFragment::Failed(error);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Upstream stream failed");
                        yield RelayFragment::Failed(e.to_string());
                        break;
                    }
                }
            }
        }
    }

    /// Request a single non-streamed completion for caller-supplied messages
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<Completion, LlmError> {
        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        let request = GenerateRequest::new(messages, self.config.clone());

        with_deadline(deadline, self.provider.generate(request)).await?
    }
}

/// Await `future`, failing with `LlmError::Timeout` once `deadline` passes
async fn with_deadline<F, T>(deadline: Option<Instant>, future: F) -> Result<T, LlmError>
where
    F: Future<Output = T>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, future)
            .await
            .map_err(|_| LlmError::Timeout),
        None => Ok(future.await),
    }
}
