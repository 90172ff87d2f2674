//! Provider trait for LLM implementations

use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

use super::{
    error::LlmError,
    types::{Completion, GenerateRequest, StreamEvent},
};
use crate::llm::openai::OpenAiClient;

/// Boxed stream of provider events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Main interface that all LLM provider implementations must satisfy
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stream generate content from the LLM
    ///
    /// Sends the request and returns a stream of events representing the
    /// incremental response. Errors before the first byte arrives are returned
    /// directly; errors after that arrive as stream items.
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError>;

    /// Generate one complete, non-streamed response
    async fn generate(&self, request: GenerateRequest) -> Result<Completion, LlmError>;
}

/// Create the upstream provider
///
/// # Arguments
///
/// * `api_key` - Bearer token for the provider
/// * `base_url` - API root, e.g. `https://api.openai.com/v1`
///
/// # Example
///
/// ```rust,no_run
/// use kb_relay::llm::create_provider;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = create_provider(
///     "sk-...".to_string(),
///     "https://api.openai.com/v1".to_string(),
/// )?;
/// # Ok(())
/// # }
/// ```
pub fn create_provider(
    api_key: String,
    base_url: String,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    let client = OpenAiClient::new(api_key, base_url)?;
    Ok(Box::new(client))
}
