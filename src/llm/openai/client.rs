//! OpenAI client implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use std::time::Duration;

use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{Completion, GenerateRequest, StreamEvent},
};

use super::mapper::{from_error_response, from_openai_event, from_openai_response, to_openai_request};
use super::sse::parse_sse_stream;
use super::types::{ChatCompletionRequest, ChatCompletionResponse};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for the OpenAI Chat Completions API (or any compatible server)
pub struct OpenAiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Bearer token
    api_key: String,
    /// API root without trailing slash
    base_url: String,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or the HTTP client cannot be built.
    pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::AuthenticationError(
                "API key is empty".to_string(),
            ));
        }

        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the chat completions endpoint URL
    fn build_endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// POST the request and turn non-2xx statuses into errors
    async fn send(
        &self,
        body: &ChatCompletionRequest,
        timeout: Option<Duration>,
    ) -> Result<Response, LlmError> {
        let mut builder = self
            .http_client
            .post(self.build_endpoint_url())
            .bearer_auth(&self.api_key)
            .json(body);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(from_error_response(status.as_u16(), retry_after, &body));
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let timeout = request.config.timeout;
        let body = to_openai_request(request, true);

        tracing::debug!(model = %body.model, messages = body.messages.len(), "Starting streamed completion");
        let response = self.send(&body, timeout).await?;

        let byte_stream = response.bytes_stream();
        let sse_stream = parse_sse_stream(Box::pin(byte_stream));

        let mut started = false;
        let event_stream = sse_stream.flat_map(move |result| match result {
            Ok(event) => futures::stream::iter(
                from_openai_event(event, &mut started)
                    .into_iter()
                    .map(Ok)
                    .collect::<Vec<Result<StreamEvent, LlmError>>>(),
            ),
            Err(e) => futures::stream::iter(vec![Err(e)]),
        });

        Ok(Box::pin(event_stream))
    }

    async fn generate(&self, request: GenerateRequest) -> Result<Completion, LlmError> {
        let timeout = request.config.timeout;
        let body = to_openai_request(request, false);

        tracing::debug!(model = %body.model, messages = body.messages.len(), "Requesting completion");
        let response = self.send(&body, timeout).await?;
        let response: ChatCompletionResponse = response.json().await?;

        from_openai_response(response)
    }
}
