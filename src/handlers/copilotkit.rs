// POST /api/copilotkit handler

use crate::llm::ChatRole;
use crate::models::{AgentRequest, AgentResponse};
use crate::state::AppState;
use bytes::Bytes;
use std::convert::Infallible;
use tracing::{info, warn};

/// Non-streamed passthrough: caller-supplied messages, no system prompt.
/// Every failure, including an undecodable body, is reported with status 200.
pub async fn copilotkit_handler(body: Bytes, state: AppState) -> Result<impl warp::Reply, Infallible> {
    let response = match serde_json::from_slice::<AgentRequest>(&body) {
        Ok(request) => {
            info!(messages = request.messages.len(), "POST /api/copilotkit");

            match state.relay.complete(request.messages).await {
                Ok(completion) => AgentResponse::Reply {
                    role: ChatRole::Assistant.as_str().to_string(),
                    content: completion.content.unwrap_or_default(),
                },
                Err(e) => {
                    warn!(error = %e, "CopilotKit completion failed");
                    AgentResponse::Failed {
                        error: e.to_string(),
                    }
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "Rejected CopilotKit request body");
            AgentResponse::Failed {
                error: e.to_string(),
            }
        }
    };

    Ok(warp::reply::json(&response))
}
