// POST /api/chat handler

use crate::models::ChatRequest;
use crate::relay::{build_transcript, CHAT_SYSTEM_PROMPT};
use crate::state::AppState;
use bytes::Bytes;
use futures_util::stream::StreamExt;
use std::convert::Infallible;
use tokio_util::sync::CancellationToken;
use tracing::info;
use warp::http::header::{HeaderValue, CONTENT_TYPE};
use warp::http::Response;
use warp::hyper::Body;

pub async fn chat_handler(
    request: ChatRequest,
    state: AppState,
) -> Result<impl warp::Reply, Infallible> {
    info!(history = request.history.len(), "POST /api/chat");

    let transcript = build_transcript(CHAT_SYSTEM_PROMPT, request.history, request.message);

    // hyper drops the body when the client goes away, which drops the
    // upstream request with it; no token is needed on this path
    let body_stream = state
        .relay
        .stream(transcript, CancellationToken::new())
        .map(|fragment| Ok::<_, Infallible>(Bytes::from(fragment.into_plain_text())));

    let mut response = Response::new(Body::wrap_stream(body_stream));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );

    Ok(response)
}
