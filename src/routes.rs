// Route definitions

use crate::handlers;
use crate::state::AppState;
use std::convert::Infallible;
use warp::Filter;

/// Upper bound on a JSON request body
const MAX_BODY_BYTES: u64 = 1024 * 1024;

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Plain HTTP routes, without the CORS wrapper
fn http_routes(
    state: AppState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // GET /
    let root = warp::path::end()
        .and(warp::get())
        .and_then(handlers::root_handler);

    // GET /health
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::health_handler);

    // POST /api/chat
    let chat = warp::path!("api" / "chat")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::chat_handler);

    // POST /api/copilotkit
    let copilotkit = warp::path!("api" / "copilotkit")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_state(state))
        .and_then(handlers::copilotkit_handler);

    root.or(health).or(chat).or(copilotkit)
}

/// GET /ws/chat
fn ws_route(
    state: AppState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("ws" / "chat")
        .and(warp::ws())
        .and(with_state(state))
        .and_then(handlers::ws_chat_handler)
}

/// Every route, with no CORS policy applied
pub fn api_routes(
    state: AppState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    http_routes(state.clone()).or(ws_route(state))
}

/// Production routes: CORS on the HTTP surface for `allowed_origin`, request tracing on all
///
/// `allowed_origin` must be `scheme://host[:port]` and `allowed_headers` valid
/// header names; `ServerConfig` validates both.
pub fn configure_routes(
    state: AppState,
    allowed_origin: &str,
    allowed_headers: &[String],
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let cors = warp::cors()
        .allow_origin(allowed_origin)
        .allow_credentials(true)
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(allowed_headers.iter().map(String::as_str));

    http_routes(state.clone())
        .with(cors)
        .or(ws_route(state))
        .with(warp::trace::request())
}
