// GET / and GET /health handlers

use crate::models::{HealthResponse, LivenessResponse};
use std::convert::Infallible;
use warp::http::StatusCode;

pub const LIVENESS_MESSAGE: &str = "Knowledge Base API is running";

pub async fn root_handler() -> Result<impl warp::Reply, Infallible> {
    let response = LivenessResponse {
        message: LIVENESS_MESSAGE.to_string(),
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&response),
        StatusCode::OK,
    ))
}

pub async fn health_handler() -> Result<impl warp::Reply, Infallible> {
    let response = HealthResponse {
        status: "healthy".to_string(),
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&response),
        StatusCode::OK,
    ))
}
