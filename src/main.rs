use std::sync::Arc;

use kb_relay::config::ServerConfig;
use kb_relay::llm::create_provider;
use kb_relay::logging::init_tracing;
use kb_relay::routes::configure_routes;
use kb_relay::state::AppState;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize tracing: {}", e);
    }

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    info!(?config, "Loaded configuration");

    let provider = match create_provider(config.api_key.clone(), config.base_url.clone()) {
        Ok(provider) => provider,
        Err(e) => {
            error!(error = %e, "Failed to create LLM provider");
            std::process::exit(1);
        }
    };

    let state = AppState::new(Arc::from(provider), config.generation_config());
    let routes = configure_routes(state, &config.allowed_origin, &config.allowed_headers);

    let (addr, server) = match warp::serve(routes)
        .try_bind_with_graceful_shutdown(config.bind_addr, shutdown_signal())
    {
        Ok(bound) => bound,
        Err(e) => {
            error!(error = %e, addr = %config.bind_addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    info!(%addr, "Starting server");
    server.await;
    info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        // Without a signal handler, run until killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
