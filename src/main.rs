use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod error;
mod integrations;
mod models;
mod services;
mod utils;

use config::Config;
use constants::API_VERSION;
use integrations::{MetadataBackendClient, ReqwestTransport, SubgraphClient, TokioBackoff};
use services::{HealthPinger, KeepAlive, MetadataReconciler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kaisign_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting KaiSign metadata service");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);

    // Upstream clients share one connection pool
    let transport = Arc::new(ReqwestTransport::new(config.http_timeout())?);
    let backend = Arc::new(MetadataBackendClient::new(
        config.api_url.clone(),
        transport.clone(),
        Arc::new(TokioBackoff),
    ));
    let subgraph = Arc::new(SubgraphClient::new(config.graph_url.clone(), transport.clone()));
    let reconciler = Arc::new(MetadataReconciler::new(subgraph.clone(), backend.clone()));
    tracing::info!("Metadata backend: {}", backend.base_url());
    tracing::info!("Subgraph: {}", subgraph.endpoint());

    let keep_alive = Arc::new(KeepAlive::new(
        Arc::new(HealthPinger::new(
            config.health_url(),
            transport.client().clone(),
        )),
        config.keep_alive_settings(),
    ));
    keep_alive.start();

    let app_state = api::AppState {
        config: config.clone(),
        backend,
        subgraph,
        reconciler,
        keep_alive: keep_alive.clone(),
    };

    let app = build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    keep_alive.stop();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn build_router(state: api::AppState) -> Router {
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/api/chains/{chain_id}", get(api::health::get_chain))
        .route("/api/keep-alive/pause", post(api::health::pause_keep_alive))
        .route("/api/keep-alive/resume", post(api::health::resume_keep_alive))
        // Combined metadata
        .route(
            "/api/contract-metadata",
            get(api::metadata::get_contract_metadata).post(api::metadata::batch_contract_metadata),
        )
        // Spec identifiers
        .route("/api/spec-metadata", post(api::spec::get_spec_metadata))
        .route("/api/spec-id/normalize", get(api::spec::normalize_spec_id))
        // Subgraph views
        .route("/api/contracts", get(api::contracts::list_contracts))
        .route("/api/contracts/search", get(api::contracts::search_contracts))
        .route(
            "/api/contracts/{address}/history",
            get(api::contracts::get_spec_history),
        )
        .route(
            "/api/contracts/{address}/functions",
            get(api::contracts::get_functions),
        )
        .route(
            "/api/users/{address}/specs",
            get(api::contracts::get_user_specs),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
