use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::AppState;
use crate::{constants::API_VERSION, services::KeepAliveStatus, utils::get_chain_name};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub api_version: String,
    pub environment: String,
    pub keep_alive: KeepAliveStatus,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: API_VERSION.to_string(),
        environment: state.config.environment.clone(),
        keep_alive: state.keep_alive.status(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainResponse {
    pub chain_id: u64,
    pub name: String,
}

/// POST /api/keep-alive/pause
pub async fn pause_keep_alive(State(state): State<AppState>) -> Json<KeepAliveStatus> {
    state.keep_alive.pause();
    Json(state.keep_alive.status())
}

/// POST /api/keep-alive/resume
pub async fn resume_keep_alive(State(state): State<AppState>) -> Json<KeepAliveStatus> {
    state.keep_alive.resume();
    Json(state.keep_alive.status())
}

/// GET /api/chains/{chain_id}
pub async fn get_chain(Path(chain_id): Path<u64>) -> Json<ChainResponse> {
    Json(ChainResponse {
        chain_id,
        name: get_chain_name(chain_id),
    })
}
