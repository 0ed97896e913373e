// src/api/mod.rs

pub mod contracts;
pub mod health;
pub mod metadata;
pub mod spec;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::integrations::{MetadataBackendClient, SubgraphClient};
use crate::services::{KeepAlive, MetadataReconciler};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: Arc<MetadataBackendClient>,
    pub subgraph: Arc<SubgraphClient>,
    pub reconciler: Arc<MetadataReconciler>,
    pub keep_alive: Arc<KeepAlive>,
}

/// Parses a required `chainId` query parameter.
pub fn require_chain_id(raw: Option<&str>, example: &str) -> Result<u64> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Missing required parameter: chainId (example: {})",
                example
            ))
        })?;
    raw.parse::<u64>()
        .map_err(|_| AppError::BadRequest(format!("Invalid chainId: {}", raw)))
}
