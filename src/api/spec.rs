use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    error::{AppError, Result},
    models::{ApiResponse, SpecId, SpecMetadataResponse},
};

#[derive(Debug, Deserialize)]
pub struct SpecMetadataRequest {
    pub spec_id: String,
}

#[derive(Debug, Deserialize)]
pub struct NormalizeQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSpecId {
    pub input: String,
    pub spec_id: SpecId,
}

/// POST /api/spec-metadata
pub async fn get_spec_metadata(
    State(state): State<AppState>,
    Json(req): Json<SpecMetadataRequest>,
) -> Result<Json<ApiResponse<SpecMetadataResponse>>> {
    let spec_id = SpecId::parse(&req.spec_id)?;
    tracing::debug!("Formatted spec ID {} -> {}", req.spec_id, spec_id);

    let response = state.backend.fetch_spec_metadata(&spec_id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// GET /api/spec-id/normalize
pub async fn normalize_spec_id(
    Query(query): Query<NormalizeQuery>,
) -> Result<Json<ApiResponse<NormalizedSpecId>>> {
    let input = query
        .id
        .ok_or_else(|| AppError::BadRequest("Missing required parameter: id".to_string()))?;
    let spec_id = SpecId::parse(&input)?;
    Ok(Json(ApiResponse::success(NormalizedSpecId { input, spec_id })))
}
