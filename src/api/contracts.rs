use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{require_chain_id, AppState};
use crate::{
    error::{AppError, Result},
    models::{ApiResponse, ContractAddress, ContractRecord, FunctionRecord, SpecHistory},
    utils::parse_flag,
};

#[derive(Debug, Deserialize)]
pub struct ChainQuery {
    #[serde(rename = "chainId")]
    pub chain_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "chainId")]
    pub chain_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UserSpecsQuery {
    pub finalized: Option<String>,
}

/// GET /api/contracts
pub async fn list_contracts(
    State(state): State<AppState>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<ApiResponse<Vec<ContractRecord>>>> {
    let chain_id = require_chain_id(query.chain_id.as_deref(), "/api/contracts?chainId=1")?;
    let contracts = state.subgraph.get_contracts_with_metadata(chain_id).await?;
    Ok(Json(ApiResponse::success(contracts)))
}

/// GET /api/contracts/search
pub async fn search_contracts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<ContractRecord>>>> {
    let term = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing required parameter: q".to_string()))?;
    let contracts = state.subgraph.search_contracts(term, query.chain_id).await?;
    Ok(Json(ApiResponse::success(contracts)))
}

/// GET /api/contracts/{address}/history
pub async fn get_spec_history(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<ApiResponse<Vec<SpecHistory>>>> {
    let address = ContractAddress::parse(&address)?;
    let chain_id = require_chain_id(
        query.chain_id.as_deref(),
        "/api/contracts/0x123.../history?chainId=1",
    )?;
    let history = state
        .subgraph
        .get_contract_spec_history(&address, chain_id)
        .await?;
    Ok(Json(ApiResponse::success(history)))
}

/// GET /api/contracts/{address}/functions
pub async fn get_functions(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<ApiResponse<Vec<FunctionRecord>>>> {
    let address = ContractAddress::parse(&address)?;
    let chain_id = require_chain_id(
        query.chain_id.as_deref(),
        "/api/contracts/0x123.../functions?chainId=1",
    )?;
    let functions = state
        .subgraph
        .get_contract_functions(&address, chain_id)
        .await?;
    Ok(Json(ApiResponse::success(functions)))
}

/// GET /api/users/{address}/specs
pub async fn get_user_specs(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<UserSpecsQuery>,
) -> Result<Json<ApiResponse<Vec<SpecHistory>>>> {
    let user = ContractAddress::parse(&address)?;
    let finalized_only = query.finalized.as_deref().map(parse_flag).unwrap_or(false);
    let specs = state.subgraph.get_user_specs(&user, finalized_only).await?;
    Ok(Json(ApiResponse::success(specs)))
}
