use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::{require_chain_id, AppState};
use crate::{
    error::{AppError, Result},
    models::{BatchResponse, CombinedMetadata},
};

const SINGLE_EXAMPLE: &str = "/api/contract-metadata?address=0x123...&chainId=1";
const BATCH_EXAMPLE: &str =
    r#"{ "contracts": [{ "address": "0x123...", "chainId": 1 }, { "address": "0x456...", "chainId": 137 }] }"#;

#[derive(Debug, Deserialize)]
pub struct ContractMetadataQuery {
    pub address: Option<String>,
    #[serde(rename = "chainId")]
    pub chain_id: Option<String>,
}

/// GET /api/contract-metadata
pub async fn get_contract_metadata(
    State(state): State<AppState>,
    Query(query): Query<ContractMetadataQuery>,
) -> Result<Json<CombinedMetadata>> {
    let address = query
        .address
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Missing required parameter: address (example: {})",
                SINGLE_EXAMPLE
            ))
        })?;
    let chain_id = require_chain_id(query.chain_id.as_deref(), SINGLE_EXAMPLE)?;

    let combined = state.reconciler.resolve(address, chain_id).await?;
    tracing::info!(
        "Resolved metadata for {} on chain {} (graph={}, blob={})",
        combined.contract_address,
        chain_id,
        combined.sources.graph,
        combined.sources.blob
    );
    Ok(Json(combined))
}

/// POST /api/contract-metadata
pub async fn batch_contract_metadata(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<BatchResponse>> {
    let contracts = match body.get("contracts") {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(AppError::BadRequest(format!(
                "Invalid request body. Expected {}",
                BATCH_EXAMPLE
            )))
        }
    };

    tracing::debug!("Resolving batch of {} contracts", contracts.len());
    let results = state.reconciler.resolve_batch(contracts).await;

    Ok(Json(BatchResponse {
        success: true,
        total: contracts.len(),
        results,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support;
    use crate::integrations::http::TransportResponse;
    use crate::models::BatchStatus;

    const DOC: &str = r#"{"metadata":{"owner":"Example","functions":{"0xa9059cbb":{"intent":"Send"}}}}"#;

    #[tokio::test]
    async fn missing_address_is_bad_request() {
        let state = test_support::state(vec![], vec![]);
        let err = get_contract_metadata(
            State(state),
            Query(ContractMetadataQuery {
                address: None,
                chain_id: Some("1".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("address")));
    }

    #[tokio::test]
    async fn missing_chain_id_is_bad_request() {
        let state = test_support::state(vec![], vec![]);
        let err = get_contract_metadata(
            State(state),
            Query(ContractMetadataQuery {
                address: Some("0x1".into()),
                chain_id: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("chainId")));
    }

    #[tokio::test]
    async fn subgraph_outage_falls_back_to_blob() {
        let state = test_support::state(
            vec![Ok(TransportResponse::new(200, DOC))],
            vec![Ok(TransportResponse::new(500, "subgraph down"))],
        );
        let Json(combined) = get_contract_metadata(
            State(state),
            Query(ContractMetadataQuery {
                address: Some("7b24ed5".into()),
                chain_id: Some("1".into()),
            }),
        )
        .await
        .unwrap();

        assert!(!combined.sources.graph);
        assert!(combined.sources.blob);
        let json = serde_json::to_value(&combined).unwrap();
        assert_eq!(json["metadata"]["functions"][0]["intent"], "Send");
        assert_eq!(json["chainId"], 1);
    }

    #[tokio::test]
    async fn batch_requires_contract_array() {
        let state = test_support::state(vec![], vec![]);
        let err = batch_contract_metadata(State(state), Json(serde_json::json!({"contracts": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn batch_keeps_valid_entries_when_others_are_malformed() {
        let state = test_support::state(
            vec![Ok(TransportResponse::new(200, DOC))],
            vec![Ok(TransportResponse::new(200, r#"{"data":{"specs":[]}}"#))],
        );
        let body = serde_json::json!({
            "contracts": [
                { "address": "0x4838b106fce9647bdf1e7877bf73ce8b0bad5f97", "chainId": 1 },
                { "address": "0x4838b106fce9647bdf1e7877bf73ce8b0bad5f97", "chainId": "137" },
                { "chainId": 1 }
            ]
        });

        let Json(batch) = batch_contract_metadata(State(state), Json(body)).await.unwrap();

        assert_eq!(batch.total, 3);
        let statuses: Vec<BatchStatus> = batch.results.iter().map(|entry| entry.status).collect();
        assert_eq!(
            statuses,
            [BatchStatus::Fulfilled, BatchStatus::Rejected, BatchStatus::Rejected]
        );
        assert!(batch.results[0].data.as_ref().unwrap().sources.blob);
        assert_eq!(batch.results[1].contract["chainId"], "137");
        assert_eq!(batch.results[2].index, 2);
        assert!(batch.results[2].error.as_deref().unwrap().contains("address"));
    }

    #[tokio::test]
    async fn batch_mixes_fulfilled_and_rejected() {
        let state = test_support::state(
            vec![Ok(TransportResponse::new(200, DOC))],
            vec![Ok(TransportResponse::new(200, r#"{"data":{"specs":[]}}"#))],
        );
        let body = serde_json::json!({
            "contracts": [
                { "address": "0x4838b106fce9647bdf1e7877bf73ce8b0bad5f97", "chainId": 1 },
                { "address": "0xzz", "chainId": 1 }
            ]
        });

        let Json(batch) = batch_contract_metadata(State(state), Json(body)).await.unwrap();

        assert_eq!(batch.total, 2);
        assert_eq!(batch.results[0].status, BatchStatus::Fulfilled);
        assert_eq!(batch.results[1].status, BatchStatus::Rejected);
        assert!(batch.results[1].error.is_some());
    }
}
