use crate::{
    error::{AppError, Result},
    integrations::{MetadataBackendClient, SubgraphClient},
    models::{
        BatchEntry, BatchStatus, CombinedMetadata, ContractAddress, ContractQuery, ContractSpecs,
        Erc7730Document,
    },
};
use async_trait::async_trait;
use serde::Deserialize;
use futures_util::future::join_all;
use serde_json::Value;
use std::sync::Arc;

/// Indexed source of spec records (the subgraph).
#[async_trait]
pub trait PrimarySource: Send + Sync {
    async fn complete_contract_metadata(
        &self,
        address: &ContractAddress,
        chain_id: u64,
    ) -> Result<ContractSpecs>;
}

/// Source of ERC-7730 documents (the blob metadata backend).
#[async_trait]
pub trait SecondarySource: Send + Sync {
    async fn blob_metadata(&self, address: &ContractAddress, chain_id: u64)
        -> Result<Erc7730Document>;
}

#[async_trait]
impl PrimarySource for SubgraphClient {
    async fn complete_contract_metadata(
        &self,
        address: &ContractAddress,
        chain_id: u64,
    ) -> Result<ContractSpecs> {
        self.get_complete_contract_metadata(address, chain_id).await
    }
}

#[async_trait]
impl SecondarySource for MetadataBackendClient {
    async fn blob_metadata(
        &self,
        address: &ContractAddress,
        chain_id: u64,
    ) -> Result<Erc7730Document> {
        self.fetch_blob_metadata(address, chain_id).await
    }
}

/// Merges subgraph and blob metadata into one provenance-tagged response.
///
/// Source failures never fail a lookup; they are logged and the source is
/// reported as absent in `sources`.
#[derive(Clone)]
pub struct MetadataReconciler {
    primary: Arc<dyn PrimarySource>,
    secondary: Arc<dyn SecondarySource>,
}

impl MetadataReconciler {
    pub fn new(primary: Arc<dyn PrimarySource>, secondary: Arc<dyn SecondarySource>) -> Self {
        Self { primary, secondary }
    }

    /// Resolves one contract. Only address validation can fail.
    pub async fn resolve(&self, address: &str, chain_id: u64) -> Result<CombinedMetadata> {
        let address = ContractAddress::parse(address)?;

        let graph = self.load_primary(&address, chain_id).await;
        let embedded = graph.as_ref().and_then(|specs| specs.blob_metadata.clone());
        let blob = match embedded {
            Some(document) => Some(document),
            None => self.load_secondary(&address, chain_id).await,
        };

        Ok(CombinedMetadata::assemble(
            address,
            chain_id,
            graph.map(|specs| specs.specs),
            blob,
            chrono::Utc::now().to_rfc3339(),
        ))
    }

    /// Resolves every raw `{ address, chainId }` entry concurrently.
    ///
    /// Output order matches input order. An entry that does not decode, or
    /// whose lookup fails, is reported as rejected without affecting the others.
    pub async fn resolve_batch(&self, items: &[Value]) -> Vec<BatchEntry> {
        let outcomes = join_all(items.iter().map(|item| self.resolve_entry(item))).await;

        items
            .iter()
            .zip(outcomes)
            .enumerate()
            .map(|(index, (item, outcome))| match outcome {
                Ok(data) => BatchEntry {
                    index,
                    contract: item.clone(),
                    status: BatchStatus::Fulfilled,
                    data: Some(data),
                    error: None,
                },
                Err(e) => BatchEntry {
                    index,
                    contract: item.clone(),
                    status: BatchStatus::Rejected,
                    data: None,
                    error: Some(e.to_string()),
                },
            })
            .collect()
    }

    async fn resolve_entry(&self, item: &Value) -> Result<CombinedMetadata> {
        let query = ContractQuery::deserialize(item)
            .map_err(|e| AppError::BadRequest(format!("Invalid contract entry: {}", e)))?;
        self.resolve(&query.address, query.chain_id).await
    }

    async fn load_primary(
        &self,
        address: &ContractAddress,
        chain_id: u64,
    ) -> Option<ContractSpecs> {
        match self.primary.complete_contract_metadata(address, chain_id).await {
            Ok(specs) if !specs.specs.is_empty() => Some(specs),
            Ok(_) => {
                tracing::debug!("No indexed specs for {} on chain {}", address, chain_id);
                None
            }
            Err(e) => {
                log_unavailable("graph", e);
                None
            }
        }
    }

    async fn load_secondary(
        &self,
        address: &ContractAddress,
        chain_id: u64,
    ) -> Option<Erc7730Document> {
        match self.secondary.blob_metadata(address, chain_id).await {
            Ok(document) => match document.backend_error() {
                Some(reason) => {
                    log_unavailable("blob", AppError::ExternalAPI(reason.to_string()));
                    None
                }
                None => Some(document),
            },
            Err(e) => {
                log_unavailable("blob", e);
                None
            }
        }
    }
}

fn log_unavailable(source: &str, cause: AppError) {
    let unavailable = AppError::SourceUnavailable {
        source_name: source.to_string(),
        reason: cause.to_string(),
    };
    tracing::warn!("{}", unavailable);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{metadata::SpecStatus, SpecRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VALID: &str = "0x4838b106fce9647bdf1e7877bf73ce8b0bad5f97";

    fn spec() -> SpecRecord {
        SpecRecord {
            id: "0x01".into(),
            user: "0xu".into(),
            blob_hash: "0xb".into(),
            status: SpecStatus::Finalized,
            block_timestamp: "1".into(),
            target_contract: Some(VALID.into()),
            chain_id: Some("1".into()),
        }
    }

    fn document(owner: &str) -> Erc7730Document {
        serde_json::from_value(serde_json::json!({
            "metadata": {
                "owner": owner,
                "functions": {
                    "0x3593564c": {"intent": "Execute"},
                    "0x24856bc3": {"intent": "Execute (no deadline)"},
                    "0x12345678": {"intent": "Other"}
                }
            }
        }))
        .unwrap()
    }

    struct FailingPrimary;

    #[async_trait]
    impl PrimarySource for FailingPrimary {
        async fn complete_contract_metadata(
            &self,
            _: &ContractAddress,
            _: u64,
        ) -> Result<ContractSpecs> {
            Err(AppError::ExternalAPI("subgraph down".into()))
        }
    }

    struct StaticPrimary(ContractSpecs);

    #[async_trait]
    impl PrimarySource for StaticPrimary {
        async fn complete_contract_metadata(
            &self,
            _: &ContractAddress,
            _: u64,
        ) -> Result<ContractSpecs> {
            Ok(self.0.clone())
        }
    }

    /// Delays answers for chain 1 so later queries finish first.
    struct SlowPrimary;

    #[async_trait]
    impl PrimarySource for SlowPrimary {
        async fn complete_contract_metadata(
            &self,
            _: &ContractAddress,
            chain_id: u64,
        ) -> Result<ContractSpecs> {
            if chain_id == 1 {
                for _ in 0..5 {
                    tokio::task::yield_now().await;
                }
            }
            Ok(ContractSpecs {
                specs: vec![spec()],
                blob_metadata: None,
            })
        }
    }

    struct CountingSecondary {
        calls: AtomicUsize,
        reply: Option<Erc7730Document>,
    }

    impl CountingSecondary {
        fn new(reply: Option<Erc7730Document>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply,
            })
        }
    }

    #[async_trait]
    impl SecondarySource for CountingSecondary {
        async fn blob_metadata(&self, _: &ContractAddress, _: u64) -> Result<Erc7730Document> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().ok_or(AppError::RetryExhausted {
                attempts: 4,
                last: "HTTP 503".into(),
            })
        }
    }

    #[tokio::test]
    async fn primary_failure_is_absorbed() {
        let secondary = CountingSecondary::new(Some(document("Uniswap")));
        let reconciler = MetadataReconciler::new(Arc::new(FailingPrimary), secondary.clone());

        let result = reconciler.resolve(VALID, 1).await.unwrap();

        assert!(!result.sources.graph);
        assert!(result.sources.blob);
        assert!(result.metadata.graph.is_none());
        let blob = result.metadata.blob.as_ref().unwrap();
        assert_eq!(blob.owner, Some(serde_json::json!("Uniswap")));
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn both_sources_failing_still_returns_identity() {
        let reconciler =
            MetadataReconciler::new(Arc::new(FailingPrimary), CountingSecondary::new(None));

        let result = reconciler.resolve(VALID, 137).await.unwrap();

        assert!(result.success);
        assert_eq!(result.sources.graph, false);
        assert_eq!(result.sources.blob, false);
        assert_eq!(result.metadata.chain_id, 137);
        assert_eq!(result.metadata.address.to_string(), VALID);
    }

    #[tokio::test]
    async fn both_sources_contribute_disjoint_groups() {
        let primary = StaticPrimary(ContractSpecs {
            specs: vec![spec()],
            blob_metadata: None,
        });
        let reconciler = MetadataReconciler::new(
            Arc::new(primary),
            CountingSecondary::new(Some(document("Uniswap"))),
        );

        let result = reconciler.resolve(VALID, 1).await.unwrap();

        assert!(result.sources.graph && result.sources.blob);
        assert_eq!(result.metadata.graph.as_ref().unwrap().specs.len(), 1);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["metadata"]["recognized"], true);
        assert_eq!(json["metadata"]["owner"], "Uniswap");
    }

    #[tokio::test]
    async fn embedded_blob_metadata_skips_backend() {
        let primary = StaticPrimary(ContractSpecs {
            specs: vec![spec()],
            blob_metadata: Some(document("Embedded")),
        });
        let secondary = CountingSecondary::new(Some(document("Backend")));
        let reconciler = MetadataReconciler::new(Arc::new(primary), secondary.clone());

        let result = reconciler.resolve(VALID, 1).await.unwrap();

        let blob = result.metadata.blob.unwrap();
        assert_eq!(blob.owner, Some(serde_json::json!("Embedded")));
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_spec_list_counts_as_absent() {
        let reconciler = MetadataReconciler::new(
            Arc::new(StaticPrimary(ContractSpecs::default())),
            CountingSecondary::new(None),
        );
        let result = reconciler.resolve(VALID, 1).await.unwrap();
        assert!(!result.sources.graph);
    }

    #[tokio::test]
    async fn backend_error_document_counts_as_absent() {
        let errored: Erc7730Document =
            serde_json::from_value(serde_json::json!({"error": "not found"})).unwrap();
        let reconciler =
            MetadataReconciler::new(Arc::new(FailingPrimary), CountingSecondary::new(Some(errored)));
        let result = reconciler.resolve(VALID, 1).await.unwrap();
        assert!(!result.sources.blob);
        assert!(result.metadata.blob.is_none());
    }

    #[tokio::test]
    async fn functions_keep_source_order() {
        let reconciler = MetadataReconciler::new(
            Arc::new(FailingPrimary),
            CountingSecondary::new(Some(document("Uniswap"))),
        );
        let result = reconciler.resolve(VALID, 1).await.unwrap();
        let selectors: Vec<String> = result
            .metadata
            .blob
            .unwrap()
            .functions
            .into_iter()
            .map(|f| f.selector)
            .collect();
        assert_eq!(selectors, ["0x3593564c", "0x24856bc3", "0x12345678"]);
    }

    #[tokio::test]
    async fn invalid_address_is_rejected() {
        let reconciler =
            MetadataReconciler::new(Arc::new(FailingPrimary), CountingSecondary::new(None));
        let err = reconciler.resolve("0xzz", 1).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn batch_reports_each_query_independently() {
        let reconciler =
            MetadataReconciler::new(Arc::new(SlowPrimary), CountingSecondary::new(None));
        let queries = vec![
            serde_json::json!({ "address": VALID, "chainId": 1 }),
            serde_json::json!({ "address": "0xzz", "chainId": 10 }),
        ];

        let results = reconciler.resolve_batch(&queries).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 0);
        assert_eq!(results[0].status, BatchStatus::Fulfilled);
        assert!(results[0].data.as_ref().unwrap().sources.graph);
        assert!(results[0].error.is_none());
        assert_eq!(results[1].index, 1);
        assert_eq!(results[1].status, BatchStatus::Rejected);
        assert!(results[1].data.is_none());
        assert!(results[1].error.as_deref().unwrap().contains("0xzz"));
        assert_eq!(results[1].contract, queries[1]);
    }

    #[tokio::test]
    async fn malformed_entries_are_rejected_individually() {
        let reconciler =
            MetadataReconciler::new(Arc::new(SlowPrimary), CountingSecondary::new(None));
        let items = vec![
            serde_json::json!({ "address": VALID, "chainId": 1 }),
            serde_json::json!({ "address": VALID, "chainId": "137" }),
            serde_json::json!({ "chainId": 1 }),
            serde_json::json!({ "address": VALID, "chainId": -5 }),
        ];

        let results = reconciler.resolve_batch(&items).await;

        let statuses: Vec<BatchStatus> = results.iter().map(|entry| entry.status).collect();
        assert_eq!(
            statuses,
            [
                BatchStatus::Fulfilled,
                BatchStatus::Rejected,
                BatchStatus::Rejected,
                BatchStatus::Rejected
            ]
        );
        assert!(results[0].data.as_ref().unwrap().sources.graph);
        for (index, entry) in results.iter().enumerate().skip(1) {
            assert_eq!(entry.index, index);
            assert_eq!(entry.contract, items[index]);
            assert!(entry.data.is_none());
            assert!(entry
                .error
                .as_deref()
                .unwrap()
                .contains("Invalid contract entry"));
        }
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let reconciler =
            MetadataReconciler::new(Arc::new(FailingPrimary), CountingSecondary::new(None));
        assert!(reconciler.resolve_batch(&[]).await.is_empty());
    }
}
