use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend reply for a spec-id lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecMetadataResponse {
    pub spec_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipfs_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// ERC-7730 descriptor as served by the blob metadata backend.
///
/// Only the sections the reconciler reads are typed; everything else rides
/// along in `extra` so the document re-serializes unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Erc7730Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Erc7730Metadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Erc7730Document {
    /// Error string reported by the backend in place of a descriptor, if any.
    pub fn backend_error(&self) -> Option<&str> {
        self.extra.get("error").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Erc7730Metadata {
    #[serde(rename = "appDomain", default, skip_serializing_if = "Option::is_none")]
    pub app_domain: Option<Value>,
    /// Selector -> display format, in document order. Kept untyped so an
    /// off-shape section does not cost the rest of the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constants: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enums: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpecStatus {
    Committed,
    Submitted,
    Proposed,
    Finalized,
    Cancelled,
    #[serde(other)]
    Other,
}

/// Spec row as indexed by the subgraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecRecord {
    pub id: String,
    pub user: String,
    pub blob_hash: String,
    pub status: SpecStatus,
    pub block_timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_contract: Option<String>,
    #[serde(rename = "chainID", default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecHistory {
    pub id: String,
    pub creator: String,
    pub blob_hash: String,
    pub created_timestamp: String,
    pub status: SpecStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_contract: Option<String>,
}

impl From<SpecRecord> for SpecHistory {
    fn from(record: SpecRecord) -> Self {
        Self {
            id: record.id,
            creator: record.user,
            blob_hash: record.blob_hash,
            created_timestamp: record.block_timestamp,
            status: record.status,
            target_contract: record.target_contract,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub address: String,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub has_approved_metadata: bool,
    #[serde(default)]
    pub latest_spec_timestamp: Option<String>,
    #[serde(default)]
    pub function_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRecord {
    pub selector: String,
    pub name: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub parameter_types: Vec<String>,
    #[serde(default)]
    pub display_format: Option<String>,
}

/// Result of the primary (subgraph) lookup for one contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractSpecs {
    pub specs: Vec<SpecRecord>,
    pub blob_metadata: Option<Erc7730Document>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erc7730_keeps_function_order_and_unknown_fields() {
        let raw = r#"{
            "context": {"contract": {"deployedOn": "1"}},
            "metadata": {
                "functions": {
                    "0xffff0000": {"intent": "Last"},
                    "0x00000001": {"intent": "First"}
                },
                "owner": "Uniswap",
                "custom": 7
            },
            "display": {"formats": {}}
        }"#;
        let doc: Erc7730Document = serde_json::from_str(raw).unwrap();
        let metadata = doc.metadata.as_ref().unwrap();
        let selectors: Vec<&String> = metadata
            .functions
            .as_ref()
            .and_then(Value::as_object)
            .unwrap()
            .keys()
            .collect();
        assert_eq!(selectors, ["0xffff0000", "0x00000001"]);
        assert_eq!(metadata.extra.get("custom"), Some(&Value::from(7)));
        assert!(doc.extra.contains_key("display"));
        assert!(doc.backend_error().is_none());
    }

    #[test]
    fn erc7730_tolerates_off_type_sections() {
        let doc: Erc7730Document = serde_json::from_value(serde_json::json!({
            "metadata": {
                "appDomain": {"name": "uniswap.org"},
                "functions": [{"selector": "0xa9059cbb"}],
                "owner": "Uniswap"
            }
        }))
        .unwrap();
        let metadata = doc.metadata.as_ref().unwrap();
        assert!(metadata.functions.as_ref().unwrap().is_array());
        assert_eq!(metadata.owner, Some(Value::from("Uniswap")));
    }

    #[test]
    fn spec_status_tolerates_unknown_values() {
        let record: SpecRecord = serde_json::from_str(
            r#"{"id":"1","user":"0xa","blobHash":"0xb","status":"DISPUTED","blockTimestamp":"10"}"#,
        )
        .unwrap();
        assert_eq!(record.status, SpecStatus::Other);
        assert!(record.target_contract.is_none());
    }

    #[test]
    fn spec_history_maps_user_to_creator() {
        let record = SpecRecord {
            id: "0x01".into(),
            user: "0xabc".into(),
            blob_hash: "0xblob".into(),
            status: SpecStatus::Finalized,
            block_timestamp: "1700000000".into(),
            target_contract: None,
            chain_id: Some("1".into()),
        };
        let history = SpecHistory::from(record);
        assert_eq!(history.creator, "0xabc");
        assert_eq!(history.created_timestamp, "1700000000");
    }
}
