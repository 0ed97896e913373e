use super::{ContractAddress, Erc7730Document, SpecRecord};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Which upstream sources contributed to a combined result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceFlags {
    pub graph: bool,
    pub blob: bool,
}

/// Indexed fields, present only when the subgraph returned specs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphGroup {
    pub specs: Vec<SpecRecord>,
    pub recognized: bool,
    pub graph: bool,
}

/// One entry of the ERC-7730 selector map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionEntry {
    pub selector: String,
    pub name: String,
    pub intent: Value,
    pub fields: Value,
}

/// Display fields, present only when blob metadata was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlobGroup {
    pub erc7730: Erc7730Document,
    pub functions: Vec<FunctionEntry>,
    pub constants: Value,
    pub enums: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
}

impl BlobGroup {
    pub fn from_document(erc7730: Erc7730Document) -> Self {
        let metadata = erc7730.metadata.clone().unwrap_or_default();
        let functions = match metadata.functions {
            Some(Value::Object(map)) => map
                .into_iter()
                .map(|(selector, format)| FunctionEntry {
                    name: selector.clone(),
                    intent: format.get("intent").cloned().unwrap_or(Value::Null),
                    fields: format.get("fields").cloned().unwrap_or(Value::Null),
                    selector,
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            functions,
            constants: metadata.constants.unwrap_or_else(|| Value::Object(Default::default())),
            enums: metadata.enums.unwrap_or_else(|| Value::Object(Default::default())),
            owner: metadata.owner,
            info: metadata.info,
            erc7730,
        }
    }
}

/// `metadata` object of a combined response.
///
/// The two groups never share a key, so flattening them cannot overwrite
/// one source with the other.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataView {
    pub address: ContractAddress,
    pub chain_id: u64,
    #[serde(flatten)]
    pub graph: Option<GraphGroup>,
    #[serde(flatten)]
    pub blob: Option<BlobGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedMetadata {
    pub success: bool,
    pub contract_address: ContractAddress,
    pub chain_id: u64,
    pub metadata: MetadataView,
    pub sources: SourceFlags,
    pub timestamp: String,
}

impl CombinedMetadata {
    /// Builds a response whose `sources` flags always match the groups present.
    pub fn assemble(
        address: ContractAddress,
        chain_id: u64,
        specs: Option<Vec<SpecRecord>>,
        blob: Option<Erc7730Document>,
        timestamp: String,
    ) -> Self {
        let graph = specs.map(|specs| GraphGroup {
            specs,
            recognized: true,
            graph: true,
        });
        let blob = blob.map(BlobGroup::from_document);
        let sources = SourceFlags {
            graph: graph.is_some(),
            blob: blob.is_some(),
        };

        Self {
            success: true,
            contract_address: address,
            chain_id,
            metadata: MetadataView {
                address,
                chain_id,
                graph,
                blob,
            },
            sources,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Fulfilled,
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub index: usize,
    /// The entry exactly as the caller sent it.
    pub contract: Value,
    pub status: BatchStatus,
    pub data: Option<CombinedMetadata>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub total: usize,
    pub results: Vec<BatchEntry>,
    pub timestamp: String,
}
