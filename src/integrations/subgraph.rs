use crate::{
    error::{AppError, Result},
    integrations::http::HttpTransport,
    models::{ContractAddress, ContractRecord, ContractSpecs, FunctionRecord, SpecHistory, SpecRecord},
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::sync::Arc;

const SPEC_FIELDS: &str = "id user blobHash status blockTimestamp targetContract chainID";
const CONTRACT_FIELDS: &str =
    "address chainID name version description hasApprovedMetadata latestSpecTimestamp functionCount";

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SpecsData {
    #[serde(default)]
    specs: Vec<SpecRecord>,
}

#[derive(Debug, Deserialize)]
struct ContractsData {
    #[serde(default)]
    contracts: Vec<ContractRecord>,
}

#[derive(Debug, Deserialize)]
struct FunctionsData {
    #[serde(default)]
    functions: Vec<FunctionRecord>,
}

/// Read-only client for the KaiSign subgraph.
#[derive(Clone)]
pub struct SubgraphClient {
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
}

impl SubgraphClient {
    pub fn new(endpoint: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let payload = json!({ "query": query, "variables": variables });
        let response = self
            .transport
            .post_json(&self.endpoint, &payload)
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Subgraph request failed: {}", e)))?;

        if !response.is_success() {
            return Err(AppError::ExternalAPI(format!(
                "Subgraph request failed: {} - {}",
                response.status, response.body
            )));
        }

        let parsed: GraphQLResponse<T> = serde_json::from_str(&response.body)
            .map_err(|e| AppError::ExternalAPI(format!("Subgraph response parse failed: {}", e)))?;

        if !parsed.errors.is_empty() {
            let messages: Vec<&str> = parsed.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(AppError::ExternalAPI(format!(
                "Subgraph query error: {}",
                messages.join("; ")
            )));
        }

        parsed
            .data
            .ok_or_else(|| AppError::ExternalAPI("Subgraph response missing data".to_string()))
    }

    /// Every spec targeting the contract, newest first.
    ///
    /// The subgraph only stores blob hashes, so `blob_metadata` is left empty.
    pub async fn get_complete_contract_metadata(
        &self,
        address: &ContractAddress,
        chain_id: u64,
    ) -> Result<ContractSpecs> {
        let query = format!(
            "query GetContractSpecs($targetContract: Bytes!, $chainID: String!) {{
  specs(where: {{ targetContract: $targetContract, chainID: $chainID }}, orderBy: blockTimestamp, orderDirection: desc) {{ {} }}
}}",
            SPEC_FIELDS
        );
        let data: SpecsData = self
            .request(
                &query,
                json!({ "targetContract": address.to_string(), "chainID": chain_id.to_string() }),
            )
            .await?;

        tracing::debug!(
            "Subgraph returned {} specs for {} on chain {}",
            data.specs.len(),
            address,
            chain_id
        );
        Ok(ContractSpecs {
            specs: data.specs,
            blob_metadata: None,
        })
    }

    /// Finalized specs for a contract, newest first.
    pub async fn get_contract_spec_history(
        &self,
        address: &ContractAddress,
        chain_id: u64,
    ) -> Result<Vec<SpecHistory>> {
        let query = format!(
            "query GetSpecHistory($targetContract: Bytes!, $chainID: String!) {{
  specs(where: {{ targetContract: $targetContract, chainID: $chainID, status: FINALIZED }}, orderBy: blockTimestamp, orderDirection: desc) {{ {} }}
}}",
            SPEC_FIELDS
        );
        let data: SpecsData = self
            .request(
                &query,
                json!({ "targetContract": address.to_string(), "chainID": chain_id.to_string() }),
            )
            .await?;
        Ok(data.specs.into_iter().map(SpecHistory::from).collect())
    }

    pub async fn get_contracts_with_metadata(&self, chain_id: u64) -> Result<Vec<ContractRecord>> {
        let query = format!(
            "query GetContracts($chainID: String!) {{
  contracts(where: {{ chainID: $chainID, hasApprovedMetadata: true }}) {{ {} }}
}}",
            CONTRACT_FIELDS
        );
        let data: ContractsData = self
            .request(&query, json!({ "chainID": chain_id.to_string() }))
            .await?;
        Ok(data.contracts)
    }

    pub async fn get_contract_functions(
        &self,
        address: &ContractAddress,
        chain_id: u64,
    ) -> Result<Vec<FunctionRecord>> {
        let query = "query GetContractFunctions($contractId: String!) {
  functions(where: { contract: $contractId }) { selector name intent parameterTypes displayFormat }
}";
        let contract_id = format!("{}-{}", address, chain_id);
        let data: FunctionsData = self
            .request(query, json!({ "contractId": contract_id }))
            .await?;
        Ok(data.functions)
    }

    /// Case-insensitive name search over approved contracts.
    pub async fn search_contracts(
        &self,
        term: &str,
        chain_id: Option<u64>,
    ) -> Result<Vec<ContractRecord>> {
        let (query, variables) = match chain_id {
            Some(chain_id) => (
                format!(
                    "query SearchContracts($term: String!, $chainID: String!) {{
  contracts(where: {{ hasApprovedMetadata: true, chainID: $chainID, name_contains_nocase: $term }}) {{ {} }}
}}",
                    CONTRACT_FIELDS
                ),
                json!({ "term": term, "chainID": chain_id.to_string() }),
            ),
            None => (
                format!(
                    "query SearchContracts($term: String!) {{
  contracts(where: {{ hasApprovedMetadata: true, name_contains_nocase: $term }}) {{ {} }}
}}",
                    CONTRACT_FIELDS
                ),
                json!({ "term": term }),
            ),
        };
        let data: ContractsData = self.request(&query, variables).await?;
        Ok(data.contracts)
    }

    /// Specs submitted by `user`; `finalized_only` restricts to FINALIZED.
    pub async fn get_user_specs(
        &self,
        user: &ContractAddress,
        finalized_only: bool,
    ) -> Result<Vec<SpecHistory>> {
        let status_filter = if finalized_only { ", status: FINALIZED" } else { "" };
        let query = format!(
            "query GetUserSpecs($user: Bytes!) {{
  specs(where: {{ user: $user{} }}, orderBy: blockTimestamp, orderDirection: desc) {{ {} }}
}}",
            status_filter, SPEC_FIELDS
        );
        let data: SpecsData = self
            .request(&query, json!({ "user": user.to_string() }))
            .await?;
        Ok(data.specs.into_iter().map(SpecHistory::from).collect())
    }
}
