use crate::{
    constants::{
        BLOB_METADATA_PATH, METADATA_INITIAL_BACKOFF_MS, METADATA_MAX_RETRIES,
        RETRYABLE_STATUS_CODES, SPEC_METADATA_PATH,
    },
    error::{AppError, Result},
    integrations::http::{join_url, Backoff, HttpTransport, TransportError, TransportResponse},
    models::{ContractAddress, Erc7730Document, MetadataQuery, SpecId, SpecMetadataResponse},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{sync::Arc, time::Duration};

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: METADATA_MAX_RETRIES,
            initial_delay: Duration::from_millis(METADATA_INITIAL_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (zero-based): initial * 2^retry.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_delay
            .saturating_mul(1_u32.checked_shl(retry).unwrap_or(u32::MAX))
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&status)
}

/// Client for the Python metadata backend.
///
/// Every call is a single logical request; transient gateway errors and
/// network failures are retried per `RetryPolicy`, everything else surfaces
/// on the first attempt.
#[derive(Clone)]
pub struct MetadataBackendClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    backoff: Arc<dyn Backoff>,
    policy: RetryPolicy,
}

impl MetadataBackendClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        backoff: Arc<dyn Backoff>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            backoff,
            policy: RetryPolicy::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, query: &MetadataQuery) -> String {
        let path = match query {
            MetadataQuery::BySpecId(_) => SPEC_METADATA_PATH,
            MetadataQuery::ByContract { .. } => BLOB_METADATA_PATH,
        };
        join_url(&self.base_url, path)
    }

    /// POSTs `query` and returns the decoded JSON body.
    ///
    /// # Errors
    /// * `Validation` on 422, never retried.
    /// * `Backend` on any other non-2xx that is not 502/503/504.
    /// * `RetryExhausted` when 502/503/504 or network failures outlast the budget.
    /// * `Protocol` when a 2xx body is not JSON.
    pub async fn fetch(&self, query: &MetadataQuery) -> Result<Value> {
        let url = self.endpoint(query);
        let body = query.request_body();
        let attempts = self.policy.max_attempts();
        let mut last_failure = String::new();

        for attempt in 0..attempts {
            tracing::debug!("Calling metadata backend (attempt {}): {}", attempt + 1, url);

            let failure = match self.transport.post_json(&url, &body).await {
                Ok(response) if is_retryable_status(response.status) => {
                    format!("HTTP {}", response.status)
                }
                Ok(response) => return interpret_response(response),
                Err(TransportError::Network(message)) => message,
                Err(TransportError::Other(message)) => {
                    return Err(AppError::ExternalAPI(format!(
                        "Metadata backend request failed: {}",
                        message
                    )));
                }
            };

            if attempt + 1 < attempts {
                let delay = self.policy.delay_for(attempt);
                tracing::warn!(
                    "Backend not ready ({}), retrying in {}ms...",
                    failure,
                    delay.as_millis()
                );
                self.backoff.sleep(delay).await;
            }
            last_failure = failure;
        }

        tracing::error!(
            "Metadata backend unavailable after {} attempts: {}",
            attempts,
            last_failure
        );
        Err(AppError::RetryExhausted {
            attempts,
            last: last_failure,
        })
    }

    async fn fetch_typed<T: DeserializeOwned>(&self, query: &MetadataQuery) -> Result<T> {
        let value = self.fetch(query).await?;
        serde_json::from_value(value)
            .map_err(|e| AppError::Protocol(format!("Unexpected metadata shape: {}", e)))
    }

    /// Looks up the IPFS/blob pointers registered for a spec id.
    pub async fn fetch_spec_metadata(&self, spec_id: &SpecId) -> Result<SpecMetadataResponse> {
        self.fetch_typed(&MetadataQuery::BySpecId(*spec_id)).await
    }

    /// Fetches the ERC-7730 document published for a contract.
    pub async fn fetch_blob_metadata(
        &self,
        address: &ContractAddress,
        chain_id: u64,
    ) -> Result<Erc7730Document> {
        self.fetch_typed(&MetadataQuery::ByContract {
            address: *address,
            chain_id,
        })
        .await
    }
}

// Internal helper that maps a non-retryable reply onto the error taxonomy.
fn interpret_response(response: TransportResponse) -> Result<Value> {
    if response.is_success() {
        return serde_json::from_str(&response.body)
            .map_err(|e| AppError::Protocol(format!("Metadata backend returned invalid JSON: {}", e)));
    }
    if response.status == 422 {
        return Err(validation_error(&response.body));
    }
    Err(AppError::Backend {
        status: response.status,
        body: response.body,
    })
}

// Internal helper that renders a FastAPI-style 422 body.
fn validation_error(body: &str) -> AppError {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            return AppError::Validation(
                "Request validation failed. Please check the request format.".to_string(),
            )
        }
    };

    let message = match parsed.get("detail") {
        Some(Value::Array(items)) => {
            let errors: Vec<String> = items.iter().map(describe_detail).collect();
            format!("Validation failed: {}", errors.join("; "))
        }
        Some(Value::String(detail)) => format!("Validation failed: {}", detail),
        Some(Value::Null) | None => "Request validation failed.".to_string(),
        Some(other) => format!("Validation failed: {}", other),
    };
    AppError::Validation(message)
}

fn describe_detail(item: &Value) -> String {
    let location = item
        .get("loc")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .filter(|loc| !loc.is_empty())
        .unwrap_or_else(|| "field".to_string());
    let message = item
        .get("msg")
        .and_then(Value::as_str)
        .or_else(|| item.get("type").and_then(Value::as_str))
        .unwrap_or("invalid");
    format!("{}: {}", location, message)
}
