use crate::{
    constants::HTTP_CONNECT_TIMEOUT_SECS,
    error::{AppError, Result},
};
use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Status and raw body of an upstream reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request never got a response: connect, timeout, or a dropped body.
    #[error("fetch failed: {0}")]
    Network(String),

    #[error("request error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() {
            TransportError::Network(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// Sleeps between retry attempts.
#[async_trait]
pub trait Backoff: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioBackoff;

#[async_trait]
impl Backoff for TokioBackoff {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client init failed: {}", e)))?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CACHE_CONTROL, "no-cache")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse::new(status, body))
    }
}

/// Joins a base URL and an absolute path without doubling slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Reply = std::result::Result<TransportResponse, TransportError>;

    /// Replays scripted replies in order and records every request.
    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        pub requests: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn post_json(&self, url: &str, body: &Value) -> Reply {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), body.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("no scripted reply".into())))
        }
    }

    /// Records requested delays instead of sleeping.
    #[derive(Default)]
    pub struct RecordingBackoff {
        pub delays: Mutex<Vec<Duration>>,
    }

    impl RecordingBackoff {
        pub fn total(&self) -> Duration {
            self.delays.lock().unwrap().iter().sum()
        }
    }

    #[async_trait]
    impl Backoff for RecordingBackoff {
        async fn sleep(&self, delay: Duration) {
            self.delays.lock().unwrap().push(delay);
        }
    }
}
