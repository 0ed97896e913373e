use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("API request failed: {status} - {body}")]
    Backend { status: u16, body: String },

    #[error("Backend service is currently unavailable after {attempts} attempts ({last}). Please try again later.")]
    RetryExhausted { attempts: u32, last: String },

    #[error("Malformed response: {0}")]
    Protocol(String),

    #[error("External API error: {0}")]
    ExternalAPI(String),

    #[error("Source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// HTTP status and stable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Backend { .. } => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
            AppError::RetryExhausted { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            AppError::Protocol(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PROTOCOL_ERROR"),
            AppError::ExternalAPI(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR"),
            AppError::SourceUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "SOURCE_UNAVAILABLE")
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let details = match &self {
            AppError::Backend { status, body } => Some(serde_json::json!({
                "status": status,
                "body": body,
            })),
            AppError::RetryExhausted { attempts, .. } => {
                Some(serde_json::json!({ "attempts": attempts }))
            }
            _ => None,
        };

        match status {
            s if s.is_server_error() => tracing::error!("{}", self),
            _ => tracing::debug!("{}", self),
        }

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
