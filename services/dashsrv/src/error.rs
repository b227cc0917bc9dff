//! Dashboard service error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use pulse_store::StoreError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashError>;

/// Service-level errors surfaced to API clients
#[derive(Debug, Error)]
pub enum DashError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid parameter: {param}: {reason}")]
    InvalidParameter { param: String, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("render error: {0}")]
    Render(String),
}

impl DashError {
    pub fn invalid_parameter(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            // Store round-trip failures: the data source is unavailable
            Self::Store(err) if err.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) | Self::Configuration(_) | Self::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Store(StoreError::NotFound { .. }) => "NOT_FOUND",
            Self::Store(StoreError::InvalidTransition { .. }) => "INVALID_TRANSITION",
            Self::Store(err) if err.is_unavailable() => "DATA_UNAVAILABLE",
            Self::Store(_) => "INTERNAL_ERROR",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Render(_) => "RENDER_ERROR",
        }
    }
}

impl IntoResponse for DashError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.error_code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
