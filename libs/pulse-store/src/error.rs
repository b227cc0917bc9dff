//! Store Error Types

use pulse_model::types::UnknownValue;
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Data layer errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Row not found
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Lifecycle transition rejected (transitions only move forward)
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Query or mutation round-trip failed
    #[error("database error: {0}")]
    Database(String),

    /// Stored value could not be decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Change-notification channel error
    #[error("notify error: {0}")]
    Notify(String),
}

impl StoreError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Whether the caller should treat this as data-unavailable
    /// (stale-but-visible policy) rather than a client error.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Notify(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::not_found("row"),
            other => StoreError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<UnknownValue> for StoreError {
    fn from(err: UnknownValue) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<uuid::Error> for StoreError {
    fn from(err: uuid::Error) -> Self {
        StoreError::Serialization(format!("invalid uuid: {}", err))
    }
}
