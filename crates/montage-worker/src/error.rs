//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Result code reported when a service gave no usable response at all.
pub const NO_RESPONSE_CODE: &str = "res_none";

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{service} failed (code {result_code}): {message}")]
    ServiceUnavailable {
        service: String,
        result_code: String,
        message: String,
    },

    #[error("{service} returned no usable clips")]
    EmptyResult { service: String },

    #[error(
        "Footage too short: requested {requested:.3}s from {candidates} candidates, short by {shortfall:.3}s"
    )]
    DurationShortage {
        requested: f64,
        candidates: usize,
        shortfall: f64,
    },

    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    #[error("Invalid configuration for {key}: {message}")]
    ConfigInvalid { key: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] montage_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] montage_media::MediaError),

    #[error("ML service error: {0}")]
    Ml(#[from] montage_ml_client::MlError),

    #[error("Model error: {0}")]
    Model(#[from] montage_models::ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn service_unavailable(
        service: impl Into<String>,
        result_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ServiceUnavailable {
            service: service.into(),
            result_code: result_code.into(),
            message: message.into(),
        }
    }

    pub fn empty_result(service: impl Into<String>) -> Self {
        Self::EmptyResult {
            service: service.into(),
        }
    }

    pub fn config_missing(key: impl Into<String>) -> Self {
        Self::ConfigMissing(key.into())
    }

    pub fn config_invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Short label used for failure counters.
    pub fn failure_code(&self) -> &str {
        match self {
            WorkerError::ServiceUnavailable { result_code, .. } => result_code,
            WorkerError::EmptyResult { .. } => "empty_result",
            WorkerError::DurationShortage { .. } => "duration_shortage",
            WorkerError::ConfigMissing(_) | WorkerError::ConfigInvalid { .. } => "config",
            WorkerError::InvalidRequest(_) => "invalid_request",
            WorkerError::Storage(_) => "storage",
            WorkerError::Media(_) => "media",
            WorkerError::Ml(_) => "ml",
            WorkerError::Model(_) => "model",
            WorkerError::Io(_) => "io",
            WorkerError::Json(_) => "json",
        }
    }

    /// Whether the failure is a footage shortage rather than a service or setup problem.
    pub fn is_shortage(&self) -> bool {
        matches!(self, WorkerError::DurationShortage { .. })
    }
}
