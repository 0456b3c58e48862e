//! Error types for the managed Redis API client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("operation {id} failed with code {code}: {message}")]
    OperationFailed { id: String, code: i32, message: String },

    #[error("operation {0} carries no usable metadata")]
    MissingMetadata(String),
}

impl ApiError {
    /// True for errors the service maps to a missing resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { code: 404, .. })
    }

    /// Whether a fresh invocation has a chance of succeeding.
    ///
    /// Transport failures and server-side 5xx/409/429 responses are worth a
    /// retry; other client errors and failed operations are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { code, .. } => {
                if (400..500).contains(code) {
                    return *code == 409 || *code == 429;
                }
                *code >= 500
            }
            ApiError::Decode(_) => false,
            ApiError::OperationFailed { .. } => false,
            ApiError::MissingMetadata(_) => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
