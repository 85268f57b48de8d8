use crate::api::types::ErrorBody;
use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Fallback text when the backend rejects a request without saying why
pub const GENERIC_REJECTION: &str = "Something went wrong";

/// Errors from talking to the backend. None of them are retried.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request never produced a response, or the body could not be read
    #[error("Failed to connect to server: {0}")]
    Connection(#[source] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("{message} ({status})")]
    Rejected { status: StatusCode, message: String },

    /// Success status with a body we cannot read
    #[error("Unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Local file for an upload could not be read
    #[error("Failed to read {path}: {source}")]
    Upload {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid request: {0}")]
    Invalid(String),
}

impl ApiError {
    /// Build a rejection from the status and raw body, using the backend's
    /// `{"error": ...}` field when present.
    pub fn rejected(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_REJECTION.to_string());
        ApiError::Rejected { status, message }
    }

    /// Message suitable for an alert shown to the user
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Connection(_) => "Failed to connect to server".to_string(),
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Decode { .. } => GENERIC_REJECTION.to_string(),
            ApiError::Upload { path, .. } => format!("Could not read {}", path),
            ApiError::Invalid(message) => message.clone(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Connection(e) => e.status(),
            _ => None,
        }
    }
}
