//! Client error types

use kipesa_core::CoreError;
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

/// Client error types
///
/// Errors are `Clone` because a single outcome is handed to every caller
/// that joined the same in-flight request.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Connection or transport failure
    #[error("Request failed: {0}")]
    Network(String),

    /// No response within the request's time bound
    #[error("Request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// Server returned a non-2xx status
    #[error("Server error {status}: {message}")]
    Status {
        status: u16,
        message: String,
        /// `detail` field of a JSON error body, when present
        detail: Option<JsonValue>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Persisted state could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// The task driving the request ended abnormally
    #[error("Request task failed: {0}")]
    TaskFailed(String),
}

impl ClientError {
    /// Create error from an HTTP status code and response body
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<JsonValue>(body)
            .ok()
            .and_then(|value| value.get("detail").cloned());

        let message = match &detail {
            Some(JsonValue::String(text)) => text.clone(),
            _ if !body.trim().is_empty() => body.to_string(),
            _ => status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string(),
        };

        Self::Status {
            status: status.as_u16(),
            message,
            detail,
        }
    }

    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human readable `detail` sent by the server, if it sent a plain string
    pub fn detail_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                detail: Some(JsonValue::String(text)),
                ..
            } => Some(text),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Configuration(err.to_string())
        } else if err.is_decode() {
            Self::Serialization(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidConfig { message } => Self::Configuration(message),
            CoreError::Serialization { message } => Self::Serialization(message),
            CoreError::Io { message } | CoreError::Storage { message } => Self::Storage(message),
        }
    }
}
