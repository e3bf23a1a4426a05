//! Error types for push activation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error domain used for every `ErrorInfo` surfaced to the registerer delegate
pub const PUSH_ERROR_DOMAIN: &str = "io.ably.push";

/// Main error type for push activation
#[derive(Error, Debug)]
pub enum PushError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Transport error: {status} ({code}): {message}")]
    TransportError {
        status: u16,
        code: i64,
        message: String,
    },

    #[error("Delegate callback error: {0}")]
    DelegateCallbackError(ErrorInfo),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl PushError {
    /// Failures after which the persisted state can no longer be trusted
    pub fn poisons_state(&self) -> bool {
        matches!(self, PushError::StorageError(_) | PushError::IoError(_))
    }
}

/// Opaque error carried by failure events and handed to the delegate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub domain: String,
    pub code: i64,
    #[serde(default)]
    pub status_code: Option<u16>,
    pub message: String,
}

impl ErrorInfo {
    /// Create an error in the push error domain
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            domain: PUSH_ERROR_DOMAIN.to_string(),
            code,
            status_code: None,
            message: message.into(),
        }
    }

    /// Attach an HTTP status code
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Rewrap an error reported by the host application into the push
    /// domain, keeping its code and message.
    pub fn from_host(error: &ErrorInfo) -> Self {
        Self {
            domain: PUSH_ERROR_DOMAIN.to_string(),
            code: error.code,
            status_code: error.status_code,
            message: error.message.clone(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(status) => write!(
                f,
                "[{} {}] {} (status {})",
                self.domain, self.code, self.message, status
            ),
            None => write!(f, "[{} {}] {}", self.domain, self.code, self.message),
        }
    }
}

impl std::error::Error for ErrorInfo {}

impl From<&PushError> for ErrorInfo {
    fn from(err: &PushError) -> Self {
        match err {
            PushError::TransportError {
                status,
                code,
                message,
            } => ErrorInfo::new(*code, message.clone()).with_status(*status),
            PushError::HttpError(e) => {
                let info = ErrorInfo::new(50003, e.to_string());
                match e.status() {
                    Some(status) => info.with_status(status.as_u16()),
                    None => info,
                }
            }
            PushError::DelegateCallbackError(info) => ErrorInfo::from_host(info),
            PushError::JsonError(e) => ErrorInfo::new(40000, e.to_string()),
            other => ErrorInfo::new(50000, other.to_string()),
        }
    }
}

impl From<PushError> for ErrorInfo {
    fn from(err: PushError) -> Self {
        ErrorInfo::from(&err)
    }
}
