use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

/// Error payload returned by every failing endpoint.
///
/// `error` is a short human readable summary. `details` itemizes each
/// violated constraint for validation failures and is omitted otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{error}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            code,
            error: error.into(),
            details: Vec::new(),
        }
    }

    pub fn validation(details: Vec<String>) -> Self {
        Self {
            code: ErrorCode::Validation,
            error: "Validation failed".into(),
            details,
        }
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, error)
    }

    /// Text suitable for a user-facing notification: the itemized details
    /// when present, the summary otherwise.
    pub fn display_message(&self) -> String {
        if self.details.is_empty() {
            self.error.clone()
        } else {
            self.details.join(", ")
        }
    }
}
