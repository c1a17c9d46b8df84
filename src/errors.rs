use std::fmt;

use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

#[derive(Debug)]
pub enum SyncError {
    ValidationError(Vec<FieldError>),
    NotAuthenticated,
    NotFound(String),
    Store(StoreError),
    InvalidImage(String),
    InternalError(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            SyncError::NotAuthenticated => write!(f, "User not authenticated"),
            SyncError::NotFound(msg) => write!(f, "Not found: {}", msg),
            SyncError::Store(err) => write!(f, "Store error: {}", err),
            SyncError::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
            SyncError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<ValidationErrors> for SyncError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        SyncError::ValidationError(field_errors)
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::Store(err)
    }
}

impl From<anyhow::Error> for SyncError {
    fn from(err: anyhow::Error) -> Self {
        SyncError::InternalError(err.to_string())
    }
}

/// Errors raised by a remote document store or blob store adapter.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display("Request failed: {_0}")]
    Request(String),

    #[display("Unexpected status code {_0}")]
    Status(u16),

    #[display("Decode error: {_0}")]
    Decode(String),

    #[display("Document not found: {_0}")]
    DocumentNotFound(String),

    #[display("Watch channel closed")]
    WatchClosed,

    #[display("Invalid store URL: {_0}")]
    InvalidUrl(String),
}

impl std::error::Error for StoreError {}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => StoreError::Status(status.as_u16()),
            None => StoreError::Request(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for StoreError {
    fn from(err: url::ParseError) -> Self {
        StoreError::InvalidUrl(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
