//! Error types for bytecraft
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (unknown id, invalid import, bad args)
//! - 3: Blocked by policy (mutation attempted while offline)
//! - 4: Operation failed (storage, serialization, network)

use std::path::PathBuf;
use thiserror::Error;

use crate::gate::Mutation;
use crate::model::EntityKind;

/// Exit codes for the bytecraft CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for bytecraft operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("Deleted item not found: {0}")]
    DeletedItemNotFound(i64),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Policy blocks (exit code 3)
    #[error("Offline: {0} is disabled until the network is back")]
    Offline(Mutation),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Network request failed for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::NotFound { .. }
            | Error::DeletedItemNotFound(_)
            | Error::Validation(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_) => exit_codes::USER_ERROR,

            // Policy blocks
            Error::Offline(_) => exit_codes::POLICY_BLOCKED,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::LockFailed(_)
            | Error::Network { .. }
            | Error::Storage(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound { kind, id } => Some(serde_json::json!({
                "type": kind.tag(),
                "id": id,
            })),
            Error::DeletedItemNotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::Offline(mutation) => Some(serde_json::json!({
                "action": mutation.to_string(),
            })),
            Error::Network { url, .. } => Some(serde_json::json!({ "url": url })),
            _ => None,
        }
    }

    /// Whether this error was raised by a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::DeletedItemNotFound(_))
    }
}

/// Result type alias for bytecraft operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
