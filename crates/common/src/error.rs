//! Error types shared across Montage crates.
//!
//! Every failure surfaced to a caller falls into one of five kinds:
//! caller-side validation ([`ErrorKind::InvalidArgument`]), missing
//! entities ([`ErrorKind::NotFound`]), an editor that cannot be reached
//! ([`ErrorKind::BackendUnavailable`]), an editor that refused the request
//! ([`ErrorKind::BackendRejected`]), and policy violations detected by the
//! composer or replacer ([`ErrorKind::Conflict`]).

use serde::{Deserialize, Serialize};

/// Top-level error type for Montage operations.
#[derive(Debug, thiserror::Error)]
pub enum MontageError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Editor unavailable during {operation}: {message}")]
    BackendUnavailable { operation: String, message: String },

    #[error("Editor rejected {operation}: {message}")]
    BackendRejected { operation: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using MontageError.
pub type MontageResult<T> = Result<T, MontageError>;

/// Flat classification of a [`MontageError`], stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    BackendUnavailable,
    BackendRejected,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// Whether the request itself was at fault and changing it can succeed.
    pub fn is_caller_error(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidArgument | ErrorKind::NotFound | ErrorKind::Conflict
        )
    }
}

impl MontageError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn backend_unavailable(operation: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            operation: operation.into(),
            message: msg.into(),
        }
    }

    pub fn backend_rejected(operation: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::BackendRejected {
            operation: operation.into(),
            message: msg.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            Self::BackendRejected { .. } => ErrorKind::BackendRejected,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Config { .. } | Self::Io(_) | Self::Json(_) | Self::Other(_) => {
                ErrorKind::Internal
            }
        }
    }
}
