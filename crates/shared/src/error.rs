//! Application-wide error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure categories every engine error falls into.
///
/// The service layer uses the kind to decide how a caller must react:
/// fix the input, reload state, retry, or pick a different command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input rejected before anything was written.
    Validation,
    /// Target is approved, baselined, or otherwise read-only.
    Conflict,
    /// Optimistic version mismatch on an aggregate.
    Concurrency,
    /// Lifecycle transition not allowed from the current status.
    State,
    /// Referenced record does not exist.
    NotFound,
    /// Batch work stopped before completion.
    Cancelled,
}

impl ErrorKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::Concurrency => "concurrency",
            Self::State => "state",
            Self::NotFound => "not_found",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Edit attempted on read-only data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Optimistic concurrency failure that survived the retry.
    #[error("Concurrent modification: {0}")]
    Concurrency(String),

    /// Invalid lifecycle transition.
    #[error("Invalid state: {0}")]
    State(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation was cancelled.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds an error of the given kind carrying `message`.
    #[must_use]
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::Concurrency => Self::Concurrency(message),
            ErrorKind::State => Self::State(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Cancelled => Self::Cancelled(message),
        }
    }

    /// Returns the kind of this error, if it maps to one.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Validation(_) => Some(ErrorKind::Validation),
            Self::Conflict(_) => Some(ErrorKind::Conflict),
            Self::Concurrency(_) => Some(ErrorKind::Concurrency),
            Self::State(_) => Some(ErrorKind::State),
            Self::NotFound(_) => Some(ErrorKind::NotFound),
            Self::Cancelled(_) => Some(ErrorKind::Cancelled),
            Self::Internal(_) => None,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) | Self::Concurrency(_) => 409,
            Self::State(_) => 422,
            Self::Cancelled(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Concurrency(_) => "CONCURRENCY_CONFLICT",
            Self::State(_) => "INVALID_STATE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Cancelled(_) => "CANCELLED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
