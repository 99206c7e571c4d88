//! Rollup error types.

use meridian_shared::types::ProjectId;
use meridian_shared::{AppError, ErrorKind};
use thiserror::Error;

use crate::evm::{EvmError, EvmScope};
use crate::hierarchy::HierarchyError;
use crate::progress::ProgressError;

/// Errors raised while aggregating or committing rollups.
#[derive(Debug, Error)]
pub enum RollupError {
    /// The scope changed since it was loaded.
    #[error("Scope {scope} was modified concurrently: expected version {expected}, found {found}")]
    VersionConflict {
        /// Scope being committed.
        scope: EvmScope,
        /// Version read at load time.
        expected: u64,
        /// Version found at commit time.
        found: u64,
    },

    /// The batch was cancelled.
    #[error("Rollup cancelled after {committed} scope commits")]
    Cancelled {
        /// Scopes fully committed before cancellation.
        committed: usize,
    },

    /// No project with this id.
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// A project has no current budget version to roll up.
    #[error("Project {0} has no approved or baseline budget")]
    NoCurrentBudget(ProjectId),

    /// A rollup worker stopped without reporting.
    #[error("Rollup worker failed: {0}")]
    Worker(String),

    /// Metric computation or record edit failed.
    #[error(transparent)]
    Evm(#[from] EvmError),

    /// Work package evaluation failed.
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// Hierarchy lookup failed.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

impl RollupError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::VersionConflict { .. } => ErrorKind::Concurrency,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::ProjectNotFound(_) => ErrorKind::NotFound,
            Self::NoCurrentBudget(_) | Self::Worker(_) => ErrorKind::State,
            Self::Evm(err) => err.kind(),
            Self::Progress(err) => err.kind(),
            Self::Hierarchy(err) => err.kind(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::VersionConflict { .. } => "CONCURRENT_MODIFICATION",
            Self::Cancelled { .. } => "ROLLUP_CANCELLED",
            Self::ProjectNotFound(_) => "PROJECT_NOT_FOUND",
            Self::NoCurrentBudget(_) => "NO_CURRENT_BUDGET",
            Self::Worker(_) => "ROLLUP_WORKER_FAILED",
            Self::Evm(err) => err.error_code(),
            Self::Progress(err) => err.error_code(),
            Self::Hierarchy(err) => err.error_code(),
        }
    }

    /// Returns true if reloading and retrying may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Concurrency)
    }
}

impl From<RollupError> for AppError {
    fn from(err: RollupError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}
