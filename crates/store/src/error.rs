//! Store error types.

use chrono::NaiveDate;
use meridian_core::baseline::BaselineError;
use meridian_core::budget::BudgetError;
use meridian_core::evm::{EvmError, EvmScope};
use meridian_core::hierarchy::HierarchyError;
use meridian_core::progress::ProgressError;
use meridian_core::rollup::RollupError;
use meridian_shared::types::{BudgetId, ProjectId};
use meridian_shared::{AppError, ErrorKind};
use thiserror::Error;

/// Errors returned by `ProjectStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No project with this id.
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// No budget version with this id in the project.
    #[error("Budget not found: {0}")]
    BudgetNotFound(BudgetId),

    /// A budget version with this id is already stored.
    #[error("Budget {0} already exists")]
    DuplicateBudget(BudgetId),

    /// The project has no approved or baseline budget.
    #[error("Project {0} has no approved or baseline budget")]
    NoCurrentBudget(ProjectId),

    /// No EVM record for the scope at the data date.
    #[error("No EVM record for {scope} at {data_date}")]
    RecordNotFound {
        /// Requested scope.
        scope: EvmScope,
        /// Requested data date.
        data_date: NaiveDate,
    },

    /// The project has never been baselined.
    #[error("Project {0} has no baseline")]
    NoBaseline(ProjectId),

    /// EVM computation or record edit failed.
    #[error(transparent)]
    Evm(#[from] EvmError),

    /// Progress was rejected.
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// Hierarchy lookup failed.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// Budget rule violated.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Baseline rule violated.
    #[error(transparent)]
    Baseline(#[from] BaselineError),

    /// Rollup failed.
    #[error(transparent)]
    Rollup(#[from] RollupError),
}

impl StoreError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ProjectNotFound(_)
            | Self::BudgetNotFound(_)
            | Self::RecordNotFound { .. }
            | Self::NoBaseline(_) => ErrorKind::NotFound,
            Self::DuplicateBudget(_) => ErrorKind::Conflict,
            Self::NoCurrentBudget(_) => ErrorKind::State,
            Self::Evm(err) => err.kind(),
            Self::Progress(err) => err.kind(),
            Self::Hierarchy(err) => err.kind(),
            Self::Budget(err) => err.kind(),
            Self::Baseline(err) => err.kind(),
            Self::Rollup(err) => err.kind(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ProjectNotFound(_) => "PROJECT_NOT_FOUND",
            Self::BudgetNotFound(_) => "BUDGET_NOT_FOUND",
            Self::DuplicateBudget(_) => "DUPLICATE_BUDGET",
            Self::NoCurrentBudget(_) => "NO_CURRENT_BUDGET",
            Self::RecordNotFound { .. } => "EVM_RECORD_NOT_FOUND",
            Self::NoBaseline(_) => "NO_BASELINE",
            Self::Evm(err) => err.error_code(),
            Self::Progress(err) => err.error_code(),
            Self::Hierarchy(err) => err.error_code(),
            Self::Budget(err) => err.error_code(),
            Self::Baseline(err) => err.error_code(),
            Self::Rollup(err) => err.error_code(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}
