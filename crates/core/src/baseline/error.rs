//! Baseline error types.

use meridian_shared::types::{BudgetId, ProjectId};
use meridian_shared::{AppError, ErrorKind};
use thiserror::Error;

use crate::budget::{BudgetError, BudgetStatus};
use crate::evm::EvmScope;

/// Errors raised while setting or comparing against a baseline.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// Only approved budgets can become the baseline.
    #[error("Budget is {0}; only an approved budget can be baselined")]
    NotApproved(BudgetStatus),

    /// The prior budget is not the project's current baseline.
    #[error("Budget {0} is not the current baseline")]
    PriorNotBaseline(BudgetId),

    /// Two inputs belong to different projects.
    #[error("Expected project {expected}, got {got}")]
    ProjectMismatch {
        /// Project of the budget being baselined.
        expected: ProjectId,
        /// Project of the other input.
        got: ProjectId,
    },

    /// The compared scope is not part of the baseline.
    #[error("Scope {0} is not part of the baseline")]
    ScopeNotInBaseline(EvmScope),

    /// A variance did not fit in a decimal.
    #[error("Arithmetic overflow while comparing to baseline")]
    Overflow,

    /// Budget transition or hierarchy check failed.
    #[error(transparent)]
    Budget(#[from] BudgetError),
}

impl BaselineError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotApproved(_) | Self::PriorNotBaseline(_) => ErrorKind::State,
            Self::ProjectMismatch { .. } | Self::Overflow => ErrorKind::Validation,
            Self::ScopeNotInBaseline(_) => ErrorKind::NotFound,
            Self::Budget(err) => err.kind(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotApproved(_) => "BUDGET_NOT_APPROVED",
            Self::PriorNotBaseline(_) => "PRIOR_NOT_BASELINE",
            Self::ProjectMismatch { .. } => "PROJECT_MISMATCH",
            Self::ScopeNotInBaseline(_) => "SCOPE_NOT_IN_BASELINE",
            Self::Overflow => "BASELINE_OVERFLOW",
            Self::Budget(err) => err.error_code(),
        }
    }
}

impl From<BaselineError> for AppError {
    fn from(err: BaselineError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}
