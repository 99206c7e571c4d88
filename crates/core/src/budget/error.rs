//! Budget error types.

use meridian_shared::types::{BudgetId, PlanningPackageId};
use meridian_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::budget::types::BudgetStatus;
use crate::hierarchy::HierarchyError;
use crate::progress::ProgressError;
use crate::schedule::ScheduleError;

/// Budget-related errors.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Attempted an invalid status transition.
    #[error("Invalid budget transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: BudgetStatus,
        /// The attempted target status.
        to: BudgetStatus,
    },

    /// Budget already has a newer version.
    #[error("Budget {budget} has already been revised into {successor}")]
    AlreadyRevised {
        /// Budget being revised.
        budget: BudgetId,
        /// Its existing successor.
        successor: BudgetId,
    },

    /// Budget is not a draft and cannot be modified.
    #[error("Budget is {0} and cannot be modified")]
    NotEditable(BudgetStatus),

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Revision reason is required but not provided.
    #[error("Revision reason is required")]
    RevisionReasonRequired,

    /// Budget total does not reconcile with its hierarchy.
    #[error(
        "Budget does not reconcile: total {budget_total} vs accounts {control_account_total} plus reserves (difference {difference})"
    )]
    Unreconciled {
        /// Budget total.
        budget_total: Decimal,
        /// Sum of control account BAC.
        control_account_total: Decimal,
        /// Unexplained difference.
        difference: Decimal,
    },

    /// Amount cannot be negative.
    #[error("{0} cannot be negative")]
    NegativeAmount(&'static str),

    /// Exchange rate must be positive.
    #[error("Exchange rate must be positive, got {0}")]
    InvalidExchangeRate(Decimal),

    /// Budget not found.
    #[error("Budget not found: {0}")]
    NotFound(BudgetId),

    /// Hierarchy belongs to a different budget version.
    #[error("Hierarchy of budget {hierarchy} does not belong to budget {budget}")]
    HierarchyMismatch {
        /// Budget being operated on.
        budget: BudgetId,
        /// Budget the hierarchy belongs to.
        hierarchy: BudgetId,
    },

    /// Planning package has already been converted.
    #[error("Planning package already converted: {0}")]
    AlreadyConverted(PlanningPackageId),

    /// Converted work packages do not carry the planning package's budget.
    #[error("Work package budgets sum to {got}, planning package holds {expected}")]
    ConversionMismatch {
        /// Planning package total.
        expected: Decimal,
        /// Sum of the new work package budgets.
        got: Decimal,
    },

    /// Budget arithmetic did not fit in a decimal.
    #[error("Arithmetic overflow in budget totals")]
    Overflow,

    /// Hierarchy lookup or edit failed.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// Time-phased distribution failed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Milestone definition rejected.
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

impl BudgetError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTransition { .. }
            | Self::AlreadyRevised { .. }
            | Self::NotEditable(_)
            | Self::AlreadyConverted(_) => ErrorKind::State,
            Self::RejectionReasonRequired
            | Self::RevisionReasonRequired
            | Self::Unreconciled { .. }
            | Self::NegativeAmount(_)
            | Self::InvalidExchangeRate(_)
            | Self::HierarchyMismatch { .. }
            | Self::ConversionMismatch { .. }
            | Self::Overflow => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Hierarchy(err) => err.kind(),
            Self::Schedule(err) => err.kind(),
            Self::Progress(err) => err.kind(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::AlreadyRevised { .. } => "BUDGET_ALREADY_REVISED",
            Self::NotEditable(_) => "BUDGET_NOT_EDITABLE",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::RevisionReasonRequired => "REVISION_REASON_REQUIRED",
            Self::Unreconciled { .. } => "BUDGET_NOT_RECONCILED",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::InvalidExchangeRate(_) => "INVALID_EXCHANGE_RATE",
            Self::NotFound(_) => "BUDGET_NOT_FOUND",
            Self::HierarchyMismatch { .. } => "HIERARCHY_MISMATCH",
            Self::AlreadyConverted(_) => "PLANNING_PACKAGE_CONVERTED",
            Self::ConversionMismatch { .. } => "CONVERSION_MISMATCH",
            Self::Overflow => "BUDGET_OVERFLOW",
            Self::Hierarchy(err) => err.error_code(),
            Self::Schedule(err) => err.error_code(),
            Self::Progress(err) => err.error_code(),
        }
    }
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_transition_error() {
        let err = BudgetError::InvalidTransition {
            from: BudgetStatus::Draft,
            to: BudgetStatus::Baseline,
        };
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("draft"));
        assert!(err.to_string().contains("baseline"));
    }

    #[test]
    fn test_unreconciled_is_validation() {
        let err = BudgetError::Unreconciled {
            budget_total: dec!(100000),
            control_account_total: dec!(95000),
            difference: dec!(5000),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 400);
    }

    #[test]
    fn test_nested_errors_keep_kind() {
        let err = BudgetError::from(ScheduleError::NegativeTotal(dec!(-1)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.error_code(), "NEGATIVE_TOTAL");

        let err = BudgetError::from(HierarchyError::DuplicateCode("X".into()));
        assert_eq!(err.error_code(), "DUPLICATE_CODE");
    }

    #[test]
    fn test_not_editable_is_state() {
        let err = BudgetError::NotEditable(BudgetStatus::Approved);
        assert_eq!(err.kind(), ErrorKind::State);
        let app: AppError = err.into();
        assert_eq!(app.error_code(), "INVALID_STATE");
    }
}
