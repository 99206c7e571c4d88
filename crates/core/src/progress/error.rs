//! Progress error types.

use chrono::NaiveDate;
use meridian_shared::types::WorkPackageId;
use meridian_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::evm::EvmError;

/// Errors raised while recording or evaluating progress.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// Input names a different work package than the tracker.
    #[error("Progress for work package {got} sent to tracker of {expected}")]
    WorkPackageMismatch {
        /// Work package the tracker belongs to.
        expected: WorkPackageId,
        /// Work package named in the input.
        got: WorkPackageId,
    },

    /// Percentage outside 0..=100.
    #[error("Progress percentage must be between 0 and 100, got {0}")]
    PercentageOutOfRange(Decimal),

    /// A cost was negative.
    #[error("{field} cannot be negative: {value}")]
    NegativeCost {
        /// Name of the cost field.
        field: &'static str,
        /// The rejected value.
        value: Decimal,
    },

    /// Entry dated before the latest recorded entry.
    #[error("Progress date {date} is before the last entry on {last}")]
    OutOfOrder {
        /// Date of the rejected entry.
        date: NaiveDate,
        /// Date of the latest entry.
        last: NaiveDate,
    },

    /// Percentage would fall below an approved entry.
    #[error("Progress {percentage}% is below the approved {approved}%")]
    BelowApproved {
        /// Requested percentage.
        percentage: Decimal,
        /// Latest approved percentage.
        approved: Decimal,
    },

    /// Percentage would fall for a method that only moves forward.
    #[error("Progress {percentage}% is below the last recorded {last}%")]
    Regression {
        /// Requested percentage.
        percentage: Decimal,
        /// Latest recorded percentage.
        last: Decimal,
    },

    /// Milestone name not defined on the work package.
    #[error("Unknown milestone: {0}")]
    UnknownMilestone(String),

    /// Milestone already completed.
    #[error("Milestone already completed: {0}")]
    MilestoneAlreadyCompleted(String),

    /// Milestone completion dated inside an approved period.
    #[error("Milestone date {date} falls in the period approved through {approved_through}")]
    MilestoneInApprovedPeriod {
        /// Requested completion date.
        date: NaiveDate,
        /// Date of the latest approved entry.
        approved_through: NaiveDate,
    },

    /// Milestone defined twice.
    #[error("Duplicate milestone: {0}")]
    DuplicateMilestone(String),

    /// Milestone weights must be non-negative and sum to 100.
    #[error("Milestone weights must sum to 100, got {0}")]
    MilestoneWeights(Decimal),

    /// Earned value did not fit in a decimal.
    #[error("Arithmetic overflow while computing earned value")]
    Overflow,

    /// Derived values were rejected by the calculator.
    #[error(transparent)]
    Evm(#[from] EvmError),
}

impl ProgressError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BelowApproved { .. } | Self::MilestoneInApprovedPeriod { .. } => ErrorKind::Conflict,
            Self::UnknownMilestone(_) => ErrorKind::NotFound,
            Self::Evm(err) => err.kind(),
            _ => ErrorKind::Validation,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::WorkPackageMismatch { .. } => "WORK_PACKAGE_MISMATCH",
            Self::PercentageOutOfRange(_) => "PERCENTAGE_OUT_OF_RANGE",
            Self::NegativeCost { .. } => "NEGATIVE_COST",
            Self::OutOfOrder { .. } => "PROGRESS_OUT_OF_ORDER",
            Self::BelowApproved { .. } => "PROGRESS_BELOW_APPROVED",
            Self::Regression { .. } => "PROGRESS_REGRESSION",
            Self::UnknownMilestone(_) => "UNKNOWN_MILESTONE",
            Self::MilestoneAlreadyCompleted(_) => "MILESTONE_ALREADY_COMPLETED",
            Self::MilestoneInApprovedPeriod { .. } => "MILESTONE_IN_APPROVED_PERIOD",
            Self::DuplicateMilestone(_) => "DUPLICATE_MILESTONE",
            Self::MilestoneWeights(_) => "INVALID_MILESTONE_WEIGHTS",
            Self::Overflow => "EARNED_VALUE_OVERFLOW",
            Self::Evm(err) => err.error_code(),
        }
    }
}

impl From<ProgressError> for AppError {
    fn from(err: ProgressError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}
