//! Schedule error types.

use chrono::NaiveDate;
use meridian_shared::types::Currency;
use meridian_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while building periods or distributing a budget.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Start date falls after end date.
    #[error("Start date {start} is after end date {end}")]
    StartAfterEnd {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// A period boundary fell outside the supported calendar.
    #[error("Date out of supported range near {0}")]
    DateOutOfRange(NaiveDate),

    /// Total budget is negative.
    #[error("Total budget cannot be negative: {0}")]
    NegativeTotal(Decimal),

    /// Total has more precision than the currency's minor unit.
    #[error("Total {total} is finer than the minor unit of {currency}")]
    SubMinorUnitTotal {
        /// The rejected total.
        total: Decimal,
        /// Currency of the distribution.
        currency: Currency,
    },

    /// Manual distribution does not supply one amount per period.
    #[error("Manual distribution has {got} amounts for {expected} periods")]
    PeriodCountMismatch {
        /// Number of periods in range.
        expected: usize,
        /// Number of amounts supplied.
        got: usize,
    },

    /// Manual distribution contains a negative amount.
    #[error("Manual amount for period {index} is negative: {amount}")]
    NegativePeriodAmount {
        /// Zero-based period index.
        index: usize,
        /// The rejected amount.
        amount: Decimal,
    },

    /// Period budgets do not add up to the total.
    #[error("Period budgets sum to {sum}, expected {total}")]
    SumMismatch {
        /// Sum of the period budgets.
        sum: Decimal,
        /// Expected total.
        total: Decimal,
    },

    /// Granularity name not recognised.
    #[error("Unknown period granularity: {0}")]
    UnknownGranularity(String),

    /// Running total did not fit in a decimal.
    #[error("Arithmetic overflow while accumulating period budgets")]
    Overflow,
}

impl ScheduleError {
    /// Returns the failure category. Every schedule error is a validation error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::StartAfterEnd { .. } => "START_AFTER_END",
            Self::DateOutOfRange(_) => "DATE_OUT_OF_RANGE",
            Self::NegativeTotal(_) => "NEGATIVE_TOTAL",
            Self::SubMinorUnitTotal { .. } => "SUB_MINOR_UNIT_TOTAL",
            Self::PeriodCountMismatch { .. } => "PERIOD_COUNT_MISMATCH",
            Self::NegativePeriodAmount { .. } => "NEGATIVE_PERIOD_AMOUNT",
            Self::SumMismatch { .. } => "TIME_PHASED_SUM_MISMATCH",
            Self::UnknownGranularity(_) => "UNKNOWN_GRANULARITY",
            Self::Overflow => "SCHEDULE_OVERFLOW",
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}
