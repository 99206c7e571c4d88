//! EVM error types.

use meridian_shared::types::EvmRecordId;
use meridian_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while computing or editing EVM records.
#[derive(Debug, Error)]
pub enum EvmError {
    /// An input measure was negative.
    #[error("{field} must not be negative, got {value}")]
    NegativeValue {
        /// Name of the measure (PV, EV, AC, BAC).
        field: &'static str,
        /// The rejected value.
        value: Decimal,
    },

    /// A derived metric did not fit in a decimal.
    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),

    /// The record has been approved and is read-only.
    #[error("EVM record {0} is approved and cannot be modified")]
    RecordApproved(EvmRecordId),

    /// The record carries the baseline flag and is read-only.
    #[error("EVM record {0} is a baseline record and cannot be modified")]
    RecordBaselined(EvmRecordId),
}

impl EvmError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NegativeValue { .. } | Self::Overflow(_) => ErrorKind::Validation,
            Self::RecordApproved(_) | Self::RecordBaselined(_) => ErrorKind::Conflict,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeValue { .. } => "NEGATIVE_EVM_VALUE",
            Self::Overflow(_) => "EVM_OVERFLOW",
            Self::RecordApproved(_) => "EVM_RECORD_APPROVED",
            Self::RecordBaselined(_) => "EVM_RECORD_BASELINED",
        }
    }
}

impl From<EvmError> for AppError {
    fn from(err: EvmError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}
