//! Hierarchy error types.

use meridian_shared::types::{ControlAccountId, PlanningPackageId, WorkPackageId};
use meridian_shared::{AppError, ErrorKind};
use thiserror::Error;

/// Errors raised by `CostHierarchy` lookups and edits.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// Control account not found.
    #[error("Control account not found: {0}")]
    ControlAccountNotFound(ControlAccountId),

    /// Work package not found.
    #[error("Work package not found: {0}")]
    WorkPackageNotFound(WorkPackageId),

    /// Planning package not found.
    #[error("Planning package not found: {0}")]
    PlanningPackageNotFound(PlanningPackageId),

    /// Code already used by a sibling.
    #[error("Code already exists: {0}")]
    DuplicateCode(String),

    /// Id already present in the arena.
    #[error("Entity already exists: {0}")]
    DuplicateId(String),

    /// Control account is closed to new packages.
    #[error("Control account is closed: {0}")]
    ControlAccountClosed(ControlAccountId),

    /// A BAC total did not fit in a decimal.
    #[error("Arithmetic overflow while totalling BAC")]
    Overflow,
}

impl HierarchyError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ControlAccountNotFound(_)
            | Self::WorkPackageNotFound(_)
            | Self::PlanningPackageNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateCode(_) | Self::DuplicateId(_) | Self::Overflow => ErrorKind::Validation,
            Self::ControlAccountClosed(_) => ErrorKind::State,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ControlAccountNotFound(_) => "CONTROL_ACCOUNT_NOT_FOUND",
            Self::WorkPackageNotFound(_) => "WORK_PACKAGE_NOT_FOUND",
            Self::PlanningPackageNotFound(_) => "PLANNING_PACKAGE_NOT_FOUND",
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::DuplicateId(_) => "DUPLICATE_ID",
            Self::ControlAccountClosed(_) => "CONTROL_ACCOUNT_CLOSED",
            Self::Overflow => "BAC_OVERFLOW",
        }
    }
}

impl From<HierarchyError> for AppError {
    fn from(err: HierarchyError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}
