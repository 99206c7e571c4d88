//! Cost hierarchy entities.

use std::fmt;

use chrono::NaiveDate;
use meridian_shared::types::{
    AuditInfo, ControlAccountId, Lifecycle, PhaseId, PlanningPackageId, UserId, WorkPackageId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::progress::{Milestone, ProgressMethod};
use crate::schedule::{TimePhasedBudgetDistributor, TimePhasedEntry};

/// Control account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAccountStatus {
    /// Accepting packages and progress.
    #[default]
    Open,
    /// Closed to new packages.
    Closed,
}

impl ControlAccountStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ControlAccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cost and schedule integration point owned by one manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAccount {
    /// Unique identifier, stable across budget versions.
    pub id: ControlAccountId,
    /// Account code, unique within the hierarchy.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Budget at completion: work packages plus unconverted planning packages.
    pub bac: Decimal,
    /// Responsible manager.
    pub owner_id: UserId,
    /// Project phase, if any.
    pub phase_id: Option<PhaseId>,
    /// Open or closed.
    pub status: ControlAccountStatus,
    /// Audit information.
    pub audit: AuditInfo,
    /// Soft-delete state.
    pub lifecycle: Lifecycle,
}

impl ControlAccount {
    /// Creates an open control account with no budget yet.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, owner_id: UserId) -> Self {
        Self {
            id: ControlAccountId::new(),
            code: code.into(),
            name: name.into(),
            bac: Decimal::ZERO,
            owner_id,
            phase_id: None,
            status: ControlAccountStatus::Open,
            audit: AuditInfo::new(owner_id),
            lifecycle: Lifecycle::active(),
        }
    }
}

/// Detailed, budgeted unit of work under a control account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPackage {
    /// Unique identifier, stable across budget versions.
    pub id: WorkPackageId,
    /// Parent control account.
    pub control_account_id: ControlAccountId,
    /// Package code, unique within its control account.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Budget at completion of the package.
    pub budget: Decimal,
    /// Latest cumulative actual cost.
    pub actual_cost: Decimal,
    /// Latest cumulative committed cost.
    pub committed_cost: Decimal,
    /// Latest percent complete.
    pub progress_percentage: Decimal,
    /// Earned value method.
    pub progress_method: ProgressMethod,
    /// Planned start.
    pub planned_start: NaiveDate,
    /// Planned finish.
    pub planned_end: NaiveDate,
    /// Milestones, for `ProgressMethod::WeightedMilestone`.
    pub milestones: Vec<Milestone>,
    /// Budget spread over periods.
    pub time_phased: Vec<TimePhasedEntry>,
    /// Audit information.
    pub audit: AuditInfo,
    /// Soft-delete state.
    pub lifecycle: Lifecycle,
}

impl WorkPackage {
    /// Planned value as of `date`.
    #[must_use]
    pub fn planned_value_at(&self, date: NaiveDate) -> Decimal {
        TimePhasedBudgetDistributor::cumulative_at(&self.time_phased, date)
    }
}

/// Budget held at summary level until it is planned in detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningPackage {
    /// Unique identifier, stable across budget versions.
    pub id: PlanningPackageId,
    /// Parent control account.
    pub control_account_id: ControlAccountId,
    /// Package code, unique within its control account.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Budget held by the package.
    pub total_budget: Decimal,
    /// Planned start.
    pub planned_start: NaiveDate,
    /// Planned finish.
    pub planned_end: NaiveDate,
    /// Budget spread over periods.
    pub time_phased: Vec<TimePhasedEntry>,
    /// Whether the package has been converted into work packages.
    pub is_converted: bool,
    /// Audit information.
    pub audit: AuditInfo,
    /// Soft-delete state.
    pub lifecycle: Lifecycle,
}

impl PlanningPackage {
    /// Planned value as of `date`.
    #[must_use]
    pub fn planned_value_at(&self, date: NaiveDate) -> Decimal {
        TimePhasedBudgetDistributor::cumulative_at(&self.time_phased, date)
    }
}
