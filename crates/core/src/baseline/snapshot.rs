//! Frozen copy of a budget version's plan.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use meridian_shared::types::{
    BaselineId, BudgetId, ControlAccountId, PlanningPackageId, ProjectId, UserId, WorkPackageId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::evm::EvmScope;
use crate::hierarchy::{CostHierarchy, PlanningPackage, WorkPackage};
use crate::schedule::{TimePhasedBudgetDistributor, TimePhasedEntry};

/// Baselined budget and schedule of one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageBaseline {
    /// Parent control account.
    pub control_account_id: ControlAccountId,
    /// Package code.
    pub code: String,
    /// Budget at completion.
    pub budget: Decimal,
    /// Planned start.
    pub planned_start: NaiveDate,
    /// Planned finish.
    pub planned_end: NaiveDate,
    /// Time-phased budget.
    pub time_phased: Vec<TimePhasedEntry>,
}

impl PackageBaseline {
    /// Planned value as of `date`.
    #[must_use]
    pub fn planned_value_at(&self, date: NaiveDate) -> Decimal {
        TimePhasedBudgetDistributor::cumulative_at(&self.time_phased, date)
    }
}

impl From<&WorkPackage> for PackageBaseline {
    fn from(wp: &WorkPackage) -> Self {
        Self {
            control_account_id: wp.control_account_id,
            code: wp.code.clone(),
            budget: wp.budget,
            planned_start: wp.planned_start,
            planned_end: wp.planned_end,
            time_phased: wp.time_phased.clone(),
        }
    }
}

impl From<&PlanningPackage> for PackageBaseline {
    fn from(pp: &PlanningPackage) -> Self {
        Self {
            control_account_id: pp.control_account_id,
            code: pp.code.clone(),
            budget: pp.total_budget,
            planned_start: pp.planned_start,
            planned_end: pp.planned_end,
            time_phased: pp.time_phased.clone(),
        }
    }
}

/// Immutable copy of every BAC, time-phased budget and schedule date of a
/// budget version at the moment it became the baseline.
///
/// Later edits to the hierarchy do not reach the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    /// Snapshot id.
    pub id: BaselineId,
    /// Baselined budget version.
    pub budget_id: BudgetId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Version number of the baselined budget.
    pub version: u32,
    /// Budget total, including reserves.
    pub total_amount: Decimal,
    /// BAC per control account.
    pub control_accounts: BTreeMap<ControlAccountId, Decimal>,
    /// Work packages.
    pub work_packages: BTreeMap<WorkPackageId, PackageBaseline>,
    /// Planning packages not yet converted when the baseline was set.
    pub planning_packages: BTreeMap<PlanningPackageId, PackageBaseline>,
    /// Baselining user.
    pub baselined_by: UserId,
    /// Baseline time.
    pub baselined_at: DateTime<Utc>,
}

impl BaselineSnapshot {
    pub(crate) fn capture(
        budget_id: BudgetId,
        project_id: ProjectId,
        version: u32,
        total_amount: Decimal,
        hierarchy: &CostHierarchy,
        baselined_by: UserId,
    ) -> Self {
        Self {
            id: BaselineId::new(),
            budget_id,
            project_id,
            version,
            total_amount,
            control_accounts: hierarchy.control_accounts().map(|ca| (ca.id, ca.bac)).collect(),
            work_packages: hierarchy
                .work_packages()
                .map(|wp| (wp.id, PackageBaseline::from(wp)))
                .collect(),
            planning_packages: hierarchy
                .planning_packages()
                .filter(|pp| !pp.is_converted)
                .map(|pp| (pp.id, PackageBaseline::from(pp)))
                .collect(),
            baselined_by,
            baselined_at: Utc::now(),
        }
    }

    /// Baseline BAC of a scope, if the scope is part of the baseline.
    #[must_use]
    pub fn bac_for(&self, scope: EvmScope) -> Option<Decimal> {
        match scope {
            EvmScope::WorkPackage(id) => self.work_packages.get(&id).map(|p| p.budget),
            EvmScope::ControlAccount(id) => self.control_accounts.get(&id).copied(),
            EvmScope::Project(id) => {
                (id == self.project_id).then(|| self.control_accounts.values().copied().sum())
            }
        }
    }

    /// Baseline planned value of a scope as of `date`.
    #[must_use]
    pub fn planned_value_at(&self, scope: EvmScope, date: NaiveDate) -> Option<Decimal> {
        match scope {
            EvmScope::WorkPackage(id) => self.work_packages.get(&id).map(|p| p.planned_value_at(date)),
            EvmScope::ControlAccount(id) => self
                .control_accounts
                .contains_key(&id)
                .then(|| self.sum_packages(date, |p| p.control_account_id == id)),
            EvmScope::Project(id) => {
                (id == self.project_id).then(|| self.sum_packages(date, |_| true))
            }
        }
    }

    fn sum_packages(&self, date: NaiveDate, include: impl Fn(&PackageBaseline) -> bool) -> Decimal {
        self.work_packages
            .values()
            .chain(self.planning_packages.values())
            .filter(|p| include(p))
            .map(|p| p.planned_value_at(date))
            .sum()
    }
}
