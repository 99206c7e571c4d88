//! Builders shared by unit tests.

use chrono::NaiveDate;
use meridian_shared::types::{
    AuditInfo, ControlAccountId, Currency, Lifecycle, PlanningPackageId, UserId, WorkPackageId,
};
use rust_decimal::Decimal;

use crate::hierarchy::{ControlAccount, PlanningPackage, WorkPackage};
use crate::progress::{Milestone, ProgressMethod};
use crate::schedule::{DistributionMethod, DistributionRequest, TimePhasedBudgetDistributor};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn linear(total: Decimal, start: NaiveDate, end: NaiveDate) -> Vec<crate::schedule::TimePhasedEntry> {
    TimePhasedBudgetDistributor::default()
        .distribute(&DistributionRequest {
            total,
            start,
            end,
            method: DistributionMethod::Linear,
            granularity: None,
            currency: Currency::Usd,
        })
        .unwrap()
}

pub fn control_account(code: &str) -> ControlAccount {
    ControlAccount::new(code, format!("Account {code}"), UserId::new())
}

/// Work package spread linearly over Jan-Apr 2025.
pub fn work_package(ca: ControlAccountId, code: &str, budget: Decimal) -> WorkPackage {
    work_package_with(ca, code, budget, ProgressMethod::Manual)
}

pub fn work_package_with(
    ca: ControlAccountId,
    code: &str,
    budget: Decimal,
    method: ProgressMethod,
) -> WorkPackage {
    let start = date(2025, 1, 1);
    let end = date(2025, 4, 30);
    WorkPackage {
        id: WorkPackageId::new(),
        control_account_id: ca,
        code: code.to_string(),
        name: format!("Package {code}"),
        budget,
        actual_cost: Decimal::ZERO,
        committed_cost: Decimal::ZERO,
        progress_percentage: Decimal::ZERO,
        progress_method: method,
        planned_start: start,
        planned_end: end,
        milestones: Vec::new(),
        time_phased: linear(budget, start, end),
        audit: AuditInfo::new(UserId::new()),
        lifecycle: Lifecycle::active(),
    }
}

pub fn milestone_package(ca: ControlAccountId, code: &str, budget: Decimal, weights: &[(&str, Decimal)]) -> WorkPackage {
    let mut wp = work_package_with(ca, code, budget, ProgressMethod::WeightedMilestone);
    wp.milestones = weights.iter().map(|(n, w)| Milestone::new(*n, *w)).collect();
    wp
}

/// Planning package spread linearly over May-Aug 2025.
pub fn planning_package(ca: ControlAccountId, code: &str, total: Decimal) -> PlanningPackage {
    let start = date(2025, 5, 1);
    let end = date(2025, 8, 31);
    PlanningPackage {
        id: PlanningPackageId::new(),
        control_account_id: ca,
        code: code.to_string(),
        name: format!("Planning {code}"),
        total_budget: total,
        planned_start: start,
        planned_end: end,
        time_phased: linear(total, start, end),
        is_converted: false,
        audit: AuditInfo::new(UserId::new()),
        lifecycle: Lifecycle::active(),
    }
}
