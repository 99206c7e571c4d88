//! Shared fixtures for store integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use meridian_core::budget::{BudgetManager, NewBudget, WorkPackageSpec};
use meridian_core::hierarchy::ControlAccount;
use meridian_core::progress::{ProgressInput, ProgressMethod};
use meridian_core::schedule::DistributionMethod;
use meridian_shared::types::{BudgetId, ControlAccountId, Currency, ProjectId, UserId, WorkPackageId};
use meridian_store::ProjectStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Budget of each seeded work package, spread 300 a month over Jan to Apr 2025.
pub const PACKAGE_BUDGET: Decimal = dec!(1200);

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// An approved project stored in a `ProjectStore`.
pub struct Seeded {
    pub project: ProjectId,
    pub budget: BudgetId,
    pub accounts: Vec<ControlAccountId>,
    /// Work packages grouped by control account, in the order of `accounts`.
    pub packages: Vec<Vec<WorkPackageId>>,
    pub user: UserId,
}

impl Seeded {
    pub fn all_packages(&self) -> Vec<WorkPackageId> {
        self.packages.iter().flatten().copied().collect()
    }
}

/// Stores an approved budget with `accounts` control accounts of
/// `per_account` Manual work packages each.
pub fn seed(store: &ProjectStore, accounts: usize, per_account: usize) -> Seeded {
    let manager = BudgetManager::default();
    let user = UserId::new();
    let count = Decimal::from(accounts * per_account);
    let (mut budget, mut hierarchy) = manager
        .create(NewBudget {
            project_id: ProjectId::new(),
            name: "Terminal expansion".into(),
            total_amount: PACKAGE_BUDGET * count,
            contingency_amount: Decimal::ZERO,
            management_reserve: Decimal::ZERO,
            currency: Currency::Usd,
            exchange_rate: Decimal::ONE,
            created_by: user,
        })
        .unwrap();

    let mut account_ids = Vec::with_capacity(accounts);
    let mut packages = Vec::with_capacity(accounts);
    for a in 0..accounts {
        let ca = ControlAccount::new(format!("CA-{a}"), format!("Account {a}"), user);
        let ca_id = ca.id;
        manager.add_control_account(&budget, &mut hierarchy, ca).unwrap();
        let ids = (0..per_account)
            .map(|p| {
                manager
                    .add_work_package(&budget, &mut hierarchy, wp_spec(ca_id, &format!("WP-{p}")), user)
                    .unwrap()
            })
            .collect();
        account_ids.push(ca_id);
        packages.push(ids);
    }

    manager.submit(&mut budget, user).unwrap();
    manager
        .approve(&mut budget, &hierarchy, user, Some("Approved for execution".into()))
        .unwrap();

    let seeded = Seeded {
        project: budget.project_id,
        budget: budget.id,
        accounts: account_ids,
        packages,
        user,
    };
    store.insert_budget(budget, hierarchy).unwrap();
    seeded
}

pub fn wp_spec(ca: ControlAccountId, code: &str) -> WorkPackageSpec {
    WorkPackageSpec {
        control_account_id: ca,
        code: code.into(),
        name: format!("Package {code}"),
        budget: PACKAGE_BUDGET,
        progress_method: ProgressMethod::Manual,
        planned_start: date(2025, 1, 1),
        planned_end: date(2025, 4, 30),
        distribution: DistributionMethod::Linear,
        granularity: None,
        milestones: Vec::new(),
    }
}

pub fn progress(wp: WorkPackageId, on: NaiveDate, pct: Decimal, ac: Decimal) -> ProgressInput {
    ProgressInput {
        work_package_id: wp,
        progress_date: on,
        progress_percentage: pct,
        actual_cost: ac,
        committed_cost: Decimal::ZERO,
        reported_by: UserId::new(),
    }
}
