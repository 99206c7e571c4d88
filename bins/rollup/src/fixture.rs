//! JSON project fixtures and loading them into a store.

use anyhow::Context;
use chrono::NaiveDate;
use meridian_core::budget::{BudgetManager, NewBudget, PlanningPackageSpec, WorkPackageSpec};
use meridian_core::hierarchy::ControlAccount;
use meridian_core::progress::{Milestone, ProgressInput, ProgressMethod};
use meridian_core::schedule::{DistributionMethod, PeriodGranularity};
use meridian_shared::types::{Currency, ProjectId, UserId};
use meridian_store::ProjectStore;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

/// A batch of projects and the data date to roll them up to.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub data_date: NaiveDate,
    pub projects: Vec<ProjectFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFixture {
    pub name: String,
    pub currency: Currency,
    #[serde(default = "one")]
    pub exchange_rate: Decimal,
    pub total_amount: Decimal,
    #[serde(default)]
    pub contingency_amount: Decimal,
    #[serde(default)]
    pub management_reserve: Decimal,
    /// Baseline the approved budget before any progress is loaded.
    #[serde(default)]
    pub baseline: bool,
    pub control_accounts: Vec<AccountFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFixture {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub work_packages: Vec<PackageFixture>,
    #[serde(default)]
    pub planning_packages: Vec<PlanningFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageFixture {
    pub code: String,
    pub name: String,
    pub budget: Decimal,
    #[serde(default)]
    pub progress_method: ProgressMethod,
    pub planned_start: NaiveDate,
    pub planned_end: NaiveDate,
    #[serde(default = "linear")]
    pub distribution: DistributionMethod,
    #[serde(default)]
    pub granularity: Option<PeriodGranularity>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub progress: Vec<ProgressFixture>,
    #[serde(default)]
    pub completed_milestones: Vec<CompletedMilestone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningFixture {
    pub code: String,
    pub name: String,
    pub total_budget: Decimal,
    pub planned_start: NaiveDate,
    pub planned_end: NaiveDate,
    #[serde(default = "linear")]
    pub distribution: DistributionMethod,
    #[serde(default)]
    pub granularity: Option<PeriodGranularity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressFixture {
    pub date: NaiveDate,
    pub percentage: Decimal,
    pub actual_cost: Decimal,
    #[serde(default)]
    pub committed_cost: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedMilestone {
    pub name: String,
    pub date: NaiveDate,
}

const fn one() -> Decimal {
    Decimal::ONE
}

const fn linear() -> DistributionMethod {
    DistributionMethod::Linear
}

impl Fixture {
    /// Parses a fixture from JSON.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("Invalid project fixture")
    }

    /// Creates, approves and optionally baselines every project, then
    /// replays its milestones and progress. Returns the new project ids in fixture order.
    pub fn load_into(
        &self,
        store: &ProjectStore,
        manager: &BudgetManager,
        user: UserId,
    ) -> anyhow::Result<Vec<ProjectId>> {
        self.projects
            .iter()
            .map(|project| {
                load_project(store, manager, project, user)
                    .with_context(|| format!("Failed to load project '{}'", project.name))
            })
            .collect()
    }
}

fn load_project(
    store: &ProjectStore,
    manager: &BudgetManager,
    fixture: &ProjectFixture,
    user: UserId,
) -> anyhow::Result<ProjectId> {
    let (mut budget, mut hierarchy) = manager.create(NewBudget {
        project_id: ProjectId::new(),
        name: fixture.name.clone(),
        total_amount: fixture.total_amount,
        contingency_amount: fixture.contingency_amount,
        management_reserve: fixture.management_reserve,
        currency: fixture.currency,
        exchange_rate: fixture.exchange_rate,
        created_by: user,
    })?;

    let mut packages = Vec::new();
    for account in &fixture.control_accounts {
        let ca = ControlAccount::new(account.code.clone(), account.name.clone(), user);
        let ca_id = ca.id;
        manager.add_control_account(&budget, &mut hierarchy, ca)?;

        for wp in &account.work_packages {
            let spec = WorkPackageSpec {
                control_account_id: ca_id,
                code: wp.code.clone(),
                name: wp.name.clone(),
                budget: wp.budget,
                progress_method: wp.progress_method,
                planned_start: wp.planned_start,
                planned_end: wp.planned_end,
                distribution: wp.distribution.clone(),
                granularity: wp.granularity,
                milestones: wp.milestones.clone(),
            };
            let id = manager
                .add_work_package(&budget, &mut hierarchy, spec, user)
                .with_context(|| format!("Work package {}", wp.code))?;
            packages.push((id, wp));
        }
        for pp in &account.planning_packages {
            let spec = PlanningPackageSpec {
                control_account_id: ca_id,
                code: pp.code.clone(),
                name: pp.name.clone(),
                total_budget: pp.total_budget,
                planned_start: pp.planned_start,
                planned_end: pp.planned_end,
                distribution: pp.distribution.clone(),
                granularity: pp.granularity,
            };
            manager
                .add_planning_package(&budget, &mut hierarchy, spec, user)
                .with_context(|| format!("Planning package {}", pp.code))?;
        }
    }

    manager.submit(&mut budget, user)?;
    manager.approve(&mut budget, &hierarchy, user, Some("Loaded from fixture".into()))?;
    let project_id = budget.project_id;
    let budget_id = budget.id;
    store.insert_budget(budget, hierarchy)?;
    if fixture.baseline {
        store.set_baseline(project_id, budget_id, user)?;
    }

    let mut reports = 0;
    for (id, wp) in packages {
        for done in &wp.completed_milestones {
            store.complete_milestone(project_id, id, &done.name, done.date, user)?;
        }
        for entry in &wp.progress {
            store.record_progress(
                project_id,
                ProgressInput {
                    work_package_id: id,
                    progress_date: entry.date,
                    progress_percentage: entry.percentage,
                    actual_cost: entry.actual_cost,
                    committed_cost: entry.committed_cost,
                    reported_by: user,
                },
            )?;
            reports += 1;
        }
    }

    info!(
        project_id = %project_id,
        name = %fixture.name,
        progress_reports = reports,
        baselined = fixture.baseline,
        "Project loaded"
    );
    Ok(project_id)
}
