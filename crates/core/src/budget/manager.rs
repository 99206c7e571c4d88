//! Budget versions and their cost hierarchy.
//!
//! `BudgetManager` owns the rules that tie a `Budget` to its
//! `CostHierarchy`: reconciliation before approval, draft-only edits, and
//! version chaining on revision. Status changes go through
//! `BudgetLifecycle`.

use chrono::NaiveDate;
use meridian_shared::config::EngineConfig;
use meridian_shared::types::{
    AuditInfo, BudgetId, Currency, Lifecycle, PlanningPackageId, UserId, WorkPackageId,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::budget::error::BudgetError;
use crate::budget::lifecycle::BudgetLifecycle;
use crate::budget::types::{
    AccountMismatch, Budget, BudgetAmounts, BudgetStatus, NewBudget, PackageMismatch, PlanningPackageSpec,
    ReconciliationReport, WorkPackageSpec,
};
use crate::currency::{checked_sum, AllocationUtil};
use crate::hierarchy::{ControlAccount, CostHierarchy, PlanningPackage, WorkPackage};
use crate::progress::{Milestone, ProgressMethod};
use crate::schedule::{
    DistributionMethod, DistributionRequest, PeriodGranularity, TimePhasedBudgetDistributor,
    TimePhasedEntry,
};

/// Budget version management.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetManager {
    distributor: TimePhasedBudgetDistributor,
}

impl BudgetManager {
    /// Creates a manager distributing package budgets with `distributor`.
    #[must_use]
    pub const fn new(distributor: TimePhasedBudgetDistributor) -> Self {
        Self { distributor }
    }

    /// Creates a manager from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self, BudgetError> {
        Ok(Self::new(TimePhasedBudgetDistributor::from_config(config)?))
    }

    /// Distributor used for package budgets.
    #[must_use]
    pub const fn distributor(&self) -> &TimePhasedBudgetDistributor {
        &self.distributor
    }

    // ------------------------------------------------------------------
    // Versions
    // ------------------------------------------------------------------

    /// Creates version 1 of a project budget with an empty hierarchy.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NegativeAmount` for a negative total or
    /// reserve, and `BudgetError::InvalidExchangeRate` unless the rate is
    /// positive.
    pub fn create(&self, input: NewBudget) -> Result<(Budget, CostHierarchy), BudgetError> {
        check_amounts(BudgetAmounts {
            total_amount: input.total_amount,
            contingency_amount: input.contingency_amount,
            management_reserve: input.management_reserve,
        })?;
        if input.exchange_rate <= Decimal::ZERO {
            return Err(BudgetError::InvalidExchangeRate(input.exchange_rate));
        }

        let budget = Budget {
            id: BudgetId::new(),
            project_id: input.project_id,
            name: input.name,
            version: 1,
            previous_version_id: None,
            status: BudgetStatus::Draft,
            total_amount: input.total_amount,
            contingency_amount: input.contingency_amount,
            management_reserve: input.management_reserve,
            currency: input.currency,
            exchange_rate: input.exchange_rate,
            submitted_by: None,
            submitted_at: None,
            approved_by: None,
            approved_at: None,
            approval_comments: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            revision_reason: None,
            revised_into: None,
            baselined_at: None,
            audit: AuditInfo::new(input.created_by),
            lifecycle: Lifecycle::active(),
        };

        info!(
            budget_id = %budget.id,
            project_id = %budget.project_id,
            total = %budget.total_amount,
            "Budget created"
        );

        let hierarchy = CostHierarchy::new(budget.id);
        Ok((budget, hierarchy))
    }

    /// Submits a draft for approval.
    pub fn submit(&self, budget: &mut Budget, submitted_by: UserId) -> Result<(), BudgetError> {
        let action = BudgetLifecycle::submit(budget.status, submitted_by)?;
        budget.apply(&action);
        info!(budget_id = %budget.id, user_id = %submitted_by, "Budget submitted");
        Ok(())
    }

    /// Approves a submitted budget whose hierarchy reconciles.
    ///
    /// # Errors
    ///
    /// * `BudgetError::InvalidTransition` if the budget is not Submitted
    /// * `BudgetError::Unreconciled` if any reconciliation rule fails
    pub fn approve(
        &self,
        budget: &mut Budget,
        hierarchy: &CostHierarchy,
        approved_by: UserId,
        comments: Option<String>,
    ) -> Result<ReconciliationReport, BudgetError> {
        let action = BudgetLifecycle::approve(budget.status, approved_by, comments)?;
        let report = self.reconcile(budget, hierarchy)?;
        if !report.is_reconciled() {
            warn!(
                budget_id = %budget.id,
                difference = %report.difference,
                account_mismatches = report.account_mismatches.len(),
                package_mismatches = report.package_mismatches.len(),
                "Budget approval blocked by reconciliation"
            );
            return Err(BudgetError::Unreconciled {
                budget_total: report.budget_total,
                control_account_total: report.control_account_total,
                difference: report.difference,
            });
        }

        budget.apply(&action);
        info!(budget_id = %budget.id, user_id = %approved_by, "Budget approved");
        Ok(report)
    }

    /// Rejects a submitted budget.
    pub fn reject(&self, budget: &mut Budget, rejected_by: UserId, reason: String) -> Result<(), BudgetError> {
        let action = BudgetLifecycle::reject(budget.status, rejected_by, reason)?;
        budget.apply(&action);
        info!(budget_id = %budget.id, user_id = %rejected_by, "Budget rejected");
        Ok(())
    }

    /// Returns a rejected budget to draft.
    pub fn reopen(&self, budget: &mut Budget, reopened_by: UserId) -> Result<(), BudgetError> {
        let action = BudgetLifecycle::reopen(budget.status, reopened_by)?;
        budget.apply(&action);
        info!(budget_id = %budget.id, user_id = %reopened_by, "Budget reopened");
        Ok(())
    }

    /// Revises an approved or baselined budget into a new draft version.
    ///
    /// The new version copies the amounts and the hierarchy (keeping entity
    /// ids) and links back to `budget`. The prior version is left immutable:
    /// an approved prior becomes Revised, a baseline prior stays Baseline.
    /// A version can be revised once; its successor is recorded in
    /// `revised_into`.
    pub fn revise(
        &self,
        budget: &mut Budget,
        hierarchy: &CostHierarchy,
        revised_by: UserId,
        reason: String,
    ) -> Result<(Budget, CostHierarchy), BudgetError> {
        check_owner(budget, hierarchy)?;
        if let Some(successor) = budget.revised_into {
            return Err(BudgetError::AlreadyRevised {
                budget: budget.id,
                successor,
            });
        }
        let action = BudgetLifecycle::revise(budget.status, revised_by, reason)?;

        let next = Budget {
            id: BudgetId::new(),
            version: budget.version + 1,
            previous_version_id: Some(budget.id),
            status: BudgetStatus::Draft,
            submitted_by: None,
            submitted_at: None,
            approved_by: None,
            approved_at: None,
            approval_comments: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            revision_reason: None,
            revised_into: None,
            baselined_at: None,
            audit: AuditInfo::new(revised_by),
            lifecycle: Lifecycle::active(),
            ..budget.clone()
        };
        let next_hierarchy = hierarchy.clone_for_budget(next.id);

        budget.apply(&action);
        budget.revised_into = Some(next.id);
        info!(
            budget_id = %budget.id,
            new_budget_id = %next.id,
            version = next.version,
            user_id = %revised_by,
            "Budget revised"
        );
        Ok((next, next_hierarchy))
    }

    /// Checks a budget against its hierarchy.
    ///
    /// The budget total must equal control account BAC plus contingency
    /// and management reserve, each control account's BAC must equal its
    /// work packages plus unconverted planning packages, and each package's
    /// time-phased budget must sum to its total.
    pub fn reconcile(&self, budget: &Budget, hierarchy: &CostHierarchy) -> Result<ReconciliationReport, BudgetError> {
        check_owner(budget, hierarchy)?;

        let control_account_total = hierarchy.total_bac()?;
        let difference = budget
            .distributable_amount()
            .and_then(|amount| amount.checked_sub(control_account_total))
            .ok_or(BudgetError::Overflow)?;

        let mut account_mismatches = Vec::new();
        for ca in hierarchy.control_accounts() {
            let computed = hierarchy.computed_bac(ca.id)?;
            if computed != ca.bac {
                account_mismatches.push(AccountMismatch {
                    control_account_id: ca.id,
                    code: ca.code.clone(),
                    stored_bac: ca.bac,
                    computed_bac: computed,
                });
            }
        }

        let work = hierarchy
            .work_packages()
            .map(|wp| (wp.code.as_str(), wp.budget, wp.time_phased.as_slice()));
        let planning = hierarchy
            .planning_packages()
            .filter(|pp| !pp.is_converted)
            .map(|pp| (pp.code.as_str(), pp.total_budget, pp.time_phased.as_slice()));
        let package_mismatches = work
            .chain(planning)
            .filter_map(|(code, expected, entries)| {
                self.package_mismatch(code, expected, entries, budget.currency)
            })
            .collect();

        Ok(ReconciliationReport {
            budget_total: budget.total_amount,
            control_account_total,
            contingency_amount: budget.contingency_amount,
            management_reserve: budget.management_reserve,
            difference,
            account_mismatches,
            package_mismatches,
        })
    }

    /// Current version among a project's budgets: the baseline if one
    /// exists, otherwise the latest approved version.
    ///
    /// An approved version being revised stays current until a successor
    /// is approved, so without either of the above the latest Revised
    /// version is returned.
    #[must_use]
    pub fn current_version(versions: &[Budget]) -> Option<&Budget> {
        let active = || versions.iter().filter(|b| b.lifecycle.is_active());
        let latest = |status: BudgetStatus| {
            active()
                .filter(|b| b.status == status)
                .max_by_key(|b| b.version)
        };
        active()
            .find(|b| b.status == BudgetStatus::Baseline)
            .or_else(|| latest(BudgetStatus::Approved))
            .or_else(|| latest(BudgetStatus::Revised))
    }

    // ------------------------------------------------------------------
    // Hierarchy edits (draft only)
    // ------------------------------------------------------------------

    /// Replaces the total and reserves of a draft budget.
    pub fn update_amounts(
        &self,
        budget: &mut Budget,
        hierarchy: &CostHierarchy,
        amounts: BudgetAmounts,
        updated_by: UserId,
    ) -> Result<(), BudgetError> {
        check_editable(budget, hierarchy)?;
        check_amounts(amounts)?;

        budget.total_amount = amounts.total_amount;
        budget.contingency_amount = amounts.contingency_amount;
        budget.management_reserve = amounts.management_reserve;
        budget.audit.touch(updated_by);
        info!(budget_id = %budget.id, total = %budget.total_amount, "Budget amounts updated");
        Ok(())
    }

    /// Adds a control account to a draft budget.
    pub fn add_control_account(
        &self,
        budget: &Budget,
        hierarchy: &mut CostHierarchy,
        account: ControlAccount,
    ) -> Result<(), BudgetError> {
        check_editable(budget, hierarchy)?;
        hierarchy.insert_control_account(account)?;
        Ok(())
    }

    /// Adds a work package, distributing its budget over its planned dates.
    pub fn add_work_package(
        &self,
        budget: &Budget,
        hierarchy: &mut CostHierarchy,
        spec: WorkPackageSpec,
        created_by: UserId,
    ) -> Result<WorkPackageId, BudgetError> {
        check_editable(budget, hierarchy)?;
        let wp = self.build_work_package(WorkPackageId::new(), spec, budget.currency, created_by)?;
        let id = wp.id;
        hierarchy.insert_work_package(wp)?;
        Ok(id)
    }

    /// Replaces the budget and schedule of a work package.
    ///
    /// Reported progress and costs are kept.
    pub fn update_work_package(
        &self,
        budget: &Budget,
        hierarchy: &mut CostHierarchy,
        id: WorkPackageId,
        spec: WorkPackageSpec,
        updated_by: UserId,
    ) -> Result<(), BudgetError> {
        check_editable(budget, hierarchy)?;
        let existing = hierarchy.work_package(id)?.clone();
        let mut wp = self.build_work_package(id, spec, budget.currency, updated_by)?;
        wp.actual_cost = existing.actual_cost;
        wp.committed_cost = existing.committed_cost;
        wp.progress_percentage = existing.progress_percentage;
        wp.audit = existing.audit;
        wp.audit.touch(updated_by);
        hierarchy.replace_work_package(wp)?;
        Ok(())
    }

    /// Removes a work package from a draft budget.
    pub fn remove_work_package(
        &self,
        budget: &Budget,
        hierarchy: &mut CostHierarchy,
        id: WorkPackageId,
        removed_by: UserId,
    ) -> Result<(), BudgetError> {
        check_editable(budget, hierarchy)?;
        hierarchy.remove_work_package(id, removed_by)?;
        Ok(())
    }

    /// Adds a planning package, distributing its budget over its planned dates.
    pub fn add_planning_package(
        &self,
        budget: &Budget,
        hierarchy: &mut CostHierarchy,
        spec: PlanningPackageSpec,
        created_by: UserId,
    ) -> Result<PlanningPackageId, BudgetError> {
        check_editable(budget, hierarchy)?;
        let time_phased = self.distribute(
            spec.total_budget,
            spec.planned_start,
            spec.planned_end,
            spec.distribution,
            spec.granularity,
            budget.currency,
        )?;
        let pp = PlanningPackage {
            id: PlanningPackageId::new(),
            control_account_id: spec.control_account_id,
            code: spec.code,
            name: spec.name,
            total_budget: spec.total_budget,
            planned_start: spec.planned_start,
            planned_end: spec.planned_end,
            time_phased,
            is_converted: false,
            audit: AuditInfo::new(created_by),
            lifecycle: Lifecycle::active(),
        };
        let id = pp.id;
        hierarchy.insert_planning_package(pp)?;
        Ok(id)
    }

    /// Converts a planning package into detailed work packages.
    ///
    /// The work package budgets must sum exactly to the planning package's
    /// total. Either every work package is added and the planning package
    /// is marked converted, or the hierarchy is left untouched.
    pub fn convert_planning_package(
        &self,
        budget: &Budget,
        hierarchy: &mut CostHierarchy,
        id: PlanningPackageId,
        specs: Vec<WorkPackageSpec>,
        converted_by: UserId,
    ) -> Result<Vec<WorkPackageId>, BudgetError> {
        check_editable(budget, hierarchy)?;
        let pp = hierarchy.planning_package(id)?;
        if pp.is_converted {
            return Err(BudgetError::AlreadyConverted(id));
        }
        let expected = pp.total_budget;
        let got = checked_sum(specs.iter().map(|s| s.budget)).ok_or(BudgetError::Overflow)?;
        if got != expected {
            return Err(BudgetError::ConversionMismatch { expected, got });
        }

        let mut staged = hierarchy.clone();
        let mut ids = Vec::with_capacity(specs.len());
        for spec in specs {
            let wp = self.build_work_package(WorkPackageId::new(), spec, budget.currency, converted_by)?;
            ids.push(wp.id);
            staged.insert_work_package(wp)?;
        }
        staged.mark_converted(id, converted_by)?;
        *hierarchy = staged;

        info!(
            budget_id = %budget.id,
            planning_package_id = %id,
            work_packages = ids.len(),
            "Planning package converted"
        );
        Ok(ids)
    }

    /// Splits a planning package's total by percentages, to the currency's
    /// minor unit, for use as converted work package budgets.
    pub fn split_planning_package(
        hierarchy: &CostHierarchy,
        id: PlanningPackageId,
        percentages: &[Decimal],
        currency: Currency,
    ) -> Result<Vec<Decimal>, BudgetError> {
        let pp = hierarchy.planning_package(id)?;
        Ok(AllocationUtil::allocate_by_percentages(
            pp.total_budget,
            percentages,
            currency.minor_units(),
        ))
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn build_work_package(
        &self,
        id: WorkPackageId,
        spec: WorkPackageSpec,
        currency: Currency,
        by: UserId,
    ) -> Result<WorkPackage, BudgetError> {
        check_non_negative(spec.budget, "budget")?;
        if spec.progress_method == ProgressMethod::WeightedMilestone {
            Milestone::validate_weights(&spec.milestones)?;
        }
        let time_phased = self.distribute(
            spec.budget,
            spec.planned_start,
            spec.planned_end,
            spec.distribution,
            spec.granularity,
            currency,
        )?;

        Ok(WorkPackage {
            id,
            control_account_id: spec.control_account_id,
            code: spec.code,
            name: spec.name,
            budget: spec.budget,
            actual_cost: Decimal::ZERO,
            committed_cost: Decimal::ZERO,
            progress_percentage: Decimal::ZERO,
            progress_method: spec.progress_method,
            planned_start: spec.planned_start,
            planned_end: spec.planned_end,
            milestones: spec.milestones,
            time_phased,
            audit: AuditInfo::new(by),
            lifecycle: Lifecycle::active(),
        })
    }

    fn distribute(
        &self,
        total: Decimal,
        start: NaiveDate,
        end: NaiveDate,
        method: DistributionMethod,
        granularity: Option<PeriodGranularity>,
        currency: Currency,
    ) -> Result<Vec<TimePhasedEntry>, BudgetError> {
        Ok(self.distributor.distribute(&DistributionRequest {
            total,
            start,
            end,
            method,
            granularity,
            currency,
        })?)
    }

    fn package_mismatch(
        &self,
        code: &str,
        expected: Decimal,
        entries: &[TimePhasedEntry],
        currency: Currency,
    ) -> Option<PackageMismatch> {
        self.distributor
            .validate_entries(entries, expected, currency)
            .err()
            .map(|_| PackageMismatch {
                code: code.to_string(),
                expected,
                time_phased_total: entries.iter().map(|e| e.period_budget).sum(),
            })
    }
}

/// Amounts must be non-negative and the reserves must fit alongside the total.
fn check_amounts(amounts: BudgetAmounts) -> Result<(), BudgetError> {
    check_non_negative(amounts.total_amount, "total_amount")?;
    check_non_negative(amounts.contingency_amount, "contingency_amount")?;
    check_non_negative(amounts.management_reserve, "management_reserve")?;
    amounts
        .contingency_amount
        .checked_add(amounts.management_reserve)
        .ok_or(BudgetError::Overflow)?;
    Ok(())
}

fn check_non_negative(amount: Decimal, field: &'static str) -> Result<(), BudgetError> {
    if amount < Decimal::ZERO {
        return Err(BudgetError::NegativeAmount(field));
    }
    Ok(())
}

fn check_owner(budget: &Budget, hierarchy: &CostHierarchy) -> Result<(), BudgetError> {
    if hierarchy.budget_id() != budget.id {
        return Err(BudgetError::HierarchyMismatch {
            budget: budget.id,
            hierarchy: hierarchy.budget_id(),
        });
    }
    Ok(())
}

fn check_editable(budget: &Budget, hierarchy: &CostHierarchy) -> Result<(), BudgetError> {
    if !budget.status.is_editable() {
        return Err(BudgetError::NotEditable(budget.status));
    }
    check_owner(budget, hierarchy)
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
