//! Setting the performance measurement baseline and measuring against it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use meridian_shared::types::{ProjectId, UserId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::baseline::error::BaselineError;
use crate::baseline::snapshot::BaselineSnapshot;
use crate::baseline::variance::VarianceMeasure;
use crate::budget::{Budget, BudgetError, BudgetLifecycle, BudgetStatus};
use crate::evm::{EvmRecord, EvmScope};
use crate::hierarchy::CostHierarchy;

/// Current performance of one scope against the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineComparison {
    /// Compared scope.
    pub scope: EvmScope,
    /// Data date of the current figures.
    pub data_date: NaiveDate,
    /// Baseline BAC against current BAC.
    pub budget_change: VarianceMeasure,
    /// Baseline BAC against current EAC.
    pub cost: VarianceMeasure,
    /// Baseline PV at the data date against current EV.
    pub schedule: VarianceMeasure,
}

/// Stateless service for baseline operations.
pub struct BaselineManager;

impl BaselineManager {
    /// Deep-copies a budget version's plan into a snapshot.
    pub fn freeze(
        budget: &Budget,
        hierarchy: &CostHierarchy,
        baselined_by: UserId,
    ) -> Result<BaselineSnapshot, BaselineError> {
        if hierarchy.budget_id() != budget.id {
            return Err(BudgetError::HierarchyMismatch {
                budget: budget.id,
                hierarchy: hierarchy.budget_id(),
            }
            .into());
        }
        Ok(BaselineSnapshot::capture(
            budget.id,
            budget.project_id,
            budget.version,
            budget.total_amount,
            hierarchy,
            baselined_by,
        ))
    }

    /// Moves the baseline flag of `project_id`'s records onto the latest
    /// record of each scope, clearing it everywhere else.
    ///
    /// Ties on data date go to the record that comes last. Records of other
    /// projects are left alone. Returns the number of flagged records.
    pub fn mark_baseline_records(project_id: ProjectId, records: &mut [EvmRecord]) -> usize {
        let mut latest: BTreeMap<EvmScope, (usize, NaiveDate)> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            if record.project_id() != project_id {
                continue;
            }
            let entry = latest
                .entry(record.scope())
                .or_insert((index, record.data_date()));
            if record.data_date() >= entry.1 {
                *entry = (index, record.data_date());
            }
        }

        for (index, record) in records.iter_mut().enumerate() {
            if record.project_id() != project_id {
                continue;
            }
            let flagged = latest.get(&record.scope()).is_some_and(|(i, _)| *i == index);
            record.set_baseline_flag(flagged);
        }
        latest.len()
    }

    /// Makes an approved budget the project's baseline.
    ///
    /// Freezes the plan, demotes `prior` (the project's current baseline, if
    /// any) to Revised, and re-flags baseline EVM records. Every check runs
    /// before anything is changed, so on error no input is modified.
    ///
    /// # Errors
    ///
    /// * `BaselineError::NotApproved` unless `budget` is Approved
    /// * `BaselineError::PriorNotBaseline` if `prior` is not a Baseline budget
    /// * `BaselineError::ProjectMismatch` if `prior` belongs to another project
    /// * `BaselineError::Budget` if the hierarchy belongs to another budget
    pub fn set_baseline(
        budget: &mut Budget,
        prior: Option<&mut Budget>,
        hierarchy: &CostHierarchy,
        records: &mut [EvmRecord],
        baselined_by: UserId,
    ) -> Result<BaselineSnapshot, BaselineError> {
        if budget.status != BudgetStatus::Approved {
            return Err(BaselineError::NotApproved(budget.status));
        }
        let action = BudgetLifecycle::set_baseline(budget.status, baselined_by)?;

        let demotion = match prior.as_deref() {
            Some(p) if p.project_id != budget.project_id => {
                return Err(BaselineError::ProjectMismatch {
                    expected: budget.project_id,
                    got: p.project_id,
                });
            }
            Some(p) if p.status != BudgetStatus::Baseline || p.id == budget.id => {
                return Err(BaselineError::PriorNotBaseline(p.id));
            }
            Some(p) => Some(BudgetLifecycle::supersede(p.status, baselined_by)?),
            None => None,
        };

        let mut snapshot = Self::freeze(budget, hierarchy, baselined_by)?;

        budget.apply(&action);
        if let (Some(p), Some(demotion)) = (prior, demotion.as_ref()) {
            p.apply(demotion);
            info!(budget_id = %p.id, "Prior baseline superseded");
        }
        let flagged = Self::mark_baseline_records(budget.project_id, records);
        if let Some(at) = budget.baselined_at {
            snapshot.baselined_at = at;
        }

        info!(
            budget_id = %budget.id,
            project_id = %budget.project_id,
            baseline_id = %snapshot.id,
            records_flagged = flagged,
            user_id = %baselined_by,
            "Baseline set"
        );
        Ok(snapshot)
    }

    /// Compares a current EVM record with the baseline. Neither input is
    /// modified.
    pub fn compare_to_baseline(
        current: &EvmRecord,
        snapshot: &BaselineSnapshot,
    ) -> Result<BaselineComparison, BaselineError> {
        let scope = current.scope();
        let data_date = current.data_date();
        let missing = || BaselineError::ScopeNotInBaseline(scope);
        let baseline_bac = snapshot.bac_for(scope).ok_or_else(missing)?;
        let baseline_pv = snapshot
            .planned_value_at(scope, data_date)
            .ok_or_else(missing)?;

        Ok(BaselineComparison {
            scope,
            data_date,
            budget_change: VarianceMeasure::for_cost(baseline_bac, current.values().bac)
                .ok_or(BaselineError::Overflow)?,
            cost: VarianceMeasure::for_cost(baseline_bac, current.metrics().eac)
                .ok_or(BaselineError::Overflow)?,
            schedule: VarianceMeasure::for_progress(baseline_pv, current.values().ev)
                .ok_or(BaselineError::Overflow)?,
        })
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
