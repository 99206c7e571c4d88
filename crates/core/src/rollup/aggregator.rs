//! Bottom-up aggregation of earned value.
//!
//! Measures (PV, EV, AC, BAC) are summed; indices are always recomputed
//! from the sums, never averaged. Every function here is pure.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use meridian_shared::types::{ControlAccountId, ProjectId, WorkPackageId};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::evm::{EvmCalculator, EvmError, EvmMetrics, EvmScope, EvmSummary, EvmValues};
use crate::hierarchy::{CostHierarchy, PlanningPackage, WorkPackage};
use crate::progress::{ProgressError, ProgressTracker};
use crate::rollup::error::RollupError;

/// Aggregated measures and metrics of one scope at one data date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSnapshot {
    /// Aggregated scope.
    pub scope: EvmScope,
    /// Data date.
    pub data_date: NaiveDate,
    /// Summed measures.
    pub values: EvmValues,
    /// Metrics recomputed from `values`.
    pub metrics: EvmMetrics,
}

impl ScopeSnapshot {
    /// Computes the metrics of `values`.
    pub fn new(scope: EvmScope, data_date: NaiveDate, values: EvmValues) -> Result<Self, EvmError> {
        Ok(Self {
            scope,
            data_date,
            values,
            metrics: EvmCalculator::calculate(&values)?,
        })
    }

    /// Flat summary for reports.
    #[must_use]
    pub const fn summary(&self) -> EvmSummary {
        EvmSummary::from_parts(self.data_date, &self.values, &self.metrics)
    }
}

/// Control account and project snapshots of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRollup {
    /// One snapshot per control account, in control account id order.
    pub control_accounts: Vec<ScopeSnapshot>,
    /// Project total.
    pub project: ScopeSnapshot,
}

/// Stateless rollup aggregator.
pub struct RollupAggregator;

impl RollupAggregator {
    /// Sums `parts` into one snapshot of `scope`.
    ///
    /// Aggregating a single snapshot's values yields that snapshot again.
    pub fn aggregate<'a>(
        scope: EvmScope,
        data_date: NaiveDate,
        parts: impl IntoIterator<Item = &'a EvmValues>,
    ) -> Result<ScopeSnapshot, EvmError> {
        let values = parts
            .into_iter()
            .try_fold(EvmValues::ZERO, |acc, part| acc.checked_add(part))?;
        ScopeSnapshot::new(scope, data_date, values)
    }

    /// Contribution of an unconverted planning package: its time-phased
    /// budget to date as PV, its total as BAC, nothing earned or spent.
    #[must_use]
    pub fn planning_package_values(pp: &PlanningPackage, data_date: NaiveDate) -> EvmValues {
        EvmValues {
            pv: pp.planned_value_at(data_date),
            ev: Decimal::ZERO,
            ac: Decimal::ZERO,
            bac: pp.total_budget,
        }
    }

    /// Measures of a work package, from its tracker when one exists.
    ///
    /// A package with no recorded progress is evaluated as untouched.
    pub fn work_package_values(
        wp: &WorkPackage,
        tracker: Option<&ProgressTracker>,
        data_date: NaiveDate,
    ) -> Result<EvmValues, ProgressError> {
        match tracker {
            Some(t) => t.evaluate(wp, data_date),
            None => ProgressTracker::new(wp.id).evaluate(wp, data_date),
        }
    }

    /// Measures of every child of a control account: its work packages
    /// followed by its unconverted planning packages.
    pub fn control_account_inputs(
        hierarchy: &CostHierarchy,
        ca: ControlAccountId,
        trackers: &BTreeMap<WorkPackageId, ProgressTracker>,
        data_date: NaiveDate,
    ) -> Result<Vec<EvmValues>, RollupError> {
        hierarchy.control_account(ca)?;

        let mut parts = hierarchy
            .work_packages_of(ca)
            .map(|wp| Self::work_package_values(wp, trackers.get(&wp.id), data_date))
            .collect::<Result<Vec<_>, _>>()?;
        parts.extend(
            hierarchy
                .unconverted_planning_packages_of(ca)
                .map(|pp| Self::planning_package_values(pp, data_date)),
        );
        Ok(parts)
    }

    /// Snapshot of one control account.
    pub fn roll_up_control_account(
        hierarchy: &CostHierarchy,
        ca: ControlAccountId,
        trackers: &BTreeMap<WorkPackageId, ProgressTracker>,
        data_date: NaiveDate,
    ) -> Result<ScopeSnapshot, RollupError> {
        let parts = Self::control_account_inputs(hierarchy, ca, trackers, data_date)?;
        Ok(Self::aggregate(EvmScope::ControlAccount(ca), data_date, &parts)?)
    }

    /// Project snapshot from its control account snapshots.
    pub fn roll_up_project(
        project_id: ProjectId,
        data_date: NaiveDate,
        control_accounts: &[ScopeSnapshot],
    ) -> Result<ScopeSnapshot, EvmError> {
        Self::aggregate(
            EvmScope::Project(project_id),
            data_date,
            control_accounts.iter().map(|s| &s.values),
        )
    }

    /// Evaluates every control account of a project in parallel, then the
    /// project total.
    ///
    /// Control account snapshots come back in id order regardless of which
    /// worker finished first.
    pub fn evaluate_project(
        project_id: ProjectId,
        hierarchy: &CostHierarchy,
        trackers: &BTreeMap<WorkPackageId, ProgressTracker>,
        data_date: NaiveDate,
    ) -> Result<ProjectRollup, RollupError> {
        let control_accounts = hierarchy
            .control_account_ids()
            .into_par_iter()
            .map(|ca| Self::roll_up_control_account(hierarchy, ca, trackers, data_date))
            .collect::<Result<Vec<_>, _>>()?;
        let project = Self::roll_up_project(project_id, data_date, &control_accounts)?;
        Ok(ProjectRollup {
            control_accounts,
            project,
        })
    }
}
