//! Thread-safe in-memory project store.
//!
//! Each project lives in one `DashMap` entry. Every write to a project runs
//! under that entry's exclusive guard, so recording progress and recomputing
//! the work package's EVM record happen as one step. Rollups read under a
//! shared guard and commit under an exclusive one, checking the scope's
//! version at commit.
//!
//! Writes are prepared on copies and swapped in only once every check has
//! passed, so a failed call leaves the project as it was.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use dashmap::DashMap;
use meridian_core::baseline::{BaselineComparison, BaselineManager, BaselineSnapshot};
use meridian_core::budget::{
    Budget, BudgetAmounts, BudgetError, BudgetManager, BudgetStatus, ReconciliationReport,
};
use meridian_core::evm::{EvmError, EvmRecord, EvmScope, EvmValues};
use meridian_core::hierarchy::{CostHierarchy, HierarchyError};
use meridian_core::progress::{ProgressInput, ProgressTracker};
use meridian_core::rollup::{RollupAggregator, RollupError, RollupInputs, RollupStore, ScopeCommit};
use meridian_shared::types::{BudgetId, ControlAccountId, ProjectId, UserId, WorkPackageId};
use tracing::{debug, info};

use crate::error::StoreError;

#[derive(Debug, Default)]
struct ProjectState {
    budgets: Vec<Budget>,
    hierarchies: BTreeMap<BudgetId, CostHierarchy>,
    trackers: BTreeMap<WorkPackageId, ProgressTracker>,
    records: Vec<EvmRecord>,
    versions: BTreeMap<EvmScope, u64>,
    /// Bumped by every budget change; moves every scope's version at once.
    epoch: u64,
    baseline: Option<BaselineSnapshot>,
}

impl ProjectState {
    fn version(&self, scope: EvmScope) -> u64 {
        self.epoch + self.versions.get(&scope).copied().unwrap_or(0)
    }

    fn bump(&mut self, scope: EvmScope) {
        *self.versions.entry(scope).or_insert(0) += 1;
    }

    fn budget(&self, id: BudgetId) -> Result<&Budget, StoreError> {
        self.budgets
            .iter()
            .find(|b| b.id == id)
            .ok_or(StoreError::BudgetNotFound(id))
    }

    fn hierarchy(&self, id: BudgetId) -> Result<&CostHierarchy, StoreError> {
        self.hierarchies
            .get(&id)
            .ok_or(StoreError::BudgetNotFound(id))
    }

    fn current_id(&self, project_id: ProjectId) -> Result<BudgetId, RollupError> {
        BudgetManager::current_version(&self.budgets)
            .map(|b| b.id)
            .ok_or(RollupError::NoCurrentBudget(project_id))
    }

    fn current_hierarchy(&self, project_id: ProjectId) -> Result<&CostHierarchy, RollupError> {
        let id = self.current_id(project_id)?;
        self.hierarchies
            .get(&id)
            .ok_or(RollupError::NoCurrentBudget(project_id))
    }

    fn record_index(&self, scope: EvmScope, data_date: NaiveDate) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.scope() == scope && r.data_date() == data_date)
    }

    fn replace_budget(&mut self, budget: Budget) {
        if let Some(slot) = self.budgets.iter_mut().find(|b| b.id == budget.id) {
            *slot = budget;
        }
    }

    /// Builds the new or updated record for `scope` at `data_date` without
    /// storing it.
    fn prepare_record(
        &self,
        project_id: ProjectId,
        scope: EvmScope,
        data_date: NaiveDate,
        values: EvmValues,
        by: UserId,
    ) -> Result<(Option<usize>, EvmRecord), EvmError> {
        match self.record_index(scope, data_date) {
            Some(index) => {
                let mut record = self.records[index].clone();
                record.update_values(values, by)?;
                Ok((Some(index), record))
            }
            None => Ok((None, EvmRecord::new(project_id, scope, data_date, values, by)?)),
        }
    }

    fn put_record(&mut self, slot: Option<usize>, record: EvmRecord) {
        match slot {
            Some(index) => self.records[index] = record,
            None => self.records.push(record),
        }
    }

    /// Stores a work package's new tracker, copies its latest progress onto
    /// the current hierarchy, and recomputes its EVM record at `data_date`.
    fn commit_work_package(
        &mut self,
        project_id: ProjectId,
        budget_id: BudgetId,
        tracker: ProgressTracker,
        data_date: NaiveDate,
        by: UserId,
    ) -> Result<EvmRecord, StoreError> {
        let wp_id = tracker.work_package_id();
        let mut hierarchy = self.hierarchy(budget_id)?.clone();
        if let Some(latest) = tracker.latest() {
            hierarchy.apply_progress(
                wp_id,
                latest.progress_percentage,
                latest.actual_cost,
                latest.committed_cost,
                by,
            )?;
        }
        let wp = hierarchy.work_package(wp_id)?;
        let ca = wp.control_account_id;
        let values = tracker.evaluate(wp, data_date)?;

        let scope = EvmScope::WorkPackage(wp_id);
        let (slot, record) = self.prepare_record(project_id, scope, data_date, values, by)?;

        self.put_record(slot, record.clone());
        self.trackers.insert(wp_id, tracker);
        self.hierarchies.insert(budget_id, hierarchy);
        for touched in [scope, EvmScope::ControlAccount(ca), EvmScope::Project(project_id)] {
            self.bump(touched);
        }
        Ok(record)
    }
}

/// In-memory store of budgets, progress, and EVM records, keyed by project.
///
/// Budget versions change only through the named lifecycle and draft-edit
/// operations, each applied by the store's `BudgetManager`.
#[derive(Debug, Default)]
pub struct ProjectStore {
    projects: DashMap<ProjectId, ProjectState>,
    manager: BudgetManager,
}

impl ProjectStore {
    /// Creates an empty store using the default budget manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store applying budget changes with `manager`.
    #[must_use]
    pub fn with_manager(manager: BudgetManager) -> Self {
        Self {
            projects: DashMap::new(),
            manager,
        }
    }

    /// Ids of every stored project, sorted.
    pub fn project_ids(&self) -> Vec<ProjectId> {
        let mut ids: Vec<ProjectId> = self.projects.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    // ------------------------------------------------------------------
    // Budgets
    // ------------------------------------------------------------------

    /// Stores a budget version with its hierarchy, creating the project on
    /// first use.
    pub fn insert_budget(&self, budget: Budget, hierarchy: CostHierarchy) -> Result<(), StoreError> {
        if hierarchy.budget_id() != budget.id {
            return Err(BudgetError::HierarchyMismatch {
                budget: budget.id,
                hierarchy: hierarchy.budget_id(),
            }
            .into());
        }
        let mut entry = self.projects.entry(budget.project_id).or_default();
        let state = entry.value_mut();
        if state.budgets.iter().any(|b| b.id == budget.id) {
            return Err(StoreError::DuplicateBudget(budget.id));
        }

        info!(
            budget_id = %budget.id,
            project_id = %budget.project_id,
            version = budget.version,
            status = %budget.status,
            "Budget stored"
        );
        state.hierarchies.insert(budget.id, hierarchy);
        state.budgets.push(budget);
        state.epoch += 1;
        Ok(())
    }

    /// Runs `f` on copies of a budget version and its hierarchy, keeping
    /// the changes only if `f` succeeds.
    fn modify_budget<T>(
        &self,
        project_id: ProjectId,
        budget_id: BudgetId,
        f: impl FnOnce(&BudgetManager, &mut Budget, &mut CostHierarchy) -> Result<T, BudgetError>,
    ) -> Result<T, StoreError> {
        let mut entry = self
            .projects
            .get_mut(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        let state = entry.value_mut();
        let mut budget = state.budget(budget_id)?.clone();
        let mut hierarchy = state.hierarchy(budget_id)?.clone();

        let out = f(&self.manager, &mut budget, &mut hierarchy)?;

        state.replace_budget(budget);
        state.hierarchies.insert(budget_id, hierarchy);
        state.epoch += 1;
        Ok(out)
    }

    /// Edits the hierarchy of a draft version. `f` receives the store's
    /// manager, whose edit operations enforce the draft-only rule.
    pub fn edit_draft<T>(
        &self,
        project_id: ProjectId,
        budget_id: BudgetId,
        f: impl FnOnce(&BudgetManager, &Budget, &mut CostHierarchy) -> Result<T, BudgetError>,
    ) -> Result<T, StoreError> {
        self.modify_budget(project_id, budget_id, |manager, budget, hierarchy| {
            if !budget.status.is_editable() {
                return Err(BudgetError::NotEditable(budget.status));
            }
            f(manager, budget, hierarchy)
        })
    }

    /// Replaces the total and reserves of a draft version.
    pub fn update_draft_amounts(
        &self,
        project_id: ProjectId,
        budget_id: BudgetId,
        amounts: BudgetAmounts,
        updated_by: UserId,
    ) -> Result<(), StoreError> {
        self.modify_budget(project_id, budget_id, |manager, budget, hierarchy| {
            manager.update_amounts(budget, hierarchy, amounts, updated_by)
        })
    }

    /// Submits a draft version for approval.
    pub fn submit_budget(&self, project_id: ProjectId, budget_id: BudgetId, submitted_by: UserId) -> Result<(), StoreError> {
        self.modify_budget(project_id, budget_id, |manager, budget, _| {
            manager.submit(budget, submitted_by)
        })
    }

    /// Approves a submitted version that reconciles with its hierarchy.
    pub fn approve_budget(
        &self,
        project_id: ProjectId,
        budget_id: BudgetId,
        approved_by: UserId,
        comments: Option<String>,
    ) -> Result<ReconciliationReport, StoreError> {
        self.modify_budget(project_id, budget_id, |manager, budget, hierarchy| {
            manager.approve(budget, hierarchy, approved_by, comments)
        })
    }

    /// Rejects a submitted version.
    pub fn reject_budget(
        &self,
        project_id: ProjectId,
        budget_id: BudgetId,
        rejected_by: UserId,
        reason: String,
    ) -> Result<(), StoreError> {
        self.modify_budget(project_id, budget_id, |manager, budget, _| {
            manager.reject(budget, rejected_by, reason)
        })
    }

    /// Returns a rejected version to draft.
    pub fn reopen_budget(&self, project_id: ProjectId, budget_id: BudgetId, reopened_by: UserId) -> Result<(), StoreError> {
        self.modify_budget(project_id, budget_id, |manager, budget, _| {
            manager.reopen(budget, reopened_by)
        })
    }

    /// Revises an approved or baseline version and stores the new draft in
    /// the same step. Returns the new version's id.
    pub fn revise_budget(
        &self,
        project_id: ProjectId,
        budget_id: BudgetId,
        revised_by: UserId,
        reason: String,
    ) -> Result<BudgetId, StoreError> {
        let mut entry = self
            .projects
            .get_mut(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        let state = entry.value_mut();
        if let Some(successor) = state
            .budgets
            .iter()
            .find(|b| b.previous_version_id == Some(budget_id))
        {
            return Err(BudgetError::AlreadyRevised {
                budget: budget_id,
                successor: successor.id,
            }
            .into());
        }
        let mut prior = state.budget(budget_id)?.clone();
        let hierarchy = state.hierarchy(budget_id)?;

        let (next, next_hierarchy) = self.manager.revise(&mut prior, hierarchy, revised_by, reason)?;

        let next_id = next.id;
        state.replace_budget(prior);
        state.hierarchies.insert(next_id, next_hierarchy);
        state.budgets.push(next);
        state.epoch += 1;
        Ok(next_id)
    }

    /// A budget version and its hierarchy.
    pub fn budget(&self, project_id: ProjectId, budget_id: BudgetId) -> Result<(Budget, CostHierarchy), StoreError> {
        let state = self
            .projects
            .get(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        Ok((
            state.budget(budget_id)?.clone(),
            state.hierarchy(budget_id)?.clone(),
        ))
    }

    /// Every budget version of a project, in insertion order.
    pub fn budgets(&self, project_id: ProjectId) -> Vec<Budget> {
        self.projects
            .get(&project_id)
            .map(|s| s.budgets.clone())
            .unwrap_or_default()
    }

    /// The project's current budget: its baseline, else its latest approved
    /// version.
    pub fn current_budget(&self, project_id: ProjectId) -> Result<(Budget, CostHierarchy), StoreError> {
        let state = self
            .projects
            .get(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        let id = state
            .current_id(project_id)
            .map_err(|_| StoreError::NoCurrentBudget(project_id))?;
        Ok((state.budget(id)?.clone(), state.hierarchy(id)?.clone()))
    }

    // ------------------------------------------------------------------
    // Progress
    // ------------------------------------------------------------------

    /// Records progress against a work package of the current budget and
    /// recomputes the package's EVM record at the progress date.
    pub fn record_progress(&self, project_id: ProjectId, input: ProgressInput) -> Result<EvmRecord, StoreError> {
        let mut entry = self
            .projects
            .get_mut(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        let state = entry.value_mut();
        let budget_id = state.current_id(project_id)?;
        let wp = state.hierarchy(budget_id)?.work_package(input.work_package_id)?;

        let mut tracker = state
            .trackers
            .get(&wp.id)
            .cloned()
            .unwrap_or_else(|| ProgressTracker::new(wp.id));
        let data_date = input.progress_date;
        let reported_by = input.reported_by;
        let percentage = tracker.record(wp, input)?.progress_percentage;

        let record = state.commit_work_package(project_id, budget_id, tracker, data_date, reported_by)?;
        info!(
            scope = %record.scope(),
            data_date = %data_date,
            percentage = %percentage,
            user_id = %reported_by,
            "Progress recorded"
        );
        Ok(record)
    }

    /// Completes a weighted milestone and recomputes the package's EVM record
    /// at the completion date.
    pub fn complete_milestone(
        &self,
        project_id: ProjectId,
        work_package_id: WorkPackageId,
        name: &str,
        date: NaiveDate,
        completed_by: UserId,
    ) -> Result<EvmRecord, StoreError> {
        let mut entry = self
            .projects
            .get_mut(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        let state = entry.value_mut();
        let budget_id = state.current_id(project_id)?;
        let wp = state.hierarchy(budget_id)?.work_package(work_package_id)?;

        let mut tracker = state
            .trackers
            .get(&wp.id)
            .cloned()
            .unwrap_or_else(|| ProgressTracker::new(wp.id));
        tracker.complete_milestone(wp, name, date)?;

        let record = state.commit_work_package(project_id, budget_id, tracker, date, completed_by)?;
        info!(
            work_package_id = %work_package_id,
            milestone = name,
            date = %date,
            "Milestone completed"
        );
        Ok(record)
    }

    /// Approves a work package's progress entries dated on or before
    /// `through`. Returns how many entries were newly approved.
    pub fn approve_progress_through(
        &self,
        project_id: ProjectId,
        work_package_id: WorkPackageId,
        through: NaiveDate,
        approved_by: UserId,
    ) -> Result<usize, StoreError> {
        let mut entry = self
            .projects
            .get_mut(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        let tracker = entry
            .value_mut()
            .trackers
            .get_mut(&work_package_id)
            .ok_or(HierarchyError::WorkPackageNotFound(work_package_id))?;
        let approved = tracker.approve_through(through, approved_by);
        info!(
            work_package_id = %work_package_id,
            through = %through,
            approved,
            "Progress approved"
        );
        Ok(approved)
    }

    /// Progress history of a work package.
    pub fn tracker(&self, project_id: ProjectId, work_package_id: WorkPackageId) -> Option<ProgressTracker> {
        self.projects
            .get(&project_id)
            .and_then(|s| s.trackers.get(&work_package_id).cloned())
    }

    // ------------------------------------------------------------------
    // EVM records
    // ------------------------------------------------------------------

    /// The record of `scope` at `data_date`.
    pub fn record(&self, project_id: ProjectId, scope: EvmScope, data_date: NaiveDate) -> Result<EvmRecord, StoreError> {
        let state = self
            .projects
            .get(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        state
            .record_index(scope, data_date)
            .map(|i| state.records[i].clone())
            .ok_or(StoreError::RecordNotFound { scope, data_date })
    }

    /// Every EVM record of a project, in creation order.
    pub fn records(&self, project_id: ProjectId) -> Vec<EvmRecord> {
        self.projects
            .get(&project_id)
            .map(|s| s.records.clone())
            .unwrap_or_default()
    }

    /// Replaces a record's measures. Fails on approved or baseline records.
    pub fn update_record_values(
        &self,
        project_id: ProjectId,
        scope: EvmScope,
        data_date: NaiveDate,
        values: EvmValues,
        updated_by: UserId,
    ) -> Result<EvmRecord, StoreError> {
        self.edit_record(project_id, scope, data_date, |record| {
            record.update_values(values, updated_by)
        })
    }

    /// Approves a record, making it read-only.
    pub fn approve_record(
        &self,
        project_id: ProjectId,
        scope: EvmScope,
        data_date: NaiveDate,
        approved_by: UserId,
    ) -> Result<EvmRecord, StoreError> {
        let record = self.edit_record(project_id, scope, data_date, |record| record.approve(approved_by))?;
        info!(
            record_id = %record.id(),
            scope = %scope,
            data_date = %data_date,
            user_id = %approved_by,
            "EVM record approved"
        );
        Ok(record)
    }

    fn edit_record(
        &self,
        project_id: ProjectId,
        scope: EvmScope,
        data_date: NaiveDate,
        edit: impl FnOnce(&mut EvmRecord) -> Result<(), EvmError>,
    ) -> Result<EvmRecord, StoreError> {
        let mut entry = self
            .projects
            .get_mut(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        let state = entry.value_mut();
        let index = state
            .record_index(scope, data_date)
            .ok_or(StoreError::RecordNotFound { scope, data_date })?;
        edit(&mut state.records[index])?;
        Ok(state.records[index].clone())
    }

    // ------------------------------------------------------------------
    // Baseline
    // ------------------------------------------------------------------

    /// Makes an approved budget version the project's baseline, superseding
    /// the current baseline and moving the record baseline flags.
    pub fn set_baseline(
        &self,
        project_id: ProjectId,
        budget_id: BudgetId,
        baselined_by: UserId,
    ) -> Result<BaselineSnapshot, StoreError> {
        let mut entry = self
            .projects
            .get_mut(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        let state = entry.value_mut();
        let mut budget = state.budget(budget_id)?.clone();
        let mut prior = state
            .budgets
            .iter()
            .find(|b| b.id != budget_id && b.status == BudgetStatus::Baseline && b.lifecycle.is_active())
            .cloned();
        let hierarchy = state
            .hierarchies
            .get(&budget_id)
            .ok_or(StoreError::BudgetNotFound(budget_id))?;

        let snapshot = BaselineManager::set_baseline(
            &mut budget,
            prior.as_mut(),
            hierarchy,
            &mut state.records,
            baselined_by,
        )?;

        state.replace_budget(budget);
        if let Some(prior) = prior {
            state.replace_budget(prior);
        }
        state.baseline = Some(snapshot.clone());
        state.epoch += 1;
        Ok(snapshot)
    }

    /// The project's current baseline snapshot.
    pub fn baseline(&self, project_id: ProjectId) -> Option<BaselineSnapshot> {
        self.projects.get(&project_id).and_then(|s| s.baseline.clone())
    }

    /// Compares the record of `scope` at `data_date` with the baseline.
    pub fn compare_to_baseline(
        &self,
        project_id: ProjectId,
        scope: EvmScope,
        data_date: NaiveDate,
    ) -> Result<BaselineComparison, StoreError> {
        let state = self
            .projects
            .get(&project_id)
            .ok_or(StoreError::ProjectNotFound(project_id))?;
        let snapshot = state
            .baseline
            .as_ref()
            .ok_or(StoreError::NoBaseline(project_id))?;
        let record = state
            .record_index(scope, data_date)
            .map(|i| &state.records[i])
            .ok_or(StoreError::RecordNotFound { scope, data_date })?;
        Ok(BaselineManager::compare_to_baseline(record, snapshot)?)
    }

    /// Current version of a scope, as seen by rollup commits.
    pub fn scope_version(&self, project_id: ProjectId, scope: EvmScope) -> u64 {
        self.projects
            .get(&project_id)
            .map_or(0, |s| s.version(scope))
    }
}

impl RollupStore for ProjectStore {
    fn control_account_ids(&self, project_id: ProjectId) -> Result<Vec<ControlAccountId>, RollupError> {
        let state = self
            .projects
            .get(&project_id)
            .ok_or(RollupError::ProjectNotFound(project_id))?;
        Ok(state.current_hierarchy(project_id)?.control_account_ids())
    }

    fn load(
        &self,
        project_id: ProjectId,
        scope: EvmScope,
        data_date: NaiveDate,
    ) -> Result<RollupInputs, RollupError> {
        let state = self
            .projects
            .get(&project_id)
            .ok_or(RollupError::ProjectNotFound(project_id))?;
        let hierarchy = state.current_hierarchy(project_id)?;

        let parts = match scope {
            EvmScope::WorkPackage(id) => vec![RollupAggregator::work_package_values(
                hierarchy.work_package(id)?,
                state.trackers.get(&id),
                data_date,
            )?],
            EvmScope::ControlAccount(ca) => {
                RollupAggregator::control_account_inputs(hierarchy, ca, &state.trackers, data_date)?
            }
            EvmScope::Project(id) if id == project_id => {
                RollupAggregator::evaluate_project(project_id, hierarchy, &state.trackers, data_date)?
                    .control_accounts
                    .iter()
                    .map(|s| s.values)
                    .collect()
            }
            EvmScope::Project(id) => return Err(RollupError::ProjectNotFound(id)),
        };

        Ok(RollupInputs {
            version: state.version(scope),
            parts,
        })
    }

    fn commit(&self, commit: ScopeCommit) -> Result<(), RollupError> {
        let project_id = commit.project_id;
        let mut entry = self
            .projects
            .get_mut(&project_id)
            .ok_or(RollupError::ProjectNotFound(project_id))?;
        let state = entry.value_mut();

        let snapshot = commit.snapshot;
        let found = state.version(snapshot.scope);
        if found != commit.expected_version {
            return Err(RollupError::VersionConflict {
                scope: snapshot.scope,
                expected: commit.expected_version,
                found,
            });
        }

        let (slot, record) = state
            .prepare_record(
                project_id,
                snapshot.scope,
                snapshot.data_date,
                snapshot.values,
                commit.committed_by,
            )?;
        state.put_record(slot, record);
        state.bump(snapshot.scope);

        debug!(
            scope = %snapshot.scope,
            level = snapshot.scope.level(),
            data_date = %snapshot.data_date,
            version = found + 1,
            "Scope record written"
        );
        Ok(())
    }
}
