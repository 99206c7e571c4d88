//! Id-keyed arena holding one budget version's cost hierarchy.

use std::collections::BTreeMap;

use meridian_shared::types::{BudgetId, ControlAccountId, PlanningPackageId, UserId, WorkPackageId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::checked_sum;
use crate::hierarchy::error::HierarchyError;
use crate::hierarchy::types::{ControlAccount, ControlAccountStatus, PlanningPackage, WorkPackage};

/// Control accounts, work packages and planning packages of one budget version.
///
/// Children point at their control account by id. Every edit that changes
/// a package's budget refreshes the parent's BAC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostHierarchy {
    budget_id: BudgetId,
    control_accounts: BTreeMap<ControlAccountId, ControlAccount>,
    work_packages: BTreeMap<WorkPackageId, WorkPackage>,
    planning_packages: BTreeMap<PlanningPackageId, PlanningPackage>,
}

impl CostHierarchy {
    /// Creates an empty hierarchy for `budget_id`.
    #[must_use]
    pub const fn new(budget_id: BudgetId) -> Self {
        Self {
            budget_id,
            control_accounts: BTreeMap::new(),
            work_packages: BTreeMap::new(),
            planning_packages: BTreeMap::new(),
        }
    }

    /// Budget version owning this hierarchy.
    #[must_use]
    pub const fn budget_id(&self) -> BudgetId {
        self.budget_id
    }

    /// Deep copy for a new budget version. Entity ids are kept.
    #[must_use]
    pub fn clone_for_budget(&self, budget_id: BudgetId) -> Self {
        Self {
            budget_id,
            ..self.clone()
        }
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Active control account by id.
    pub fn control_account(&self, id: ControlAccountId) -> Result<&ControlAccount, HierarchyError> {
        self.control_accounts
            .get(&id)
            .filter(|ca| ca.lifecycle.is_active())
            .ok_or(HierarchyError::ControlAccountNotFound(id))
    }

    /// Active work package by id.
    pub fn work_package(&self, id: WorkPackageId) -> Result<&WorkPackage, HierarchyError> {
        self.work_packages
            .get(&id)
            .filter(|wp| wp.lifecycle.is_active())
            .ok_or(HierarchyError::WorkPackageNotFound(id))
    }

    /// Active planning package by id.
    pub fn planning_package(&self, id: PlanningPackageId) -> Result<&PlanningPackage, HierarchyError> {
        self.planning_packages
            .get(&id)
            .filter(|pp| pp.lifecycle.is_active())
            .ok_or(HierarchyError::PlanningPackageNotFound(id))
    }

    /// Active control accounts in id order.
    pub fn control_accounts(&self) -> impl Iterator<Item = &ControlAccount> {
        self.control_accounts
            .values()
            .filter(|ca| ca.lifecycle.is_active())
    }

    /// Ids of active control accounts in id order.
    #[must_use]
    pub fn control_account_ids(&self) -> Vec<ControlAccountId> {
        self.control_accounts().map(|ca| ca.id).collect()
    }

    /// Every active work package in id order.
    pub fn work_packages(&self) -> impl Iterator<Item = &WorkPackage> {
        self.work_packages.values().filter(|wp| wp.lifecycle.is_active())
    }

    /// Every active planning package in id order.
    pub fn planning_packages(&self) -> impl Iterator<Item = &PlanningPackage> {
        self.planning_packages
            .values()
            .filter(|pp| pp.lifecycle.is_active())
    }

    /// Active work packages of a control account.
    pub fn work_packages_of(&self, ca: ControlAccountId) -> impl Iterator<Item = &WorkPackage> {
        self.work_packages()
            .filter(move |wp| wp.control_account_id == ca)
    }

    /// Active, unconverted planning packages of a control account.
    pub fn unconverted_planning_packages_of(
        &self,
        ca: ControlAccountId,
    ) -> impl Iterator<Item = &PlanningPackage> {
        self.planning_packages()
            .filter(move |pp| pp.control_account_id == ca && !pp.is_converted)
    }

    /// BAC of a control account recomputed from its children.
    pub fn computed_bac(&self, ca: ControlAccountId) -> Result<Decimal, HierarchyError> {
        let work = self.work_packages_of(ca).map(|wp| wp.budget);
        let planning = self
            .unconverted_planning_packages_of(ca)
            .map(|pp| pp.total_budget);
        checked_sum(work.chain(planning)).ok_or(HierarchyError::Overflow)
    }

    /// Sum of the stored BAC of every active control account.
    pub fn total_bac(&self) -> Result<Decimal, HierarchyError> {
        checked_sum(self.control_accounts().map(|ca| ca.bac)).ok_or(HierarchyError::Overflow)
    }

    /// Fails if adding `amount` under `ca` would overflow its BAC or the
    /// hierarchy total.
    fn check_room(&self, ca: ControlAccountId, amount: Decimal) -> Result<(), HierarchyError> {
        self.computed_bac(ca)?
            .checked_add(amount)
            .and(self.total_bac()?.checked_add(amount))
            .map(|_| ())
            .ok_or(HierarchyError::Overflow)
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Adds a control account. Its BAC is derived from its children.
    pub fn insert_control_account(&mut self, mut ca: ControlAccount) -> Result<(), HierarchyError> {
        if self.control_accounts.contains_key(&ca.id) {
            return Err(HierarchyError::DuplicateId(ca.id.to_string()));
        }
        if self.control_accounts().any(|other| other.code == ca.code) {
            return Err(HierarchyError::DuplicateCode(ca.code));
        }
        ca.bac = Decimal::ZERO;
        self.control_accounts.insert(ca.id, ca);
        Ok(())
    }

    /// Adds a work package under an open control account.
    pub fn insert_work_package(&mut self, wp: WorkPackage) -> Result<(), HierarchyError> {
        self.check_new_child(wp.control_account_id, &wp.code)?;
        if self.work_packages.contains_key(&wp.id) {
            return Err(HierarchyError::DuplicateId(wp.id.to_string()));
        }
        let ca = wp.control_account_id;
        self.check_room(ca, wp.budget)?;
        self.work_packages.insert(wp.id, wp);
        self.refresh_bac(ca)
    }

    /// Adds a planning package under an open control account.
    pub fn insert_planning_package(&mut self, pp: PlanningPackage) -> Result<(), HierarchyError> {
        self.check_new_child(pp.control_account_id, &pp.code)?;
        if self.planning_packages.contains_key(&pp.id) {
            return Err(HierarchyError::DuplicateId(pp.id.to_string()));
        }
        let ca = pp.control_account_id;
        self.check_room(ca, pp.total_budget)?;
        self.planning_packages.insert(pp.id, pp);
        self.refresh_bac(ca)
    }

    /// Replaces a work package, keeping it under its existing control account.
    pub fn replace_work_package(&mut self, wp: WorkPackage) -> Result<(), HierarchyError> {
        let existing = self.work_package(wp.id)?;
        let previous_ca = existing.control_account_id;
        if wp.code != existing.code
            && self
                .work_packages_of(wp.control_account_id)
                .any(|other| other.id != wp.id && other.code == wp.code)
        {
            return Err(HierarchyError::DuplicateCode(wp.code));
        }
        self.control_account(wp.control_account_id)?;

        let ca = wp.control_account_id;
        self.check_room(ca, wp.budget)?;
        self.work_packages.insert(wp.id, wp);
        self.refresh_bac(previous_ca)?;
        self.refresh_bac(ca)
    }

    /// Soft-deletes a work package.
    pub fn remove_work_package(&mut self, id: WorkPackageId, removed_by: UserId) -> Result<(), HierarchyError> {
        let wp = self
            .work_packages
            .get_mut(&id)
            .filter(|wp| wp.lifecycle.is_active())
            .ok_or(HierarchyError::WorkPackageNotFound(id))?;
        wp.lifecycle.soft_delete();
        wp.audit.touch(removed_by);
        let ca = wp.control_account_id;
        self.refresh_bac(ca)
    }

    /// Marks a planning package converted, moving its budget out of the
    /// control account's BAC.
    pub fn mark_converted(&mut self, id: PlanningPackageId, converted_by: UserId) -> Result<(), HierarchyError> {
        let pp = self
            .planning_packages
            .get_mut(&id)
            .filter(|pp| pp.lifecycle.is_active())
            .ok_or(HierarchyError::PlanningPackageNotFound(id))?;
        pp.is_converted = true;
        pp.audit.touch(converted_by);
        let ca = pp.control_account_id;
        self.refresh_bac(ca)
    }

    /// Copies the latest reported progress onto a work package.
    ///
    /// Progress fields are operational data, not budget, so this is allowed
    /// in every budget status.
    pub fn apply_progress(
        &mut self,
        id: WorkPackageId,
        progress_percentage: Decimal,
        actual_cost: Decimal,
        committed_cost: Decimal,
        updated_by: UserId,
    ) -> Result<(), HierarchyError> {
        let wp = self
            .work_packages
            .get_mut(&id)
            .filter(|wp| wp.lifecycle.is_active())
            .ok_or(HierarchyError::WorkPackageNotFound(id))?;
        wp.progress_percentage = progress_percentage;
        wp.actual_cost = actual_cost;
        wp.committed_cost = committed_cost;
        wp.audit.touch(updated_by);
        Ok(())
    }

    /// Stores the BAC recomputed from children on the control account.
    fn refresh_bac(&mut self, ca: ControlAccountId) -> Result<(), HierarchyError> {
        let bac = self.computed_bac(ca)?;
        if let Some(account) = self.control_accounts.get_mut(&ca) {
            account.bac = bac;
        }
        Ok(())
    }

    fn check_new_child(&self, ca: ControlAccountId, code: &str) -> Result<(), HierarchyError> {
        let account = self.control_account(ca)?;
        if account.status == ControlAccountStatus::Closed {
            return Err(HierarchyError::ControlAccountClosed(ca));
        }
        let taken = self.work_packages_of(ca).any(|wp| wp.code == code)
            || self.planning_packages().any(|pp| pp.control_account_id == ca && pp.code == code);
        if taken {
            return Err(HierarchyError::DuplicateCode(code.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "arena_tests.rs"]
mod tests;
