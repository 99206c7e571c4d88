//! Progress history and earned value per work package.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use meridian_shared::types::{UserId, WorkPackageId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::checked_sum;
use crate::evm::EvmValues;
use crate::hierarchy::WorkPackage;
use crate::progress::error::ProgressError;
use crate::progress::types::{ProgressEntry, ProgressInput, ProgressMethod, WorkStatus};

/// Append-only progress history of one work package.
///
/// Entries are kept in non-decreasing date order. Costs on each entry are
/// cumulative to its date, so the latest entry on or before a data date
/// fully describes the package at that date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressTracker {
    work_package_id: WorkPackageId,
    entries: Vec<ProgressEntry>,
    completed_milestones: BTreeMap<String, NaiveDate>,
}

impl ProgressTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new(work_package_id: WorkPackageId) -> Self {
        Self {
            work_package_id,
            entries: Vec::new(),
            completed_milestones: BTreeMap::new(),
        }
    }

    /// Work package this tracker belongs to.
    #[must_use]
    pub const fn work_package_id(&self) -> WorkPackageId {
        self.work_package_id
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[ProgressEntry] {
        &self.entries
    }

    /// Most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&ProgressEntry> {
        self.entries.last()
    }

    /// Most recent approved entry.
    #[must_use]
    pub fn latest_approved(&self) -> Option<&ProgressEntry> {
        self.entries.iter().rev().find(|e| e.is_approved)
    }

    /// Latest entry dated on or before `date`.
    #[must_use]
    pub fn entry_at(&self, date: NaiveDate) -> Option<&ProgressEntry> {
        self.entries.iter().rev().find(|e| e.progress_date <= date)
    }

    /// Milestones completed so far, with completion dates.
    #[must_use]
    pub const fn completed_milestones(&self) -> &BTreeMap<String, NaiveDate> {
        &self.completed_milestones
    }

    /// Validates and appends a progress report.
    ///
    /// # Errors
    ///
    /// * `ProgressError::PercentageOutOfRange` / `NegativeCost` for bad input
    /// * `ProgressError::OutOfOrder` if dated before the latest entry
    /// * `ProgressError::BelowApproved` if below the latest approved percentage
    /// * `ProgressError::Regression` if below the latest percentage and the
    ///   method only moves forward
    pub fn record(
        &mut self,
        work_package: &WorkPackage,
        input: ProgressInput,
    ) -> Result<&ProgressEntry, ProgressError> {
        if input.work_package_id != self.work_package_id || work_package.id != self.work_package_id {
            return Err(ProgressError::WorkPackageMismatch {
                expected: self.work_package_id,
                got: input.work_package_id,
            });
        }

        let pct = input.progress_percentage;
        if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
            return Err(ProgressError::PercentageOutOfRange(pct));
        }
        for (field, value) in [
            ("actualCost", input.actual_cost),
            ("committedCost", input.committed_cost),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ProgressError::NegativeCost { field, value });
            }
        }

        if let Some(last) = self.latest()
            && input.progress_date < last.progress_date
        {
            return Err(ProgressError::OutOfOrder {
                date: input.progress_date,
                last: last.progress_date,
            });
        }

        if let Some(approved) = self.latest_approved()
            && pct < approved.progress_percentage
        {
            return Err(ProgressError::BelowApproved {
                percentage: pct,
                approved: approved.progress_percentage,
            });
        }

        if work_package.progress_method.is_monotonic()
            && let Some(last) = self.latest()
            && pct < last.progress_percentage
        {
            return Err(ProgressError::Regression {
                percentage: pct,
                last: last.progress_percentage,
            });
        }

        self.entries.push(ProgressEntry::from_input(input));
        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    /// Approves every entry dated on or before `through`.
    ///
    /// Returns the number of newly approved entries.
    pub fn approve_through(&mut self, through: NaiveDate, approved_by: UserId) -> usize {
        let now = Utc::now();
        let mut approved = 0;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.progress_date <= through && !e.is_approved)
        {
            entry.is_approved = true;
            entry.approved_by = Some(approved_by);
            entry.approved_at = Some(now);
            entry.audit.touch(approved_by);
            approved += 1;
        }
        approved
    }

    /// Marks a weighted milestone complete on `date`.
    ///
    /// The date must fall after the latest approved entry; approved periods
    /// are closed.
    pub fn complete_milestone(
        &mut self,
        work_package: &WorkPackage,
        name: &str,
        date: NaiveDate,
    ) -> Result<(), ProgressError> {
        if !work_package.milestones.iter().any(|m| m.name == name) {
            return Err(ProgressError::UnknownMilestone(name.to_string()));
        }
        if self.completed_milestones.contains_key(name) {
            return Err(ProgressError::MilestoneAlreadyCompleted(name.to_string()));
        }
        if let Some(approved) = self.latest_approved()
            && date <= approved.progress_date
        {
            return Err(ProgressError::MilestoneInApprovedPeriod {
                date,
                approved_through: approved.progress_date,
            });
        }
        self.completed_milestones.insert(name.to_string(), date);
        Ok(())
    }

    /// Percent complete as of `date`; zero before the first entry.
    #[must_use]
    pub fn percentage_at(&self, date: NaiveDate) -> Decimal {
        self.entry_at(date)
            .map_or(Decimal::ZERO, |e| e.progress_percentage)
    }

    /// Cumulative actual cost as of `date`.
    #[must_use]
    pub fn actual_cost_at(&self, date: NaiveDate) -> Decimal {
        self.entry_at(date).map_or(Decimal::ZERO, |e| e.actual_cost)
    }

    /// Earned value as of `date` under the work package's progress method.
    ///
    /// # Errors
    ///
    /// `ProgressError::Overflow` if a share of the budget does not fit in
    /// a decimal.
    pub fn earned_value(&self, work_package: &WorkPackage, date: NaiveDate) -> Result<Decimal, ProgressError> {
        let budget = work_package.budget;
        let pct = self.percentage_at(date);

        match work_package.progress_method {
            ProgressMethod::Manual => percent_of(budget, pct),
            ProgressMethod::ZeroHundred => Ok(if pct >= Decimal::ONE_HUNDRED {
                budget
            } else {
                Decimal::ZERO
            }),
            ProgressMethod::FiftyFifty => {
                if pct >= Decimal::ONE_HUNDRED {
                    Ok(budget)
                } else if pct > Decimal::ZERO {
                    budget.checked_div(Decimal::TWO).ok_or(ProgressError::Overflow)
                } else {
                    Ok(Decimal::ZERO)
                }
            }
            ProgressMethod::LevelOfEffort => Ok(work_package.planned_value_at(date)),
            ProgressMethod::WeightedMilestone => {
                let earned = work_package.milestones.iter().filter(|m| {
                    self.completed_milestones
                        .get(&m.name)
                        .is_some_and(|done| *done <= date)
                });
                let weight =
                    checked_sum(earned.map(|m| m.weight)).ok_or(ProgressError::Overflow)?;
                percent_of(budget, weight)
            }
        }
    }

    /// PV, EV, AC and BAC of the work package as of `date`.
    pub fn evaluate(&self, work_package: &WorkPackage, date: NaiveDate) -> Result<EvmValues, ProgressError> {
        Ok(EvmValues::new(
            work_package.planned_value_at(date),
            self.earned_value(work_package, date)?,
            self.actual_cost_at(date),
            work_package.budget,
        )?)
    }

    /// Work status as of `date`.
    #[must_use]
    pub fn status_at(&self, date: NaiveDate) -> WorkStatus {
        match self.entry_at(date) {
            Some(e) if e.progress_percentage >= Decimal::ONE_HUNDRED => WorkStatus::Completed,
            Some(e) if e.progress_percentage > Decimal::ZERO || e.actual_cost > Decimal::ZERO => {
                WorkStatus::InProgress
            }
            _ => WorkStatus::NotStarted,
        }
    }
}

/// `pct` percent of `amount`. The fraction is taken first so large budgets
/// do not overflow in the intermediate product.
fn percent_of(amount: Decimal, pct: Decimal) -> Result<Decimal, ProgressError> {
    pct.checked_div(Decimal::ONE_HUNDRED)
        .and_then(|fraction| amount.checked_mul(fraction))
        .ok_or(ProgressError::Overflow)
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
