//! Progress domain types.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use meridian_shared::types::{AuditInfo, ProgressEntryId, UserId, WorkPackageId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::progress::error::ProgressError;

/// How earned value is derived from a work package's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMethod {
    /// Reported percent complete; 100 marks completion.
    #[default]
    Manual,
    /// Nothing earned until complete.
    ZeroHundred,
    /// Half earned on start, the rest on completion.
    FiftyFifty,
    /// Earned value tracks planned value.
    LevelOfEffort,
    /// Earned by completing weighted milestones.
    WeightedMilestone,
}

impl ProgressMethod {
    /// Returns the string representation of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::ZeroHundred => "zero_hundred",
            Self::FiftyFifty => "fifty_fifty",
            Self::LevelOfEffort => "level_of_effort",
            Self::WeightedMilestone => "weighted_milestone",
        }
    }

    /// Parses a method from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "manual" => Some(Self::Manual),
            "zero_hundred" => Some(Self::ZeroHundred),
            "fifty_fifty" => Some(Self::FiftyFifty),
            "level_of_effort" => Some(Self::LevelOfEffort),
            "weighted_milestone" => Some(Self::WeightedMilestone),
            _ => None,
        }
    }

    /// Returns true if the reported percentage may never decrease.
    #[must_use]
    pub const fn is_monotonic(&self) -> bool {
        !matches!(self, Self::Manual)
    }
}

impl fmt::Display for ProgressMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A weighted milestone of a work package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Milestone name, unique within the work package.
    pub name: String,
    /// Share of the budget earned on completion, in percent.
    pub weight: Decimal,
}

impl Milestone {
    /// Creates a milestone.
    #[must_use]
    pub fn new(name: impl Into<String>, weight: Decimal) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }

    /// Checks that names are unique and weights are non-negative and sum to 100.
    pub fn validate_weights(milestones: &[Self]) -> Result<(), ProgressError> {
        let mut names = BTreeSet::new();
        let mut sum = Decimal::ZERO;
        for m in milestones {
            if !names.insert(m.name.as_str()) {
                return Err(ProgressError::DuplicateMilestone(m.name.clone()));
            }
            if m.weight.is_sign_negative() && !m.weight.is_zero() {
                return Err(ProgressError::MilestoneWeights(m.weight));
            }
            sum += m.weight;
        }
        if sum != Decimal::ONE_HUNDRED {
            return Err(ProgressError::MilestoneWeights(sum));
        }
        Ok(())
    }
}

/// Progress report for one work package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInput {
    /// Work package reported on.
    pub work_package_id: WorkPackageId,
    /// Date the progress applies to.
    pub progress_date: NaiveDate,
    /// Percent complete, 0 to 100.
    pub progress_percentage: Decimal,
    /// Cumulative actual cost to date.
    pub actual_cost: Decimal,
    /// Cumulative committed cost to date.
    pub committed_cost: Decimal,
    /// Reporting user.
    pub reported_by: UserId,
}

/// A recorded progress report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Entry id.
    pub id: ProgressEntryId,
    /// Work package reported on.
    pub work_package_id: WorkPackageId,
    /// Date the progress applies to.
    pub progress_date: NaiveDate,
    /// Percent complete, 0 to 100.
    pub progress_percentage: Decimal,
    /// Cumulative actual cost to date.
    pub actual_cost: Decimal,
    /// Cumulative committed cost to date.
    pub committed_cost: Decimal,
    /// Reporting user.
    pub reported_by: UserId,
    /// Whether the entry has been approved (and is immutable).
    pub is_approved: bool,
    /// Approver.
    pub approved_by: Option<UserId>,
    /// Approval time.
    pub approved_at: Option<DateTime<Utc>>,
    /// Audit information.
    pub audit: AuditInfo,
}

impl ProgressEntry {
    pub(crate) fn from_input(input: ProgressInput) -> Self {
        Self {
            id: ProgressEntryId::new(),
            work_package_id: input.work_package_id,
            progress_date: input.progress_date,
            progress_percentage: input.progress_percentage,
            actual_cost: input.actual_cost,
            committed_cost: input.committed_cost,
            reported_by: input.reported_by,
            is_approved: false,
            approved_by: None,
            approved_at: None,
            audit: AuditInfo::new(input.reported_by),
        }
    }
}

/// Work status derived from the latest progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// No progress or cost reported.
    NotStarted,
    /// Started but not complete.
    InProgress,
    /// Reported 100% complete.
    Completed,
}
