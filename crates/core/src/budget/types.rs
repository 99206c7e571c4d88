//! Budget data types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use meridian_shared::types::{
    AuditInfo, BudgetId, ControlAccountId, Currency, Lifecycle, ProjectId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::progress::{Milestone, ProgressMethod};
use crate::schedule::{DistributionMethod, PeriodGranularity};

/// Budget version status.
///
/// Valid transitions:
/// - Draft → Submitted (submit)
/// - Submitted → Approved (approve, reconciled budgets only)
/// - Submitted → Rejected (reject)
/// - Rejected → Draft (reopen)
/// - Approved → Baseline (set baseline)
/// - Approved → Revised (revise)
/// - Baseline → Revised (superseded by a newer baseline)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Being prepared; the hierarchy may be edited.
    Draft,
    /// Waiting for approval.
    Submitted,
    /// Approved and eligible to become the baseline.
    Approved,
    /// Sent back by the approver.
    Rejected,
    /// The project's performance measurement baseline.
    Baseline,
    /// Replaced by a later version (immutable history).
    Revised,
}

impl BudgetStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Baseline => "baseline",
            Self::Revised => "revised",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "baseline" => Some(Self::Baseline),
            "revised" => Some(Self::Revised),
            _ => None,
        }
    }

    /// Returns true if the budget and its hierarchy can be modified.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the budget has passed approval.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved | Self::Baseline)
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One version of a project budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget version ID.
    pub id: BudgetId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Budget name.
    pub name: String,
    /// Version number, starting at 1.
    pub version: u32,
    /// Version this one revises.
    pub previous_version_id: Option<BudgetId>,
    /// Lifecycle status.
    pub status: BudgetStatus,
    /// Total amount including contingency and management reserve.
    pub total_amount: Decimal,
    /// Contingency held outside control accounts.
    pub contingency_amount: Decimal,
    /// Management reserve held outside control accounts.
    pub management_reserve: Decimal,
    /// Budget currency.
    pub currency: Currency,
    /// Rate from budget currency to the reporting currency.
    pub exchange_rate: Decimal,
    /// Submitter.
    pub submitted_by: Option<UserId>,
    /// Submission time.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Approver.
    pub approved_by: Option<UserId>,
    /// Approval time.
    pub approved_at: Option<DateTime<Utc>>,
    /// Approver's comments.
    pub approval_comments: Option<String>,
    /// Rejecting user.
    pub rejected_by: Option<UserId>,
    /// Rejection time.
    pub rejected_at: Option<DateTime<Utc>>,
    /// Reason given on rejection.
    pub rejection_reason: Option<String>,
    /// Reason this version was revised.
    pub revision_reason: Option<String>,
    /// Version that revises this one. At most one successor exists.
    pub revised_into: Option<BudgetId>,
    /// When this version became the baseline.
    pub baselined_at: Option<DateTime<Utc>>,
    /// Audit information.
    pub audit: AuditInfo,
    /// Soft-delete state.
    pub lifecycle: Lifecycle,
}

impl Budget {
    /// Amount that must be covered by control accounts, or `None` on overflow.
    #[must_use]
    pub fn distributable_amount(&self) -> Option<Decimal> {
        self.total_amount
            .checked_sub(self.contingency_amount)?
            .checked_sub(self.management_reserve)
    }

    /// Total converted to the reporting currency at the budget's rate.
    #[must_use]
    pub fn total_in_reporting_currency(&self, reporting: Currency) -> Option<Decimal> {
        if reporting == self.currency {
            Some(self.total_amount)
        } else {
            self.total_amount
                .checked_mul(self.exchange_rate)
                .map(|total| reporting.round(total))
        }
    }

    /// Applies a validated lifecycle action.
    pub fn apply(&mut self, action: &BudgetAction) {
        self.status = action.new_status();
        match action {
            BudgetAction::Submit {
                submitted_by,
                submitted_at,
                ..
            } => {
                self.submitted_by = Some(*submitted_by);
                self.submitted_at = Some(*submitted_at);
                self.audit.touch(*submitted_by);
            }
            BudgetAction::Approve {
                approved_by,
                approved_at,
                comments,
                ..
            } => {
                self.approved_by = Some(*approved_by);
                self.approved_at = Some(*approved_at);
                self.approval_comments.clone_from(comments);
                self.audit.touch(*approved_by);
            }
            BudgetAction::Reject {
                rejected_by,
                rejected_at,
                reason,
                ..
            } => {
                self.rejected_by = Some(*rejected_by);
                self.rejected_at = Some(*rejected_at);
                self.rejection_reason = Some(reason.clone());
                self.audit.touch(*rejected_by);
            }
            BudgetAction::Reopen { reopened_by, .. } => {
                self.submitted_by = None;
                self.submitted_at = None;
                self.audit.touch(*reopened_by);
            }
            BudgetAction::SetBaseline {
                baselined_by,
                baselined_at,
                ..
            } => {
                self.baselined_at = Some(*baselined_at);
                self.audit.touch(*baselined_by);
            }
            BudgetAction::Supersede { superseded_by, .. } => {
                self.audit.touch(*superseded_by);
            }
            BudgetAction::Revise {
                revised_by, reason, ..
            } => {
                self.revision_reason = Some(reason.clone());
                self.audit.touch(*revised_by);
            }
        }
    }
}

/// Input for creating the first version of a project budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBudget {
    /// Owning project.
    pub project_id: ProjectId,
    /// Budget name.
    pub name: String,
    /// Total amount including reserves.
    pub total_amount: Decimal,
    /// Contingency.
    pub contingency_amount: Decimal,
    /// Management reserve.
    pub management_reserve: Decimal,
    /// Budget currency.
    pub currency: Currency,
    /// Rate to the reporting currency.
    pub exchange_rate: Decimal,
    /// Creating user.
    pub created_by: UserId,
}

/// Amounts of a draft budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAmounts {
    /// Total amount including reserves.
    pub total_amount: Decimal,
    /// Contingency.
    pub contingency_amount: Decimal,
    /// Management reserve.
    pub management_reserve: Decimal,
}

/// Input for a new or updated work package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPackageSpec {
    /// Parent control account.
    pub control_account_id: ControlAccountId,
    /// Package code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Budget at completion.
    pub budget: Decimal,
    /// Earned value method.
    pub progress_method: ProgressMethod,
    /// Planned start.
    pub planned_start: NaiveDate,
    /// Planned finish.
    pub planned_end: NaiveDate,
    /// How the budget is spread over the planned dates.
    pub distribution: DistributionMethod,
    /// Period size, or the engine default.
    pub granularity: Option<PeriodGranularity>,
    /// Milestones for `ProgressMethod::WeightedMilestone`.
    pub milestones: Vec<Milestone>,
}

/// Input for a new planning package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningPackageSpec {
    /// Parent control account.
    pub control_account_id: ControlAccountId,
    /// Package code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Budget held.
    pub total_budget: Decimal,
    /// Planned start.
    pub planned_start: NaiveDate,
    /// Planned finish.
    pub planned_end: NaiveDate,
    /// How the budget is spread over the planned dates.
    pub distribution: DistributionMethod,
    /// Period size, or the engine default.
    pub granularity: Option<PeriodGranularity>,
}

/// Budget lifecycle action representing a state transition with audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetAction {
    /// Draft submitted for approval.
    Submit {
        /// Resulting status.
        new_status: BudgetStatus,
        /// Submitting user.
        submitted_by: UserId,
        /// Submission time.
        submitted_at: DateTime<Utc>,
    },
    /// Submitted budget approved.
    Approve {
        /// Resulting status.
        new_status: BudgetStatus,
        /// Approving user.
        approved_by: UserId,
        /// Approval time.
        approved_at: DateTime<Utc>,
        /// Optional approver comments.
        comments: Option<String>,
    },
    /// Submitted budget rejected.
    Reject {
        /// Resulting status.
        new_status: BudgetStatus,
        /// Rejecting user.
        rejected_by: UserId,
        /// Rejection time.
        rejected_at: DateTime<Utc>,
        /// Reason (required).
        reason: String,
    },
    /// Rejected budget returned to draft.
    Reopen {
        /// Resulting status.
        new_status: BudgetStatus,
        /// Reopening user.
        reopened_by: UserId,
    },
    /// Approved budget frozen as the baseline.
    SetBaseline {
        /// Resulting status.
        new_status: BudgetStatus,
        /// Baselining user.
        baselined_by: UserId,
        /// Baseline time.
        baselined_at: DateTime<Utc>,
    },
    /// Former baseline replaced by a newer one.
    Supersede {
        /// Resulting status.
        new_status: BudgetStatus,
        /// User who set the new baseline.
        superseded_by: UserId,
    },
    /// Version revised into a new draft.
    Revise {
        /// Resulting status of the prior version.
        new_status: BudgetStatus,
        /// Revising user.
        revised_by: UserId,
        /// Revision time.
        revised_at: DateTime<Utc>,
        /// Reason (required).
        reason: String,
    },
}

impl BudgetAction {
    /// Status the budget ends up in.
    #[must_use]
    pub const fn new_status(&self) -> BudgetStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::Reopen { new_status, .. }
            | Self::SetBaseline { new_status, .. }
            | Self::Supersede { new_status, .. }
            | Self::Revise { new_status, .. } => *new_status,
        }
    }
}

/// Control account whose stored BAC differs from its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMismatch {
    /// Control account.
    pub control_account_id: ControlAccountId,
    /// Account code.
    pub code: String,
    /// BAC stored on the account.
    pub stored_bac: Decimal,
    /// Sum of work packages and unconverted planning packages.
    pub computed_bac: Decimal,
}

/// Package whose time-phased budget does not add up to its total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMismatch {
    /// Package code.
    pub code: String,
    /// Package total.
    pub expected: Decimal,
    /// Sum of period budgets.
    pub time_phased_total: Decimal,
}

/// Result of checking a budget against its hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Budget total.
    pub budget_total: Decimal,
    /// Sum of control account BAC.
    pub control_account_total: Decimal,
    /// Contingency.
    pub contingency_amount: Decimal,
    /// Management reserve.
    pub management_reserve: Decimal,
    /// Budget total minus (accounts + contingency + reserve).
    pub difference: Decimal,
    /// Accounts whose BAC disagrees with their children.
    pub account_mismatches: Vec<AccountMismatch>,
    /// Packages whose periods disagree with their total.
    pub package_mismatches: Vec<PackageMismatch>,
}

impl ReconciliationReport {
    /// Returns true if every reconciliation rule holds.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.difference.is_zero()
            && self.account_mismatches.is_empty()
            && self.package_mismatches.is_empty()
    }
}
