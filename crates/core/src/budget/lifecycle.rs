//! Budget lifecycle state machine.
//!
//! Each function checks one transition and returns the `BudgetAction` to
//! apply, carrying the audit trail. Nothing here mutates a budget.

use chrono::Utc;
use meridian_shared::types::UserId;

use crate::budget::error::BudgetError;
use crate::budget::types::{BudgetAction, BudgetStatus};

/// Stateless service for budget status transitions.
pub struct BudgetLifecycle;

impl BudgetLifecycle {
    /// Submit a draft budget for approval.
    pub fn submit(current: BudgetStatus, submitted_by: UserId) -> Result<BudgetAction, BudgetError> {
        match current {
            BudgetStatus::Draft => Ok(BudgetAction::Submit {
                new_status: BudgetStatus::Submitted,
                submitted_by,
                submitted_at: Utc::now(),
            }),
            _ => Err(BudgetError::InvalidTransition {
                from: current,
                to: BudgetStatus::Submitted,
            }),
        }
    }

    /// Approve a submitted budget.
    ///
    /// Reconciliation is checked by `BudgetManager::approve`, not here.
    pub fn approve(
        current: BudgetStatus,
        approved_by: UserId,
        comments: Option<String>,
    ) -> Result<BudgetAction, BudgetError> {
        match current {
            BudgetStatus::Submitted => Ok(BudgetAction::Approve {
                new_status: BudgetStatus::Approved,
                approved_by,
                approved_at: Utc::now(),
                comments,
            }),
            _ => Err(BudgetError::InvalidTransition {
                from: current,
                to: BudgetStatus::Approved,
            }),
        }
    }

    /// Reject a submitted budget.
    ///
    /// # Errors
    ///
    /// * `BudgetError::RejectionReasonRequired` if `reason` is blank
    /// * `BudgetError::InvalidTransition` if not Submitted
    pub fn reject(
        current: BudgetStatus,
        rejected_by: UserId,
        reason: String,
    ) -> Result<BudgetAction, BudgetError> {
        if reason.trim().is_empty() {
            return Err(BudgetError::RejectionReasonRequired);
        }

        match current {
            BudgetStatus::Submitted => Ok(BudgetAction::Reject {
                new_status: BudgetStatus::Rejected,
                rejected_by,
                rejected_at: Utc::now(),
                reason,
            }),
            _ => Err(BudgetError::InvalidTransition {
                from: current,
                to: BudgetStatus::Rejected,
            }),
        }
    }

    /// Return a rejected budget to draft for rework.
    pub fn reopen(current: BudgetStatus, reopened_by: UserId) -> Result<BudgetAction, BudgetError> {
        match current {
            BudgetStatus::Rejected => Ok(BudgetAction::Reopen {
                new_status: BudgetStatus::Draft,
                reopened_by,
            }),
            _ => Err(BudgetError::InvalidTransition {
                from: current,
                to: BudgetStatus::Draft,
            }),
        }
    }

    /// Freeze an approved budget as the baseline.
    pub fn set_baseline(current: BudgetStatus, baselined_by: UserId) -> Result<BudgetAction, BudgetError> {
        match current {
            BudgetStatus::Approved => Ok(BudgetAction::SetBaseline {
                new_status: BudgetStatus::Baseline,
                baselined_by,
                baselined_at: Utc::now(),
            }),
            _ => Err(BudgetError::InvalidTransition {
                from: current,
                to: BudgetStatus::Baseline,
            }),
        }
    }

    /// Demote the former baseline once a newer version is baselined.
    pub fn supersede(current: BudgetStatus, superseded_by: UserId) -> Result<BudgetAction, BudgetError> {
        match current {
            BudgetStatus::Baseline => Ok(BudgetAction::Supersede {
                new_status: BudgetStatus::Revised,
                superseded_by,
            }),
            _ => Err(BudgetError::InvalidTransition {
                from: current,
                to: BudgetStatus::Revised,
            }),
        }
    }

    /// Revise an approved or baselined budget.
    ///
    /// An approved version becomes `Revised`. A baseline stays `Baseline`
    /// until the new version is itself baselined and supersedes it.
    pub fn revise(
        current: BudgetStatus,
        revised_by: UserId,
        reason: String,
    ) -> Result<BudgetAction, BudgetError> {
        if reason.trim().is_empty() {
            return Err(BudgetError::RevisionReasonRequired);
        }

        let new_status = match current {
            BudgetStatus::Approved => BudgetStatus::Revised,
            BudgetStatus::Baseline => BudgetStatus::Baseline,
            _ => {
                return Err(BudgetError::InvalidTransition {
                    from: current,
                    to: BudgetStatus::Revised,
                });
            }
        };

        Ok(BudgetAction::Revise {
            new_status,
            revised_by,
            revised_at: Utc::now(),
            reason,
        })
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: BudgetStatus, to: BudgetStatus) -> bool {
        matches!(
            (from, to),
            (BudgetStatus::Draft, BudgetStatus::Submitted)
                | (
                    BudgetStatus::Submitted,
                    BudgetStatus::Approved | BudgetStatus::Rejected
                )
                | (BudgetStatus::Rejected, BudgetStatus::Draft)
                | (
                    BudgetStatus::Approved,
                    BudgetStatus::Baseline | BudgetStatus::Revised
                )
                | (BudgetStatus::Baseline, BudgetStatus::Revised)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_from_draft() {
        let user = UserId::new();
        let action = BudgetLifecycle::submit(BudgetStatus::Draft, user).unwrap();
        assert_eq!(action.new_status(), BudgetStatus::Submitted);
        assert!(matches!(action, BudgetAction::Submit { submitted_by, .. } if submitted_by == user));
    }

    #[test]
    fn test_approve_requires_submitted() {
        let err = BudgetLifecycle::approve(BudgetStatus::Draft, UserId::new(), None).unwrap_err();
        assert!(matches!(
            err,
            BudgetError::InvalidTransition {
                from: BudgetStatus::Draft,
                to: BudgetStatus::Approved
            }
        ));
    }

    #[test]
    fn test_reject_requires_reason() {
        assert!(matches!(
            BudgetLifecycle::reject(BudgetStatus::Submitted, UserId::new(), "   ".into()),
            Err(BudgetError::RejectionReasonRequired)
        ));
        let action =
            BudgetLifecycle::reject(BudgetStatus::Submitted, UserId::new(), "over plan".into())
                .unwrap();
        assert_eq!(action.new_status(), BudgetStatus::Rejected);
    }

    #[test]
    fn test_reopen_only_from_rejected() {
        assert_eq!(
            BudgetLifecycle::reopen(BudgetStatus::Rejected, UserId::new())
                .unwrap()
                .new_status(),
            BudgetStatus::Draft
        );
        assert!(BudgetLifecycle::reopen(BudgetStatus::Approved, UserId::new()).is_err());
    }

    #[test]
    fn test_set_baseline_on_draft_fails() {
        assert!(matches!(
            BudgetLifecycle::set_baseline(BudgetStatus::Draft, UserId::new()),
            Err(BudgetError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_revise_keeps_baseline_until_superseded() {
        let action =
            BudgetLifecycle::revise(BudgetStatus::Baseline, UserId::new(), "scope change".into())
                .unwrap();
        assert_eq!(action.new_status(), BudgetStatus::Baseline);

        let action =
            BudgetLifecycle::revise(BudgetStatus::Approved, UserId::new(), "scope change".into())
                .unwrap();
        assert_eq!(action.new_status(), BudgetStatus::Revised);

        assert!(matches!(
            BudgetLifecycle::revise(BudgetStatus::Approved, UserId::new(), String::new()),
            Err(BudgetError::RevisionReasonRequired)
        ));
        assert!(BudgetLifecycle::revise(BudgetStatus::Draft, UserId::new(), "x".into()).is_err());
    }

    #[test]
    fn test_supersede_only_baseline() {
        assert_eq!(
            BudgetLifecycle::supersede(BudgetStatus::Baseline, UserId::new())
                .unwrap()
                .new_status(),
            BudgetStatus::Revised
        );
        assert!(BudgetLifecycle::supersede(BudgetStatus::Approved, UserId::new()).is_err());
    }

    #[test]
    fn test_is_valid_transition() {
        assert!(BudgetLifecycle::is_valid_transition(BudgetStatus::Draft, BudgetStatus::Submitted));
        assert!(BudgetLifecycle::is_valid_transition(BudgetStatus::Rejected, BudgetStatus::Draft));
        assert!(BudgetLifecycle::is_valid_transition(BudgetStatus::Approved, BudgetStatus::Baseline));
        assert!(!BudgetLifecycle::is_valid_transition(BudgetStatus::Draft, BudgetStatus::Approved));
        assert!(!BudgetLifecycle::is_valid_transition(BudgetStatus::Revised, BudgetStatus::Draft));
    }
}
