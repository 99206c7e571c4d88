//! Property-based tests for `BudgetLifecycle`.

use meridian_shared::types::UserId;
use proptest::prelude::*;
use uuid::Uuid;

use crate::budget::error::BudgetError;
use crate::budget::lifecycle::BudgetLifecycle;
use crate::budget::types::{BudgetAction, BudgetStatus};

fn arb_status() -> impl Strategy<Value = BudgetStatus> {
    prop_oneof![
        Just(BudgetStatus::Draft),
        Just(BudgetStatus::Submitted),
        Just(BudgetStatus::Approved),
        Just(BudgetStatus::Rejected),
        Just(BudgetStatus::Baseline),
        Just(BudgetStatus::Revised),
    ]
}

fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

fn arb_reason() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 ]{0,60}"
}

fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t]{0,5}"
}

/// Runs every transition function against `status`, returning the statuses reached.
fn reachable(status: BudgetStatus, user: UserId, reason: &str) -> Vec<BudgetStatus> {
    [
        BudgetLifecycle::submit(status, user),
        BudgetLifecycle::approve(status, user, None),
        BudgetLifecycle::reject(status, user, reason.to_string()),
        BudgetLifecycle::reopen(status, user),
        BudgetLifecycle::set_baseline(status, user),
        BudgetLifecycle::supersede(status, user),
        BudgetLifecycle::revise(status, user, reason.to_string()),
    ]
    .into_iter()
    .filter_map(Result::ok)
    .map(|action| action.new_status())
    .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Every produced transition is a valid one
    // =========================================================================

    #[test]
    fn prop_actions_only_take_valid_transitions(
        status in arb_status(),
        user in arb_user(),
        reason in arb_reason(),
    ) {
        for next in reachable(status, user, &reason) {
            // Revising a baseline leaves it in place.
            let stays = status == BudgetStatus::Baseline && next == BudgetStatus::Baseline;
            prop_assert!(
                stays || BudgetLifecycle::is_valid_transition(status, next),
                "{} -> {} produced but not listed as valid", status, next
            );
        }
    }

    // =========================================================================
    // Property 2: Revised is terminal
    // =========================================================================

    #[test]
    fn prop_revised_is_terminal(user in arb_user(), reason in arb_reason()) {
        prop_assert!(reachable(BudgetStatus::Revised, user, &reason).is_empty());
    }

    // =========================================================================
    // Property 3: Only drafts can be submitted
    // =========================================================================

    #[test]
    fn prop_submit_only_from_draft(status in arb_status(), user in arb_user()) {
        let result = BudgetLifecycle::submit(status, user);
        if status == BudgetStatus::Draft {
            prop_assert!(result.is_ok());
        } else {
            let is_invalid = matches!(result, Err(BudgetError::InvalidTransition { .. }));
            prop_assert!(is_invalid);
        }
    }

    // =========================================================================
    // Property 4: Blank reasons are rejected regardless of status
    // =========================================================================

    #[test]
    fn prop_blank_rejection_reason_fails(status in arb_status(), user in arb_user(), blank in arb_blank()) {
        let rejected = matches!(
            BudgetLifecycle::reject(status, user, blank.clone()),
            Err(BudgetError::RejectionReasonRequired)
        );
        prop_assert!(rejected);
        let revised = matches!(
            BudgetLifecycle::revise(status, user, blank),
            Err(BudgetError::RevisionReasonRequired)
        );
        prop_assert!(revised);
    }

    // =========================================================================
    // Property 5: Actions carry the acting user
    // =========================================================================

    #[test]
    fn prop_approve_records_approver(user in arb_user(), comments in proptest::option::of(arb_reason())) {
        let action = BudgetLifecycle::approve(BudgetStatus::Submitted, user, comments.clone()).unwrap();
        match action {
            BudgetAction::Approve { approved_by, comments: got, .. } => {
                prop_assert_eq!(approved_by, user);
                prop_assert_eq!(got, comments);
            }
            other => prop_assert!(false, "expected Approve, got {:?}", other),
        }
    }
}
