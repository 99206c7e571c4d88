//! Property-based tests for ProgressTracker.

use meridian_shared::types::{ControlAccountId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::progress::tracker::ProgressTracker;
use crate::progress::types::{ProgressInput, ProgressMethod};
use crate::test_support::{date, work_package_with};

fn arb_method() -> impl Strategy<Value = ProgressMethod> {
    prop_oneof![
        Just(ProgressMethod::Manual),
        Just(ProgressMethod::ZeroHundred),
        Just(ProgressMethod::FiftyFifty),
        Just(ProgressMethod::LevelOfEffort),
    ]
}

/// Sequence of (day offset step, percent) reports.
fn arb_reports() -> impl Strategy<Value = Vec<(u64, u32)>> {
    prop::collection::vec((0u64..20, 0u32..=100), 1..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Earned value stays within [0, BAC]
    // =========================================================================

    #[test]
    fn prop_earned_value_bounded(method in arb_method(), reports in arb_reports(), budget in 0i64..10_000_000) {
        let budget = Decimal::new(budget, 2);
        let wp = work_package_with(ControlAccountId::new(), "WP", budget, method);
        let mut tracker = ProgressTracker::new(wp.id);
        let mut on = date(2025, 1, 1);

        for (step, pct) in reports {
            on = on + chrono::Days::new(step);
            let _ = tracker.record(&wp, ProgressInput {
                work_package_id: wp.id,
                progress_date: on,
                progress_percentage: Decimal::from(pct),
                actual_cost: Decimal::ZERO,
                committed_cost: Decimal::ZERO,
                reported_by: UserId::new(),
            });
            let ev = tracker.earned_value(&wp, on).unwrap();
            prop_assert!(ev >= Decimal::ZERO);
            prop_assert!(ev <= budget);
        }
    }

    // =========================================================================
    // Property 2: Accepted history never violates ordering or monotonicity
    // =========================================================================

    #[test]
    fn prop_accepted_history_is_ordered(method in arb_method(), reports in arb_reports()) {
        let wp = work_package_with(ControlAccountId::new(), "WP", Decimal::from(1000), method);
        let mut tracker = ProgressTracker::new(wp.id);
        let mut on = date(2025, 1, 1);

        for (step, pct) in reports {
            on = on + chrono::Days::new(step);
            let _ = tracker.record(&wp, ProgressInput {
                work_package_id: wp.id,
                progress_date: on,
                progress_percentage: Decimal::from(pct),
                actual_cost: Decimal::ZERO,
                committed_cost: Decimal::ZERO,
                reported_by: UserId::new(),
            });
        }

        for pair in tracker.entries().windows(2) {
            prop_assert!(pair[0].progress_date <= pair[1].progress_date);
            if method.is_monotonic() {
                prop_assert!(pair[0].progress_percentage <= pair[1].progress_percentage);
            }
        }
    }
}
