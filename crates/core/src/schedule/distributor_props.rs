//! Property-based tests for TimePhasedBudgetDistributor.

use chrono::{Days, NaiveDate};
use meridian_shared::types::Currency;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::schedule::distributor::{
    DistributionMethod, DistributionRequest, TimePhasedBudgetDistributor,
};
use crate::schedule::period::PeriodGranularity;

fn arb_total() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Start date somewhere in 2024-2026 and a span of up to three years.
fn arb_range() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (0u64..1000, 0u64..1100).prop_map(|(offset, span)| {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let start = base.checked_add_days(Days::new(offset)).unwrap();
        let end = start.checked_add_days(Days::new(span)).unwrap();
        (start, end)
    })
}

fn arb_method() -> impl Strategy<Value = DistributionMethod> {
    prop_oneof![Just(DistributionMethod::Linear), Just(DistributionMethod::SCurve)]
}

fn arb_granularity() -> impl Strategy<Value = PeriodGranularity> {
    prop_oneof![Just(PeriodGranularity::Weekly), Just(PeriodGranularity::Monthly)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // =========================================================================
    // Property 1: Sum of period budgets equals the total
    // =========================================================================

    #[test]
    fn prop_sum_equals_total(
        total in arb_total(),
        (start, end) in arb_range(),
        method in arb_method(),
        granularity in arb_granularity(),
    ) {
        let distributor = TimePhasedBudgetDistributor::default();
        let entries = distributor
            .distribute(&DistributionRequest {
                total,
                start,
                end,
                method,
                granularity: Some(granularity),
                currency: Currency::Usd,
            })
            .unwrap();

        let sum: Decimal = entries.iter().map(|e| e.period_budget).sum();
        prop_assert_eq!(sum, total);
        prop_assert_eq!(entries.last().unwrap().cumulative_budget, total);
        prop_assert!(distributor.validate_entries(&entries, total, Currency::Usd).is_ok());
    }

    // =========================================================================
    // Property 2: Periods tile the range and cumulative budgets never fall
    // =========================================================================

    #[test]
    fn prop_periods_contiguous_and_monotonic(
        total in arb_total(),
        (start, end) in arb_range(),
        method in arb_method(),
        granularity in arb_granularity(),
    ) {
        let entries = TimePhasedBudgetDistributor::default()
            .distribute(&DistributionRequest {
                total,
                start,
                end,
                method,
                granularity: Some(granularity),
                currency: Currency::Usd,
            })
            .unwrap();

        prop_assert_eq!(entries.first().unwrap().period.start, start);
        prop_assert_eq!(entries.last().unwrap().period.end, end);
        for pair in entries.windows(2) {
            prop_assert_eq!(pair[0].period.end.succ_opt().unwrap(), pair[1].period.start);
            prop_assert!(pair[0].cumulative_budget <= pair[1].cumulative_budget);
        }
        prop_assert!(entries.iter().all(|e| e.period_budget >= Decimal::ZERO));
    }
}
