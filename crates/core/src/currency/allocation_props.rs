//! Property-based tests for allocation.
//!
//! Every allocator must return parts that sum exactly to the total and
//! never produce a negative part for a non-negative total.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::allocation::AllocationUtil;

/// Strategy to generate non-negative amounts in cents (0.00 to 1,000,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate non-decreasing cumulative fractions ending at 1.
fn cumulative_fractions() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(0u32..1000, 1..30).prop_map(|mut steps| {
        steps.sort_unstable();
        let mut fractions: Vec<Decimal> = steps
            .iter()
            .map(|s| Decimal::from(*s) / Decimal::from(1000))
            .collect();
        fractions.push(Decimal::ONE);
        fractions
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_linear_sum_equals_total(total in amount(), count in 1usize..60) {
        let parts = AllocationUtil::allocate_linear(total, count, 2);
        prop_assert_eq!(parts.len(), count);
        prop_assert_eq!(parts.iter().copied().sum::<Decimal>(), total);
        prop_assert!(parts.iter().all(|p| *p >= Decimal::ZERO));
    }

    #[test]
    fn prop_linear_remainder_only_on_last(total in amount(), count in 2usize..60) {
        let parts = AllocationUtil::allocate_linear(total, count, 2);
        let first = parts[0];
        prop_assert!(parts[..count - 1].iter().all(|p| *p == first));
        prop_assert!(parts[count - 1] >= first);
        prop_assert!(parts[count - 1] - first < Decimal::new(1, 2) * Decimal::from(count as u64));
    }

    #[test]
    fn prop_cumulative_sum_equals_total(total in amount(), fractions in cumulative_fractions()) {
        let parts = AllocationUtil::allocate_cumulative(total, &fractions, 2);
        prop_assert_eq!(parts.len(), fractions.len());
        prop_assert_eq!(parts.iter().copied().sum::<Decimal>(), total);
        prop_assert!(parts.iter().all(|p| *p >= Decimal::ZERO));
    }
}
