//! Property-based tests for RollupAggregator.

use chrono::NaiveDate;
use meridian_shared::types::{ControlAccountId, ProjectId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::evm::{EvmCalculator, EvmScope, EvmValues};
use crate::rollup::aggregator::RollupAggregator;

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_values() -> impl Strategy<Value = EvmValues> {
    (arb_amount(), arb_amount(), arb_amount(), arb_amount())
        .prop_map(|(pv, ev, ac, bac)| EvmValues { pv, ev, ac, bac })
}

fn arb_parts() -> impl Strategy<Value = Vec<EvmValues>> {
    prop::collection::vec(arb_values(), 0..12)
}

fn data_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // =========================================================================
    // Property 1: Measures are additive
    // =========================================================================

    /// Each aggregated measure equals the sum of the parts.
    #[test]
    fn prop_measures_sum(parts in arb_parts()) {
        let scope = EvmScope::ControlAccount(ControlAccountId::new());
        let snap = RollupAggregator::aggregate(scope, data_date(), &parts).unwrap();

        prop_assert_eq!(snap.values.pv, parts.iter().map(|p| p.pv).sum::<Decimal>());
        prop_assert_eq!(snap.values.ev, parts.iter().map(|p| p.ev).sum::<Decimal>());
        prop_assert_eq!(snap.values.ac, parts.iter().map(|p| p.ac).sum::<Decimal>());
        prop_assert_eq!(snap.values.bac, parts.iter().map(|p| p.bac).sum::<Decimal>());
    }

    // =========================================================================
    // Property 2: Metrics come from the sums
    // =========================================================================

    /// Aggregated metrics equal the calculator run on the aggregated values.
    #[test]
    fn prop_metrics_recomputed(parts in arb_parts()) {
        let scope = EvmScope::ControlAccount(ControlAccountId::new());
        let snap = RollupAggregator::aggregate(scope, data_date(), &parts).unwrap();
        prop_assert_eq!(snap.metrics, EvmCalculator::calculate(&snap.values).unwrap());
    }

    // =========================================================================
    // Property 3: Aggregation is idempotent
    // =========================================================================

    /// Same inputs give the same output, and re-aggregating an aggregate
    /// returns it unchanged.
    #[test]
    fn prop_idempotent(parts in arb_parts()) {
        let scope = EvmScope::Project(ProjectId::new());
        let once = RollupAggregator::aggregate(scope, data_date(), &parts).unwrap();
        let again = RollupAggregator::aggregate(scope, data_date(), &parts).unwrap();
        prop_assert_eq!(once, again);

        let twice = RollupAggregator::aggregate(scope, data_date(), [&once.values]).unwrap();
        prop_assert_eq!(once, twice);
    }

    // =========================================================================
    // Property 4: Grouping does not matter
    // =========================================================================

    /// Rolling up through control accounts gives the same project totals as
    /// summing every part directly.
    #[test]
    fn prop_two_level_equals_flat(parts in arb_parts(), split in 0usize..12) {
        let split = split.min(parts.len());
        let (left, right) = parts.split_at(split);
        let a = RollupAggregator::aggregate(EvmScope::ControlAccount(ControlAccountId::new()), data_date(), left).unwrap();
        let b = RollupAggregator::aggregate(EvmScope::ControlAccount(ControlAccountId::new()), data_date(), right).unwrap();

        let project = ProjectId::new();
        let nested = RollupAggregator::roll_up_project(project, data_date(), &[a, b]).unwrap();
        let flat = RollupAggregator::aggregate(EvmScope::Project(project), data_date(), &parts).unwrap();
        prop_assert_eq!(nested, flat);
    }
}
