//! Property-based tests for EvmCalculator.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::evm::calculator::{
    EvmCalculator, EvmValues, PerformanceIndex, PerformanceStatus,
};

/// Strategy for non-negative amounts with cents, up to 10 million.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_values() -> impl Strategy<Value = EvmValues> {
    (arb_amount(), arb_amount(), arb_amount(), arb_amount())
        .prop_map(|(pv, ev, ac, bac)| EvmValues { pv, ev, ac, bac })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // =========================================================================
    // Property 1: Variances are exact
    // =========================================================================

    /// CV = EV - AC and SV = EV - PV for every non-negative input.
    #[test]
    fn prop_variances_exact(values in arb_values()) {
        let m = EvmCalculator::calculate(&values).unwrap();
        prop_assert_eq!(m.cv, values.ev - values.ac);
        prop_assert_eq!(m.sv, values.ev - values.pv);
    }

    // =========================================================================
    // Property 2: Zero denominators yield the sentinel
    // =========================================================================

    /// AC = 0 gives CPI = 1.0; PV = 0 gives SPI = 1.0.
    #[test]
    fn prop_zero_denominator_sentinel(pv in arb_amount(), ev in arb_amount(), bac in arb_amount()) {
        let m = EvmCalculator::calculate(&EvmValues { pv: Decimal::ZERO, ev, ac: Decimal::ZERO, bac }).unwrap();
        prop_assert_eq!(m.cpi, PerformanceIndex::NotAssessable);
        prop_assert_eq!(m.cpi.value(), Decimal::ONE);
        prop_assert_eq!(m.spi.value(), Decimal::ONE);

        let m = EvmCalculator::calculate(&EvmValues { pv, ev, ac: Decimal::ZERO, bac }).unwrap();
        prop_assert_eq!(m.cpi.value(), Decimal::ONE);
    }

    // =========================================================================
    // Property 3: Status follows the ordered rules
    // =========================================================================

    /// Negative CV and SV always classify as critical; exactly one negative as at risk.
    #[test]
    fn prop_status_rules(values in arb_values()) {
        let m = EvmCalculator::calculate(&values).unwrap();
        let cost_behind = m.cv < Decimal::ZERO;
        let schedule_behind = m.sv < Decimal::ZERO;
        match (cost_behind, schedule_behind) {
            (true, true) => prop_assert_eq!(m.status, PerformanceStatus::Critical),
            (true, false) | (false, true) => prop_assert_eq!(m.status, PerformanceStatus::AtRisk),
            (false, false) => prop_assert_ne!(m.status, PerformanceStatus::Critical),
        }
    }

    /// ETC = EAC - AC and VAC = BAC - EAC.
    #[test]
    fn prop_completion_estimates_consistent(values in arb_values()) {
        let m = EvmCalculator::calculate(&values).unwrap();
        prop_assert_eq!(m.etc, m.eac - values.ac);
        prop_assert_eq!(m.vac, values.bac - m.eac);
    }

    /// The calculator is deterministic.
    #[test]
    fn prop_deterministic(values in arb_values()) {
        prop_assert_eq!(
            EvmCalculator::calculate(&values).unwrap(),
            EvmCalculator::calculate(&values).unwrap()
        );
    }
}
