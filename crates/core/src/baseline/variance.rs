//! Variance of a current figure against its baseline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceType {
    /// Better than baseline.
    Favorable,
    /// Worse than baseline.
    Unfavorable,
    /// No variance.
    None,
}

/// One baseline-versus-current comparison, in absolute and percentage terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceMeasure {
    /// Baseline figure.
    pub baseline: Decimal,
    /// Current figure.
    pub current: Decimal,
    /// Signed variance; positive is favorable.
    pub variance: Decimal,
    /// Variance as a percentage of the baseline, to two places.
    pub variance_percent: Decimal,
    /// Direction of the variance.
    pub variance_type: VarianceType,
}

impl VarianceMeasure {
    /// Variance of a cost-like figure: coming in under baseline is favorable.
    ///
    /// `None` if the variance or its percentage does not fit in a decimal.
    #[must_use]
    pub fn for_cost(baseline: Decimal, current: Decimal) -> Option<Self> {
        Self::build(baseline, current, baseline.checked_sub(current)?)
    }

    /// Variance of a progress-like figure: running ahead of baseline is favorable.
    #[must_use]
    pub fn for_progress(baseline: Decimal, current: Decimal) -> Option<Self> {
        Self::build(baseline, current, current.checked_sub(baseline)?)
    }

    fn build(baseline: Decimal, current: Decimal, variance: Decimal) -> Option<Self> {
        let variance_percent = if baseline.is_zero() {
            Decimal::ZERO
        } else {
            variance
                .checked_div(baseline)?
                .checked_mul(Decimal::ONE_HUNDRED)?
                .round_dp(2)
        };

        let variance_type = if variance.is_zero() {
            VarianceType::None
        } else if variance.is_sign_positive() {
            VarianceType::Favorable
        } else {
            VarianceType::Unfavorable
        };

        Some(Self {
            baseline,
            current,
            variance,
            variance_percent,
            variance_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cost_overrun_is_unfavorable() {
        let v = VarianceMeasure::for_cost(dec!(100000), dec!(114285.71)).unwrap();
        assert_eq!(v.variance, dec!(-14285.71));
        assert_eq!(v.variance_percent, dec!(-14.29));
        assert_eq!(v.variance_type, VarianceType::Unfavorable);
    }

    #[test]
    fn test_progress_ahead_is_favorable() {
        let v = VarianceMeasure::for_progress(dec!(30000), dec!(36000)).unwrap();
        assert_eq!(v.variance, dec!(6000));
        assert_eq!(v.variance_percent, dec!(20));
        assert_eq!(v.variance_type, VarianceType::Favorable);
    }

    #[test]
    fn test_zero_baseline_has_zero_percent() {
        let v = VarianceMeasure::for_progress(Decimal::ZERO, dec!(500)).unwrap();
        assert_eq!(v.variance_percent, Decimal::ZERO);
        assert_eq!(v.variance_type, VarianceType::Favorable);
    }

    #[test]
    fn test_no_variance() {
        let v = VarianceMeasure::for_cost(dec!(10), dec!(10)).unwrap();
        assert_eq!(v.variance_type, VarianceType::None);
        assert_eq!(v.variance_percent, Decimal::ZERO);
    }

    #[test]
    fn test_out_of_range_variance_is_none() {
        assert!(VarianceMeasure::for_cost(Decimal::MAX, -Decimal::MAX).is_none());
        assert!(VarianceMeasure::for_progress(dec!(0.0000000001), Decimal::MAX).is_none());
        assert!(VarianceMeasure::for_cost(Decimal::MAX, Decimal::ZERO).is_some());
    }
}
