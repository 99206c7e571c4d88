//! Amount allocation utilities.
//!
//! Every function here splits a total into parts whose sum EXACTLY equals
//! the total, so no minor units are lost or gained when a budget is spread
//! across periods or packages.
//!
//! - `allocate_linear` gives equal parts and puts the remainder on the last part.
//! - `allocate_cumulative` follows a cumulative curve, rounding each cumulative
//!   target half-even and forcing the final target to the total.
//! - `allocate_by_percentages` uses the Largest Remainder Method.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Allocation utility for distributing amounts.
pub struct AllocationUtil;

impl AllocationUtil {
    /// Allocate `total` equally across `count` parts.
    ///
    /// Each part is the equal share truncated to `decimal_places`; the
    /// remainder goes to the last part, so the last part is never smaller
    /// than the others.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use meridian_core::currency::AllocationUtil;
    ///
    /// // 100 / 3 = [33.33, 33.33, 33.34], sum = 100.00
    /// let result = AllocationUtil::allocate_linear(dec!(100), 3, 2);
    /// assert_eq!(result, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);
    /// ```
    #[must_use]
    pub fn allocate_linear(total: Decimal, count: usize, decimal_places: u32) -> Vec<Decimal> {
        if count == 0 {
            return vec![];
        }
        if count == 1 {
            return vec![total];
        }

        let count_dec = Decimal::from(count as u64);
        let base = (total / count_dec).round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero);
        let last = total - base * Decimal::from((count - 1) as u64);

        (0..count)
            .map(|i| if i + 1 == count { last } else { base })
            .collect()
    }

    /// Allocate `total` along a cumulative curve.
    ///
    /// `cumulative_fractions[i]` is the share of the total that should be
    /// reached by the end of part `i`; fractions must be non-decreasing and
    /// within `[0, 1]`. Each cumulative target is rounded half-even to
    /// `decimal_places`, the final target is forced to `total`, and parts
    /// are the differences between consecutive targets.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use meridian_core::currency::AllocationUtil;
    ///
    /// let fractions = vec![dec!(0.25), dec!(0.75), dec!(1)];
    /// let result = AllocationUtil::allocate_cumulative(dec!(1000), &fractions, 2);
    /// assert_eq!(result, vec![dec!(250), dec!(500), dec!(250)]);
    /// ```
    #[must_use]
    pub fn allocate_cumulative(
        total: Decimal,
        cumulative_fractions: &[Decimal],
        decimal_places: u32,
    ) -> Vec<Decimal> {
        let last_index = cumulative_fractions.len().saturating_sub(1);
        let mut previous = Decimal::ZERO;

        cumulative_fractions
            .iter()
            .enumerate()
            .map(|(i, fraction)| {
                let target = if i == last_index {
                    total
                } else {
                    (total * *fraction)
                        .round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
                        .max(previous)
                        .min(total)
                };
                let part = target - previous;
                previous = target;
                part
            })
            .collect()
    }

    /// Allocate by percentages using Largest Remainder Method.
    ///
    /// Ensures sum of allocations EXACTLY equals total.
    ///
    /// # Arguments
    ///
    /// * `total` - The total amount to allocate
    /// * `percentages` - Slice of percentages (should sum to 100)
    /// * `decimal_places` - Number of decimal places for each allocation
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use meridian_core::currency::AllocationUtil;
    ///
    /// // 100 split 50%/30%/20%
    /// let percentages = vec![dec!(50), dec!(30), dec!(20)];
    /// let result = AllocationUtil::allocate_by_percentages(dec!(100), &percentages, 2);
    /// assert_eq!(result.iter().sum::<rust_decimal::Decimal>(), dec!(100));
    /// ```
    #[must_use]
    pub fn allocate_by_percentages(
        total: Decimal,
        percentages: &[Decimal],
        decimal_places: u32,
    ) -> Vec<Decimal> {
        if percentages.is_empty() {
            return vec![];
        }

        let hundred = Decimal::ONE_HUNDRED;
        let unit = Decimal::new(1, decimal_places);

        let exact: Vec<Decimal> = percentages.iter().map(|p| total * *p / hundred).collect();

        let mut rounded: Vec<Decimal> = exact
            .iter()
            .map(|a| a.round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero))
            .collect();

        let sum_rounded: Decimal = rounded.iter().copied().sum();
        let remainder = total - sum_rounded;

        let units_to_distribute = (remainder / unit)
            .round_dp_with_strategy(0, RoundingStrategy::ToZero)
            .to_u64()
            .unwrap_or(0);
        let units_to_distribute = usize::try_from(units_to_distribute).unwrap_or(0);

        if units_to_distribute == 0 {
            return rounded;
        }

        let mut remainders: Vec<(usize, Decimal)> = exact
            .iter()
            .zip(rounded.iter())
            .enumerate()
            .map(|(i, (e, r))| (i, *e - *r))
            .collect();

        // Largest fractional remainder first; ties keep original order.
        remainders.sort_by(|a, b| b.1.cmp(&a.1));

        for (idx, _) in remainders.iter().take(units_to_distribute) {
            rounded[*idx] += unit;
        }

        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // =========================================================================
    // allocate_linear tests
    // =========================================================================

    #[test]
    fn test_allocate_linear_empty() {
        assert!(AllocationUtil::allocate_linear(dec!(100), 0, 2).is_empty());
    }

    #[test]
    fn test_allocate_linear_single() {
        assert_eq!(AllocationUtil::allocate_linear(dec!(100), 1, 2), vec![dec!(100)]);
    }

    #[test]
    fn test_allocate_linear_even_split() {
        let result = AllocationUtil::allocate_linear(dec!(12000), 4, 2);
        assert_eq!(result, vec![dec!(3000), dec!(3000), dec!(3000), dec!(3000)]);
    }

    #[test]
    fn test_allocate_linear_remainder_on_last() {
        // 200 / 3 = 66.666.. -> [66.66, 66.66, 66.68]
        let result = AllocationUtil::allocate_linear(dec!(200), 3, 2);
        assert_eq!(result, vec![dec!(66.66), dec!(66.66), dec!(66.68)]);
    }

    #[test]
    fn test_allocate_linear_sum_invariant() {
        let test_cases = [
            (dec!(100), 3),
            (dec!(100), 7),
            (dec!(0.01), 3),
            (dec!(999.99), 7),
            (dec!(1000000), 13),
        ];

        for (total, count) in test_cases {
            let result = AllocationUtil::allocate_linear(total, count, 2);
            assert_eq!(
                result.iter().sum::<Decimal>(),
                total,
                "Sum invariant failed for total={total}, count={count}"
            );
        }
    }

    // =========================================================================
    // allocate_cumulative tests
    // =========================================================================

    #[test]
    fn test_allocate_cumulative_forces_final_total() {
        let fractions = vec![dec!(0.3333), dec!(0.6666), dec!(0.9999)];
        let result = AllocationUtil::allocate_cumulative(dec!(100), &fractions, 2);
        assert_eq!(result.iter().sum::<Decimal>(), dec!(100));
        assert_eq!(result[2], dec!(33.34));
    }

    #[test]
    fn test_allocate_cumulative_rounds_half_even() {
        // 0.125 * 1 = 0.125 -> 0.12 (half to even)
        let fractions = vec![dec!(0.125), dec!(1)];
        let result = AllocationUtil::allocate_cumulative(dec!(1), &fractions, 2);
        assert_eq!(result, vec![dec!(0.12), dec!(0.88)]);
    }

    #[test]
    fn test_allocate_cumulative_never_negative() {
        let fractions = vec![dec!(0.001), dec!(0.002), dec!(0.003), dec!(1)];
        let result = AllocationUtil::allocate_cumulative(dec!(1), &fractions, 2);
        assert!(result.iter().all(|p| *p >= Decimal::ZERO));
        assert_eq!(result.iter().sum::<Decimal>(), dec!(1));
    }

    // =========================================================================
    // allocate_by_percentages tests
    // =========================================================================

    #[test]
    fn test_allocate_by_percentages_empty() {
        let result = AllocationUtil::allocate_by_percentages(dec!(100), &[], 2);
        assert!(result.is_empty());
    }

    #[test]
    fn test_allocate_by_percentages_uneven() {
        let percentages = vec![dec!(50), dec!(30), dec!(20)];
        let result = AllocationUtil::allocate_by_percentages(dec!(100), &percentages, 2);
        assert_eq!(result, vec![dec!(50), dec!(30), dec!(20)]);
    }

    #[test]
    fn test_allocate_by_percentages_sum_invariant() {
        let test_cases = [
            (dec!(100), vec![dec!(33.33), dec!(33.33), dec!(33.34)]),
            (dec!(1000), vec![dec!(25), dec!(25), dec!(25), dec!(25)]),
            (dec!(99.99), vec![dec!(10), dec!(20), dec!(30), dec!(40)]),
        ];

        for (total, percentages) in test_cases {
            let result = AllocationUtil::allocate_by_percentages(total, &percentages, 2);
            assert_eq!(
                result.iter().sum::<Decimal>(),
                total,
                "Sum invariant failed for total={total}, percentages={percentages:?}"
            );
        }
    }
}
