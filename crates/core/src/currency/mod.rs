//! Splitting amounts into exact parts.

pub mod allocation;

#[cfg(test)]
mod allocation_props;

pub use allocation::AllocationUtil;

use rust_decimal::Decimal;

/// Sums `amounts`, or `None` if the total does not fit in a decimal.
pub fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts.into_iter().try_fold(Decimal::ZERO, Decimal::checked_add)
}
