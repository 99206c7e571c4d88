//! Earned value metrics and EVM records.
//!
//! `EvmCalculator` is pure: it turns PV, EV, AC and BAC into the derived
//! indices and a performance status. `EvmRecord` is the persisted result for
//! one scope at one data date, read-only once approved or baselined.

pub mod calculator;
pub mod error;
pub mod record;

#[cfg(test)]
mod calculator_props;

pub use calculator::{
    EvmCalculator, EvmMetrics, EvmValues, PerformanceIndex, PerformanceStatus, ToCompleteIndex,
};
pub use error::EvmError;
pub use record::{EvmRecord, EvmScope, EvmSummary};
