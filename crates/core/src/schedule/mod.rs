//! Time-phased budget distribution.
//!
//! Splits a budget total across calendar periods so that the parts always
//! add back up to the total. The first and last periods are clipped to the
//! distribution's start and end dates.

pub mod distributor;
pub mod error;
pub mod period;

#[cfg(test)]
mod distributor_props;

pub use distributor::{
    DistributionMethod, DistributionRequest, TimePhasedBudgetDistributor, TimePhasedEntry,
};
pub use error::ScheduleError;
pub use period::{Period, PeriodGranularity};
