//! Performance measurement baseline.
//!
//! Setting a baseline freezes an approved budget version's BAC, time-phased
//! budgets and schedule dates into a `BaselineSnapshot`. Current EVM records
//! are then compared against the snapshot.

pub mod error;
pub mod manager;
pub mod snapshot;
pub mod variance;

pub use error::BaselineError;
pub use manager::{BaselineComparison, BaselineManager};
pub use snapshot::{BaselineSnapshot, PackageBaseline};
pub use variance::{VarianceMeasure, VarianceType};
