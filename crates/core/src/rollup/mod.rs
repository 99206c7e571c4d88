//! Rollup of earned value from work packages to control accounts and projects.
//!
//! `RollupAggregator` holds the pure aggregation rules. `RollupService`
//! commits aggregates through a `RollupStore` with optimistic version
//! checks, and `RollupJob` runs the service over many projects as a
//! cancellable batch.

pub mod aggregator;
pub mod error;
pub mod job;
pub mod service;
pub mod store;

#[cfg(test)]
mod aggregator_props;

pub use aggregator::{ProjectRollup, RollupAggregator, ScopeSnapshot};
pub use error::RollupError;
pub use job::{RollupJob, RollupReport};
pub use service::{RollupOutcome, RollupService};
pub use store::{RollupInputs, RollupStore, ScopeCommit};
