//! Work package progress tracking.
//!
//! A `ProgressTracker` holds the append-only progress history of one work
//! package and derives earned value from it using the package's progress
//! method.

pub mod error;
pub mod tracker;
pub mod types;

#[cfg(test)]
mod tracker_props;

pub use error::ProgressError;
pub use tracker::ProgressTracker;
pub use types::{Milestone, ProgressEntry, ProgressInput, ProgressMethod, WorkStatus};
