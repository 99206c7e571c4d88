//! In-memory storage for Meridian.
//!
//! This crate provides:
//! - `ProjectStore`, a thread-safe store of budgets, progress, and EVM records
//! - The `RollupStore` implementation rollup services and batch jobs run against
//!
//! It is the seam a persistent implementation replaces.

pub mod error;
pub mod project_store;

pub use error::StoreError;
pub use project_store::ProjectStore;
