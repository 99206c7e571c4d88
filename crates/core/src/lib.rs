//! Core business logic for Meridian.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `evm` - Earned value metrics, status classification, and EVM records
//! - `schedule` - Time-phased budget distribution across calendar periods
//! - `progress` - Work package progress tracking and earned value methods
//! - `hierarchy` - Control account / work package / planning package arena
//! - `budget` - Budget versions, lifecycle, and reconciliation
//! - `baseline` - Baseline freezing and variance to baseline
//! - `rollup` - Bottom-up aggregation, optimistic commits, and batch jobs
//! - `currency` - Exact allocation of totals into parts

pub mod baseline;
pub mod budget;
pub mod currency;
pub mod evm;
pub mod hierarchy;
pub mod progress;
pub mod rollup;
pub mod schedule;

#[cfg(test)]
pub(crate) mod test_support;
