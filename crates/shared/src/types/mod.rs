//! Common types used across the application.

pub mod audit;
pub mod id;
pub mod money;

pub use audit::{AuditInfo, Lifecycle};
pub use id::*;
pub use money::Currency;
