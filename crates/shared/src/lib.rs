//! Shared types, errors, and configuration for Meridian.
//!
//! This crate provides common types used across all other crates:
//! - Currencies with minor-unit rounding
//! - Typed IDs for type-safe entity references
//! - Audit and lifecycle values embedded in every entity
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, ErrorKind};
