//! Budget versions, approval lifecycle and reconciliation.

pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod types;

#[cfg(test)]
mod lifecycle_props;

pub use error::BudgetError;
pub use lifecycle::BudgetLifecycle;
pub use manager::BudgetManager;
pub use types::{
    AccountMismatch, Budget, BudgetAction, BudgetAmounts, BudgetStatus, NewBudget, PackageMismatch,
    PlanningPackageSpec, ReconciliationReport, WorkPackageSpec,
};
