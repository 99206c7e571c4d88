//! Cost hierarchy: control accounts, work packages, and planning packages.
//!
//! Entities reference their parent by id and live in a `CostHierarchy`
//! arena owned by one budget version. Ids stay the same across versions,
//! so progress and EVM history keep pointing at the same packages after a
//! revision.

pub mod arena;
pub mod error;
pub mod types;

pub use arena::CostHierarchy;
pub use error::HierarchyError;
pub use types::{ControlAccount, ControlAccountStatus, PlanningPackage, WorkPackage};
