//! Storage seam for rollups.

use chrono::NaiveDate;
use meridian_shared::types::{ControlAccountId, ProjectId, UserId};

use crate::evm::{EvmScope, EvmValues};
use crate::rollup::aggregator::ScopeSnapshot;
use crate::rollup::error::RollupError;

/// Child measures of a scope, read at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupInputs {
    /// Scope version at load time.
    pub version: u64,
    /// Measures of the scope's children.
    pub parts: Vec<EvmValues>,
}

/// An aggregated scope ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeCommit {
    /// Owning project.
    pub project_id: ProjectId,
    /// Version the snapshot was computed from.
    pub expected_version: u64,
    /// The aggregate.
    pub snapshot: ScopeSnapshot,
    /// User or job on whose behalf the commit is made.
    pub committed_by: UserId,
}

/// Storage used by `RollupService`.
///
/// `commit` must be all-or-nothing and must fail with
/// `RollupError::VersionConflict` when the scope's version no longer
/// equals `expected_version`.
pub trait RollupStore: Send + Sync {
    /// Control accounts of the project's current budget, in id order.
    fn control_account_ids(&self, project_id: ProjectId) -> Result<Vec<ControlAccountId>, RollupError>;

    /// Children measures of `scope` at `data_date`, with the scope's version.
    fn load(
        &self,
        project_id: ProjectId,
        scope: EvmScope,
        data_date: NaiveDate,
    ) -> Result<RollupInputs, RollupError>;

    /// Writes the aggregate as the scope's EVM record for its data date.
    fn commit(&self, commit: ScopeCommit) -> Result<(), RollupError>;
}

impl<S: RollupStore + ?Sized> RollupStore for std::sync::Arc<S> {
    fn control_account_ids(&self, project_id: ProjectId) -> Result<Vec<ControlAccountId>, RollupError> {
        (**self).control_account_ids(project_id)
    }

    fn load(
        &self,
        project_id: ProjectId,
        scope: EvmScope,
        data_date: NaiveDate,
    ) -> Result<RollupInputs, RollupError> {
        (**self).load(project_id, scope, data_date)
    }

    fn commit(&self, commit: ScopeCommit) -> Result<(), RollupError> {
        (**self).commit(commit)
    }
}
