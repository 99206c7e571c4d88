//! Synchronous rollup with optimistic concurrency.

use chrono::NaiveDate;
use meridian_shared::config::EngineConfig;
use meridian_shared::types::{ProjectId, UserId};
use tracing::{debug, info, warn};

use crate::evm::EvmScope;
use crate::rollup::aggregator::{RollupAggregator, ScopeSnapshot};
use crate::rollup::error::RollupError;
use crate::rollup::store::{RollupStore, ScopeCommit};

/// Result of one committed scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupOutcome {
    /// The committed aggregate.
    pub snapshot: ScopeSnapshot,
    /// Reloads needed after version conflicts.
    pub retries: u32,
}

/// Loads, aggregates and commits scopes against a `RollupStore`.
///
/// A version conflict on commit reloads the scope and tries again, up to
/// `max_retries` times; a conflict after that is returned to the caller.
#[derive(Debug, Clone)]
pub struct RollupService<S> {
    store: S,
    max_retries: u32,
}

impl<S: RollupStore> RollupService<S> {
    /// Creates a service retrying conflicts up to `max_retries` times.
    pub const fn new(store: S, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    /// Creates a service using the configured retry count.
    pub fn from_config(store: S, config: &EngineConfig) -> Self {
        Self::new(store, config.rollup_max_retries)
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Rolls up one scope at `data_date`.
    pub fn roll_up(
        &self,
        project_id: ProjectId,
        scope: EvmScope,
        data_date: NaiveDate,
        committed_by: UserId,
    ) -> Result<RollupOutcome, RollupError> {
        let mut retries = 0;
        loop {
            let inputs = self.store.load(project_id, scope, data_date)?;
            let snapshot = RollupAggregator::aggregate(scope, data_date, &inputs.parts)?;

            let commit = ScopeCommit {
                project_id,
                expected_version: inputs.version,
                snapshot,
                committed_by,
            };
            match self.store.commit(commit) {
                Ok(()) => {
                    debug!(
                        scope = %scope,
                        data_date = %data_date,
                        version = inputs.version,
                        retries,
                        "Rollup committed"
                    );
                    return Ok(RollupOutcome { snapshot, retries });
                }
                Err(err) if err.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    warn!(scope = %scope, attempt = retries, error = %err, "Rollup conflict, reloading");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Rolls up every control account of a project, then the project.
    ///
    /// Each scope commits independently; an error stops the run and leaves
    /// already committed scopes in place.
    pub fn roll_up_project(
        &self,
        project_id: ProjectId,
        data_date: NaiveDate,
        committed_by: UserId,
    ) -> Result<Vec<RollupOutcome>, RollupError> {
        let mut outcomes = self
            .store
            .control_account_ids(project_id)?
            .into_iter()
            .map(|ca| self.roll_up(project_id, EvmScope::ControlAccount(ca), data_date, committed_by))
            .collect::<Result<Vec<_>, _>>()?;
        outcomes.push(self.roll_up(project_id, EvmScope::Project(project_id), data_date, committed_by)?);

        info!(
            project_id = %project_id,
            data_date = %data_date,
            scopes = outcomes.len(),
            "Project rolled up"
        );
        Ok(outcomes)
    }
}
