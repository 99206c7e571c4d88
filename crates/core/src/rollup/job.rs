//! Cancellable batch rollup.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use meridian_shared::types::{ProjectId, UserId};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::evm::{EvmScope, EvmSummary};
use crate::rollup::aggregator::ScopeSnapshot;
use crate::rollup::error::RollupError;
use crate::rollup::service::{RollupOutcome, RollupService};
use crate::rollup::store::RollupStore;

/// Outcome of a finished batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupReport {
    /// Data date rolled up.
    pub data_date: NaiveDate,
    /// Projects processed.
    pub projects: usize,
    /// Scopes committed.
    pub scopes_committed: usize,
    /// Reloads after version conflicts, across all scopes.
    pub retries: u32,
    /// Wall-clock time of the batch.
    pub duration: Duration,
    /// Committed aggregates in commit order.
    pub snapshots: Vec<ScopeSnapshot>,
}

impl RollupReport {
    /// Flat summaries of every committed scope.
    #[must_use]
    pub fn summaries(&self) -> Vec<EvmSummary> {
        self.snapshots.iter().map(ScopeSnapshot::summary).collect()
    }
}

/// Rolls up a set of projects on the tokio blocking pool.
///
/// Scopes run one at a time, control accounts first and then the project.
/// Cancellation is checked before each scope; a commit already in flight
/// runs to completion, so every scope is either fully committed or untouched.
pub struct RollupJob<S> {
    service: Arc<RollupService<S>>,
    project_ids: Vec<ProjectId>,
    data_date: NaiveDate,
    requested_by: UserId,
}

impl<S: RollupStore + 'static> RollupJob<S> {
    /// Creates a job for `project_ids` at `data_date`.
    pub const fn new(
        service: Arc<RollupService<S>>,
        project_ids: Vec<ProjectId>,
        data_date: NaiveDate,
        requested_by: UserId,
    ) -> Self {
        Self {
            service,
            project_ids,
            data_date,
            requested_by,
        }
    }

    /// Runs the batch until done, failed or cancelled.
    ///
    /// # Errors
    ///
    /// * `RollupError::Cancelled` with the number of scopes committed
    /// * the first error any scope returned
    pub async fn run(&self, cancel: CancellationToken) -> Result<RollupReport, RollupError> {
        let started = Instant::now();
        let mut report = RollupReport {
            data_date: self.data_date,
            projects: 0,
            scopes_committed: 0,
            retries: 0,
            duration: Duration::ZERO,
            snapshots: Vec::new(),
        };

        for &project_id in &self.project_ids {
            if cancel.is_cancelled() {
                return Err(cancelled(&report));
            }
            let service = Arc::clone(&self.service);
            let accounts = tokio::task::spawn_blocking(move || {
                service.store().control_account_ids(project_id)
            })
            .await
            .map_err(|err| RollupError::Worker(err.to_string()))??;

            let scopes = accounts
                .into_iter()
                .map(EvmScope::ControlAccount)
                .chain(std::iter::once(EvmScope::Project(project_id)));

            for scope in scopes {
                if cancel.is_cancelled() {
                    return Err(cancelled(&report));
                }
                let outcome = self.run_scope(project_id, scope, &cancel).await;
                match outcome {
                    ScopeRun::Done(outcome) => record(&mut report, outcome),
                    ScopeRun::Cancelled(finished) => {
                        if let Some(outcome) = finished {
                            record(&mut report, outcome);
                        }
                        return Err(cancelled(&report));
                    }
                    ScopeRun::Failed(err) => return Err(err),
                }
            }
            report.projects += 1;
        }

        report.duration = started.elapsed();
        info!(
            data_date = %report.data_date,
            projects = report.projects,
            scopes = report.scopes_committed,
            retries = report.retries,
            duration_ms = u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            "Rollup batch finished"
        );
        Ok(report)
    }

    async fn run_scope(&self, project_id: ProjectId, scope: EvmScope, cancel: &CancellationToken) -> ScopeRun {
        let service = Arc::clone(&self.service);
        let data_date = self.data_date;
        let by = self.requested_by;
        let mut handle =
            tokio::task::spawn_blocking(move || service.roll_up(project_id, scope, data_date, by));

        tokio::select! {
            biased;
            joined = &mut handle => match joined {
                Ok(Ok(outcome)) => ScopeRun::Done(outcome),
                Ok(Err(err)) => ScopeRun::Failed(err),
                Err(err) => ScopeRun::Failed(RollupError::Worker(err.to_string())),
            },
            () = cancel.cancelled() => {
                // The commit cannot be interrupted; wait so it lands whole or not at all.
                ScopeRun::Cancelled(handle.await.ok().and_then(Result::ok))
            }
        }
    }
}

enum ScopeRun {
    Done(RollupOutcome),
    Cancelled(Option<RollupOutcome>),
    Failed(RollupError),
}

fn record(report: &mut RollupReport, outcome: RollupOutcome) {
    report.scopes_committed += 1;
    report.retries += outcome.retries;
    report.snapshots.push(outcome.snapshot);
}

fn cancelled(report: &RollupReport) -> RollupError {
    info!(committed = report.scopes_committed, "Rollup batch cancelled");
    RollupError::Cancelled {
        committed: report.scopes_committed,
    }
}
