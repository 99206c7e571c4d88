//! Meridian batch rollup runner.
//!
//! Loads a JSON project fixture into an in-memory store, rolls every
//! project up to the data date, and prints the EVM summaries as JSON.
//!
//! Usage: meridian-rollup [FIXTURE]

mod fixture;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use meridian_core::budget::BudgetManager;
use meridian_core::evm::{EvmScope, EvmSummary};
use meridian_core::rollup::{RollupJob, RollupService};
use meridian_shared::AppConfig;
use meridian_shared::config::LoggingConfig;
use meridian_shared::types::UserId;
use meridian_store::ProjectStore;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::fixture::Fixture;

#[derive(Serialize)]
struct ScopeLine {
    scope: EvmScope,
    #[serde(flatten)]
    summary: EvmSummary,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.runner.input_path.clone())
        .context("No fixture given: pass a path or set MERIDIAN__RUNNER__INPUT_PATH")?;
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let fixture = Fixture::from_json(&text)?;
    let data_date = config.runner.data_date.unwrap_or(fixture.data_date);

    let runner = UserId::new();
    let manager = BudgetManager::from_config(&config.engine)?;
    let store = Arc::new(ProjectStore::with_manager(manager));
    let projects = fixture.load_into(&store, &manager, runner)?;
    info!(
        fixture = %path.display(),
        projects = projects.len(),
        data_date = %data_date,
        "Fixture loaded"
    );

    let service = Arc::new(RollupService::from_config(Arc::clone(&store), &config.engine));
    let job = RollupJob::new(service, projects, data_date, runner);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current scope");
            on_signal.cancel();
        }
    });

    let report = job.run(cancel).await?;
    let lines: Vec<ScopeLine> = report
        .snapshots
        .iter()
        .map(|s| ScopeLine {
            scope: s.scope,
            summary: s.summary(),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&lines)?);

    info!(
        scopes = report.scopes_committed,
        retries = report.retries,
        duration_ms = u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
        "Rollup complete"
    );
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter.as_str().into());
    let registry = tracing_subscriber::registry().with(filter);

    // Summaries go to stdout, so logs go to stderr.
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
