//! Concurrent access tests for the project store.
//!
//! These tests verify that:
//! - Progress recorded from many tasks at once is never lost
//! - Concurrent rollups of the same scope converge on the correct totals
//! - A rollup racing progress updates never commits stale figures
//! - Conflicts surface as retryable concurrency errors, never as drift

#![allow(clippy::cast_possible_truncation)]

mod common;

use std::sync::Arc;

use futures::future::join_all;
use meridian_core::evm::EvmScope;
use meridian_core::rollup::{RollupAggregator, RollupService, RollupStore};
use meridian_shared::ErrorKind;
use meridian_shared::types::UserId;
use meridian_store::ProjectStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

use common::{date, progress, seed};

// ============================================================================
// Test: progress from many tasks on distinct work packages
// ============================================================================
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_progress_is_not_lost() {
    const PACKAGES: usize = 16;
    let store = Arc::new(ProjectStore::new());
    let seeded = seed(&store, 1, PACKAGES);
    let on = date(2025, 2, 28);
    let ca = EvmScope::ControlAccount(seeded.accounts[0]);
    let before = store.scope_version(seeded.project, ca);

    let barrier = Arc::new(Barrier::new(PACKAGES));
    let handles: Vec<_> = seeded
        .all_packages()
        .into_iter()
        .map(|wp| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            let project = seeded.project;
            tokio::spawn(async move {
                barrier.wait().await;
                store.record_progress(project, progress(wp, on, dec!(50), dec!(700)))
            })
        })
        .collect();

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    // Every package moved the account's version exactly once.
    assert_eq!(
        store.scope_version(seeded.project, ca),
        before + PACKAGES as u64
    );
    for wp in seeded.all_packages() {
        let record = store
            .record(seeded.project, EvmScope::WorkPackage(wp), on)
            .unwrap();
        assert_eq!(record.values().ev, dec!(600));
    }

    let service = RollupService::new(Arc::clone(&store), 1);
    let outcome = service
        .roll_up(seeded.project, ca, on, seeded.user)
        .unwrap();
    let count = Decimal::from(PACKAGES as u64);
    assert_eq!(outcome.snapshot.values.pv, dec!(600) * count);
    assert_eq!(outcome.snapshot.values.ev, dec!(600) * count);
    assert_eq!(outcome.snapshot.values.ac, dec!(700) * count);
    assert_eq!(outcome.snapshot.values.bac, dec!(1200) * count);
}

// ============================================================================
// Test: racing rollups of one control account
// ============================================================================
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rollups_converge() {
    const ROLLUPS: usize = 8;
    let store = Arc::new(ProjectStore::new());
    let seeded = seed(&store, 1, 4);
    let on = date(2025, 3, 31);
    for (i, wp) in seeded.all_packages().into_iter().enumerate() {
        let pct = Decimal::from(25 * (i as u64 + 1));
        store
            .record_progress(seeded.project, progress(wp, on, pct, dec!(500)))
            .unwrap();
    }

    let service = Arc::new(RollupService::new(Arc::clone(&store), 1));
    let ca = EvmScope::ControlAccount(seeded.accounts[0]);
    let barrier = Arc::new(Barrier::new(ROLLUPS));
    let handles: Vec<_> = (0..ROLLUPS)
        .map(|_| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let project = seeded.project;
            tokio::spawn(async move {
                barrier.wait().await;
                service.roll_up(project, ca, on, UserId::new())
            })
        })
        .collect();

    let mut committed = 0;
    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(_) => committed += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::Concurrency),
        }
    }
    assert!(committed >= 1);

    // Percentages 25/50/75/100 of 1,200 each.
    let record = store.record(seeded.project, ca, on).unwrap();
    assert_eq!(record.values().ev, dec!(3000));
    assert_eq!(record.values().ac, dec!(2000));
    assert_eq!(record.values().pv, dec!(3600));
}

// ============================================================================
// Test: rollups racing progress updates never keep stale totals
// ============================================================================
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rollup_racing_progress_settles_on_latest_figures() {
    const PACKAGES: usize = 8;
    let store = Arc::new(ProjectStore::new());
    let seeded = seed(&store, 2, PACKAGES / 2);
    let on = date(2025, 4, 30);
    let service = Arc::new(RollupService::new(Arc::clone(&store), 1));

    let barrier = Arc::new(Barrier::new(PACKAGES * 2));
    let mut handles = Vec::new();
    for wp in seeded.all_packages() {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        let project = seeded.project;
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            store
                .record_progress(project, progress(wp, on, dec!(100), dec!(1000)))
                .map(|_| ())
                .map_err(|err| err.kind())
        }));
    }
    for i in 0..PACKAGES {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let project = seeded.project;
        let ca = EvmScope::ControlAccount(seeded.accounts[i % 2]);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            service
                .roll_up(project, ca, on, UserId::new())
                .map(|_| ())
                .map_err(|err| err.kind())
        }));
    }

    for result in join_all(handles).await {
        if let Err(kind) = result.unwrap() {
            assert_eq!(kind, ErrorKind::Concurrency);
        }
    }

    // Once writers are done, one more pass brings every scope up to date.
    let outcomes = service
        .roll_up_project(seeded.project, on, seeded.user)
        .unwrap();
    let project = outcomes.last().unwrap().snapshot;
    assert_eq!(project.values.ev, dec!(1200) * Decimal::from(PACKAGES as u64));
    assert_eq!(project.values.ac, dec!(1000) * Decimal::from(PACKAGES as u64));

    for &ca in &seeded.accounts {
        let scope = EvmScope::ControlAccount(ca);
        let inputs = store.load(seeded.project, scope, on).unwrap();
        let fresh = RollupAggregator::aggregate(scope, on, &inputs.parts).unwrap();
        let stored = store.record(seeded.project, scope, on).unwrap();
        assert_eq!(stored.values(), &fresh.values);
        assert_eq!(stored.metrics(), &fresh.metrics);
    }
}

// ============================================================================
// Test: projects do not interfere
// ============================================================================
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_projects_are_independent() {
    const PROJECTS: usize = 6;
    let store = Arc::new(ProjectStore::new());
    let projects: Vec<_> = (0..PROJECTS).map(|_| seed(&store, 1, 2)).collect();
    let on = date(2025, 1, 31);

    let handles: Vec<_> = projects
        .iter()
        .map(|seeded| {
            let store = Arc::clone(&store);
            let project = seeded.project;
            let packages = seeded.all_packages();
            let user = seeded.user;
            tokio::spawn(async move {
                for wp in packages {
                    store.record_progress(project, progress(wp, on, dec!(25), dec!(250)))?;
                }
                RollupService::new(store, 0)
                    .roll_up_project(project, on, user)
                    .map_err(meridian_store::StoreError::from)
            })
        })
        .collect();

    for result in join_all(handles).await {
        let outcomes = result.unwrap().unwrap();
        let project = outcomes.last().unwrap().snapshot;
        assert_eq!(project.values.ev, dec!(600));
        assert_eq!(project.values.ac, dec!(500));
    }
    assert_eq!(store.project_ids().len(), PROJECTS);
}
