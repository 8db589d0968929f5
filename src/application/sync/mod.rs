//! Spreadsheet-to-store synchronization.
//!
//! A run loads a [`Snapshot`] from the configured source, refreshes the
//! discount overlay from it, and reconciles the catalog. Runs never overlap:
//! a trigger that arrives while a run is in flight is dropped.

pub mod reconcile;
pub mod snapshot;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::discount::DiscountOverlay;

pub use reconcile::{KindTally, ReconcileError, ReconcileReport, Reconciler};
pub use snapshot::{Snapshot, SkippedRow};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot source `{path}` could not be read: {message}")]
    Unreadable { path: String, message: String },
    #[error("snapshot source `{path}` is malformed: {message}")]
    Malformed { path: String, message: String },
}

/// Where snapshots come from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn load(&self) -> Result<Snapshot, SnapshotError>;

    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

pub struct SyncService {
    source: Arc<dyn SnapshotSource>,
    reconciler: Reconciler,
    discounts: Arc<DiscountOverlay>,
    running: AtomicBool,
}

impl SyncService {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        reconciler: Reconciler,
        discounts: Arc<DiscountOverlay>,
    ) -> Self {
        Self {
            source,
            reconciler,
            discounts,
            running: AtomicBool::new(false),
        }
    }

    pub fn discounts(&self) -> &Arc<DiscountOverlay> {
        &self.discounts
    }

    /// Run one synchronization pass.
    ///
    /// Returns `Ok(None)` when another pass is still in progress.
    pub async fn run_once(&self) -> Result<Option<ReconcileReport>, SyncError> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            debug!(
                target = "tavola::sync",
                "Previous sync still running; skipping trigger"
            );
            return Ok(None);
        };

        let started_at = Instant::now();
        let result = self.run_inner().await;
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        histogram!("tavola_sync_run_ms", "outcome" => outcome).record(elapsed_ms);

        result.map(Some)
    }

    async fn run_inner(&self) -> Result<ReconcileReport, SyncError> {
        let snapshot = self.source.load().await?;
        debug!(
            target = "tavola::sync",
            source = %self.source.describe(),
            rows = snapshot.rows().len(),
            "Loaded snapshot"
        );

        self.discounts.replace(DiscountOverlay::scan(&snapshot));

        let parsed = snapshot::parse(&snapshot);
        for skipped in &parsed.skipped {
            warn!(
                target = "tavola::sync",
                row = skipped.row,
                reason = %skipped.defect,
                "Skipping snapshot row"
            );
        }

        let report = self.reconciler.reconcile(&parsed).await?;
        counter!("tavola_sync_mutations_total").increment(report.mutations() as u64);
        if report.mutations() > 0 {
            info!(
                target = "tavola::sync",
                menus = ?report.menus,
                submenus = ?report.submenus,
                dishes = ?report.dishes,
                skipped = report.skipped.len(),
                "Catalog synchronized"
            );
        }
        Ok(report)
    }
}

struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
