//! Push-only progress sink for release runs.

use crate::report::RunReport;
use crate::scheduler::SchedulerState;
use crate::stage::PublishStage;
use async_trait::async_trait;
use tracing::{error, info};

/// Receives progress notifications from the scheduler.
///
/// Push-only: implementations never influence scheduling. Every method
/// has an empty default so observers implement only what they need.
#[async_trait]
pub trait PublishObserver: Send + Sync {
    /// Called once before any work, with every package in the run.
    async fn init_packages(&self, packages: &[String]) {
        let _ = packages;
    }

    /// Called on every stage transition, including `Retrying`.
    async fn on_stage(&self, package: &str, stage: &PublishStage) {
        let _ = (package, stage);
    }

    /// Called when a package's pipeline records an error.
    async fn on_error(&self, package: &str, error: &str) {
        let _ = (package, error);
    }

    /// Called when a dependency level begins.
    async fn on_level_start(&self, level: usize, packages: &[String]) {
        let _ = (level, packages);
    }

    /// Called when the run pauses, resumes, or is cancelled.
    async fn on_scheduler_state(&self, state: SchedulerState) {
        let _ = state;
    }

    /// Called once with the final report.
    async fn on_complete(&self, report: &RunReport) {
        let _ = report;
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

#[async_trait]
impl PublishObserver for NoOpObserver {}

/// Observer that forwards notifications to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

#[async_trait]
impl PublishObserver for LogObserver {
    async fn init_packages(&self, packages: &[String]) {
        info!(packages = packages.len(), "release run starting");
    }

    async fn on_stage(&self, package: &str, stage: &PublishStage) {
        info!(package, %stage, "stage transition");
    }

    async fn on_error(&self, package: &str, err: &str) {
        error!(package, error = err, "package error");
    }

    async fn on_level_start(&self, level: usize, packages: &[String]) {
        info!(level, packages = ?packages, "level starting");
    }

    async fn on_scheduler_state(&self, state: SchedulerState) {
        info!(?state, "scheduler state changed");
    }

    async fn on_complete(&self, report: &RunReport) {
        info!(
            published = report.published,
            failed = report.failed,
            blocked = report.blocked,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "release run complete"
        );
    }
}
