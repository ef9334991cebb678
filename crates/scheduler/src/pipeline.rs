//! The per-package publish pipeline.

use crate::observer::PublishObserver;
use crate::report::PackageOutcome;
use crate::scheduler::{RunOptions, SchedulerState};
use crate::stage::PublishStage;
use crate::state::{PackageState, RunState};
use slipway_backends::{Error as BackendError, PackageManager, Vcs};
use slipway_net::RetryKind;
use slipway_planner::ManifestEditor;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

/// Everything one package's pipeline needs, resolved up front.
#[derive(Debug, Clone)]
pub(crate) struct PackageJob {
    pub name: String,
    pub dir: PathBuf,
    pub manifest_path: PathBuf,
    pub new_version: String,
    pub tag: Option<String>,
    /// Internal dependency pins: name to planned version.
    pub pins: HashMap<String, String>,
}

/// Classifies a backend failure for the stage retry loop.
///
/// Command failures are worth re-entering the stage: registries throttle
/// and flake. A missing tool or a domain-level refusal will not improve
/// with repetition.
fn classify(error: &BackendError) -> RetryKind {
    match error {
        BackendError::CommandFailed { .. } => RetryKind::Transient,
        BackendError::Spawn { .. } | BackendError::Backend { .. } => RetryKind::Fatal,
    }
}

/// Drives one package through its stages, with durable state updates and
/// observer notifications on every transition.
#[derive(Clone)]
pub(crate) struct Pipeline {
    pub package_manager: Arc<dyn PackageManager>,
    pub vcs: Arc<dyn Vcs>,
    pub options: Arc<RunOptions>,
    pub observer: Arc<dyn PublishObserver>,
    pub state: Arc<Mutex<RunState>>,
    pub control: watch::Receiver<SchedulerState>,
}

impl Pipeline {
    /// Runs the pipeline to a terminal stage, or stops at a stage
    /// boundary on cancellation.
    pub async fn run(&mut self, job: &PackageJob) -> PackageOutcome {
        if self.record(job, PackageState::InProgress, None).await.is_err() {
            return PackageOutcome {
                stage: PublishStage::Failed,
                error: Some("failed to persist run state".to_string()),
            };
        }

        let stages = [
            PublishStage::Pinning,
            PublishStage::Building,
            PublishStage::Publishing,
            PublishStage::Polling,
            PublishStage::Verifying,
        ];

        for stage in stages {
            if self.checkpoint().await == SchedulerState::Cancelled {
                debug!(package = %job.name, %stage, "cancelled at stage boundary");
                return PackageOutcome {
                    stage,
                    error: Some("run cancelled".to_string()),
                };
            }

            self.observer.on_stage(&job.name, &stage).await;
            if let Err(message) = self.run_stage(job, &stage).await {
                warn!(package = %job.name, %stage, error = %message, "pipeline failed");
                self.observer.on_error(&job.name, &message).await;
                if let Err(e) = self
                    .record(job, PackageState::Failed, Some(message.clone()))
                    .await
                {
                    warn!(package = %job.name, error = %e, "run state write failed, ledger may be stale");
                }
                self.observer.on_stage(&job.name, &PublishStage::Failed).await;
                return PackageOutcome {
                    stage: PublishStage::Failed,
                    error: Some(message),
                };
            }
        }

        if let Err(e) = self.record(job, PackageState::Published, None).await {
            warn!(package = %job.name, error = %e, "run state write failed, ledger may be stale");
        }
        self.observer
            .on_stage(&job.name, &PublishStage::Published)
            .await;
        PackageOutcome {
            stage: PublishStage::Published,
            error: None,
        }
    }

    /// Blocks while paused; reports the state that let execution proceed.
    async fn checkpoint(&mut self) -> SchedulerState {
        loop {
            let state = *self.control.borrow();
            match state {
                SchedulerState::Running | SchedulerState::Cancelled => return state,
                SchedulerState::Paused => {
                    if self.control.changed().await.is_err() {
                        // Sender dropped: treat as cancellation.
                        return SchedulerState::Cancelled;
                    }
                }
            }
        }
    }

    /// Runs one stage, re-entering it after backoff on transient errors.
    async fn run_stage(&mut self, job: &PackageJob, stage: &PublishStage) -> Result<(), String> {
        let mut attempt = 0;
        loop {
            match self.execute(job, stage).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if classify(&e) == RetryKind::Fatal
                        || attempt >= self.options.retry.max_retries
                    {
                        return Err(e.to_string());
                    }
                    let delay = self.options.retry.delay_for(attempt);
                    warn!(
                        package = %job.name,
                        %stage,
                        attempt = attempt + 1,
                        error = %e,
                        ?delay,
                        "transient failure, re-entering stage"
                    );
                    self.observer
                        .on_stage(
                            &job.name,
                            &PublishStage::Retrying(Box::new(stage.clone())),
                        )
                        .await;
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    if self.checkpoint().await == SchedulerState::Cancelled {
                        return Err("run cancelled".to_string());
                    }
                    self.observer.on_stage(&job.name, stage).await;
                }
            }
        }
    }

    async fn execute(&self, job: &PackageJob, stage: &PublishStage) -> slipway_backends::Result<()> {
        match stage {
            PublishStage::Pinning => self.pin(job).await,
            PublishStage::Building => {
                self.package_manager
                    .build(
                        &job.dir,
                        &self.options.dist_dir.join(&job.name),
                        self.options.no_sources,
                        self.options.dry_run,
                    )
                    .await?
                    .into_result()?;
                Ok(())
            }
            PublishStage::Publishing => self.publish(job).await,
            PublishStage::Polling => self.poll(job).await,
            PublishStage::Verifying => self.verify(job).await,
            _ => Ok(()),
        }
    }

    /// Rewrites the member manifest (own version + internal pins), then
    /// lets the package manager record the bump. Dry runs keep the edits
    /// in memory.
    async fn pin(&self, job: &PackageJob) -> slipway_backends::Result<()> {
        let mut editor = ManifestEditor::open(&job.manifest_path)
            .map_err(|e| BackendError::backend(e.to_string()))?;
        editor
            .set_version(&job.new_version)
            .map_err(|e| BackendError::backend(e.to_string()))?;
        let pinned = editor.pin_all(&job.pins);
        if self.options.dry_run.is_dry() {
            debug!(package = %job.name, pinned, "dry run, manifest edits not written");
        } else {
            editor
                .save()
                .map_err(|e| BackendError::backend(e.to_string()))?;
        }

        self.package_manager
            .version_bump(&job.dir, &job.new_version, self.options.dry_run)
            .await?
            .into_result()?;

        // The lockfile must reflect the pinned versions before building.
        self.package_manager
            .lock(false, Some(&job.name), self.options.dry_run)
            .await?
            .into_result()?;
        Ok(())
    }

    /// Duplicate guard, then upload. A version the registry already
    /// resolves is treated as published by a previous attempt.
    async fn publish(&self, job: &PackageJob) -> slipway_backends::Result<()> {
        let check = self
            .package_manager
            .resolve_check(
                &job.name,
                &job.new_version,
                self.options.index_url.as_deref(),
                self.options.dry_run,
            )
            .await?;
        if !check.dry_run && check.ok() {
            debug!(
                package = %job.name,
                version = %job.new_version,
                "already resolvable, skipping upload"
            );
            return Ok(());
        }

        self.package_manager
            .publish(
                &self.options.dist_dir.join(&job.name),
                self.options.check_url.as_deref(),
                self.options.index_url.as_deref(),
                self.options.dist_tag.as_deref(),
                self.options.dry_run,
            )
            .await?
            .into_result()?;
        Ok(())
    }

    /// Polls the registry until it reflects the new version.
    async fn poll(&self, job: &PackageJob) -> slipway_backends::Result<()> {
        for attempt in 0..self.options.poll_attempts {
            let check = self
                .package_manager
                .resolve_check(
                    &job.name,
                    &job.new_version,
                    self.options.index_url.as_deref(),
                    self.options.dry_run,
                )
                .await?;
            if check.ok() {
                return Ok(());
            }
            debug!(
                package = %job.name,
                attempt = attempt + 1,
                max = self.options.poll_attempts,
                "registry does not resolve version yet"
            );
            tokio::time::sleep(self.options.poll_interval).await;
        }
        Err(BackendError::backend(format!(
            "registry never reflected {}=={} after {} polls",
            job.name, job.new_version, self.options.poll_attempts
        )))
    }

    /// Smoke-tests the published package, then tags it.
    async fn verify(&self, job: &PackageJob) -> slipway_backends::Result<()> {
        self.package_manager
            .smoke_test(&job.name, &job.new_version, self.options.dry_run)
            .await?
            .into_result()?;

        if let Some(tag) = &job.tag {
            let message = format!("{} {}", job.name, job.new_version);
            self.vcs
                .tag(tag, &message, self.options.dry_run)
                .await?
                .into_result()?;
        }
        Ok(())
    }

    async fn record(
        &self,
        job: &PackageJob,
        status: PackageState,
        error: Option<String>,
    ) -> crate::error::Result<()> {
        self.state.lock().await.mark(&job.name, status, error)
    }
}
