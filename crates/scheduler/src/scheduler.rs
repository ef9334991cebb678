//! Level-ordered concurrent scheduling with pause and cancel.

use crate::error::Result;
use crate::observer::PublishObserver;
use crate::pipeline::{PackageJob, Pipeline};
use crate::preflight::Preflight;
use crate::report::{PackageOutcome, RunReport};
use crate::stage::PublishStage;
use crate::state::RunState;
use serde::{Deserialize, Serialize};
use slipway_backends::{DryRun, Forge, PackageManager, Vcs};
use slipway_graph::DependencyGraph;
use slipway_net::RetryConfig;
use slipway_planner::ReleaseManifest;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// The run-wide control state, held in a watch channel.
///
/// `Running ⇄ Paused`; `Cancelled` is terminal. Pause blocks new stage
/// and level launches at stage boundaries; in-flight backend calls always
/// finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    /// Work proceeds.
    Running,
    /// New launches are held at the next boundary.
    Paused,
    /// The run winds down; nothing new starts.
    Cancelled,
}

/// Remote control for a running scheduler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: watch::Sender<SchedulerState>,
}

impl SchedulerHandle {
    /// Pauses the run at the next stage boundary. No-op unless running.
    pub fn pause(&self) {
        self.tx.send_if_modified(|state| {
            if *state == SchedulerState::Running {
                *state = SchedulerState::Paused;
                true
            } else {
                false
            }
        });
    }

    /// Resumes a paused run. No-op unless paused; a cancelled run stays
    /// cancelled.
    pub fn resume(&self) {
        self.tx.send_if_modified(|state| {
            if *state == SchedulerState::Paused {
                *state = SchedulerState::Running;
                true
            } else {
                false
            }
        });
    }

    /// Cancels the run. Terminal.
    pub fn cancel(&self) {
        self.tx.send_if_modified(|state| {
            if *state == SchedulerState::Cancelled {
                false
            } else {
                *state = SchedulerState::Cancelled;
                true
            }
        });
    }

    /// The current control state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        *self.tx.borrow()
    }
}

/// Configuration for one release run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum packages in flight within a level.
    pub concurrency: usize,
    /// Whether backend commands execute or only report.
    pub dry_run: DryRun,
    /// Stage retry policy for transient failures.
    pub retry: RetryConfig,
    /// How many times POLLING asks the registry before giving up.
    pub poll_attempts: u32,
    /// Delay between registry polls.
    pub poll_interval: Duration,
    /// Where build artifacts land, one subdirectory per package.
    pub dist_dir: PathBuf,
    /// Registry index URL override.
    pub index_url: Option<String>,
    /// Registry check URL for upload skip detection.
    pub check_url: Option<String>,
    /// Distribution tag (npm-style channels).
    pub dist_tag: Option<String>,
    /// Build without bundling internal sources.
    pub no_sources: bool,
    /// The workspace root the manifest paths are relative to.
    pub workspace_root: PathBuf,
    /// Where the durable run state lives.
    pub run_state_path: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            dry_run: DryRun::No,
            retry: RetryConfig::default(),
            poll_attempts: 10,
            poll_interval: Duration::from_secs(3),
            dist_dir: PathBuf::from("dist"),
            index_url: None,
            check_url: None,
            dist_tag: None,
            no_sources: false,
            workspace_root: PathBuf::from("."),
            run_state_path: PathBuf::from(".slipway-run-state.json"),
        }
    }
}

impl RunOptions {
    /// Creates options rooted at a workspace directory.
    #[must_use]
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        let workspace_root = workspace_root.into();
        Self {
            dist_dir: workspace_root.join("dist"),
            run_state_path: workspace_root.join(".slipway-run-state.json"),
            workspace_root,
            ..Default::default()
        }
    }

    /// Sets the concurrency limit.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Enables dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: DryRun) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the registry index URL.
    #[must_use]
    pub fn with_index_url(mut self, url: impl Into<String>) -> Self {
        self.index_url = Some(url.into());
        self
    }
}

/// Runs a release manifest against a dependency graph.
///
/// Levels execute in topological order; a level only starts once the
/// previous one fully settles. Within a level, packages run concurrently
/// under a semaphore. A failed package blocks its transitive dependents
/// before they ever start; unrelated packages proceed.
pub struct Scheduler {
    package_manager: Arc<dyn PackageManager>,
    vcs: Arc<dyn Vcs>,
    forge: Option<Arc<dyn Forge>>,
    options: Arc<RunOptions>,
    observer: Arc<dyn PublishObserver>,
    control: watch::Sender<SchedulerState>,
}

impl Scheduler {
    /// Creates a scheduler over the given backends.
    #[must_use]
    pub fn new(
        package_manager: Arc<dyn PackageManager>,
        vcs: Arc<dyn Vcs>,
        options: RunOptions,
        observer: Arc<dyn PublishObserver>,
    ) -> Self {
        let (control, _) = watch::channel(SchedulerState::Running);
        Self {
            package_manager,
            vcs,
            forge: None,
            options: Arc::new(options),
            observer,
            control,
        }
    }

    /// Attaches a forge for post-publish release creation.
    #[must_use]
    pub fn with_forge(mut self, forge: Arc<dyn Forge>) -> Self {
        self.forge = Some(forge);
        self
    }

    /// A control handle usable from other tasks.
    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            tx: self.control.clone(),
        }
    }

    /// Executes the whole run and returns the completion report.
    ///
    /// # Errors
    ///
    /// Fails on preflight refusal, run state corruption, or a worker
    /// panic. Per-package pipeline failures do not error; they are
    /// reported in the [`RunReport`].
    pub async fn run(
        &self,
        graph: &DependencyGraph,
        manifest: &ReleaseManifest,
    ) -> Result<RunReport> {
        let start = std::time::Instant::now();

        Preflight::run(&*self.vcs, manifest).await?;

        let names: Vec<String> = manifest.packages.iter().map(|p| p.name.clone()).collect();
        let run_state = RunState::load_or_new(&self.options.run_state_path, names.clone())?;
        self.observer.init_packages(&names).await;

        let pins: HashMap<String, String> = manifest
            .releasable()
            .map(|p| (p.name.clone(), p.new_version.clone()))
            .collect();

        let state = Arc::new(Mutex::new(run_state));
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut outcomes: BTreeMap<String, PackageOutcome> = BTreeMap::new();
        let mut blocked: HashSet<String> = HashSet::new();
        let mut cancelled = false;

        let levels = graph.levels();
        for (level_index, level) in levels.iter().enumerate() {
            if self.level_checkpoint().await == SchedulerState::Cancelled {
                cancelled = true;
                break;
            }

            let launching: Vec<String> = level
                .iter()
                .filter(|p| manifest.get(&p.name).is_some_and(|plan| !plan.skipped))
                .map(|p| p.name.clone())
                .collect();
            self.observer.on_level_start(level_index, &launching).await;
            info!(level = level_index, packages = launching.len(), "level starting");

            let mut join_set: JoinSet<(String, PackageOutcome)> = JoinSet::new();

            for package in level {
                let Some(plan) = manifest.get(&package.name) else {
                    continue;
                };

                if plan.skipped {
                    self.settle(&mut outcomes, &package.name, PublishStage::Skipped, None)
                        .await;
                    continue;
                }
                if state.lock().await.is_published(&package.name) {
                    info!(package = %package.name, "already published in a previous attempt");
                    self.settle(&mut outcomes, &package.name, PublishStage::Published, None)
                        .await;
                    continue;
                }
                if blocked.contains(&package.name) {
                    self.settle(
                        &mut outcomes,
                        &package.name,
                        PublishStage::Blocked,
                        Some("a dependency failed".to_string()),
                    )
                    .await;
                    continue;
                }

                let dir = self.options.workspace_root.join(&package.path);
                let job = PackageJob {
                    name: package.name.clone(),
                    manifest_path: dir.join("Cargo.toml"),
                    dir,
                    new_version: plan.new_version.clone(),
                    tag: plan.tag.clone(),
                    pins: pins.clone(),
                };
                let mut pipeline = Pipeline {
                    package_manager: Arc::clone(&self.package_manager),
                    vcs: Arc::clone(&self.vcs),
                    options: Arc::clone(&self.options),
                    observer: Arc::clone(&self.observer),
                    state: Arc::clone(&state),
                    control: self.control.subscribe(),
                };
                let semaphore = Arc::clone(&semaphore);

                join_set.spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return (
                            job.name.clone(),
                            PackageOutcome {
                                stage: PublishStage::Failed,
                                error: Some("scheduler shut down".to_string()),
                            },
                        );
                    };
                    let outcome = pipeline.run(&job).await;
                    (job.name.clone(), outcome)
                });
            }

            while let Some(joined) = join_set.join_next().await {
                let (name, outcome) = joined?;
                if outcome.stage == PublishStage::Failed {
                    for dependent in graph.dependents_of(&name) {
                        blocked.insert(dependent);
                    }
                }
                if !outcome.stage.is_terminal() {
                    cancelled = true;
                }
                outcomes.insert(name, outcome);
            }

            if cancelled {
                warn!(level = level_index, "run cancelled, later levels not started");
                break;
            }
        }

        // Packages in levels never reached stay at Waiting.
        for plan in &manifest.packages {
            outcomes.entry(plan.name.clone()).or_insert(PackageOutcome {
                stage: PublishStage::Waiting,
                error: None,
            });
        }

        let report = RunReport::from_outcomes(outcomes, start.elapsed(), cancelled);

        if report.success() {
            self.tag_umbrella(manifest).await;
            self.create_forge_releases(manifest, &report).await;
            if let Some(mutex) = Arc::into_inner(state) {
                mutex.into_inner().clear()?;
            }
        }

        self.observer.on_complete(&report).await;
        Ok(report)
    }

    /// Records a package that settles without running its pipeline.
    async fn settle(
        &self,
        outcomes: &mut BTreeMap<String, PackageOutcome>,
        name: &str,
        stage: PublishStage,
        error: Option<String>,
    ) {
        self.observer.on_stage(name, &stage).await;
        outcomes.insert(name.to_string(), PackageOutcome { stage, error });
    }

    /// Blocks at a level boundary while paused; notifies the observer of
    /// state changes it sits through.
    async fn level_checkpoint(&self) -> SchedulerState {
        let mut rx = self.control.subscribe();
        loop {
            let state = *rx.borrow();
            match state {
                SchedulerState::Running => return state,
                SchedulerState::Cancelled => {
                    self.observer.on_scheduler_state(state).await;
                    return state;
                }
                SchedulerState::Paused => {
                    self.observer.on_scheduler_state(state).await;
                    if rx.changed().await.is_err() {
                        return SchedulerState::Cancelled;
                    }
                    self.observer.on_scheduler_state(*rx.borrow()).await;
                }
            }
        }
    }

    /// Tags the umbrella after every package published, so preflight
    /// refuses a second run of the same release. Best-effort: the
    /// packages are already out.
    async fn tag_umbrella(&self, manifest: &ReleaseManifest) {
        let message = format!("release {}", manifest.umbrella_tag);
        match self
            .vcs
            .tag(&manifest.umbrella_tag, &message, self.options.dry_run)
            .await
        {
            Ok(result) if !result.ok() => {
                warn!(tag = %manifest.umbrella_tag, stderr = %result.stderr, "umbrella tag creation failed");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(tag = %manifest.umbrella_tag, error = %e, "umbrella tag creation failed");
            }
        }
    }

    /// Creates one forge release per published tag, best-effort.
    async fn create_forge_releases(&self, manifest: &ReleaseManifest, report: &RunReport) {
        let Some(forge) = &self.forge else {
            return;
        };
        for plan in manifest.releasable() {
            let published = report
                .packages
                .get(&plan.name)
                .is_some_and(|o| o.stage == PublishStage::Published);
            let Some(tag) = plan.tag.as_deref() else {
                continue;
            };
            if !published {
                continue;
            }
            let title = format!("{} {}", plan.name, plan.new_version);
            if let Err(e) = forge
                .create_release(tag, &title, &plan.reason, false, false, self.options.dry_run)
                .await
            {
                warn!(package = %plan.name, error = %e, "forge release creation failed");
            }
        }
    }
}
