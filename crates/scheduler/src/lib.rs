//! Concurrent, pausable release scheduling for slipway.
//!
//! The scheduler walks a [`slipway_graph::DependencyGraph`] level by
//! level and drives every releasable package of a
//! [`slipway_planner::ReleaseManifest`] through its publish pipeline:
//!
//! ```text
//! WAITING → PINNING → BUILDING → PUBLISHING → POLLING → VERIFYING
//!         → { PUBLISHED | FAILED | SKIPPED | BLOCKED }
//! ```
//!
//! Progress is durable: [`RunState`] is flushed around every stage
//! transition, so a crashed run resumes where it left off. Control is
//! live: a [`SchedulerHandle`] can pause, resume, or cancel at stage
//! boundaries while in-flight backend calls finish cleanly.

mod error;
mod observer;
mod pipeline;
mod preflight;
mod report;
mod scheduler;
mod stage;
mod state;

pub use error::{Error, Result};
pub use observer::{LogObserver, NoOpObserver, PublishObserver};
pub use preflight::Preflight;
pub use report::{PackageOutcome, RunReport};
pub use scheduler::{RunOptions, Scheduler, SchedulerHandle, SchedulerState};
pub use stage::PublishStage;
pub use state::{PackageState, PackageStatus, RunState};
