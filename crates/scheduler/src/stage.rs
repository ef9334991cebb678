//! Per-package publish stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a package is in its publish pipeline.
///
/// The happy path runs `Waiting → Pinning → Building → Publishing →
/// Polling → Verifying → Published`. `Retrying` is a transient sub-state
/// carrying the stage it interrupted; `Blocked` is terminal and entered
/// only by dependency-failure propagation, never by the package's own
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "stage", content = "interrupted")]
pub enum PublishStage {
    /// Not yet started.
    Waiting,
    /// Rewriting manifests: own version plus internal dependency pins.
    Pinning,
    /// Building distribution artifacts.
    Building,
    /// Uploading to the registry (after the duplicate guard).
    Publishing,
    /// Waiting for the registry to reflect the new version.
    Polling,
    /// Smoke-testing the published package.
    Verifying,
    /// Backing off before re-entering the carried stage.
    Retrying(Box<PublishStage>),
    /// Successfully published and verified.
    Published,
    /// The pipeline failed after exhausting retries.
    Failed,
    /// Excluded from this run (no releasable changes, or already done).
    Skipped,
    /// Never started because a dependency failed.
    Blocked,
}

impl PublishStage {
    /// Whether this stage ends the package's run.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Published | Self::Failed | Self::Skipped | Self::Blocked
        )
    }

    /// Whether the package ended successfully (published or legitimately
    /// skipped).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Published | Self::Skipped)
    }
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Pinning => write!(f, "pinning"),
            Self::Building => write!(f, "building"),
            Self::Publishing => write!(f, "publishing"),
            Self::Polling => write!(f, "polling"),
            Self::Verifying => write!(f, "verifying"),
            Self::Retrying(stage) => write!(f, "retrying {stage}"),
            Self::Published => write!(f, "published"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}
