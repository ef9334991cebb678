//! Completion report for one release run.

use crate::stage::PublishStage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Where one package ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageOutcome {
    /// Final (or interrupted) stage.
    pub stage: PublishStage,
    /// The recorded error, when the package failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Manifest-shaped completion report, serializable for CI consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Per-package outcomes, in name order.
    pub packages: BTreeMap<String, PackageOutcome>,
    /// Packages that published (including prior-run publishes).
    pub published: usize,
    /// Packages whose pipeline failed.
    pub failed: usize,
    /// Packages blocked by a failed dependency.
    pub blocked: usize,
    /// Packages excluded from the run.
    pub skipped: usize,
    /// Total wall-clock time.
    pub duration: Duration,
    /// Whether the run was cancelled before finishing.
    pub cancelled: bool,
}

impl RunReport {
    /// Builds a report from per-package outcomes, tallying as it goes.
    #[must_use]
    pub fn from_outcomes(
        packages: BTreeMap<String, PackageOutcome>,
        duration: Duration,
        cancelled: bool,
    ) -> Self {
        let mut published = 0;
        let mut failed = 0;
        let mut blocked = 0;
        let mut skipped = 0;
        for outcome in packages.values() {
            match outcome.stage {
                PublishStage::Published => published += 1,
                PublishStage::Failed => failed += 1,
                PublishStage::Blocked => blocked += 1,
                PublishStage::Skipped => skipped += 1,
                _ => {}
            }
        }
        Self {
            packages,
            published,
            failed,
            blocked,
            skipped,
            duration,
            cancelled,
        }
    }

    /// Whether every package either published or was legitimately skipped.
    #[must_use]
    pub const fn success(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.blocked == 0
    }
}
