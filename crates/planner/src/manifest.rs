//! The release manifest: the immutable record of one planned release.

use crate::commit::BumpType;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One package's planned version change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    /// Package name.
    pub name: String,
    /// Version before this release.
    pub old_version: String,
    /// Version after this release (equal to `old_version` when skipped).
    pub new_version: String,
    /// The bump decision that produced `new_version`.
    pub bump: BumpType,
    /// Human-readable explanation of the decision.
    pub reason: String,
    /// Whether the package is excluded from this release.
    pub skipped: bool,
    /// Per-package git tag, absent for skipped packages.
    pub tag: Option<String>,
}

/// The planned versions for one release run.
///
/// Write-once: a manifest is computed, persisted, and then only read.
/// Re-planning produces a fresh manifest rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseManifest {
    /// The commit the plan was computed from.
    pub git_sha: String,
    /// The umbrella tag marking the whole release.
    pub umbrella_tag: String,
    /// When the plan was computed.
    pub created_at: DateTime<Utc>,
    /// Planned changes, sorted by package name.
    pub packages: Vec<PackageVersion>,
}

impl ReleaseManifest {
    /// Creates a manifest, enforcing name order on the package list.
    #[must_use]
    pub fn new(git_sha: &str, umbrella_tag: &str, mut packages: Vec<PackageVersion>) -> Self {
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            git_sha: git_sha.to_string(),
            umbrella_tag: umbrella_tag.to_string(),
            created_at: Utc::now(),
            packages,
        }
    }

    /// Looks up a package's planned change by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageVersion> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Iterates over the packages actually being released.
    pub fn releasable(&self) -> impl Iterator<Item = &PackageVersion> {
        self.packages.iter().filter(|p| !p.skipped)
    }

    /// Whether the manifest releases anything at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releasable().next().is_none()
    }

    /// Writes the manifest as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reads a manifest previously written with [`Self::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::manifest(
                format!("failed to read release manifest: {e}"),
                Some(path.to_path_buf()),
            )
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}
