//! Preflight gate: conditions checked before any package starts.

use crate::error::{Error, Result};
use slipway_backends::Vcs;
use slipway_planner::ReleaseManifest;
use tracing::debug;

/// Runs every gate; the first failure aborts the run before side effects.
pub struct Preflight;

impl Preflight {
    /// Checks repository and manifest preconditions.
    ///
    /// Gates: clean worktree, non-shallow clone, umbrella tag absent
    /// (already-present means this release already ran), and a manifest
    /// that releases at least one package.
    pub async fn run(vcs: &dyn Vcs, manifest: &ReleaseManifest) -> Result<()> {
        if !vcs.is_clean().await? {
            return Err(Error::preflight("worktree has uncommitted changes"));
        }
        if vcs.is_shallow().await? {
            return Err(Error::preflight(
                "shallow clone: commit ranges cannot be computed",
            ));
        }
        if vcs.tag_exists(&manifest.umbrella_tag).await? {
            return Err(Error::preflight(format!(
                "umbrella tag {} already exists; this release has already run",
                manifest.umbrella_tag
            )));
        }
        if manifest.is_empty() {
            return Err(Error::preflight("manifest releases no packages"));
        }

        debug!(umbrella_tag = %manifest.umbrella_tag, "preflight passed");
        Ok(())
    }
}
