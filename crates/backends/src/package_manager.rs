//! The package manager capability surface.

use crate::command::{CommandResult, DryRun};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Builds, publishes, and resolves packages against a registry.
///
/// One instance serves the whole run; per-package context arrives through
/// arguments so implementations can stay stateless.
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Builds distribution artifacts for one package into `output_dir`.
    async fn build(
        &self,
        package_dir: &Path,
        output_dir: &Path,
        no_sources: bool,
        dry_run: DryRun,
    ) -> Result<CommandResult>;

    /// Uploads the artifacts in `dist_dir` to the registry.
    async fn publish(
        &self,
        dist_dir: &Path,
        check_url: Option<&str>,
        index_url: Option<&str>,
        dist_tag: Option<&str>,
        dry_run: DryRun,
    ) -> Result<CommandResult>;

    /// Refreshes or verifies the workspace lockfile.
    async fn lock(
        &self,
        check_only: bool,
        upgrade_package: Option<&str>,
        dry_run: DryRun,
    ) -> Result<CommandResult>;

    /// Writes `new_version` into the package's own manifest.
    async fn version_bump(
        &self,
        package_dir: &Path,
        new_version: &str,
        dry_run: DryRun,
    ) -> Result<CommandResult>;

    /// Checks whether `name@version` is resolvable from the registry.
    ///
    /// Used both as the pre-publish duplicate guard and as the
    /// post-publish poll, so it must reflect the registry's live state.
    async fn resolve_check(
        &self,
        name: &str,
        version: &str,
        index_url: Option<&str>,
        dry_run: DryRun,
    ) -> Result<CommandResult>;

    /// Installs `name@version` into a scratch environment and imports it.
    async fn smoke_test(&self, name: &str, version: &str, dry_run: DryRun)
    -> Result<CommandResult>;
}
