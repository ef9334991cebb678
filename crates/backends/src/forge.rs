//! The forge capability surface: hosted releases, pull requests, labels.

use crate::command::{CommandResult, DryRun};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A hosted release as the forge reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// The tag the release points at.
    pub tag: String,
    /// Display title.
    pub title: String,
    /// Whether the release is still a draft.
    pub draft: bool,
    /// Whether the release is marked pre-release.
    pub prerelease: bool,
}

/// A pull request as the forge reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    /// PR number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Source branch.
    pub head: String,
    /// Target branch.
    pub base: String,
    /// Current state.
    pub state: PrState,
}

/// Pull request state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    /// Open PRs only.
    Open,
    /// Closed (unmerged) PRs only.
    Closed,
    /// Merged PRs only.
    Merged,
    /// No filter.
    All,
}

/// Hosted forge operations.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Creates a release for `tag`, optionally as a draft.
    async fn create_release(
        &self,
        tag: &str,
        title: &str,
        notes: &str,
        draft: bool,
        prerelease: bool,
        dry_run: DryRun,
    ) -> Result<CommandResult>;

    /// Deletes the release for `tag`.
    async fn delete_release(&self, tag: &str, dry_run: DryRun) -> Result<CommandResult>;

    /// Publishes a draft release.
    async fn promote_release(&self, tag: &str, dry_run: DryRun) -> Result<CommandResult>;

    /// Lists releases, newest first.
    async fn list_releases(&self) -> Result<Vec<ReleaseInfo>>;

    /// Opens a pull request from `head` into `base`.
    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
        dry_run: DryRun,
    ) -> Result<CommandResult>;

    /// Updates the title and body of an existing pull request.
    async fn update_pr(
        &self,
        number: u64,
        title: &str,
        body: &str,
        dry_run: DryRun,
    ) -> Result<CommandResult>;

    /// Merges a pull request.
    async fn merge_pr(&self, number: u64, dry_run: DryRun) -> Result<CommandResult>;

    /// Lists pull requests matching a state filter.
    async fn list_prs(&self, state: PrState) -> Result<Vec<PullRequestInfo>>;

    /// Adds labels to a pull request.
    async fn add_labels(
        &self,
        number: u64,
        labels: &[String],
        dry_run: DryRun,
    ) -> Result<CommandResult>;

    /// Removes labels from a pull request.
    async fn remove_labels(
        &self,
        number: u64,
        labels: &[String],
        dry_run: DryRun,
    ) -> Result<CommandResult>;
}
