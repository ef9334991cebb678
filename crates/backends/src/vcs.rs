//! The version control capability surface.

use crate::command::{CommandResult, DryRun};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One commit from the repository log, with the files it changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Commit hash.
    pub sha: String,
    /// Full commit message.
    pub message: String,
    /// Repo-relative paths changed by the commit.
    pub files: Vec<PathBuf>,
}

/// Repository state, history, commits, and tags.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Whether the worktree has no uncommitted changes.
    async fn is_clean(&self) -> Result<bool>;

    /// Whether the clone is shallow. Shallow clones cannot compute
    /// commit ranges reliably.
    async fn is_shallow(&self) -> Result<bool>;

    /// The current HEAD commit hash.
    async fn current_sha(&self) -> Result<String>;

    /// Commits in `range` (for example `v1.2.0..HEAD`), newest last.
    async fn log(&self, range: &str) -> Result<Vec<LogEntry>>;

    /// Commits the given paths with `message`.
    async fn commit(&self, message: &str, paths: &[PathBuf], dry_run: DryRun)
    -> Result<CommandResult>;

    /// Creates an annotated tag at HEAD.
    async fn tag(&self, name: &str, message: &str, dry_run: DryRun) -> Result<CommandResult>;

    /// Whether a tag already exists, locally or on the default remote.
    async fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Deletes a tag, optionally from a remote as well.
    async fn delete_tag(
        &self,
        name: &str,
        remote: Option<&str>,
        dry_run: DryRun,
    ) -> Result<CommandResult>;
}
