//! Crash-safe persisted run state.
//!
//! The run state is the only durable structure the scheduler mutates. It
//! is flushed before and after every stage transition, so a crashed run
//! can resume: packages recorded `published` are skipped, packages left
//! `in-progress` re-run their pipeline from the start. The pipeline is
//! therefore at-least-once; the pre-publish duplicate guard makes the
//! observable publish exactly-once.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable status of one package within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageState {
    /// Not yet started.
    Pending,
    /// Pipeline started but not finished.
    InProgress,
    /// Publish completed and verified.
    Published,
    /// Pipeline failed.
    Failed,
}

/// One package's durable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageStatus {
    /// Current durable state.
    pub status: PackageState,
    /// Last recorded error, when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The persisted ledger for one release run.
#[derive(Debug)]
pub struct RunState {
    path: PathBuf,
    entries: BTreeMap<String, PackageStatus>,
}

impl RunState {
    /// Creates a fresh run state with every package pending.
    pub fn new<I, S>(path: &Path, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = packages
            .into_iter()
            .map(|name| {
                (
                    name.into(),
                    PackageStatus {
                        status: PackageState::Pending,
                        error: None,
                    },
                )
            })
            .collect();
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    /// Loads an existing run state, or creates a fresh one.
    ///
    /// Loaded `in-progress` entries are reset to pending so their
    /// pipeline re-runs from the start; `published` entries are kept and
    /// will be skipped. Packages in `packages` but absent from the file
    /// are added as pending.
    pub fn load_or_new<I, S>(path: &Path, packages: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !path.is_file() {
            return Ok(Self::new(path, packages));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::run_state(path, format!("failed to read: {e}")))?;
        let mut entries: BTreeMap<String, PackageStatus> = serde_json::from_str(&contents)
            .map_err(|e| Error::run_state(path, format!("corrupt run state: {e}")))?;

        let mut resumed = 0_usize;
        for status in entries.values_mut() {
            if status.status == PackageState::InProgress {
                status.status = PackageState::Pending;
                resumed += 1;
            }
        }
        for name in packages {
            entries.entry(name.into()).or_insert(PackageStatus {
                status: PackageState::Pending,
                error: None,
            });
        }

        debug!(
            path = %path.display(),
            packages = entries.len(),
            resumed,
            "run state loaded"
        );
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Records a package's state and flushes to disk.
    pub fn mark(
        &mut self,
        name: &str,
        status: PackageState,
        error: Option<String>,
    ) -> Result<()> {
        self.entries
            .insert(name.to_string(), PackageStatus { status, error });
        self.flush()
    }

    /// Whether the package already published in a previous attempt.
    #[must_use]
    pub fn is_published(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|s| s.status == PackageState::Published)
    }

    /// The durable record for one package.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageStatus> {
        self.entries.get(name)
    }

    /// All records, in name order.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<String, PackageStatus> {
        &self.entries
    }

    /// Writes the ledger atomically: temp file in the same directory,
    /// then rename over the target.
    pub fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| Error::run_state(&self.path, format!("failed to write: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| Error::run_state(&self.path, format!("failed to rename: {e}")))?;
        Ok(())
    }

    /// Removes the state file once a run fully succeeds.
    pub fn clear(self) -> Result<()> {
        if self.path.is_file() {
            std::fs::remove_file(&self.path)
                .map_err(|e| Error::run_state(&self.path, format!("failed to remove: {e}")))?;
        }
        Ok(())
    }
}
