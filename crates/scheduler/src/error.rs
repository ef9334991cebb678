//! Error types for scheduler operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scheduler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a release.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A preflight gate failed; nothing was started.
    #[error("Preflight failed: {reason}")]
    #[diagnostic(
        code(slipway::scheduler::preflight),
        help("Fix the repository state and re-run; no release work has begun")
    )]
    Preflight {
        /// Why the gate refused to proceed.
        reason: String,
    },

    /// The persisted run state could not be read or written.
    #[error("Run state error at {path}: {message}")]
    #[diagnostic(code(slipway::scheduler::run_state))]
    RunState {
        /// The run state file path.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// A backend operation failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Backend(#[from] slipway_backends::Error),

    /// A planning operation failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Planner(#[from] slipway_planner::Error),

    /// A worker task panicked or was aborted.
    #[error("Worker task failed: {0}")]
    #[diagnostic(code(slipway::scheduler::join))]
    Join(#[from] tokio::task::JoinError),

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(slipway::scheduler::io))]
    Io(#[from] std::io::Error),

    /// Wrapped JSON error.
    #[error("JSON error: {0}")]
    #[diagnostic(code(slipway::scheduler::json))]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a preflight error.
    #[must_use]
    pub fn preflight(reason: impl Into<String>) -> Self {
        Self::Preflight {
            reason: reason.into(),
        }
    }

    /// Create a run state error.
    #[must_use]
    pub fn run_state(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::RunState {
            path: path.into(),
            message: message.into(),
        }
    }
}
