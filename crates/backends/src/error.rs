//! Error types for backend operations.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a backend.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The backend process could not be started.
    #[error("Failed to spawn {command}: {source}")]
    #[diagnostic(
        code(slipway::backends::spawn),
        help("Check that the tool is installed and on PATH")
    )]
    Spawn {
        /// The command that failed to start.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The backend command ran but exited non-zero.
    #[error("Command {command} exited with code {return_code}")]
    #[diagnostic(code(slipway::backends::command_failed))]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        return_code: i32,
        /// Captured stderr.
        stderr: String,
    },

    /// A backend reported a domain-level failure.
    #[error("Backend error: {message}")]
    #[diagnostic(code(slipway::backends::backend))]
    Backend {
        /// The error message.
        message: String,
    },
}

impl Error {
    /// Create a spawn error.
    #[must_use]
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Create a backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
