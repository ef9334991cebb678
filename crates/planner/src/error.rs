//! Error types for version planning operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for planner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while planning a release.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Failed to parse or validate a version string.
    #[error("Invalid version: {version}")]
    #[diagnostic(
        code(slipway::planner::invalid_version),
        help("Versions must be SemVer (1.2.3) or match the configured CalVer format")
    )]
    InvalidVersion {
        /// The invalid version string.
        version: String,
    },

    /// Unknown calendar versioning format string.
    #[error("Unknown CalVer format: {format}")]
    #[diagnostic(
        code(slipway::planner::calver_format),
        help("Supported formats are YYYY.MM.DD and YYYY.MM.MICRO")
    )]
    CalverFormat {
        /// The unrecognized format string.
        format: String,
    },

    /// Manifest file error.
    #[error("Manifest error: {message}")]
    #[diagnostic(
        code(slipway::planner::manifest),
        help("Check that the manifest file exists and is properly formatted")
    )]
    Manifest {
        /// The error message.
        message: String,
        /// The manifest file path.
        path: Option<PathBuf>,
    },

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(slipway::planner::io))]
    Io(#[from] std::io::Error),

    /// Wrapped JSON error.
    #[error("JSON error: {0}")]
    #[diagnostic(code(slipway::planner::json))]
    Json(#[from] serde_json::Error),

    /// Wrapped TOML parsing error.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(slipway::planner::toml_parse))]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Create a new invalid version error.
    #[must_use]
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create a new manifest error.
    #[must_use]
    pub fn manifest(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Manifest {
            message: message.into(),
            path,
        }
    }
}
