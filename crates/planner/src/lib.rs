//! Commit parsing and version planning for slipway.
//!
//! This crate turns a workspace scan and a range of commits into a
//! [`ReleaseManifest`]: the immutable record of planned package versions
//! for one release run. It covers:
//!
//! - **Workspace scan**: reading member manifests and internal dependency
//!   declarations ([`Workspace`])
//! - **Commit parsing**: Conventional Commits with revert recovery
//!   ([`CommitParser`])
//! - **Bump reduction**: folding commits per package into one bump
//!   decision, cancelling reverts ([`plan_bump`])
//! - **Version rendering**: SemVer increments ([`Version`]) or calendar
//!   versioning ([`compute_calver`])
//! - **Pin rewriting**: lossless manifest edits for the pinning stage
//!   ([`ManifestEditor`])
//!
//! The manifest is write-once per run: re-running recomputes a new
//! manifest from the same inputs rather than mutating an old one.

mod calver;
mod commit;
mod error;
mod manifest;
mod pins;
mod plan;
mod version;
mod workspace;

pub use calver::{CalverFormat, compute_calver};
pub use commit::{BumpType, CommitParser, ParsedCommit};
pub use error::{Error, Result};
pub use manifest::{PackageVersion, ReleaseManifest};
pub use pins::ManifestEditor;
pub use plan::{ReleasePlanner, VersionScheme, plan_bump};
pub use version::Version;
pub use workspace::{Workspace, attribute_commits};
