//! Backend capability traits for slipway.
//!
//! The scheduler drives releases through three capability surfaces:
//!
//! - [`PackageManager`] — building, publishing, and resolving packages
//! - [`Vcs`] — repository state, history, commits, and tags
//! - [`Forge`] — hosted releases, pull requests, and labels
//!
//! Every mutating operation takes a [`DryRun`] flag and returns a
//! [`CommandResult`], so a dry run exercises the same decision paths as a
//! real run and reports the exact commands it would have executed.
//! Concrete shell-backed implementations live with their users; this
//! crate defines the contract and the [`CommandSpec`] execution plumbing.

mod command;
mod error;
mod forge;
mod package_manager;
mod vcs;

pub use command::{CommandResult, CommandSpec, DryRun};
pub use error::{Error, Result};
pub use forge::{Forge, PrState, PullRequestInfo, ReleaseInfo};
pub use package_manager::PackageManager;
pub use vcs::{LogEntry, Vcs};
