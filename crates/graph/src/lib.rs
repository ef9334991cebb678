//! Package dependency graph algorithms for slipway.
//!
//! This crate builds a directed graph of workspace packages and their
//! internal dependency edges, detects cycles before any release work
//! starts, and produces the topological levels the scheduler walks.
//!
//! # Key Types
//!
//! - [`Package`]: An immutable workspace package record
//! - [`DependencyGraph`]: The directed graph over packages
//!
//! # Example
//!
//! ```ignore
//! use slipway_graph::{DependencyGraph, Package};
//!
//! let graph = DependencyGraph::build(packages)?;
//! for (i, level) in graph.levels().iter().enumerate() {
//!     // Every package in `level` only depends on earlier levels.
//! }
//! ```

mod error;
mod graph;
mod package;

pub use error::{Error, Result};
pub use graph::DependencyGraph;
pub use package::Package;
