//! Error types for dependency graph operations.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or ordering the dependency graph.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum Error {
    /// The package set contains one or more dependency cycles.
    #[error("dependency cycle detected: {}", format_cycles(.cycles))]
    #[diagnostic(
        code(slipway::graph::cycle),
        help("Break the cycle by removing one of the internal dependency edges")
    )]
    Cycle {
        /// Every cycle found, as ordered lists of package names.
        cycles: Vec<Vec<String>>,
    },

    /// A package declares an internal dependency that is not in the workspace.
    #[error("package '{package}' depends on unknown package '{dependency}'")]
    #[diagnostic(
        code(slipway::graph::missing_dependency),
        help("Internal dependencies must name another package in the same workspace")
    )]
    MissingDependency {
        /// The package with the dangling edge.
        package: String,
        /// The dependency name that could not be resolved.
        dependency: String,
    },

    /// Two packages in the workspace share a name.
    #[error("duplicate package name '{name}'")]
    #[diagnostic(
        code(slipway::graph::duplicate_package),
        help("Package names are the identity of graph nodes and must be unique")
    )]
    DuplicatePackage {
        /// The repeated name.
        name: String,
    },
}

fn format_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|cycle| cycle.join(" -> "))
        .collect::<Vec<_>>()
        .join("; ")
}
