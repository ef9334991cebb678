//! Workspace package model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A versioned package discovered in the workspace.
///
/// Packages are created once per workspace scan and are immutable for the
/// duration of a release run. Identity is the package name, which is unique
/// within a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Unique package name.
    pub name: String,
    /// Current version string as declared in the manifest.
    pub version: String,
    /// Package root directory, relative to the workspace root.
    pub path: PathBuf,
    /// Path to the package manifest file.
    pub manifest_path: PathBuf,
    /// Names of workspace-internal dependencies.
    pub internal_deps: Vec<String>,
}

impl Package {
    /// Creates a package with no internal dependencies.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        let manifest_path = path.join("Cargo.toml");
        Self {
            name: name.into(),
            version: version.into(),
            path,
            manifest_path,
            internal_deps: Vec::new(),
        }
    }

    /// Adds internal dependency names.
    #[must_use]
    pub fn with_deps(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.internal_deps.extend(deps.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_package_new() {
        let pkg = Package::new("core", "1.2.3", "crates/core");
        assert_eq!(pkg.name, "core");
        assert_eq!(pkg.version, "1.2.3");
        assert_eq!(pkg.path, Path::new("crates/core"));
        assert_eq!(pkg.manifest_path, Path::new("crates/core/Cargo.toml"));
        assert!(pkg.internal_deps.is_empty());
    }

    #[test]
    fn test_package_with_deps() {
        let pkg = Package::new("app", "0.1.0", "crates/app").with_deps(["core", "util"]);
        assert_eq!(pkg.internal_deps, vec!["core", "util"]);
    }
}
