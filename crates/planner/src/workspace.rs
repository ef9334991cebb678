//! Workspace scanning and commit attribution.

use crate::commit::ParsedCommit;
use crate::error::{Error, Result};
use serde::Deserialize;
use slipway_graph::Package;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A scanned workspace: the root plus every member package.
///
/// Member paths are stored relative to the root so they line up with the
/// repo-relative file paths that commit attribution sees.
pub struct Workspace {
    root: PathBuf,
    packages: Vec<Package>,
}

#[derive(Deserialize)]
struct RootManifest {
    workspace: Option<WorkspaceTable>,
}

#[derive(Deserialize)]
struct WorkspaceTable {
    #[serde(default)]
    members: Vec<String>,
    package: Option<WorkspaceDefaults>,
}

#[derive(Deserialize)]
struct WorkspaceDefaults {
    version: Option<String>,
}

#[derive(Deserialize)]
struct MemberManifest {
    package: Option<PackageTable>,
    #[serde(default)]
    dependencies: HashMap<String, toml::Value>,
    #[serde(rename = "dev-dependencies", default)]
    dev_dependencies: HashMap<String, toml::Value>,
    #[serde(rename = "build-dependencies", default)]
    build_dependencies: HashMap<String, toml::Value>,
}

#[derive(Deserialize)]
struct PackageTable {
    name: Option<String>,
    version: Option<toml::Value>,
}

impl Workspace {
    /// Scans a workspace root, expanding member globs and reading each
    /// member manifest.
    ///
    /// Internal dependencies are the subset of each member's declared
    /// dependencies (normal, dev, and build) whose names are themselves
    /// workspace members.
    pub fn discover(root: &Path) -> Result<Self> {
        let root_path = root.join("Cargo.toml");
        let contents = std::fs::read_to_string(&root_path)
            .map_err(|e| Error::manifest(format!("failed to read: {e}"), Some(root_path.clone())))?;
        let root_manifest: RootManifest = toml::from_str(&contents)?;
        let Some(workspace) = root_manifest.workspace else {
            return Err(Error::manifest(
                "not a workspace root: missing [workspace]",
                Some(root_path),
            ));
        };
        let default_version = workspace
            .package
            .and_then(|defaults| defaults.version);

        let mut scanned = Vec::new();
        for member in &workspace.members {
            for dir in expand_member(root, member)? {
                let manifest_path = root.join(&dir).join("Cargo.toml");
                if !manifest_path.is_file() {
                    continue;
                }
                scanned.push(scan_member(&manifest_path, dir, default_version.as_deref())?);
            }
        }

        let member_names: BTreeSet<String> =
            scanned.iter().map(|(pkg, _)| pkg.name.clone()).collect();
        let mut packages: Vec<Package> = scanned
            .into_iter()
            .map(|(pkg, declared)| {
                let internal: Vec<String> = declared
                    .into_iter()
                    .filter(|dep| member_names.contains(dep))
                    .collect();
                pkg.with_deps(internal)
            })
            .collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(root = %root.display(), members = packages.len(), "workspace scanned");
        Ok(Self {
            root: root.to_path_buf(),
            packages,
        })
    }

    /// The workspace root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The member packages, sorted by name.
    #[must_use]
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Consumes the workspace, yielding its packages.
    #[must_use]
    pub fn into_packages(self) -> Vec<Package> {
        self.packages
    }
}

/// Expands one member entry, which may be a literal path or a glob.
fn expand_member(root: &Path, member: &str) -> Result<Vec<PathBuf>> {
    if !member.contains('*') {
        return Ok(vec![PathBuf::from(member)]);
    }
    let pattern = root.join(member);
    let pattern = pattern.to_string_lossy();
    let paths = glob::glob(&pattern)
        .map_err(|e| Error::manifest(format!("bad member glob {member}: {e}"), None))?;

    let mut dirs = Vec::new();
    for entry in paths {
        let path =
            entry.map_err(|e| Error::manifest(format!("member glob {member}: {e}"), None))?;
        if path.is_dir() {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            dirs.push(relative);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Reads one member manifest, returning the package and its declared
/// dependency names (not yet filtered to workspace members).
fn scan_member(
    manifest_path: &Path,
    dir: PathBuf,
    default_version: Option<&str>,
) -> Result<(Package, Vec<String>)> {
    let contents = std::fs::read_to_string(manifest_path).map_err(|e| {
        Error::manifest(format!("failed to read: {e}"), Some(manifest_path.to_path_buf()))
    })?;
    let manifest: MemberManifest = toml::from_str(&contents)?;
    let Some(package) = manifest.package else {
        return Err(Error::manifest(
            "missing [package] table",
            Some(manifest_path.to_path_buf()),
        ));
    };
    let name = package.name.ok_or_else(|| {
        Error::manifest("missing package.name", Some(manifest_path.to_path_buf()))
    })?;
    let version = resolve_version(package.version.as_ref(), default_version).ok_or_else(|| {
        Error::manifest("missing package.version", Some(manifest_path.to_path_buf()))
    })?;

    let mut declared: Vec<String> = manifest
        .dependencies
        .keys()
        .chain(manifest.dev_dependencies.keys())
        .chain(manifest.build_dependencies.keys())
        .cloned()
        .collect();
    declared.sort();
    declared.dedup();

    Ok((Package::new(name, version, dir), declared))
}

/// Resolves `version = "1.2.3"` or `version.workspace = true`.
fn resolve_version(field: Option<&toml::Value>, default: Option<&str>) -> Option<String> {
    match field {
        Some(toml::Value::String(version)) => Some(version.clone()),
        Some(toml::Value::Table(table))
            if table.get("workspace").and_then(toml::Value::as_bool) == Some(true) =>
        {
            default.map(str::to_string)
        }
        _ => None,
    }
}

/// Maps commits to the packages they touch.
///
/// Each commit carries the files it changed (repo-relative); a file
/// belongs to the package with the longest matching path prefix, so a
/// nested package shadows its parent. Files outside any member are
/// ignored. A commit touching several packages is attributed to each.
#[must_use]
pub fn attribute_commits(
    packages: &[Package],
    commits: &[(ParsedCommit, Vec<PathBuf>)],
) -> HashMap<String, Vec<ParsedCommit>> {
    let mut attributed: HashMap<String, Vec<ParsedCommit>> = HashMap::new();
    for (commit, files) in commits {
        let mut touched: BTreeSet<&str> = BTreeSet::new();
        for file in files {
            if let Some(owner) = owner_of(packages, file) {
                touched.insert(owner);
            }
        }
        for name in touched {
            attributed
                .entry(name.to_string())
                .or_default()
                .push(commit.clone());
        }
    }
    attributed
}

fn owner_of<'a>(packages: &'a [Package], file: &Path) -> Option<&'a str> {
    packages
        .iter()
        .filter(|package| file.starts_with(&package.path))
        .max_by_key(|package| package.path.as_os_str().len())
        .map(|package| package.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitParser;

    fn write_workspace(dir: &Path) {
        std::fs::write(
            dir.join("Cargo.toml"),
            r#"[workspace]
members = ["crates/*", "app"]

[workspace.package]
version = "2.0.0"
"#,
        )
        .unwrap();

        std::fs::create_dir_all(dir.join("crates/core/src")).unwrap();
        std::fs::write(
            dir.join("crates/core/Cargo.toml"),
            "[package]\nname = \"core\"\nversion = \"1.2.3\"\n\n[dependencies]\nserde = \"1\"\n",
        )
        .unwrap();

        std::fs::create_dir_all(dir.join("crates/util/src")).unwrap();
        std::fs::write(
            dir.join("crates/util/Cargo.toml"),
            "[package]\nname = \"util\"\nversion.workspace = true\n\n[dependencies]\ncore = { path = \"../core\" }\n",
        )
        .unwrap();

        std::fs::create_dir_all(dir.join("app/src")).unwrap();
        std::fs::write(
            dir.join("app/Cargo.toml"),
            "[package]\nname = \"app\"\nversion = \"0.1.0\"\n\n[dependencies]\ncore = { path = \"../crates/core\" }\n\n[dev-dependencies]\nutil = { path = \"../crates/util\" }\n",
        )
        .unwrap();
    }

    #[test]
    fn test_discover_finds_glob_and_literal_members() {
        let dir = tempfile::tempdir().unwrap();
        write_workspace(dir.path());

        let workspace = Workspace::discover(dir.path()).unwrap();
        let names: Vec<_> = workspace.packages().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["app", "core", "util"]);
    }

    #[test]
    fn test_discover_resolves_workspace_version() {
        let dir = tempfile::tempdir().unwrap();
        write_workspace(dir.path());

        let workspace = Workspace::discover(dir.path()).unwrap();
        let util = workspace.packages().iter().find(|p| p.name == "util").unwrap();
        assert_eq!(util.version, "2.0.0");
    }

    #[test]
    fn test_discover_filters_internal_deps_to_members() {
        let dir = tempfile::tempdir().unwrap();
        write_workspace(dir.path());

        let workspace = Workspace::discover(dir.path()).unwrap();
        let core = workspace.packages().iter().find(|p| p.name == "core").unwrap();
        assert!(core.internal_deps.is_empty());

        let app = workspace.packages().iter().find(|p| p.name == "app").unwrap();
        assert_eq!(app.internal_deps, vec!["core", "util"]);
    }

    #[test]
    fn test_discover_rejects_non_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"solo\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();
        assert!(Workspace::discover(dir.path()).is_err());
    }

    #[test]
    fn test_attribute_by_longest_prefix() {
        let packages = vec![
            Package::new("core", "1.0.0", "crates/core"),
            Package::new("core-macros", "1.0.0", "crates/core/macros"),
        ];
        let commit = CommitParser::parse("fix: macro bug", "abc").unwrap();
        let commits = vec![(
            commit,
            vec![PathBuf::from("crates/core/macros/src/lib.rs")],
        )];

        let attributed = attribute_commits(&packages, &commits);
        assert!(attributed.contains_key("core-macros"));
        assert!(!attributed.contains_key("core"));
    }

    #[test]
    fn test_attribute_multi_package_commit() {
        let packages = vec![
            Package::new("core", "1.0.0", "crates/core"),
            Package::new("util", "1.0.0", "crates/util"),
        ];
        let commit = CommitParser::parse("feat: shared change", "abc").unwrap();
        let commits = vec![(
            commit,
            vec![
                PathBuf::from("crates/core/src/lib.rs"),
                PathBuf::from("crates/util/src/lib.rs"),
                PathBuf::from("README.md"),
            ],
        )];

        let attributed = attribute_commits(&packages, &commits);
        assert_eq!(attributed.len(), 2);
        assert_eq!(attributed["core"].len(), 1);
        assert_eq!(attributed["util"].len(), 1);
    }

    #[test]
    fn test_attribute_ignores_files_outside_members() {
        let packages = vec![Package::new("core", "1.0.0", "crates/core")];
        let commit = CommitParser::parse("docs: readme", "abc").unwrap();
        let commits = vec![(commit, vec![PathBuf::from("docs/guide.md")])];

        assert!(attribute_commits(&packages, &commits).is_empty());
    }
}
