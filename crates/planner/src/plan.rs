//! Bump reduction and release planning.

use crate::calver::{CalverFormat, compute_calver};
use crate::commit::{BumpType, ParsedCommit};
use crate::error::Result;
use crate::manifest::{PackageVersion, ReleaseManifest};
use crate::version::Version;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use slipway_graph::DependencyGraph;
use std::collections::HashMap;
use tracing::debug;

/// How a workspace's next versions are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VersionScheme {
    /// SemVer increments driven by the bump decision.
    #[default]
    SemVer,
    /// Calendar versions driven by the release date.
    CalVer(CalverFormat),
}

/// Reduces a package's commits to a single bump decision.
///
/// Fold is `max` over each commit's own bump, after cancelling
/// revert/original pairs: a revert annihilates at most one earlier commit.
/// The original is matched by subject first; failing that, the most recent
/// not-yet-cancelled commit of equal bump strength is taken and the
/// ambiguity logged. A revert whose original is outside the commit range
/// cancels nothing.
#[must_use]
pub fn plan_bump(commits: &[ParsedCommit]) -> BumpType {
    let mut cancelled = vec![false; commits.len()];

    for i in 0..commits.len() {
        if !commits[i].is_revert {
            continue;
        }
        let target = commits[i].reverted_bump.unwrap_or(BumpType::None);
        if target == BumpType::None {
            continue;
        }

        let by_subject = (0..i).rev().find(|&j| {
            !cancelled[j]
                && !commits[j].is_revert
                && subject_of(&commits[j].raw) == commits[i].description
        });
        let by_strength = if by_subject.is_none() {
            (0..i)
                .rev()
                .find(|&j| !cancelled[j] && !commits[j].is_revert && commits[j].bump == target)
        } else {
            None
        };

        match by_subject.or(by_strength) {
            Some(j) => {
                if by_subject.is_none() {
                    debug!(
                        revert = %commits[i].sha,
                        original = %commits[j].sha,
                        "revert matched by bump strength, not subject"
                    );
                }
                cancelled[j] = true;
                cancelled[i] = true;
            }
            None => {
                debug!(
                    revert = %commits[i].sha,
                    "reverted commit is outside the release range; nothing cancelled"
                );
            }
        }
    }

    commits
        .iter()
        .zip(&cancelled)
        .filter(|&(_, &gone)| !gone)
        .map(|(commit, _)| commit.bump)
        .fold(BumpType::None, BumpType::max_bump)
}

fn subject_of(raw: &str) -> &str {
    raw.trim().lines().next().unwrap_or_default().trim()
}

/// Plans the next version for every package in the graph.
pub struct ReleasePlanner {
    scheme: VersionScheme,
    today: NaiveDate,
}

impl ReleasePlanner {
    /// Creates a planner rendering versions for today's date.
    #[must_use]
    pub fn new(scheme: VersionScheme) -> Self {
        Self {
            scheme,
            today: Utc::now().date_naive(),
        }
    }

    /// Creates a planner with an explicit date, for reproducible runs.
    #[must_use]
    pub const fn with_date(scheme: VersionScheme, today: NaiveDate) -> Self {
        Self { scheme, today }
    }

    /// Produces the release manifest for one run.
    ///
    /// Packages are visited in name order so the manifest is byte-stable
    /// for the same inputs. A package with no releasable commits is
    /// recorded as skipped and keeps its current version.
    pub fn plan(
        &self,
        graph: &DependencyGraph,
        commits_by_package: &HashMap<String, Vec<ParsedCommit>>,
        git_sha: &str,
        umbrella_tag: &str,
    ) -> Result<ReleaseManifest> {
        let mut planned = Vec::with_capacity(graph.package_count());

        for package in graph.packages() {
            let commits = commits_by_package
                .get(&package.name)
                .map_or(&[][..], Vec::as_slice);
            let bump = plan_bump(commits);
            planned.push(self.plan_package(&package.name, &package.version, commits, bump)?);
        }

        debug!(
            packages = planned.len(),
            releasing = planned.iter().filter(|p| !p.skipped).count(),
            "release plan computed"
        );

        Ok(ReleaseManifest::new(git_sha, umbrella_tag, planned))
    }

    fn plan_package(
        &self,
        name: &str,
        old_version: &str,
        commits: &[ParsedCommit],
        bump: BumpType,
    ) -> Result<PackageVersion> {
        if bump == BumpType::None {
            return Ok(PackageVersion {
                name: name.to_string(),
                old_version: old_version.to_string(),
                new_version: old_version.to_string(),
                bump,
                reason: format!("{} commit(s), no releasable changes", commits.len()),
                skipped: true,
                tag: None,
            });
        }

        let new_version = match self.scheme {
            VersionScheme::SemVer => {
                let current: Version = old_version.parse()?;
                current.bump(bump).to_string()
            }
            VersionScheme::CalVer(format) => compute_calver(format, old_version, self.today)?,
        };

        Ok(PackageVersion {
            name: name.to_string(),
            old_version: old_version.to_string(),
            new_version: new_version.clone(),
            bump,
            reason: format!("{} commit(s), max bump {bump}", commits.len()),
            skipped: false,
            tag: Some(format!("{name}-v{new_version}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitParser;
    use slipway_graph::Package;

    fn commit(message: &str, sha: &str) -> ParsedCommit {
        CommitParser::parse(message, sha).unwrap()
    }

    #[test]
    fn test_plan_bump_empty_is_none() {
        assert_eq!(plan_bump(&[]), BumpType::None);
    }

    #[test]
    fn test_plan_bump_takes_max() {
        let commits = vec![
            commit("fix: small thing", "a"),
            commit("feat: big thing", "b"),
            commit("chore: housekeeping", "c"),
        ];
        assert_eq!(plan_bump(&commits), BumpType::Minor);
    }

    #[test]
    fn test_revert_cancels_original_by_subject() {
        let commits = vec![
            commit("feat: add endpoint", "a"),
            commit("fix: typo", "b"),
            commit("Revert \"feat: add endpoint\"", "c"),
        ];
        // The feat is annihilated; the fix survives.
        assert_eq!(plan_bump(&commits), BumpType::Patch);
    }

    #[test]
    fn test_revert_without_original_cancels_nothing() {
        let commits = vec![
            commit("fix: typo", "a"),
            commit("Revert \"feat: something from last release\"", "b"),
        ];
        assert_eq!(plan_bump(&commits), BumpType::Patch);
    }

    #[test]
    fn test_revert_falls_back_to_equal_strength() {
        let commits = vec![
            commit("feat: original wording", "a"),
            commit("revert: feat: reworded subject", "b"),
        ];
        assert_eq!(plan_bump(&commits), BumpType::None);
    }

    #[test]
    fn test_revert_cancels_one_commit_only() {
        let commits = vec![
            commit("feat: first", "a"),
            commit("feat: second", "b"),
            commit("Revert \"feat: first\"", "c"),
        ];
        assert_eq!(plan_bump(&commits), BumpType::Minor);
    }

    #[test]
    fn test_revert_does_not_downgrade_stronger_commits() {
        let commits = vec![
            commit("feat!: breaking rework", "a"),
            commit("feat: smaller thing", "b"),
            commit("Revert \"feat: smaller thing\"", "c"),
        ];
        assert_eq!(plan_bump(&commits), BumpType::Major);
    }

    fn graph_of(packages: Vec<Package>) -> DependencyGraph {
        DependencyGraph::build(packages).unwrap()
    }

    fn planner() -> ReleasePlanner {
        ReleasePlanner::with_date(
            VersionScheme::SemVer,
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        )
    }

    #[test]
    fn test_plan_bumps_touched_package() {
        let graph = graph_of(vec![Package::new("core", "1.2.3", "crates/core")]);
        let mut commits = HashMap::new();
        commits.insert("core".to_string(), vec![commit("feat: new api", "a")]);

        let manifest = planner().plan(&graph, &commits, "abc123", "rel-1").unwrap();
        let core = &manifest.packages[0];
        assert_eq!(core.new_version, "1.3.0");
        assert!(!core.skipped);
        assert_eq!(core.tag.as_deref(), Some("core-v1.3.0"));
    }

    #[test]
    fn test_plan_skips_untouched_package() {
        let graph = graph_of(vec![
            Package::new("core", "1.2.3", "crates/core"),
            Package::new("util", "0.4.0", "crates/util"),
        ]);
        let mut commits = HashMap::new();
        commits.insert("core".to_string(), vec![commit("fix: bug", "a")]);

        let manifest = planner().plan(&graph, &commits, "abc123", "rel-1").unwrap();
        let util = manifest.get("util").unwrap();
        assert!(util.skipped);
        assert_eq!(util.new_version, "0.4.0");
        assert!(util.tag.is_none());
    }

    #[test]
    fn test_plan_is_deterministic() {
        let graph = graph_of(vec![
            Package::new("b", "1.0.0", "crates/b"),
            Package::new("a", "1.0.0", "crates/a"),
        ]);
        let commits = HashMap::new();

        let first = planner().plan(&graph, &commits, "abc", "rel-1").unwrap();
        let second = planner().plan(&graph, &commits, "abc", "rel-1").unwrap();
        let names: Vec<_> = first.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(first.packages, second.packages);
    }

    #[test]
    fn test_plan_calver_uses_date_not_bump() {
        let graph = graph_of(vec![Package::new("core", "2026.1.14", "crates/core")]);
        let mut commits = HashMap::new();
        commits.insert("core".to_string(), vec![commit("fix: bug", "a")]);

        let planner = ReleasePlanner::with_date(
            VersionScheme::CalVer(CalverFormat::YearMonthDay),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        );
        let manifest = planner.plan(&graph, &commits, "abc", "rel-1").unwrap();
        assert_eq!(manifest.packages[0].new_version, "2026.1.15");
    }
}
