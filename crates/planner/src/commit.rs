//! Conventional commit parsing with revert recovery.
//!
//! Uses the `git-conventional` crate for the Conventional Commits grammar
//! and layers revert handling on top: a revert contributes no bump itself
//! but records the bump of the commit it undoes, so the reduction step in
//! [`crate::plan_bump`] can cancel the pair out.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The version component a commit (or a set of commits) requires.
///
/// Ordered by precedence so that [`BumpType::max_bump`] is a simple `max`:
/// `None < Prerelease < Patch < Minor < Major`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    /// No release-relevant change.
    #[default]
    None,
    /// Pre-release increment.
    Prerelease,
    /// Backwards-compatible fix.
    Patch,
    /// Backwards-compatible feature.
    Minor,
    /// Breaking change.
    Major,
}

impl BumpType {
    /// Returns the higher-precedence of two bumps.
    ///
    /// This is the fold operator used to reduce a package's commit list to
    /// a single decision; it is commutative, associative, and idempotent.
    #[must_use]
    pub fn max_bump(self, other: Self) -> Self {
        self.max(other)
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Prerelease => "prerelease",
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        };
        write!(f, "{s}")
    }
}

/// A parsed commit record, one per commit, immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommit {
    /// Commit hash.
    pub sha: String,
    /// The commit type (feat, fix, revert, ...).
    pub commit_type: String,
    /// Optional scope.
    pub scope: Option<String>,
    /// The commit description (for reverts, the reverted subject).
    pub description: String,
    /// Whether this is a breaking change.
    pub breaking: bool,
    /// The bump this commit contributes on its own.
    pub bump: BumpType,
    /// The full raw message.
    pub raw: String,
    /// Whether this commit reverts another commit.
    pub is_revert: bool,
    /// For reverts, the bump of the commit being undone.
    pub reverted_bump: Option<BumpType>,
}

/// Parser for conventional commit messages.
pub struct CommitParser;

impl CommitParser {
    /// Parses a commit message into a typed record.
    ///
    /// Returns `None` for messages that are neither conventional commits
    /// nor recognized reverts; such commits never influence versioning.
    ///
    /// Reverts are recognized in two textual forms: git's default
    /// `Revert "<original subject>"` and the conventional `revert:
    /// <original subject>`. The nested original is parsed recursively to
    /// recover the bump being undone.
    #[must_use]
    pub fn parse(message: &str, sha: &str) -> Option<ParsedCommit> {
        let trimmed = message.trim();
        let subject = trimmed.lines().next().unwrap_or_default().trim();

        if let Some(original) = revert_subject(subject) {
            let reverted_bump =
                Self::parse(original, sha).map_or(BumpType::None, |commit| commit.bump);
            return Some(ParsedCommit {
                sha: sha.to_string(),
                commit_type: "revert".to_string(),
                scope: None,
                description: original.to_string(),
                breaking: false,
                bump: BumpType::None,
                raw: message.to_string(),
                is_revert: true,
                reverted_bump: Some(reverted_bump),
            });
        }

        let parsed = git_conventional::Commit::parse(trimmed).ok()?;
        let commit_type = parsed.type_().to_string();
        let breaking = parsed.breaking();
        let bump = if breaking {
            BumpType::Major
        } else {
            match commit_type.as_str() {
                "feat" => BumpType::Minor,
                "fix" | "perf" => BumpType::Patch,
                _ => BumpType::None,
            }
        };

        Some(ParsedCommit {
            sha: sha.to_string(),
            commit_type,
            scope: parsed.scope().map(|s| s.to_string()),
            description: parsed.description().to_string(),
            breaking,
            bump,
            raw: message.to_string(),
            is_revert: false,
            reverted_bump: None,
        })
    }
}

/// Extracts the reverted subject from a revert commit subject line.
fn revert_subject(subject: &str) -> Option<&str> {
    if let Some(rest) = subject.strip_prefix("Revert \"") {
        return rest.strip_suffix('"');
    }
    subject.strip_prefix("revert:").map(str::trim)
}
