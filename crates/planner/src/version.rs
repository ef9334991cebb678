//! Version parsing and bumping.
//!
//! Slipway keeps its own version type rather than using a SemVer crate:
//! CalVer-managed packages carry four-segment versions (`2026.1.15.1`)
//! and the pre-release bump below is not expressible with an off-the-shelf
//! SemVer increment.

use crate::commit::BumpType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed version: three numeric components plus an optional
/// pre-release suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
    /// Pre-release suffix, without the leading `-`.
    pub prerelease: Option<String>,
}

impl Version {
    /// Creates a release version with no pre-release suffix.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// Applies a bump, producing the next version.
    ///
    /// `Major`, `Minor`, and `Patch` reset the lower components and drop
    /// any pre-release suffix. `Prerelease` increments the trailing
    /// numeric part of an existing suffix, or starts a new `rc.1` series
    /// on the next patch version. `None` returns the version unchanged.
    #[must_use]
    pub fn bump(&self, bump: BumpType) -> Self {
        match bump {
            BumpType::Major => Self::new(self.major + 1, 0, 0),
            BumpType::Minor => Self::new(self.major, self.minor + 1, 0),
            BumpType::Patch => Self::new(self.major, self.minor, self.patch + 1),
            BumpType::Prerelease => self.bump_prerelease(),
            BumpType::None => self.clone(),
        }
    }

    fn bump_prerelease(&self) -> Self {
        match &self.prerelease {
            Some(pre) => Self {
                major: self.major,
                minor: self.minor,
                patch: self.patch,
                prerelease: Some(increment_suffix(pre)),
            },
            None => Self {
                major: self.major,
                minor: self.minor,
                patch: self.patch + 1,
                prerelease: Some("rc.1".to_string()),
            },
        }
    }

    /// Whether this is a pre-release version.
    #[must_use]
    pub const fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

/// Increments the trailing numeric segment of a pre-release suffix,
/// appending `.1` when there is none.
fn increment_suffix(pre: &str) -> String {
    match pre.rfind('.') {
        Some(dot) => {
            let (head, tail) = (&pre[..dot], &pre[dot + 1..]);
            tail.parse::<u64>()
                .map_or_else(|_| format!("{pre}.1"), |n| format!("{head}.{}", n + 1))
        }
        None => pre
            .parse::<u64>()
            .map_or_else(|_| format!("{pre}.1"), |n| (n + 1).to_string()),
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_prefix('v').unwrap_or(s);
        let (core, prerelease) = match s.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return Err(Error::invalid_version(s)),
            None => (s, None),
        };

        let mut parts = core.split('.');
        let major = parse_component(parts.next(), s)?;
        let minor = parse_component(parts.next(), s)?;
        let patch = parse_component(parts.next(), s)?;
        if parts.next().is_some() {
            return Err(Error::invalid_version(s));
        }

        Ok(Self {
            major,
            minor,
            patch,
            prerelease,
        })
    }
}

fn parse_component(part: Option<&str>, original: &str) -> Result<u64> {
    part.ok_or_else(|| Error::invalid_version(original))?
        .parse()
        .map_err(|_| Error::invalid_version(original))
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                // A pre-release sorts before its release.
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
