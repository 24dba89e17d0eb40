//! Version constraints accepted from application manifests.

use super::{Version, VersionError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("invalid version constraint '{0}'")]
    Malformed(String),
}

/// A requested version range, as written in an application manifest.
///
/// Three shapes cover everything the .NET ecosystem writes:
///
/// * `2.1.605` pins an exact version.
/// * `2.1.x` floats to the newest patch of a release line, `2.x` to the
///   newest version of a major line. MSBuild spells the wildcard `*`, so
///   `2.1.*` is accepted as the same thing.
/// * `<2.1.607` asks for the newest version strictly below a bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Exact(Version),
    Float { major: u64, minor: Option<u64> },
    LessThan(Version),
}

impl Constraint {
    /// Floating constraint covering one `major.minor` release line.
    pub fn line(major: u64, minor: u64) -> Self {
        Constraint::Float {
            major,
            minor: Some(minor),
        }
    }

    /// Whether `version` satisfies this constraint.
    ///
    /// Floating constraints do not exclude pre-releases; ordering already
    /// ranks a release above any pre-release of the same triple, so a
    /// preview only wins when nothing else matches.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Constraint::Exact(exact) => exact == version,
            Constraint::Float { major, minor } => {
                version.major == *major && minor.map_or(true, |m| version.minor == m)
            }
            Constraint::LessThan(bound) => version < bound,
        }
    }

    /// The major line this constraint names.
    pub fn major(&self) -> u64 {
        match self {
            Constraint::Exact(v) | Constraint::LessThan(v) => v.major,
            Constraint::Float { major, .. } => *major,
        }
    }

    /// The minor line this constraint names, when it names one.
    pub fn minor(&self) -> Option<u64> {
        match self {
            Constraint::Exact(v) | Constraint::LessThan(v) => Some(v.minor),
            Constraint::Float { minor, .. } => *minor,
        }
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let malformed = || ConstraintError::Malformed(s.to_string());
        if s.is_empty() {
            return Err(malformed());
        }

        if let Some(bound) = s.strip_prefix('<') {
            let version: Version = bound.trim().parse().map_err(|_: VersionError| malformed())?;
            return Ok(Constraint::LessThan(version));
        }

        if let Some(head) = s.strip_suffix(".x").or_else(|| s.strip_suffix(".*")) {
            let parts: Vec<&str> = head.split('.').collect();
            let numbers: Vec<u64> = parts
                .iter()
                .map(|p| p.parse::<u64>())
                .collect::<Result<_, _>>()
                .map_err(|_| malformed())?;
            return match numbers.as_slice() {
                [major] => Ok(Constraint::Float {
                    major: *major,
                    minor: None,
                }),
                [major, minor] => Ok(Constraint::line(*major, *minor)),
                _ => Err(malformed()),
            };
        }

        let version: Version = s.parse().map_err(|_: VersionError| malformed())?;
        Ok(Constraint::Exact(version))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Exact(v) => v.fmt(f),
            Constraint::Float { major, minor: None } => write!(f, "{}.x", major),
            Constraint::Float {
                major,
                minor: Some(minor),
            } => write!(f, "{}.{}.x", major, minor),
            Constraint::LessThan(v) => write!(f, "<{}", v),
        }
    }
}
