//! Dependency version handling.
//!
//! .NET dependency versions are `major.minor.patch` triples with an optional
//! pre-release tag ("3.0.100-preview6-012264"). Ordering follows semver: the
//! triple compares numerically and a tagged version sorts below the untagged
//! release of the same triple, so "newest matching" never silently prefers a
//! preview over a release.

pub mod catalog;
pub mod constraint;
pub mod resolver;

pub use catalog::{Catalog, CatalogEntry, CatalogError};
pub use constraint::{Constraint, ConstraintError};
pub use resolver::{resolve, Resolution, ResolveError, Resolver, VersionRequest};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("invalid version '{0}': expected major.minor.patch with an optional pre-release tag")]
    Malformed(String),
}

/// A concrete dependency version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release tag without the leading dash, when present.
    pub pre: Option<String>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    pub fn with_pre(major: u64, minor: u64, patch: u64, pre: &str) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Some(pre.to_string()),
        }
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    /// The `major.minor` release line this version belongs to.
    pub fn line(&self) -> (u64, u64) {
        (self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let malformed = || VersionError::Malformed(s.to_string());

        let (triple, pre) = match s.split_once('-') {
            Some((head, tag)) if !tag.is_empty() => (head, Some(tag.to_string())),
            Some(_) => return Err(malformed()),
            None => (s, None),
        };

        let mut parts = triple.split('.');
        let mut next_number = || -> Result<u64, VersionError> {
            parts
                .next()
                .and_then(|p| p.parse::<u64>().ok())
                .ok_or_else(malformed)
        };

        let major = next_number()?;
        let minor = next_number()?;
        let patch = next_number()?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(Version {
            major,
            minor,
            patch,
            pre,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_pre(a, b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Semver pre-release comparison: dot-separated identifiers, numeric ones
/// compare as numbers and sort below alphanumeric ones.
fn compare_pre(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(ln), Ok(rn)) => ln.cmp(&rn),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_release_versions() {
        let v: Version = "2.1.605".parse().unwrap();
        assert_eq!(v, Version::new(2, 1, 605));
        assert_eq!(v.line(), (2, 1));
        assert!(!v.is_prerelease());
    }

    #[test]
    fn test_parses_prerelease_versions() {
        let v: Version = "3.0.100-preview6-012264".parse().unwrap();
        assert_eq!(v, Version::with_pre(3, 0, 100, "preview6-012264"));
        assert!(v.is_prerelease());
    }

    #[test]
    fn test_rejects_malformed_versions() {
        for bad in ["", "2", "2.1", "2.1.x", "2.1.3.4", "2.one.3", "2.1.3-"] {
            assert!(bad.parse::<Version>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_display_round_trips() {
        for s in ["2.1.605", "3.0.100-preview6-012264"] {
            assert_eq!(s.parse::<Version>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_ordering_by_triple() {
        let a: Version = "2.1.9".parse().unwrap();
        let b: Version = "2.1.14".parse().unwrap();
        let c: Version = "2.2.0".parse().unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_release_sorts_above_prerelease() {
        let release = Version::new(2, 1, 0);
        let preview = Version::with_pre(2, 1, 0, "preview2-25407-01");
        assert!(preview < release);
    }

    #[test]
    fn test_prerelease_tags_compare_numerically_aware() {
        let six = Version::with_pre(3, 0, 100, "preview6");
        let seven = Version::with_pre(3, 0, 100, "preview7");
        assert!(six < seven);

        let two = Version::with_pre(1, 0, 0, "rc.2");
        let ten = Version::with_pre(1, 0, 0, "rc.10");
        assert!(two < ten);
    }
}
