//! The dependency catalog bundled with the buildpack.
//!
//! The catalog is the `dependencies` section of the buildpack manifest:
//! every version of every component this buildpack can install, with the
//! download metadata for each artifact. Resolution never consults the
//! network; a version that is not in the catalog does not exist.

use crate::component::Component;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read dependency manifest {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dependency manifest {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// One installable artifact.
///
/// `name` stays a free-form string: manifests carry entries this buildpack
/// does not manage (build tooling, sibling libraries) and those must survive
/// a load/filter/serialize round trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cf_stacks: Vec<String>,
}

impl CatalogEntry {
    pub fn new(name: &str, version: Version) -> Self {
        Self {
            name: name.to_string(),
            version,
            uri: None,
            sha256: None,
            cf_stacks: Vec::new(),
        }
    }

    pub fn with_uri(mut self, uri: &str) -> Self {
        self.uri = Some(uri.to_string());
        self
    }

    pub fn with_sha256(mut self, sha256: &str) -> Self {
        self.sha256 = Some(sha256.to_string());
        self
    }

    pub fn with_stacks(mut self, stacks: &[&str]) -> Self {
        self.cf_stacks = stacks.iter().map(|s| s.to_string()).collect();
        self
    }
}

#[derive(Debug, Deserialize)]
struct DependencyManifest {
    #[serde(default)]
    dependencies: Vec<CatalogEntry>,
}

/// All versions the buildpack can install.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Loads the `dependencies` section of a buildpack manifest.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let manifest: DependencyManifest =
            serde_yaml::from_str(&content).map_err(|source| CatalogError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::from_entries(manifest.dependencies))
    }

    pub fn push(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Keeps only entries usable on `stack`. Entries that list no stacks are
    /// stack-agnostic and survive the filter.
    pub fn supporting_stack(mut self, stack: &str) -> Self {
        self.entries
            .retain(|e| e.cf_stacks.is_empty() || e.cf_stacks.iter().any(|s| s == stack));
        self
    }

    /// Versions available for one component, oldest first.
    pub fn versions_for(&self, component: Component) -> Vec<&Version> {
        let mut versions: Vec<&Version> = self
            .entries
            .iter()
            .filter(|e| e.name == component.name())
            .map(|e| &e.version)
            .collect();
        versions.sort();
        versions
    }

    /// The entry backing one resolved component version.
    pub fn entry(&self, component: Component, version: &Version) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.name == component.name() && &e.version == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::new("dotnet-sdk", Version::new(2, 1, 505)),
            CatalogEntry::new("dotnet-sdk", Version::new(2, 1, 301)),
            CatalogEntry::new("dotnet-runtime", Version::new(2, 1, 9))
                .with_uri("https://example.org/dotnet-runtime.2.1.9.tar.xz")
                .with_sha256("0ab1")
                .with_stacks(&["cflinuxfs3"]),
            CatalogEntry::new("bower", Version::new(1, 8, 8)),
        ])
    }

    #[test]
    fn test_versions_for_sorts_ascending() {
        let catalog = sample();
        let versions = catalog.versions_for(Component::Sdk);
        assert_eq!(
            versions,
            vec![&Version::new(2, 1, 301), &Version::new(2, 1, 505)]
        );
    }

    #[test]
    fn test_versions_for_unknown_component_is_empty() {
        assert!(sample().versions_for(Component::LibGdiPlus).is_empty());
    }

    #[test]
    fn test_entry_carries_download_metadata() {
        let catalog = sample();
        let entry = catalog
            .entry(Component::Runtime, &Version::new(2, 1, 9))
            .unwrap();
        assert_eq!(
            entry.uri.as_deref(),
            Some("https://example.org/dotnet-runtime.2.1.9.tar.xz")
        );
        assert_eq!(entry.sha256.as_deref(), Some("0ab1"));
    }

    #[test]
    fn test_stack_filter_keeps_agnostic_entries() {
        let catalog = sample().supporting_stack("cflinuxfs4");
        assert!(catalog.versions_for(Component::Runtime).is_empty());
        assert_eq!(catalog.versions_for(Component::Sdk).len(), 2);
    }

    #[test]
    fn test_loads_manifest_yaml() {
        let yaml = r#"
language: dotnet-core
dependencies:
  - name: dotnet-sdk
    version: 2.1.804
    uri: https://buildpacks.example.org/dotnet-sdk.2.1.804.linux-amd64.tar.xz
    sha256: 9cbb3f8e5f91
    cf_stacks:
      - cflinuxfs3
  - name: libgdiplus
    version: 6.0.2
"#;
        let manifest: DependencyManifest = serde_yaml::from_str(yaml).unwrap();
        let catalog = Catalog::from_entries(manifest.dependencies);
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.versions_for(Component::Sdk),
            vec![&Version::new(2, 1, 804)]
        );
        assert_eq!(
            catalog.versions_for(Component::LibGdiPlus),
            vec![&Version::new(6, 0, 2)]
        );
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let err = Catalog::load(Path::new("/nonexistent/manifest.yml")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
