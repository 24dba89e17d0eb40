//! Application tree scan.
//!
//! The tree is walked once, up front, into an immutable snapshot. Everything
//! downstream (mode detection, manifest loading, the native dependency scan)
//! asks the snapshot instead of touching the filesystem again, so one
//! staging run reasons about one consistent view of the app.

use super::StagingError;
use crate::manifest::project::PROJECT_EXTENSIONS;
use crate::manifest::ManifestError;
use ignore::{overrides::OverrideBuilder, WalkBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub max_depth: usize,
    pub max_files: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            max_files: 50_000,
        }
    }
}

/// Snapshot of the files in an application directory.
#[derive(Debug, Clone)]
pub struct AppTree {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl AppTree {
    pub fn scan(root: &Path) -> Result<Self, StagingError> {
        Self::scan_with(root, &ScanConfig::default())
    }

    pub fn scan_with(root: &Path, config: &ScanConfig) -> Result<Self, StagingError> {
        let root = root
            .canonicalize()
            .map_err(|source| StagingError::Scan {
                path: root.display().to_string(),
                source,
            })?;

        let mut override_builder = OverrideBuilder::new(&root);
        override_builder.add("!.git/").ok();
        let overrides = override_builder
            .build()
            .unwrap_or_else(|_| OverrideBuilder::new(&root).build().expect("empty overrides"));

        let mut files = Vec::new();
        // Ignore rules do not apply here: staging must see exactly the files
        // the app was pushed with, whether or not they are gitignored.
        for result in WalkBuilder::new(&root)
            .max_depth(Some(config.max_depth))
            .hidden(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .overrides(overrides)
            .build()
        {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "failed to read directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if files.len() >= config.max_files {
                return Err(StagingError::TreeTooLarge {
                    limit: config.max_files,
                });
            }
            let rel = path.strip_prefix(&root).unwrap_or(path).to_path_buf();
            files.push(rel);
        }
        files.sort();

        debug!(root = %root.display(), files = files.len(), "scanned application tree");
        Ok(AppTree { root, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Whether a file with this exact relative path exists. Bare names test
    /// the tree root, where the buildpack-facing manifests live.
    pub fn contains(&self, rel: &str) -> bool {
        self.files.iter().any(|p| p == Path::new(rel))
    }

    /// Root-level files whose name ends with `suffix`, sorted.
    pub fn root_files_with_suffix(&self, suffix: &str) -> Vec<&Path> {
        self.files
            .iter()
            .filter(|p| p.parent() == Some(Path::new("")))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(suffix) && n.len() > suffix.len())
            })
            .map(PathBuf::as_path)
            .collect()
    }

    /// Project files anywhere in the tree, shallowest first. Build output
    /// under `bin/` or `obj/` is not a project of this app.
    pub fn project_files(&self) -> Vec<&Path> {
        let mut projects: Vec<&Path> = self
            .files
            .iter()
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| PROJECT_EXTENSIONS.contains(&e))
            })
            .filter(|p| {
                !p.components()
                    .any(|c| c.as_os_str() == "bin" || c.as_os_str() == "obj")
            })
            .map(PathBuf::as_path)
            .collect();
        projects.sort_by_key(|p| (p.components().count(), p.to_path_buf()));
        projects
    }

    /// Reads one file from the snapshot's root.
    pub fn read_to_string(&self, rel: &Path) -> Result<String, ManifestError> {
        let path = self.root.join(rel);
        fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.display().to_string(),
            source,
        })
    }
}
