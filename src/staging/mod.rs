//! Staging pipeline.
//!
//! [`Stager`] wires the stages together: scan the tree once, detect the
//! deployment mode, load whichever manifests that mode consults, resolve
//! every requested component against the catalog, and assemble the plan.
//! Any fatal error aborts the whole run; there is no partially staged plan.

pub mod layout;
pub mod mode;
pub mod native_deps;
pub mod scan;

pub use layout::{LaunchSpec, PlanAction, StagingPlan};
pub use mode::{Detection, DeploymentMode};
pub use scan::{AppTree, ScanConfig};

use crate::buildlog::BuildLog;
use crate::component::Component;
use crate::manifest::{BuildpackYml, GlobalJson, ManifestError, SourceKind, SourceSet};
use crate::version::{Catalog, Resolver, ResolveError, VersionRequest};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("no .NET Core application found in {}", .0.display())]
    NotDetected(PathBuf),
    #[error("both {project} and {runtime_config} are present; push either project sources or a published app, not both")]
    AmbiguousMode {
        project: String,
        runtime_config: String,
    },
    #[error("application tree exceeds the {limit} file scan limit")]
    TreeTooLarge { limit: usize },
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine the application entry point")]
    NoEntryAssembly,
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Scans `app_dir` and classifies the deployment mode without staging
/// anything.
pub fn detect_app(app_dir: &Path) -> Result<Detection, StagingError> {
    let tree = AppTree::scan(app_dir)?;
    mode::detect(&tree)
}

/// Turns an application tree into a staging plan.
pub struct Stager<'a> {
    catalog: &'a Catalog,
    log: &'a dyn BuildLog,
    precedence: Vec<SourceKind>,
}

impl<'a> Stager<'a> {
    pub fn new(catalog: &'a Catalog, log: &'a dyn BuildLog) -> Self {
        Self {
            catalog,
            log,
            precedence: SourceKind::PRECEDENCE.to_vec(),
        }
    }

    /// Overrides the manifest precedence. The default order is the
    /// platform's documented one and right for almost everyone.
    pub fn with_precedence(mut self, precedence: &[SourceKind]) -> Self {
        self.precedence = precedence.to_vec();
        self
    }

    pub fn stage(&self, app_dir: &Path) -> Result<StagingPlan, StagingError> {
        let tree = AppTree::scan(app_dir)?;
        let detection = mode::detect(&tree)?;
        info!(mode = detection.mode.name(), "detected deployment mode");

        let sources = self.load_sources(&tree, &detection)?;
        let resolver = Resolver::new(self.catalog, self.log);

        let mut resolutions = Vec::new();
        for request in self.requests(&detection, &sources) {
            resolutions.push(resolver.resolve_request(&request)?);
        }
        for component in native_deps::advise(&tree, &detection)? {
            resolutions.push(resolver.resolve_request(&VersionRequest::latest(component))?);
        }

        layout::assemble(&detection, &resolutions, self.catalog, self.log)
    }

    /// Loads the manifests the detected mode consults, strongest first.
    ///
    /// `buildpack.yml` problems are fatal: the file exists solely to steer
    /// this buildpack, so it must parse. `global.json` is shared project
    /// metadata and a broken one is skipped with a warning.
    fn load_sources(
        &self,
        tree: &AppTree,
        detection: &Detection,
    ) -> Result<SourceSet, StagingError> {
        let mut set = SourceSet::new();
        match detection.mode {
            DeploymentMode::SourceBuild { .. } => {
                if let Some(yml) = self.load_buildpack_yml(tree)? {
                    set.push(Box::new(yml));
                }
                if let Some(project) = &detection.project {
                    set.push(Box::new(project.clone()));
                }
                if let Some(global) = self.load_global_json(tree) {
                    set.push(Box::new(global));
                }
            }
            DeploymentMode::FrameworkDependent => {
                if let Some(yml) = self.load_buildpack_yml(tree)? {
                    set.push(Box::new(yml));
                }
                if let Some(config) = &detection.runtime_config {
                    set.push(Box::new(config.clone()));
                }
            }
            DeploymentMode::SelfContained => {}
        }
        Ok(set.with_order(&self.precedence))
    }

    fn load_buildpack_yml(&self, tree: &AppTree) -> Result<Option<BuildpackYml>, StagingError> {
        if !tree.contains(BuildpackYml::FILE_NAME) {
            return Ok(None);
        }
        let content = tree.read_to_string(Path::new(BuildpackYml::FILE_NAME))?;
        Ok(BuildpackYml::parse(&content)?)
    }

    fn load_global_json(&self, tree: &AppTree) -> Option<GlobalJson> {
        if !tree.contains(GlobalJson::FILE_NAME) {
            return None;
        }
        let content = match tree.read_to_string(Path::new(GlobalJson::FILE_NAME)) {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "skipping unreadable global.json");
                return None;
            }
        };
        match GlobalJson::parse(&content) {
            Ok(parsed) => {
                for warning in parsed.warnings() {
                    warn!("{}", warning);
                }
                Some(parsed)
            }
            Err(err) => {
                warn!(error = %err, "ignoring invalid global.json");
                None
            }
        }
    }

    /// The components this mode stages. ASP.NET Core is only requested when
    /// some manifest actually asks for it; the SDK and runtime defaults are
    /// "newest available" when nothing pins them.
    fn requests(&self, detection: &Detection, sources: &SourceSet) -> Vec<VersionRequest> {
        match detection.mode {
            DeploymentMode::SourceBuild {
                self_contained_publish,
            } => {
                let mut requests = vec![sources.request(Component::Sdk)];
                if !self_contained_publish {
                    requests.push(sources.request(Component::Runtime));
                    requests.extend(sources.request_if_constrained(Component::AspNetCore));
                }
                requests
            }
            DeploymentMode::FrameworkDependent => {
                let mut requests = vec![sources.request(Component::Runtime)];
                requests.extend(sources.request_if_constrained(Component::AspNetCore));
                requests
            }
            DeploymentMode::SelfContained => Vec::new(),
        }
    }
}
