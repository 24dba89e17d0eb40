//! Staging plan assembly.
//!
//! The plan is the buildpack's output contract: an ordered list of actions
//! an executor applies verbatim, plus the command that starts the app.
//! Everything here is deterministic; two runs over the same tree and catalog
//! serialize to identical plans.

use super::mode::{Detection, DeploymentMode};
use super::StagingError;
use crate::buildlog::BuildLog;
use crate::component::Component;
use crate::manifest::RuntimeConfig;
use crate::version::{Catalog, Resolution, Version};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything an executor needs to stage and start the app.
#[derive(Debug, Clone, Serialize)]
pub struct StagingPlan {
    pub mode: DeploymentMode,
    /// Resolved version per component, in install order.
    pub versions: BTreeMap<Component, Version>,
    pub actions: Vec<PlanAction>,
    pub launch: LaunchSpec,
}

/// One step of the staging plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanAction {
    /// Download and unpack one catalog artifact into the dependency layout.
    Install {
        component: Component,
        version: Version,
        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sha256: Option<String>,
    },
    /// Build and publish the application with the staged SDK.
    Publish { self_contained: bool },
    /// Drop a staged component from the layout if it is present.
    Remove { component: Component },
}

/// The process the platform starts after staging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchSpec {
    /// `dotnet <entry>.dll`, for framework-dependent apps.
    pub fn managed(entry_assembly: &str) -> Self {
        Self {
            program: "dotnet".to_string(),
            args: vec![format!("{}.dll", entry_assembly)],
        }
    }

    /// `./<entry>`, for self-contained apps that ship their own host.
    pub fn direct(entry_assembly: &str) -> Self {
        Self {
            program: format!("./{}", entry_assembly),
            args: Vec::new(),
        }
    }

    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Assembles the final plan from the resolved versions.
///
/// Install actions come first in component order, then the publish step for
/// source builds, then removals. The SDK is removed whenever the app ends up
/// self-contained: it was either never needed or only needed to build.
pub fn assemble(
    detection: &Detection,
    resolutions: &[Resolution],
    catalog: &Catalog,
    log: &dyn BuildLog,
) -> Result<StagingPlan, StagingError> {
    let entry = entry_assembly(detection)?;

    let mut versions = BTreeMap::new();
    for resolution in resolutions {
        versions.insert(resolution.component, resolution.version.clone());
    }

    let mut actions = Vec::new();
    for (component, version) in &versions {
        let meta = catalog.entry(*component, version);
        actions.push(PlanAction::Install {
            component: *component,
            version: version.clone(),
            uri: meta.and_then(|m| m.uri.clone()),
            sha256: meta.and_then(|m| m.sha256.clone()),
        });
    }

    match detection.mode {
        DeploymentMode::SourceBuild {
            self_contained_publish,
        } => {
            actions.push(PlanAction::Publish {
                self_contained: self_contained_publish,
            });
            if self_contained_publish {
                log.info("Removing dotnet-sdk");
                actions.push(PlanAction::Remove {
                    component: Component::Sdk,
                });
            }
        }
        DeploymentMode::SelfContained => {
            log.info("Removing dotnet-sdk");
            actions.push(PlanAction::Remove {
                component: Component::Sdk,
            });
        }
        DeploymentMode::FrameworkDependent => {}
    }

    let launch = match detection.mode {
        DeploymentMode::SourceBuild {
            self_contained_publish: true,
        }
        | DeploymentMode::SelfContained => LaunchSpec::direct(&entry),
        _ => LaunchSpec::managed(&entry),
    };

    Ok(StagingPlan {
        mode: detection.mode,
        versions,
        actions,
        launch,
    })
}

/// Name of the assembly the app starts from.
///
/// Published apps are named after their runtime config file, which keeps
/// dots in assembly names intact. Source builds use `AssemblyName` when the
/// project sets one and the project file's stem otherwise.
pub fn entry_assembly(detection: &Detection) -> Result<String, StagingError> {
    if let Some(config) = &detection.runtime_config {
        if let Some(stem) = RuntimeConfig::entry_assembly(config.file_name()) {
            return Ok(stem.to_string());
        }
    }
    if let Some(project) = &detection.project {
        if let Some(name) = project.assembly_name() {
            return Ok(name.to_string());
        }
        let stem = project
            .file_name()
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(project.file_name());
        return Ok(stem.to_string());
    }
    Err(StagingError::NoEntryAssembly)
}
