//! Deployment mode detection.
//!
//! The shape of the pushed tree decides everything downstream: which
//! manifests are consulted, whether an SDK is staged, and how the app is
//! started. Three shapes exist, and a tree that matches two of them at once
//! is a configuration error, never a guess.

use super::scan::AppTree;
use super::StagingError;
use crate::manifest::{ProjectFile, RuntimeConfig};
use serde::Serialize;
use tracing::{debug, warn};

/// How the application was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    /// Project sources; the buildpack builds and publishes the app itself.
    SourceBuild {
        /// Whether the project publishes self-contained (a runtime
        /// identifier is set), which changes what survives the build.
        self_contained_publish: bool,
    },
    /// Published framework-dependent output; shared frameworks are staged.
    FrameworkDependent,
    /// Published self-contained output; the app carries its own runtime.
    SelfContained,
}

impl DeploymentMode {
    pub fn name(&self) -> &'static str {
        match self {
            DeploymentMode::SourceBuild { .. } => "source",
            DeploymentMode::FrameworkDependent => "framework-dependent",
            DeploymentMode::SelfContained => "self-contained",
        }
    }

    /// Whether staging needs an SDK at all.
    pub fn installs_sdk(&self) -> bool {
        matches!(self, DeploymentMode::SourceBuild { .. })
    }

    pub fn is_published(&self) -> bool {
        !matches!(self, DeploymentMode::SourceBuild { .. })
    }
}

/// The detected mode plus the manifests that proved it, already parsed so
/// later stages do not read them again.
#[derive(Debug, Clone)]
pub struct Detection {
    pub mode: DeploymentMode,
    /// Main project file, for source builds.
    pub project: Option<ProjectFile>,
    /// Root runtime config, for published apps.
    pub runtime_config: Option<RuntimeConfig>,
}

/// Classifies the tree by its signature files.
///
/// A project file anywhere outside build output means sources; a
/// `*.runtimeconfig.json` at the tree root means published output. Both at
/// once is ambiguous and fails rather than guessing, since the two modes
/// stage different dependencies.
pub fn detect(tree: &AppTree) -> Result<Detection, StagingError> {
    let projects = tree.project_files();
    let configs = tree.root_files_with_suffix(RuntimeConfig::SUFFIX);

    match (projects.first(), configs.first()) {
        (Some(project), Some(config)) => Err(StagingError::AmbiguousMode {
            project: project.display().to_string(),
            runtime_config: config.display().to_string(),
        }),
        (Some(project), None) => {
            let content = tree.read_to_string(project)?;
            let file_name = project
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("project file");
            let parsed = ProjectFile::parse(file_name, &content)?;
            for warning in parsed.warnings() {
                warn!("{}", warning);
            }
            let mode = DeploymentMode::SourceBuild {
                self_contained_publish: parsed.is_self_contained(),
            };
            debug!(project = %project.display(), mode = mode.name(), "detected mode from project file");
            Ok(Detection {
                mode,
                project: Some(parsed),
                runtime_config: None,
            })
        }
        (None, Some(config)) => {
            let content = tree.read_to_string(config)?;
            let file_name = config
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("runtimeconfig.json");
            let parsed = RuntimeConfig::parse(file_name, &content)?;
            let mode = if parsed.has_framework() {
                DeploymentMode::FrameworkDependent
            } else {
                DeploymentMode::SelfContained
            };
            debug!(config = %config.display(), mode = mode.name(), "detected mode from runtime config");
            Ok(Detection {
                mode,
                project: None,
                runtime_config: Some(parsed),
            })
        }
        (None, None) => Err(StagingError::NotDetected(tree.root().to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    const FDD_CONFIG: &str = r#"{"runtimeOptions": {"framework": {"name": "Microsoft.NETCore.App", "version": "2.1.1"}}}"#;

    #[test]
    fn test_project_file_means_source_build() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "app.csproj",
            "<Project Sdk=\"Microsoft.NET.Sdk\"><PropertyGroup><TargetFramework>netcoreapp2.1</TargetFramework></PropertyGroup></Project>",
        );

        let tree = AppTree::scan(dir.path()).unwrap();
        let detection = detect(&tree).unwrap();
        assert_eq!(
            detection.mode,
            DeploymentMode::SourceBuild {
                self_contained_publish: false
            }
        );
        assert!(detection.project.is_some());
        assert!(detection.mode.installs_sdk());
    }

    #[test]
    fn test_runtime_identifier_marks_self_contained_publish() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "app.csproj",
            "<Project Sdk=\"Microsoft.NET.Sdk\"><PropertyGroup><TargetFramework>netcoreapp2.2</TargetFramework><RuntimeIdentifier>linux-x64</RuntimeIdentifier></PropertyGroup></Project>",
        );

        let tree = AppTree::scan(dir.path()).unwrap();
        let detection = detect(&tree).unwrap();
        assert_eq!(
            detection.mode,
            DeploymentMode::SourceBuild {
                self_contained_publish: true
            }
        );
    }

    #[test]
    fn test_root_runtime_config_with_framework_is_fdd() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "app.runtimeconfig.json", FDD_CONFIG);
        write_file(dir.path(), "app.dll", "");

        let tree = AppTree::scan(dir.path()).unwrap();
        let detection = detect(&tree).unwrap();
        assert_eq!(detection.mode, DeploymentMode::FrameworkDependent);
        assert!(detection.runtime_config.is_some());
        assert!(!detection.mode.installs_sdk());
    }

    #[test]
    fn test_frameworkless_runtime_config_is_self_contained() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "app.runtimeconfig.json",
            r#"{"runtimeOptions": {"configProperties": {}}}"#,
        );

        let tree = AppTree::scan(dir.path()).unwrap();
        let detection = detect(&tree).unwrap();
        assert_eq!(detection.mode, DeploymentMode::SelfContained);
    }

    #[test]
    fn test_nested_runtime_config_does_not_shadow_sources() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "app.csproj",
            "<Project Sdk=\"Microsoft.NET.Sdk\"><PropertyGroup><TargetFramework>netcoreapp2.1</TargetFramework></PropertyGroup></Project>",
        );
        write_file(
            dir.path(),
            "bin/Release/netcoreapp2.1/publish/app.runtimeconfig.json",
            FDD_CONFIG,
        );

        let tree = AppTree::scan(dir.path()).unwrap();
        let detection = detect(&tree).unwrap();
        assert!(matches!(
            detection.mode,
            DeploymentMode::SourceBuild { .. }
        ));
    }

    #[test]
    fn test_project_and_root_config_is_ambiguous() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "app.csproj",
            "<Project Sdk=\"Microsoft.NET.Sdk\"/>",
        );
        write_file(dir.path(), "app.runtimeconfig.json", FDD_CONFIG);

        let tree = AppTree::scan(dir.path()).unwrap();
        let err = detect(&tree).unwrap_err();
        assert!(matches!(err, StagingError::AmbiguousMode { .. }));
        assert!(err.to_string().contains("app.csproj"));
        assert!(err.to_string().contains("app.runtimeconfig.json"));
    }

    #[test]
    fn test_empty_tree_is_not_a_dotnet_app() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "index.html", "<html/>");

        let tree = AppTree::scan(dir.path()).unwrap();
        let err = detect(&tree).unwrap_err();
        assert!(matches!(err, StagingError::NotDetected(_)));
    }
}
