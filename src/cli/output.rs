//! Output formatting for multiple formats
//!
//! This module provides formatters for different output formats including JSON, YAML,
//! and human-readable text. Each formatter implements consistent styling and structure.
//!
//! # Example
//!
//! ```ignore
//! use dotstage::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_plan(&plan)?;
//! println!("{}", output);
//! ```

use anyhow::{Context, Result};
use std::path::Path;

use crate::staging::{Detection, PlanAction, StagingPlan};
use crate::version::Resolution;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Output formatter for staging results
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Creates a new output formatter with the specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a staging plan according to the configured format
    pub fn format_plan(&self, plan: &StagingPlan) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_plan_json(plan),
            OutputFormat::Yaml => self.format_plan_yaml(plan),
            OutputFormat::Human => self.format_plan_human(plan),
        }
    }

    /// Formats a deployment mode detection
    pub fn format_detection(&self, detection: &Detection, app_dir: &Path) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_detection_json(detection, app_dir),
            OutputFormat::Yaml => self.format_detection_yaml(detection, app_dir),
            OutputFormat::Human => self.format_detection_human(detection, app_dir),
        }
    }

    /// Formats a single version resolution
    pub fn format_resolution(&self, resolution: &Resolution) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_resolution_json(resolution),
            OutputFormat::Yaml => self.format_resolution_yaml(resolution),
            OutputFormat::Human => self.format_resolution_human(resolution),
        }
    }

    // JSON formatting methods

    fn format_plan_json(&self, plan: &StagingPlan) -> Result<String> {
        serde_json::to_string_pretty(plan).context("Failed to serialize staging plan to JSON")
    }

    fn format_detection_json(&self, detection: &Detection, app_dir: &Path) -> Result<String> {
        let output = detection_value(detection, app_dir);
        serde_json::to_string_pretty(&output).context("Failed to serialize detection to JSON")
    }

    fn format_resolution_json(&self, resolution: &Resolution) -> Result<String> {
        let output = resolution_value(resolution);
        serde_json::to_string_pretty(&output).context("Failed to serialize resolution to JSON")
    }

    // YAML formatting methods

    fn format_plan_yaml(&self, plan: &StagingPlan) -> Result<String> {
        serde_yaml::to_string(plan).context("Failed to serialize staging plan to YAML")
    }

    fn format_detection_yaml(&self, detection: &Detection, app_dir: &Path) -> Result<String> {
        let output = detection_value(detection, app_dir);
        serde_yaml::to_string(&output).context("Failed to serialize detection to YAML")
    }

    fn format_resolution_yaml(&self, resolution: &Resolution) -> Result<String> {
        let output = resolution_value(resolution);
        serde_yaml::to_string(&output).context("Failed to serialize resolution to YAML")
    }

    // Human-readable formatting methods

    fn format_plan_human(&self, plan: &StagingPlan) -> Result<String> {
        let mut output = String::new();

        output.push_str("\u{2713} Staging Plan\n");
        output.push_str(&"\u{2501}".repeat(42));
        output.push_str("\n\n");

        output.push_str(&format!("Deployment Mode:  {}\n\n", plan.mode.name()));

        output.push_str("Versions:\n");
        if plan.versions.is_empty() {
            output.push_str("\u{2514}\u{2500} (nothing to install)\n");
        } else {
            for (i, (component, version)) in plan.versions.iter().enumerate() {
                let is_last = i == plan.versions.len() - 1;
                let connector = if is_last { "\u{2514}" } else { "\u{251C}" };
                output.push_str(&format!(
                    "{}\u{2500} {:<20} {}\n",
                    connector,
                    component.name(),
                    version
                ));
            }
        }
        output.push('\n');

        output.push_str("Actions:\n");
        for (i, action) in plan.actions.iter().enumerate() {
            let is_last = i == plan.actions.len() - 1;
            let connector = if is_last { "\u{2514}" } else { "\u{251C}" };
            let line = match action {
                PlanAction::Install {
                    component, version, ..
                } => format!("install {} {}", component.name(), version),
                PlanAction::Publish { self_contained } => {
                    if *self_contained {
                        "publish (self-contained)".to_string()
                    } else {
                        "publish".to_string()
                    }
                }
                PlanAction::Remove { component } => format!("remove {}", component.name()),
            };
            output.push_str(&format!("{}\u{2500} {}\n", connector, line));
        }
        output.push('\n');

        output.push_str(&format!("Launch: {}\n", plan.launch.command_line()));

        Ok(output)
    }

    fn format_detection_human(&self, detection: &Detection, app_dir: &Path) -> Result<String> {
        let mut output = String::new();

        output.push_str("\u{2713} Deployment Mode\n");
        output.push_str(&"\u{2501}".repeat(42));
        output.push_str("\n\n");

        output.push_str(&format!("Application:  {}\n", app_dir.display()));
        output.push_str(&format!("Mode:         {}\n", detection.mode.name()));

        if let Some(ref project) = detection.project {
            output.push_str(&format!("Project:      {}\n", project.file_name()));
        }
        if let Some(ref config) = detection.runtime_config {
            output.push_str(&format!("Config:       {}\n", config.file_name()));
        }

        Ok(output)
    }

    fn format_resolution_human(&self, resolution: &Resolution) -> Result<String> {
        let mut output = String::new();
        output.push_str(&format!(
            "\u{2713} {} {}\n",
            resolution.component.name(),
            resolution.version
        ));
        if resolution.fell_back {
            output.push_str("  (substituted from a newer release line)\n");
        }
        Ok(output)
    }
}

fn detection_value(detection: &Detection, app_dir: &Path) -> serde_json::Value {
    serde_json::json!({
        "app_dir": app_dir,
        "mode": detection.mode,
        "project": detection.project.as_ref().map(|p| p.file_name()),
        "runtime_config": detection.runtime_config.as_ref().map(|r| r.file_name()),
    })
}

fn resolution_value(resolution: &Resolution) -> serde_json::Value {
    serde_json::json!({
        "component": resolution.component.name(),
        "version": resolution.version,
        "fell_back": resolution.fell_back,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::staging::{DeploymentMode, LaunchSpec};
    use crate::version::Version;
    use std::collections::BTreeMap;

    fn create_test_plan() -> StagingPlan {
        let mut versions = BTreeMap::new();
        versions.insert(Component::Sdk, Version::new(2, 1, 505));
        versions.insert(Component::Runtime, Version::new(2, 1, 9));

        StagingPlan {
            mode: DeploymentMode::SourceBuild {
                self_contained_publish: false,
            },
            versions,
            actions: vec![
                PlanAction::Install {
                    component: Component::Sdk,
                    version: Version::new(2, 1, 505),
                    uri: None,
                    sha256: None,
                },
                PlanAction::Install {
                    component: Component::Runtime,
                    version: Version::new(2, 1, 9),
                    uri: None,
                    sha256: None,
                },
                PlanAction::Publish {
                    self_contained: false,
                },
            ],
            launch: LaunchSpec::managed("exampleapp"),
        }
    }

    #[test]
    fn test_json_format() {
        let plan = create_test_plan();
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_plan(&plan).unwrap();

        assert!(output.contains("dotnet-sdk"));
        assert!(output.contains("2.1.505"));
        assert!(output.contains("source_build"));

        // Verify it's valid JSON
        let _parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    }

    #[test]
    fn test_yaml_format() {
        let plan = create_test_plan();
        let formatter = OutputFormatter::new(OutputFormat::Yaml);
        let output = formatter.format_plan(&plan).unwrap();

        assert!(output.contains("dotnet-sdk"));
        assert!(output.contains("2.1.505"));

        // Verify it's valid YAML
        let _parsed: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
    }

    #[test]
    fn test_human_format() {
        let plan = create_test_plan();
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_plan(&plan).unwrap();

        assert!(output.contains("Staging Plan"));
        assert!(output.contains("Deployment Mode:  source"));
        assert!(output.contains("dotnet-sdk"));
        assert!(output.contains("2.1.505"));
        assert!(output.contains("publish"));
        assert!(output.contains("Launch: dotnet exampleapp.dll"));
    }

    #[test]
    fn test_human_format_marks_last_entry() {
        let plan = create_test_plan();
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_plan(&plan).unwrap();

        // Two versions: first gets a tee, last gets an elbow
        assert!(output.contains("\u{251C}\u{2500} dotnet-sdk"));
        assert!(output.contains("\u{2514}\u{2500} dotnet-runtime"));
    }

    #[test]
    fn test_resolution_human_format() {
        let resolution = Resolution {
            component: Component::Sdk,
            version: Version::new(2, 1, 505),
            source: None,
            fell_back: false,
        };

        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_resolution(&resolution).unwrap();

        assert!(output.contains("dotnet-sdk 2.1.505"));
        assert!(!output.contains("substituted"));
    }

    #[test]
    fn test_resolution_json_format() {
        let resolution = Resolution {
            component: Component::Runtime,
            version: Version::new(2, 1, 13),
            source: None,
            fell_back: true,
        };

        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_resolution(&resolution).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["component"], "dotnet-runtime");
        assert_eq!(parsed["version"], "2.1.13");
        assert_eq!(parsed["fell_back"], true);
    }
}
