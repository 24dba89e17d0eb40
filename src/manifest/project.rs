//! MSBuild project files (`*.csproj`, `*.fsproj`, `*.vbproj`).

use super::{ManifestError, SourceKind, VersionSource};
use crate::component::Component;
use crate::version::Constraint;
use regex::Regex;
use roxmltree::Document;

/// Project file extensions the buildpack recognizes.
pub const PROJECT_EXTENSIONS: [&str; 3] = ["csproj", "fsproj", "vbproj"];

const ASPNETCORE_PACKAGES: [&str; 2] = ["Microsoft.AspNetCore.App", "Microsoft.AspNetCore.All"];
const WEB_SDK: &str = "Microsoft.NET.Sdk.Web";

/// Version-relevant metadata from one MSBuild project file.
///
/// The parse is lenient where MSBuild is: an unparseable version value is
/// dropped with a warning instead of failing the build, since the target
/// framework still tells us which release line the app needs.
#[derive(Debug, Clone)]
pub struct ProjectFile {
    file_name: String,
    target_line: Option<(u64, u64)>,
    runtime_version: Option<Constraint>,
    aspnetcore_version: Option<Constraint>,
    assembly_name: Option<String>,
    references_aspnetcore: bool,
    self_contained: bool,
    package_refs: Vec<String>,
    warnings: Vec<String>,
}

impl ProjectFile {
    pub fn parse(file_name: &str, content: &str) -> Result<Self, ManifestError> {
        let doc = Document::parse(content).map_err(|e| ManifestError::Invalid {
            file: file_name.to_string(),
            reason: e.to_string(),
        })?;

        let mut parsed = ProjectFile {
            file_name: file_name.to_string(),
            target_line: None,
            runtime_version: None,
            aspnetcore_version: None,
            assembly_name: None,
            references_aspnetcore: false,
            self_contained: false,
            package_refs: Vec::new(),
            warnings: Vec::new(),
        };

        if doc.root_element().attribute("Sdk") == Some(WEB_SDK) {
            parsed.references_aspnetcore = true;
        }

        for node in doc.descendants() {
            if node.has_tag_name("TargetFramework") {
                if let Some(text) = node.text() {
                    parsed.set_target_framework(text.trim());
                }
            } else if node.has_tag_name("TargetFrameworks") {
                // Multi-targeted projects build for the first listed framework.
                if let Some(first) = node.text().and_then(|t| t.split(';').next()) {
                    parsed.set_target_framework(first.trim());
                }
            } else if node.has_tag_name("RuntimeFrameworkVersion") {
                if let Some(text) = node.text() {
                    parsed.runtime_version =
                        parsed.lenient_constraint(text.trim(), "RuntimeFrameworkVersion");
                }
            } else if node.has_tag_name("AssemblyName") {
                parsed.assembly_name = node.text().map(|s| s.trim().to_string());
            } else if node.has_tag_name("RuntimeIdentifier")
                || node.has_tag_name("RuntimeIdentifiers")
            {
                parsed.self_contained = true;
            } else if node.has_tag_name("PackageReference") {
                let Some(include) = node.attribute("Include") else {
                    continue;
                };
                parsed.package_refs.push(include.to_string());
                if ASPNETCORE_PACKAGES.contains(&include) {
                    parsed.references_aspnetcore = true;
                    if let Some(version) = node.attribute("Version") {
                        parsed.aspnetcore_version =
                            parsed.lenient_constraint(version.trim(), include);
                    }
                }
            }
        }

        Ok(parsed)
    }

    fn set_target_framework(&mut self, tfm: &str) {
        let pattern = Regex::new(r"^net(?:coreapp)?(\d+)\.(\d+)$").expect("valid regex");
        if let Some(captures) = pattern.captures(tfm) {
            let major = captures[1].parse().unwrap_or(0);
            let minor = captures[2].parse().unwrap_or(0);
            self.target_line = Some((major, minor));
        }
    }

    fn lenient_constraint(&mut self, value: &str, where_: &str) -> Option<Constraint> {
        match value.parse::<Constraint>() {
            Ok(constraint) => Some(constraint),
            Err(_) => {
                self.warnings.push(format!(
                    "ignoring unparseable version '{}' for {} in {}",
                    value, where_, self.file_name
                ));
                None
            }
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// `AssemblyName` when the project sets one; the built app is named
    /// after it instead of the project file.
    pub fn assembly_name(&self) -> Option<&str> {
        self.assembly_name.as_deref()
    }

    /// The `major.minor` line of the target framework, when it is a .NET
    /// Core one.
    pub fn target_line(&self) -> Option<(u64, u64)> {
        self.target_line
    }

    /// Whether the project publishes self-contained (a runtime identifier
    /// is set).
    pub fn is_self_contained(&self) -> bool {
        self.self_contained
    }

    pub fn references_package(&self, name: &str) -> bool {
        self.package_refs.iter().any(|p| p == name)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn target_float(&self) -> Option<Constraint> {
        self.target_line
            .map(|(major, minor)| Constraint::line(major, minor))
    }
}

impl VersionSource for ProjectFile {
    fn kind(&self) -> SourceKind {
        SourceKind::Project
    }

    fn constraint(&self, component: Component) -> Option<Constraint> {
        match component {
            Component::Runtime => self.runtime_version.clone().or_else(|| self.target_float()),
            Component::AspNetCore => {
                if !self.references_aspnetcore {
                    return None;
                }
                self.aspnetcore_version
                    .clone()
                    .or_else(|| self.target_float())
            }
            _ => None,
        }
    }
}
