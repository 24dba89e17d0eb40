//! Published `*.runtimeconfig.json` framework references.

use super::{strip_json_comments, ManifestError, SourceKind, VersionSource};
use crate::component::Component;
use crate::version::{Constraint, Version};
use serde::Deserialize;

const NETCORE_APP: &str = "Microsoft.NETCore.App";
const ASPNETCORE_APP: &str = "Microsoft.AspNetCore.App";
const ASPNETCORE_ALL: &str = "Microsoft.AspNetCore.All";

/// The shared-framework references of a published application.
///
/// `dotnet publish` writes the version the app was built against, not the
/// version it must run on: patch roll-forward is the platform default. An
/// app published with `applyPatches: false` opted out of that, so its
/// version becomes an exact pin.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    file_name: String,
    frameworks: Vec<FrameworkReference>,
    apply_patches: bool,
}

/// One `framework` entry from `runtimeOptions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkReference {
    pub name: String,
    pub version: Option<Version>,
}

#[derive(Debug, Deserialize)]
struct RawRuntimeConfig {
    #[serde(rename = "runtimeOptions")]
    runtime_options: Option<RawRuntimeOptions>,
}

#[derive(Debug, Deserialize)]
struct RawRuntimeOptions {
    framework: Option<RawFramework>,
    #[serde(default)]
    frameworks: Vec<RawFramework>,
    #[serde(rename = "applyPatches")]
    apply_patches: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawFramework {
    name: Option<String>,
    version: Option<String>,
}

impl RuntimeConfig {
    /// Suffix a published app's config file carries; the stem in front of it
    /// is the entry assembly name.
    pub const SUFFIX: &'static str = ".runtimeconfig.json";

    pub fn parse(file_name: &str, content: &str) -> Result<Self, ManifestError> {
        let cleaned = strip_json_comments(content);
        let raw: RawRuntimeConfig =
            serde_json::from_str(&cleaned).map_err(|e| ManifestError::Invalid {
                file: file_name.to_string(),
                reason: e.to_string(),
            })?;

        let mut frameworks = Vec::new();
        let mut apply_patches = true;
        if let Some(options) = raw.runtime_options {
            apply_patches = options.apply_patches.unwrap_or(true);
            // .NET Core 3.0 moved to a `frameworks` list; earlier releases
            // wrote a single `framework` object.
            let raw_frameworks = options.framework.into_iter().chain(options.frameworks);
            for framework in raw_frameworks {
                let Some(name) = framework.name else {
                    continue;
                };
                let version = match framework.version.as_deref() {
                    Some(text) => Some(text.parse::<Version>().map_err(|e| {
                        ManifestError::Invalid {
                            file: file_name.to_string(),
                            reason: e.to_string(),
                        }
                    })?),
                    None => None,
                };
                frameworks.push(FrameworkReference { name, version });
            }
        }

        Ok(RuntimeConfig {
            file_name: file_name.to_string(),
            frameworks,
            apply_patches,
        })
    }

    /// The entry assembly a config file is named after
    /// ("my.app.runtimeconfig.json" names "my.app").
    pub fn entry_assembly(file_name: &str) -> Option<&str> {
        file_name
            .strip_suffix(Self::SUFFIX)
            .filter(|stem| !stem.is_empty())
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Whether the app depends on any shared framework. A published app
    /// without one carries its runtime with it.
    pub fn has_framework(&self) -> bool {
        !self.frameworks.is_empty()
    }

    pub fn frameworks(&self) -> &[FrameworkReference] {
        &self.frameworks
    }

    fn find(&self, names: &[&str]) -> Option<&FrameworkReference> {
        self.frameworks
            .iter()
            .find(|f| names.iter().any(|n| *n == f.name))
    }

    fn shaped(&self, version: &Version) -> Constraint {
        if self.apply_patches {
            Constraint::line(version.major, version.minor)
        } else {
            Constraint::Exact(version.clone())
        }
    }
}

impl VersionSource for RuntimeConfig {
    fn kind(&self) -> SourceKind {
        SourceKind::RuntimeConfig
    }

    fn constraint(&self, component: Component) -> Option<Constraint> {
        let aspnet = self.find(&[ASPNETCORE_APP, ASPNETCORE_ALL]);
        match component {
            Component::AspNetCore => {
                let version = aspnet?.version.as_ref()?;
                Some(self.shaped(version))
            }
            Component::Runtime => {
                if let Some(netcore) = self.find(&[NETCORE_APP]) {
                    let version = netcore.version.as_ref()?;
                    return Some(self.shaped(version));
                }
                // An ASP.NET Core reference implies the base runtime of the
                // same line; the pin, if any, belongs to aspnetcore alone.
                let version = aspnet?.version.as_ref()?;
                Some(Constraint::line(version.major, version.minor))
            }
            _ => None,
        }
    }
}
