//! `buildpack.yml` operator overrides.

use super::{ManifestError, SourceKind, VersionSource};
use crate::component::Component;
use crate::version::Constraint;
use serde::Deserialize;

/// The `dotnet-core` section of `buildpack.yml`.
///
/// Anything written here is an explicit operator decision: it outranks every
/// other manifest, and a version that cannot be satisfied fails staging
/// instead of falling back.
#[derive(Debug, Clone, Default)]
pub struct BuildpackYml {
    sdk: Option<Constraint>,
}

#[derive(Debug, Deserialize)]
struct RawBuildpackYml {
    #[serde(rename = "dotnet-core")]
    dotnet_core: Option<RawDotnetSection>,
}

#[derive(Debug, Deserialize)]
struct RawDotnetSection {
    sdk: Option<serde_yaml::Value>,
}

impl BuildpackYml {
    pub const FILE_NAME: &'static str = "buildpack.yml";

    /// Parses `content`. Returns `Ok(None)` when the file has no
    /// `dotnet-core` section, which is common: other buildpacks in a
    /// multi-buildpack push share the same file.
    pub fn parse(content: &str) -> Result<Option<Self>, ManifestError> {
        if content.trim().is_empty() {
            return Ok(None);
        }

        let raw: RawBuildpackYml =
            serde_yaml::from_str(content).map_err(|e| ManifestError::Invalid {
                file: Self::FILE_NAME.to_string(),
                reason: e.to_string(),
            })?;
        let Some(section) = raw.dotnet_core else {
            return Ok(None);
        };

        let sdk = match section.sdk.as_ref().and_then(scalar_to_string) {
            Some(value) => Some(value.parse::<Constraint>().map_err(|_| {
                ManifestError::Constraint {
                    value,
                    file: Self::FILE_NAME.to_string(),
                }
            })?),
            None => None,
        };

        Ok(Some(BuildpackYml { sdk }))
    }
}

impl VersionSource for BuildpackYml {
    fn kind(&self) -> SourceKind {
        SourceKind::BuildpackYml
    }

    fn constraint(&self, component: Component) -> Option<Constraint> {
        match component {
            Component::Sdk => self.sdk.clone(),
            _ => None,
        }
    }
}

/// YAML leaves `2.2.x` as a string but turns a bare `2.2` into a number;
/// both spellings reach the constraint parser as text.
fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
