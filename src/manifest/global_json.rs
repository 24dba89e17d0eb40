//! `global.json` SDK pinning.

use super::{strip_json_comments, ManifestError, SourceKind, VersionSource};
use crate::component::Component;
use crate::version::Constraint;
use serde::Deserialize;

/// The `sdk.version` pin from `global.json`.
///
/// This is project metadata, not an operator override: a pin that cannot be
/// parsed is dropped with a warning rather than failing the build, and a pin
/// that cannot be satisfied falls back to the release line.
#[derive(Debug, Clone, Default)]
pub struct GlobalJson {
    sdk: Option<Constraint>,
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawGlobalJson {
    sdk: Option<RawSdkSection>,
}

#[derive(Debug, Deserialize)]
struct RawSdkSection {
    version: Option<String>,
}

impl GlobalJson {
    pub const FILE_NAME: &'static str = "global.json";

    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let cleaned = strip_json_comments(content);
        let raw: RawGlobalJson =
            serde_json::from_str(&cleaned).map_err(|e| ManifestError::Invalid {
                file: Self::FILE_NAME.to_string(),
                reason: e.to_string(),
            })?;

        let mut parsed = GlobalJson::default();
        if let Some(version) = raw.sdk.and_then(|s| s.version) {
            match version.parse::<Constraint>() {
                Ok(constraint) => parsed.sdk = Some(constraint),
                Err(_) => parsed.warnings.push(format!(
                    "ignoring unparseable sdk version '{}' in {}",
                    version,
                    Self::FILE_NAME
                )),
            }
        }
        Ok(parsed)
    }

    /// Problems worth surfacing that did not stop the parse.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl VersionSource for GlobalJson {
    fn kind(&self) -> SourceKind {
        SourceKind::GlobalJson
    }

    fn constraint(&self, component: Component) -> Option<Constraint> {
        match component {
            Component::Sdk => self.sdk.clone(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    #[test]
    fn test_parses_sdk_version() {
        let parsed = GlobalJson::parse(r#"{"sdk": {"version": "2.1.500"}}"#).unwrap();
        assert_eq!(
            parsed.constraint(Component::Sdk),
            Some(Constraint::Exact(Version::new(2, 1, 500)))
        );
        assert!(parsed.warnings().is_empty());
    }

    #[test]
    fn test_tolerates_comments() {
        let content = r#"{
  // tools version
  "sdk": {"version": "2.1.505"}
}"#;
        let parsed = GlobalJson::parse(content).unwrap();
        assert!(parsed.constraint(Component::Sdk).is_some());
    }

    #[test]
    fn test_missing_sdk_section_pins_nothing() {
        let parsed = GlobalJson::parse(r#"{"projects": ["src"]}"#).unwrap();
        assert_eq!(parsed.constraint(Component::Sdk), None);
    }

    #[test]
    fn test_unparseable_version_is_dropped_with_warning() {
        let parsed = GlobalJson::parse(r#"{"sdk": {"version": "latest-and-greatest"}}"#).unwrap();
        assert_eq!(parsed.constraint(Component::Sdk), None);
        assert_eq!(parsed.warnings().len(), 1);
        assert!(parsed.warnings()[0].contains("latest-and-greatest"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = GlobalJson::parse("{not json").unwrap_err();
        assert!(matches!(err, ManifestError::Invalid { .. }));
    }
}
