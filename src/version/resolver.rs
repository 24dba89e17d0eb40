//! Best-match selection against the dependency catalog.
//!
//! Resolution is a pure fold over catalog entries; [`Resolver`] wraps it
//! with the policy layer that narrates outcomes to the build log and decides
//! whether a miss is recoverable. The same request against the same catalog
//! always produces the same answer.

use crate::buildlog::BuildLog;
use crate::component::Component;
use crate::manifest::SourceKind;
use crate::version::{Catalog, Constraint, Version};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Unable to install {}: no match found for {requested}", .component.display_name())]
    NoMatch {
        component: Component,
        requested: String,
    },
}

/// Highest catalog version satisfying `constraint`.
///
/// `None` as the constraint means "any version": the newest one wins. The
/// result is `None` when nothing in the catalog matches.
pub fn resolve(
    component: Component,
    constraint: Option<&Constraint>,
    catalog: &Catalog,
) -> Option<Version> {
    catalog
        .versions_for(component)
        .into_iter()
        .filter(|v| constraint.map_or(true, |c| c.matches(v)))
        .max()
        .cloned()
}

/// What the application manifests asked for, for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequest {
    pub component: Component,
    pub constraint: Option<Constraint>,
    /// Which manifest stated the constraint. `None` when no manifest did and
    /// the component defaults to the newest available version.
    pub source: Option<SourceKind>,
}

impl VersionRequest {
    pub fn new(component: Component, constraint: Constraint, source: SourceKind) -> Self {
        Self {
            component,
            constraint: Some(constraint),
            source: Some(source),
        }
    }

    /// Request for the newest available version of `component`.
    pub fn latest(component: Component) -> Self {
        Self {
            component,
            constraint: None,
            source: None,
        }
    }

    /// The version text for diagnostics.
    fn requested(&self) -> String {
        match &self.constraint {
            Some(constraint) => constraint.to_string(),
            None => "latest".to_string(),
        }
    }

    /// A strict request fails outright when it cannot be satisfied.
    ///
    /// `buildpack.yml` is an explicit operator decision, and an exact pin in
    /// `runtimeconfig.json` only exists when the app was published with
    /// `applyPatches: false`. Silently substituting a different version
    /// would override a choice someone made on purpose.
    fn is_strict(&self) -> bool {
        match self.source {
            Some(SourceKind::BuildpackYml) => true,
            Some(SourceKind::RuntimeConfig) => {
                matches!(self.constraint, Some(Constraint::Exact(_)))
            }
            _ => false,
        }
    }

    /// Wider constraints to retry after a recoverable miss: first the
    /// `major.minor` line, then the whole major line.
    fn fallback_constraints(&self) -> Vec<Constraint> {
        let Some(constraint) = &self.constraint else {
            return Vec::new();
        };
        let mut wider = Vec::new();
        if let Some(minor) = constraint.minor() {
            let line = Constraint::line(constraint.major(), minor);
            if line != *constraint {
                wider.push(line);
            }
        }
        let major = Constraint::Float {
            major: constraint.major(),
            minor: None,
        };
        if major != *constraint {
            wider.push(major);
        }
        wider
    }
}

/// A version the plan will install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub component: Component,
    pub version: Version,
    /// The manifest that drove the choice, when one did.
    pub source: Option<SourceKind>,
    /// Set when the requested version was unavailable and a newer version
    /// from an enclosing release line was substituted.
    pub fell_back: bool,
}

/// Resolves version requests and narrates the outcome to the build log.
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    log: &'a dyn BuildLog,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog, log: &'a dyn BuildLog) -> Self {
        Self { catalog, log }
    }

    /// Resolves one request.
    ///
    /// A miss on a flexible request retries the enclosing release lines
    /// before giving up; a miss on a strict request or a bare "latest"
    /// request is fatal immediately.
    pub fn resolve_request(&self, request: &VersionRequest) -> Result<Resolution, ResolveError> {
        if let Some(version) = resolve(request.component, request.constraint.as_ref(), self.catalog)
        {
            return Ok(self.resolved(request, version, false));
        }

        let requested = request.requested();
        if let Some(source) = request.source {
            self.log.warning(&format!(
                "{} {} in {} is not available",
                request.component.short_name(),
                requested,
                source.file_label()
            ));
        }

        if !request.is_strict() && request.constraint.is_some() {
            self.log.info("falling back to latest version in version line");
            for wider in request.fallback_constraints() {
                if let Some(version) = resolve(request.component, Some(&wider), self.catalog) {
                    tracing::debug!(
                        component = request.component.name(),
                        requested = %requested,
                        substituted = %version,
                        "requested version unavailable, widened to release line"
                    );
                    return Ok(self.resolved(request, version, true));
                }
            }
        }

        let err = ResolveError::NoMatch {
            component: request.component,
            requested,
        };
        self.log.error(&err.to_string());
        Err(err)
    }

    fn resolved(&self, request: &VersionRequest, version: Version, fell_back: bool) -> Resolution {
        self.log.info(&format!(
            "Installing {} {}",
            request.component.name(),
            version
        ));
        Resolution {
            component: request.component,
            version,
            source: request.source,
            fell_back,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildlog::MemoryLog;
    use crate::version::CatalogEntry;

    fn catalog(entries: &[(&str, &str)]) -> Catalog {
        Catalog::from_entries(
            entries
                .iter()
                .map(|(name, version)| CatalogEntry::new(name, version.parse().unwrap()))
                .collect(),
        )
    }

    fn sdk_request(constraint: &str, source: SourceKind) -> VersionRequest {
        VersionRequest::new(Component::Sdk, constraint.parse().unwrap(), source)
    }

    #[test]
    fn test_float_picks_highest_patch() {
        let catalog = catalog(&[
            ("dotnet-runtime", "2.1.0"),
            ("dotnet-runtime", "2.1.3"),
            ("dotnet-runtime", "2.1.9"),
            ("dotnet-runtime", "2.2.1"),
        ]);
        let constraint: Constraint = "2.1.x".parse().unwrap();
        assert_eq!(
            resolve(Component::Runtime, Some(&constraint), &catalog),
            Some(Version::new(2, 1, 9))
        );
    }

    #[test]
    fn test_no_constraint_picks_newest() {
        let catalog = catalog(&[("libgdiplus", "6.0.1"), ("libgdiplus", "6.0.2")]);
        assert_eq!(
            resolve(Component::LibGdiPlus, None, &catalog),
            Some(Version::new(6, 0, 2))
        );
    }

    #[test]
    fn test_release_beats_preview_within_line() {
        let catalog = catalog(&[
            ("dotnet-sdk", "2.2.100-preview1-009349"),
            ("dotnet-sdk", "2.2.100"),
        ]);
        let constraint: Constraint = "2.2.x".parse().unwrap();
        assert_eq!(
            resolve(Component::Sdk, Some(&constraint), &catalog),
            Some(Version::new(2, 2, 100))
        );
    }

    #[test]
    fn test_resolve_request_logs_install_line() {
        let catalog = catalog(&[("dotnet-sdk", "2.1.505")]);
        let log = MemoryLog::new();
        let resolver = Resolver::new(&catalog, &log);

        let resolution = resolver
            .resolve_request(&sdk_request("2.1.505", SourceKind::GlobalJson))
            .unwrap();

        assert_eq!(resolution.version, Version::new(2, 1, 505));
        assert!(!resolution.fell_back);
        assert!(log.contains("Installing dotnet-sdk 2.1.505"));
    }

    #[test]
    fn test_missing_pin_falls_back_to_release_line() {
        let catalog = catalog(&[("dotnet-sdk", "2.1.301"), ("dotnet-sdk", "2.1.505")]);
        let log = MemoryLog::new();
        let resolver = Resolver::new(&catalog, &log);

        let resolution = resolver
            .resolve_request(&sdk_request("2.1.500", SourceKind::GlobalJson))
            .unwrap();

        assert_eq!(resolution.version, Version::new(2, 1, 505));
        assert!(resolution.fell_back);
        assert!(log.contains("SDK 2.1.500 in global.json is not available"));
        assert!(log.contains("falling back to latest version in version line"));
        assert!(log.contains("Installing dotnet-sdk 2.1.505"));
    }

    #[test]
    fn test_dead_line_widens_to_major() {
        let catalog = catalog(&[("dotnet-runtime", "2.2.5"), ("dotnet-runtime", "2.2.7")]);
        let log = MemoryLog::new();
        let resolver = Resolver::new(&catalog, &log);

        let request =
            VersionRequest::new(Component::Runtime, Constraint::line(2, 0), SourceKind::Project);
        let resolution = resolver.resolve_request(&request).unwrap();

        assert_eq!(resolution.version, Version::new(2, 2, 7));
        assert!(resolution.fell_back);
    }

    #[test]
    fn test_override_miss_is_fatal() {
        let catalog = catalog(&[("dotnet-sdk", "2.1.505")]);
        let log = MemoryLog::new();
        let resolver = Resolver::new(&catalog, &log);

        let err = resolver
            .resolve_request(&sdk_request("2.0.0-preview7", SourceKind::BuildpackYml))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Unable to install Dotnet SDK: no match found for 2.0.0-preview7"
        );
        assert!(log.contains("SDK 2.0.0-preview7 in buildpack.yml is not available"));
        assert!(!log.contains("falling back"));
    }

    #[test]
    fn test_pinned_runtimeconfig_miss_is_fatal() {
        let catalog = catalog(&[("dotnet-aspnetcore", "2.1.30")]);
        let log = MemoryLog::new();
        let resolver = Resolver::new(&catalog, &log);

        let request = VersionRequest::new(
            Component::AspNetCore,
            "2.1.12".parse().unwrap(),
            SourceKind::RuntimeConfig,
        );
        let err = resolver.resolve_request(&request).unwrap_err();

        assert!(matches!(err, ResolveError::NoMatch { .. }));
        assert!(log.contains("AspNetCore 2.1.12 in runtimeconfig.json is not available"));
        assert!(!log.contains("falling back"));
    }

    #[test]
    fn test_floated_runtimeconfig_miss_recovers() {
        let catalog = catalog(&[("dotnet-aspnetcore", "2.2.8")]);
        let log = MemoryLog::new();
        let resolver = Resolver::new(&catalog, &log);

        let request = VersionRequest::new(
            Component::AspNetCore,
            Constraint::line(2, 1),
            SourceKind::RuntimeConfig,
        );
        let resolution = resolver.resolve_request(&request).unwrap();

        assert_eq!(resolution.version, Version::new(2, 2, 8));
        assert!(resolution.fell_back);
    }

    #[test]
    fn test_empty_catalog_is_fatal_for_latest() {
        let catalog = Catalog::new();
        let log = MemoryLog::new();
        let resolver = Resolver::new(&catalog, &log);

        let err = resolver
            .resolve_request(&VersionRequest::latest(Component::LibGdiPlus))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Unable to install libgdiplus: no match found for latest"
        );
    }
}
