//! dotstage - staging and launch tooling for .NET Core applications
//!
//! This library inspects a pushed .NET Core application, decides how it should
//! be deployed, resolves the SDK and runtime versions to install from a
//! dependency manifest, and supervises the resulting process at runtime.
//!
//! # Core Concepts
//!
//! - **Deployment Mode**: How the app arrives - as sources to build, as a
//!   framework-dependent publish, or as a self-contained publish
//! - **Version Source**: A file that pins or floats a component version
//!   (`buildpack.yml`, `*.runtimeconfig.json`, the project file, `global.json`)
//! - **Catalog**: The versions a buildpack release actually ships, loaded from
//!   its dependency manifest
//! - **Staging Plan**: The ordered install, publish, and cleanup actions plus
//!   the command that starts the app
//!
//! # Example Usage
//!
//! ```ignore
//! use dotstage::buildlog::ConsoleLog;
//! use dotstage::staging::Stager;
//! use dotstage::version::Catalog;
//! use std::path::Path;
//!
//! fn stage_app(app_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Catalog::load(Path::new("manifest.yml"))?;
//!     let log = ConsoleLog;
//!
//!     let plan = Stager::new(&catalog, &log).stage(app_dir)?;
//!
//!     println!("mode: {}", plan.mode.name());
//!     println!("start: {}", plan.launch.command_line());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`staging`]: Deployment mode detection and plan assembly
//! - [`version`]: Version model, constraints, catalog, and resolution
//! - [`manifest`]: Parsers for the files that request versions
//! - [`launch`]: Process supervision and signal relay

// Public modules
pub mod buildlog;
pub mod cli;
pub mod component;
pub mod config;
pub mod launch;
pub mod manifest;
pub mod staging;
pub mod util;
pub mod version;

// Re-export key types for convenient access
pub use buildlog::{BuildLog, ConsoleLog, MemoryLog, NoOpLog};
pub use component::Component;
pub use config::{ConfigError, StageConfig};
pub use launch::{LaunchError, LaunchedApp};
pub use manifest::{ManifestError, SourceKind};
pub use staging::{Detection, DeploymentMode, Stager, StagingError, StagingPlan};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};
pub use version::{Catalog, Constraint, Resolution, ResolveError, Version};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_dotstage() {
        assert_eq!(NAME, "dotstage");
    }
}
