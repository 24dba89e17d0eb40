//! Environment-backed configuration.
//!
//! Buildpack scripts configure this binary through environment variables;
//! CLI flags override them per invocation.
//!
//! # Environment Variables
//!
//! - `DOTSTAGE_MANIFEST`: path to the dependency manifest - default: "manifest.yml"
//! - `DOTSTAGE_STACK`: only stage artifacts built for this stack - default: `CF_STACK`, else unfiltered
//! - `DOTSTAGE_GRACE_SECONDS`: seconds a signalled app may keep running - default: "10"
//! - `DOTSTAGE_LOG_LEVEL`: diagnostic log level - default: "info" (read at startup, not here)

use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_MANIFEST: &str = "manifest.yml";
const DEFAULT_GRACE_SECONDS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Runtime configuration for staging and launch.
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Dependency manifest listing the installable versions.
    pub manifest_path: PathBuf,

    /// Root filesystem stack to filter catalog entries by.
    pub stack: Option<String>,

    /// Grace period granted to a signalled app, in seconds.
    pub grace_seconds: u64,
}

impl Default for StageConfig {
    /// Loads configuration from environment variables with defaults.
    fn default() -> Self {
        let manifest_path = env::var("DOTSTAGE_MANIFEST")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MANIFEST));

        // The platform exports CF_STACK in every staging container; an
        // explicit DOTSTAGE_STACK wins over it.
        let stack = env::var("DOTSTAGE_STACK")
            .ok()
            .or_else(|| env::var("CF_STACK").ok())
            .filter(|s| !s.is_empty());

        let grace_seconds = env::var("DOTSTAGE_GRACE_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_GRACE_SECONDS);

        Self {
            manifest_path,
            stack,
            grace_seconds,
        }
    }
}

impl StageConfig {
    /// Checks that the values are usable before any work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grace_seconds == 0 {
            return Err(ConfigError::ValidationFailed(
                "Grace period must be at least 1 second".to_string(),
            ));
        }
        if self.grace_seconds > 600 {
            return Err(ConfigError::ValidationFailed(
                "Grace period cannot exceed 10 minutes".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = vec![
            EnvGuard::unset("DOTSTAGE_MANIFEST"),
            EnvGuard::unset("DOTSTAGE_STACK"),
            EnvGuard::unset("CF_STACK"),
            EnvGuard::unset("DOTSTAGE_GRACE_SECONDS"),
        ];

        let config = StageConfig::default();

        assert_eq!(config.manifest_path, PathBuf::from(DEFAULT_MANIFEST));
        assert_eq!(config.stack, None);
        assert_eq!(config.grace_seconds, DEFAULT_GRACE_SECONDS);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("DOTSTAGE_MANIFEST", "/buildpack/manifest.yml"),
            EnvGuard::set("DOTSTAGE_STACK", "cflinuxfs3"),
            EnvGuard::set("DOTSTAGE_GRACE_SECONDS", "30"),
        ];

        let config = StageConfig::default();

        assert_eq!(
            config.manifest_path,
            PathBuf::from("/buildpack/manifest.yml")
        );
        assert_eq!(config.stack.as_deref(), Some("cflinuxfs3"));
        assert_eq!(config.grace_seconds, 30);
    }

    #[test]
    #[serial]
    fn test_cf_stack_is_the_fallback() {
        let _guards = vec![
            EnvGuard::unset("DOTSTAGE_STACK"),
            EnvGuard::set("CF_STACK", "cflinuxfs4"),
        ];

        let config = StageConfig::default();
        assert_eq!(config.stack.as_deref(), Some("cflinuxfs4"));
    }

    #[test]
    #[serial]
    fn test_malformed_grace_falls_back_to_default() {
        let _guard = EnvGuard::set("DOTSTAGE_GRACE_SECONDS", "soon");

        let config = StageConfig::default();
        assert_eq!(config.grace_seconds, DEFAULT_GRACE_SECONDS);
    }

    #[test]
    fn test_validation_rejects_zero_grace() {
        let config = StageConfig {
            manifest_path: PathBuf::from("manifest.yml"),
            stack: None,
            grace_seconds: 0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_excessive_grace() {
        let config = StageConfig {
            manifest_path: PathBuf::from("manifest.yml"),
            stack: None,
            grace_seconds: 601,
        };
        assert!(config.validate().is_err());
    }
}
