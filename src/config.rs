//! Configuration management for Tallyguard.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{Result, TallyguardError};
use crate::ratelimit::RateLimitOptions;

/// Prefix for environment overrides, e.g. `TALLYGUARD__RATE_LIMITING__LIMIT`.
const ENV_PREFIX: &str = "TALLYGUARD";

/// Main configuration for Tallyguard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TallyguardConfig {
    /// Counter store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Rate limit overrides; unset fields keep the built-in defaults
    #[serde(default)]
    pub rate_limiting: RateLimitOptions,
}

/// Counter store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL. Without one an in-process store is used.
    #[serde(default)]
    pub redis_url: Option<String>,
}

impl TallyguardConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| TallyguardError::Config(format!("Failed to parse configuration: {}", e)))
    }

    /// Load configuration from an optional YAML file, then apply
    /// `TALLYGUARD__*` environment overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration");
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Yaml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| TallyguardError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TallyguardConfig::default();
        assert!(config.store.redis_url.is_none());
        assert_eq!(config.rate_limiting, RateLimitOptions::default());
    }

    #[test]
    fn test_from_yaml_full() {
        let yaml = r#"
store:
  redis_url: "redis://127.0.0.1:6379"
rate_limiting:
  limit: 100
  window: 3600
"#;
        let config = TallyguardConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.store.redis_url.as_deref(), Some("redis://127.0.0.1:6379"));
        assert_eq!(config.rate_limiting.limit, Some(100));
        assert_eq!(config.rate_limiting.window, Some(3600));
    }

    #[test]
    fn test_from_yaml_partial_rate_limiting() {
        let yaml = r#"
rate_limiting:
  limit: 10
"#;
        let config = TallyguardConfig::from_yaml(yaml).unwrap();
        assert!(config.store.redis_url.is_none());
        assert_eq!(config.rate_limiting, RateLimitOptions::with_limit(10));
    }

    #[test]
    fn test_from_yaml_invalid() {
        let result = TallyguardConfig::from_yaml("rate_limiting: fast");
        assert!(matches!(result, Err(TallyguardError::Config(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let result = TallyguardConfig::from_file("/nonexistent/tallyguard.yaml");
        assert!(matches!(result, Err(TallyguardError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir()
            .join(format!("tallyguard-load-{}.yaml", std::process::id()));
        std::fs::write(&path, "rate_limiting:\n  window: 15\n").unwrap();

        let config = TallyguardConfig::load(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.rate_limiting, RateLimitOptions::with_window(15));
    }

    #[test]
    fn test_load_env_overrides_file() {
        // Only this test reads store.redis_url through `load`
        let path = std::env::temp_dir()
            .join(format!("tallyguard-env-{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            "store:\n  redis_url: \"redis://file:6379\"\nrate_limiting:\n  limit: 7\n",
        )
        .unwrap();
        std::env::set_var("TALLYGUARD__STORE__REDIS_URL", "redis://env:6380");

        let result = TallyguardConfig::load(Some(path.as_path()));
        std::env::remove_var("TALLYGUARD__STORE__REDIS_URL");
        std::fs::remove_file(&path).unwrap();

        let config = result.unwrap();
        assert_eq!(config.store.redis_url.as_deref(), Some("redis://env:6380"));
        assert_eq!(config.rate_limiting.limit, Some(7));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = TallyguardConfig::load(Some(Path::new("/nonexistent/tallyguard.yaml")));
        assert!(matches!(result, Err(TallyguardError::Config(_))));
    }
}
