use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default settings file, looked up relative to the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "notification-sync";

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Dashboard API connection
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiConfig {
    /// Base URL the notification paths are appended to, e.g. `http://localhost:5000/api`
    pub base_url: String,
    /// Bearer token attached to every request
    #[serde(default)]
    pub token: Option<String>,
}

/// Sync engine timing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SyncConfig {
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Issue one fetch as soon as connectivity comes back
    pub catch_up_on_reconnect: bool,
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15,
            request_timeout_secs: 10,
            catch_up_on_reconnect: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
    pub log_level: String,
}

impl Settings {
    /// Load settings from the default file (optional) and `APP_*` environment variables
    pub fn new() -> Result<Self, SettingsError> {
        Self::load(None)
    }

    /// Load settings, reading `path` instead of the default file when given.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&str>) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        Self::from_builder(Self::builder()?.add_source(file).add_source(Self::environment()))
    }

    /// Load settings from an inline TOML document and an explicit environment map
    pub fn from_sources(toml: &str, env: HashMap<String, String>) -> Result<Self, SettingsError> {
        let builder = Self::builder()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .add_source(Self::environment().source(Some(env)));
        Self::from_builder(builder)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let defaults = SyncConfig::default();
        Config::builder()
            .set_default("api.base_url", "http://localhost:5000/api")?
            .set_default("sync.poll_interval_secs", defaults.poll_interval_secs)?
            .set_default("sync.request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("sync.catch_up_on_reconnect", defaults.catch_up_on_reconnect)?
            .set_default("cache.directory", ".notification-cache")?
            .set_default("log_level", "info")
    }

    fn environment() -> Environment {
        Environment::with_prefix("APP")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.sync.poll_interval_secs == 0 {
            return Err(SettingsError::Invalid {
                field: "sync.poll_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.sync.request_timeout_secs == 0 {
            return Err(SettingsError::Invalid {
                field: "sync.request_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.api.base_url.trim().is_empty() {
            return Err(SettingsError::Invalid {
                field: "api.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:5000/api".to_string(),
                token: None,
            },
            sync: SyncConfig::default(),
            cache: CacheConfig {
                directory: PathBuf::from(".notification-cache"),
            },
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_without_sources() {
        let settings = Settings::from_sources("", HashMap::new()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.sync.poll_interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_file_values_override_defaults() {
        let toml = r#"
            log_level = "debug"

            [api]
            base_url = "https://energy.example.edu/api"
            token = "secret"

            [sync]
            poll_interval_secs = 30
        "#;

        let settings = Settings::from_sources(toml, HashMap::new()).unwrap();
        assert_eq!(settings.api.base_url, "https://energy.example.edu/api");
        assert_eq!(settings.api.token.as_deref(), Some("secret"));
        assert_eq!(settings.sync.poll_interval_secs, 30);
        assert_eq!(settings.sync.request_timeout_secs, 10);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_environment_overrides_file() {
        let toml = "[sync]\npoll_interval_secs = 30\n";
        let mut env = HashMap::new();
        env.insert("APP_SYNC__POLL_INTERVAL_SECS".to_string(), "45".to_string());
        env.insert("APP_SYNC__CATCH_UP_ON_RECONNECT".to_string(), "false".to_string());

        let settings = Settings::from_sources(toml, env).unwrap();
        assert_eq!(settings.sync.poll_interval_secs, 45);
        assert!(!settings.sync.catch_up_on_reconnect);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let result = Settings::from_sources("[sync]\npoll_interval_secs = 0\n", HashMap::new());
        assert!(matches!(
            result,
            Err(SettingsError::Invalid { field: "sync.poll_interval_secs", .. })
        ));
    }
}
