//! Client configuration

use crate::validation::{ValidateConfig, validators};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable consulted for the API base URL before the literal fallback
pub const API_BASE_ENV: &str = "API_BASE_URL";

/// Base URL used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Storage key the access token is persisted under
pub const DEFAULT_TOKEN_KEY: &str = "kipesa_token";

const CONFIG_PATHS: [&str; 3] = [
    "kipesa.toml",
    "config/kipesa.toml",
    "/etc/kipesa/kipesa.toml",
];

/// Kipesa client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the Kipesa API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Timeout for GET requests in seconds
    #[serde(default = "default_get_timeout")]
    pub get_timeout_secs: u64,
    /// Timeout for POST requests in seconds
    #[serde(default = "default_post_timeout")]
    pub post_timeout_secs: u64,
    /// Key under which the access token is persisted
    #[serde(default = "default_token_key")]
    pub token_key: String,
    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Directory for persisted client state (defaults to the platform data dir)
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_base() -> String {
    std::env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
}

fn default_get_timeout() -> u64 {
    10
}

fn default_post_timeout() -> u64 {
    30
}

fn default_token_key() -> String {
    DEFAULT_TOKEN_KEY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            get_timeout_secs: default_get_timeout(),
            post_timeout_secs: default_post_timeout(),
            token_key: default_token_key(),
            user_agent: None,
            state_dir: None,
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_layers(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load_layers(Some(path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Merge defaults, config files and `KIPESA__*` variables without validating
    ///
    /// With `path` only that file is read; otherwise the standard locations are
    /// searched. Callers applying their own overrides validate afterwards.
    pub fn load_layers(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => builder = builder.add_source(File::from(path)),
            None => {
                for path in &CONFIG_PATHS {
                    if Path::new(path).exists() {
                        builder = builder.add_source(File::with_name(path).required(false));
                    }
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("KIPESA")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Timeout applied to GET requests
    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.get_timeout_secs)
    }

    /// Timeout applied to POST requests
    pub fn post_timeout(&self) -> Duration {
        Duration::from_secs(self.post_timeout_secs)
    }

    /// Resolve the state directory
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("app", "kipesa", "kipesa")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".kipesa"))
        })
    }
}

impl ValidateConfig for ClientConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validators::validate_http_url(&self.api_base, "api_base")?;
        validators::validate_range(self.get_timeout_secs, 1, 600, "get_timeout_secs")?;
        validators::validate_range(self.post_timeout_secs, 1, 600, "post_timeout_secs")?;
        validators::validate_not_empty(&self.token_key, "token_key")?;
        Ok(())
    }
}
