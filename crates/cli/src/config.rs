//! CLI configuration utilities

use anyhow::{Context, Result};
use kipesa_core::{ClientConfig, ValidateConfig};
use std::path::{Path, PathBuf};

/// Values given on the command line, applied over loaded configuration
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_base: Option<String>,
    pub state_dir: Option<PathBuf>,
}

/// Load configuration from `path` or the default lookup, then apply overrides
pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<ClientConfig> {
    let mut config = ClientConfig::load_layers(path).with_context(|| match path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;

    if let Some(api_base) = overrides.api_base {
        config.api_base = api_base;
    }
    if let Some(state_dir) = overrides.state_dir {
        config.state_dir = Some(state_dir);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Render the effective configuration for display
pub fn render(config: &ClientConfig) -> Result<String> {
    let mut value = serde_json::to_value(config)?;
    value["state_dir"] = serde_json::Value::String(config.state_dir().display().to_string());
    Ok(serde_json::to_string_pretty(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "api_base = \"https://api.kipesa.app\"").unwrap();
        writeln!(file, "get_timeout_secs = 4").unwrap();

        let config = resolve(
            Some(file.path()),
            Overrides {
                api_base: Some("http://127.0.0.1:9000".to_string()),
                state_dir: Some(PathBuf::from("/tmp/kipesa-state")),
            },
        )
        .unwrap();

        assert_eq!(config.api_base, "http://127.0.0.1:9000");
        assert_eq!(config.get_timeout_secs, 4);
        assert_eq!(config.state_dir(), PathBuf::from("/tmp/kipesa-state"));
    }

    #[test]
    fn test_override_replaces_invalid_file_value() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "api_base = \"not a url\"").unwrap();

        let config = resolve(
            Some(file.path()),
            Overrides {
                api_base: Some("https://api.kipesa.app".to_string()),
                state_dir: None,
            },
        )
        .unwrap();
        assert_eq!(config.api_base, "https://api.kipesa.app");
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();

        let result = resolve(
            Some(file.path()),
            Overrides {
                api_base: Some("not a url".to_string()),
                state_dir: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_render_shows_resolved_state_dir() {
        let config = ClientConfig {
            state_dir: Some(PathBuf::from("/var/lib/kipesa")),
            ..ClientConfig::default()
        };
        let rendered = render(&config).unwrap();
        assert!(rendered.contains("/var/lib/kipesa"));
        assert!(rendered.contains("\"token_key\": \"kipesa_token\""));
    }
}
