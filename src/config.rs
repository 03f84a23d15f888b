//! Configuration management for node-metrics-sampler.
//!
//! Configuration is read from an optional YAML, JSON or TOML file and then
//! overridden by the `INFLUXDB_HOST`, `INFLUXDB_USER` and `INFLUXDB_PWD`
//! environment variables.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::sink::{parse_address, SinkConfig};

pub const ENV_HOST: &str = "INFLUXDB_HOST";
pub const ENV_USER: &str = "INFLUXDB_USER";
pub const ENV_PASSWORD: &str = "INFLUXDB_PWD";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default config file locations, first match wins.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "/etc/node-metrics-sampler/config.yaml",
    "/etc/node-metrics-sampler/config.yml",
    "/etc/node-metrics-sampler/config.json",
    "/etc/node-metrics-sampler/config.toml",
    "./node-metrics-sampler.yaml",
    "./node-metrics-sampler.yml",
    "./node-metrics-sampler.json",
    "./node-metrics-sampler.toml",
];

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // InfluxDB connection
    #[serde(alias = "influxdb-host")]
    pub influxdb_host: Option<String>,
    #[serde(alias = "influxdb-user")]
    pub influxdb_user: Option<String>,
    #[serde(alias = "influxdb-pwd")]
    pub influxdb_pwd: Option<String>,
    #[serde(alias = "request-timeout-secs")]
    pub request_timeout_secs: Option<u64>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Applies environment overrides from `vars`. Empty values are ignored.
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) {
        let get = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();

        if let Some(host) = get(ENV_HOST) {
            self.influxdb_host = Some(host);
        }
        if let Some(user) = get(ENV_USER) {
            self.influxdb_user = Some(user);
        }
        if let Some(pwd) = get(ENV_PASSWORD) {
            self.influxdb_pwd = Some(pwd);
        }
    }

    /// Copy safe to print: the password is masked.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        if copy.influxdb_pwd.is_some() {
            copy.influxdb_pwd = Some("********".to_string());
        }
        copy
    }

    /// Sink settings for a validated config.
    pub fn sink_config(&self) -> Result<SinkConfig, ConfigError> {
        validate_effective_config(self)?;

        let username = self.influxdb_user.clone().filter(|u| !u.is_empty());
        let password = match (&username, &self.influxdb_pwd) {
            (Some(_), pwd) => pwd.clone(),
            (None, Some(_)) => {
                warn!(
                    "{} is set but {} is empty; connecting without authentication",
                    ENV_PASSWORD, ENV_USER
                );
                None
            }
            (None, None) => None,
        };

        Ok(SinkConfig {
            address: self.influxdb_host.clone().unwrap_or_default(),
            username,
            password,
            timeout: Duration::from_secs(
                self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    let host = cfg
        .influxdb_host
        .as_deref()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "{} is not set and no influxdb_host is configured",
                ENV_HOST
            ))
        })?;

    parse_address(host).map_err(|e| ConfigError::Invalid(e.to_string()))?;

    if cfg.request_timeout_secs == Some(0) {
        return Err(ConfigError::Invalid(
            "request_timeout_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// Resolves configuration: environment > config file > defaults.
pub fn resolve_config(path: Option<&Path>, no_config: bool) -> Result<Config, ConfigError> {
    let mut config = if no_config {
        Config::default()
    } else {
        load_config(path)?
    };

    let vars: HashMap<String, String> = std::env::vars().collect();
    config.apply_env(&vars);

    Ok(config)
}

/// Loads a config file; falls back to the default locations, then to
/// defaults when no file exists.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists()),
    };

    let Some(path) = path else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        source: e,
    })?;

    let parse_err = |reason: String| ConfigError::Parse {
        path: path.display().to_string(),
        reason,
    };

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        Some("toml") => toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
    };

    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Renders a config in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String, ConfigError> {
    let rendered = match format {
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?
        }
        ConfigFormat::Toml => {
            toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?
        }
        ConfigFormat::Yaml => {
            serde_yaml::to_string(config).map_err(|e| ConfigError::Serialize(e.to_string()))?
        }
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            influxdb_host: Some("http://localhost:8086".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config {
            influxdb_host: Some("http://file:8086".into()),
            influxdb_user: Some("file-user".into()),
            ..Default::default()
        };
        let vars = HashMap::from([
            (ENV_HOST.to_string(), "http://env:8086".to_string()),
            (ENV_USER.to_string(), String::new()),
            (ENV_PASSWORD.to_string(), "secret".to_string()),
        ]);

        config.apply_env(&vars);

        assert_eq!(config.influxdb_host.as_deref(), Some("http://env:8086"));
        // empty variables do not clear file values
        assert_eq!(config.influxdb_user.as_deref(), Some("file-user"));
        assert_eq!(config.influxdb_pwd.as_deref(), Some("secret"));
    }

    #[test]
    fn test_validate_requires_host() {
        assert!(validate_effective_config(&Config::default()).is_err());
        assert!(validate_effective_config(&valid()).is_ok());

        let config = Config {
            influxdb_host: Some("ftp://localhost".into()),
            ..Default::default()
        };
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            request_timeout_secs: Some(0),
            ..valid()
        };
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_password_without_user_is_ignored() {
        let config = Config {
            influxdb_pwd: Some("secret".into()),
            ..valid()
        };
        assert!(validate_effective_config(&config).is_ok());

        let sink = config.sink_config().unwrap();
        assert_eq!(sink.username, None);
        assert_eq!(sink.password, None);

        let config = Config {
            influxdb_user: Some(String::new()),
            influxdb_pwd: Some("secret".into()),
            ..valid()
        };
        let sink = config.sink_config().unwrap();
        assert_eq!(sink.username, None);
        assert_eq!(sink.password, None);
    }

    #[test]
    fn test_sink_config() {
        let config = Config {
            influxdb_user: Some("admin".into()),
            influxdb_pwd: Some("secret".into()),
            request_timeout_secs: Some(3),
            ..valid()
        };

        let sink = config.sink_config().unwrap();
        assert_eq!(sink.address, "http://localhost:8086");
        assert_eq!(sink.username.as_deref(), Some("admin"));
        assert_eq!(sink.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_redacted_masks_password() {
        let config = Config {
            influxdb_pwd: Some("secret".into()),
            ..valid()
        };
        let rendered = render_config(&config.redacted(), ConfigFormat::Yaml).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("********"));
    }

    #[test]
    fn test_load_config_formats() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let yaml = dir.path().join("config.yaml");
        fs::write(&yaml, "influxdb_host: http://yaml:8086\nlog-level: debug\n").unwrap();
        let config = load_config(Some(&yaml)).unwrap();
        assert_eq!(config.influxdb_host.as_deref(), Some("http://yaml:8086"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));

        let json = dir.path().join("config.json");
        fs::write(&json, r#"{"influxdb_host": "http://json:8086"}"#).unwrap();
        assert_eq!(
            load_config(Some(&json)).unwrap().influxdb_host.as_deref(),
            Some("http://json:8086")
        );

        let toml_path = dir.path().join("config.toml");
        fs::write(&toml_path, "influxdb_host = \"http://toml:8086\"\n").unwrap();
        assert_eq!(
            load_config(Some(&toml_path)).unwrap().influxdb_host.as_deref(),
            Some("http://toml:8086")
        );
    }

    #[test]
    fn test_load_config_errors() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            load_config(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{not json").unwrap();
        assert!(matches!(
            load_config(Some(&broken)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
