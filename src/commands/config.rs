//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use node_metrics_sampler::config::{render_config, DEFAULT_TIMEOUT_SECS};
use node_metrics_sampler::{Config, ConfigFormat};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let config = Config {
        influxdb_host: Some("http://localhost:8086".to_string()),
        request_timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        log_level: Some("info".to_string()),
        ..Default::default()
    };
    let output = output.unwrap_or_else(|| PathBuf::from("node-metrics-sampler.yaml"));

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Node Metrics Sampler Configuration
# ===================================
#
# Environment variables take precedence over this file:
#   INFLUXDB_HOST, INFLUXDB_USER, INFLUXDB_PWD
#
# InfluxDB Connection
# -------------------
# influxdb_host: "http://localhost:8086"  # Scheme, host and port
# influxdb_user: null                     # Basic auth user (null = no auth)
# influxdb_pwd: null                      # Basic auth password
# request_timeout_secs: 10                # HTTP request timeout
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}
