//! CLI arguments and subcommands for node-metrics-sampler.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use node_metrics_sampler::ConfigFormat;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "node-metrics-sampler",
    about = "Samples host CPU, memory, swap, disk and network counters into InfluxDB",
    long_about = "Samples host CPU, memory, swap, disk and network counters into InfluxDB.\n\n\
                  Once per second the sampler reads /proc and statvfs, writes one \
                  `node_metrics` point tagged with the hostname to the `metrics` database \
                  and prints the snapshot as a JSON line. The InfluxDB address and \
                  credentials come from INFLUXDB_HOST, INFLUXDB_USER and INFLUXDB_PWD.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate host counters, configuration and sink connectivity
    Check {
        /// Skip the InfluxDB connectivity check
        #[arg(long)]
        offline: bool,
    },

    /// Capture snapshots and print them without writing to InfluxDB
    Test {
        /// Number of snapshots to capture
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Also print the line protocol that would be written
        #[arg(long)]
        verbose: bool,
    },

    /// Generate a configuration file
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments (YAML only)
        #[arg(long)]
        commented: bool,
    },
}
