//! node-metrics-sampler - version 0.1.0
//!
//! Host metrics sampler with tracing logging.
//! This is the main entry point that resolves configuration, handles
//! subcommands and runs the sampling loop until a shutdown signal arrives.

mod cli;
mod commands;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_test};
use node_metrics_sampler::config::{
    render_config, resolve_config, validate_effective_config, Config,
};
use node_metrics_sampler::{connect_or_cancel, ProcSource, Sampler};

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr; stdout carries one JSON line per cycle.
fn setup_logging(config: &Config, args: &Args) {
    let log_level = args
        .log_level
        .or_else(|| {
            config
                .log_level
                .as_deref()
                .and_then(|s| LogLevel::from_str(s, true).ok())
        })
        .unwrap_or(LogLevel::Info);

    let max_level = match log_level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", log_level);
}

/// Cancels `token` on SIGINT or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    token.cancel();
}

/// Connects to InfluxDB and samples until shutdown.
async fn run_sampler(config: &Config) -> anyhow::Result<()> {
    let sink_config = config.sink_config()?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    info!("Connecting to InfluxDB at {}", sink_config.address);
    let Some(sink) = connect_or_cancel(&sink_config, &shutdown).await? else {
        info!("node-metrics-sampler stopped before connecting");
        return Ok(());
    };

    let mut sampler = Sampler::new(ProcSource::new(), sink, std::io::stdout());
    let summary = sampler.run(shutdown).await?;

    info!(
        "node-metrics-sampler stopped gracefully after {} cycles",
        summary.cycles
    );
    Ok(())
}

/// Main application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match resolve_config(args.config.as_deref(), args.no_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if args.check_config {
        if let Err(e) = validate_effective_config(&config) {
            eprintln!("❌ Configuration invalid: {}", e);
            std::process::exit(1);
        }
        println!("✅ Configuration is valid");
        return Ok(());
    }

    if args.show_config {
        println!("{}", render_config(&config.redacted(), args.config_format)?);
        return Ok(());
    }

    setup_logging(&config, &args);

    if let Some(command) = &args.command {
        return match command {
            Commands::Check { offline } => command_check(*offline, &config).await,
            Commands::Test {
                iterations,
                verbose,
            } => command_test(*iterations, *verbose).await,
            Commands::Config {
                output,
                format,
                commented,
            } => command_config(output.clone(), *format, *commented),
        };
    }

    if let Err(e) = validate_effective_config(&config) {
        error!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }

    info!("Starting node-metrics-sampler");

    if let Err(e) = run_sampler(&config).await {
        error!("❌ Fatal: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
