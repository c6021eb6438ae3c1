//! planbench command-line entry point.

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

mod commands;
mod config;
mod workload;

/// Slow-query detection and index benchmarking for a document store.
#[derive(Parser, Debug)]
#[command(name = "planbench", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "planbench.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Measure every workload candidate and benchmark the slow ones.
    Detect {
        /// Override the configured slow-query threshold.
        #[arg(long)]
        threshold_ms: Option<u64>,
    },
    /// Benchmark one named candidate unconditionally.
    Bench {
        /// Candidate name from the workload file.
        name: String,
    },
    /// Check server connectivity.
    Ping,
}

fn get_env_filter() -> EnvFilter {
    if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else if cfg!(debug_assertions) {
        EnvFilter::new("planbench=debug")
    } else {
        EnvFilter::new("planbench=info")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .append(true)
        .open("planbench.log")?;

    // Non-blocking log appenders
    let (file_non_blocking, file_guard) = tracing_appender::non_blocking(log_file);
    let (console_non_blocking, console_guard) = tracing_appender::non_blocking(std::io::stderr());
    // Maintain guard references to keep log threads alive
    let _guards = (file_guard, console_guard);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_file(true);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(console_non_blocking)
        .with_ansi(true)
        .with_target(false)
        .compact();

    Registry::default()
        .with(get_env_filter())
        .with(file_layer)
        .with(stderr_layer)
        .init();

    let config = Config::load_from_path(&cli.config)?;
    tracing::debug!(server = %config.server.addr(), collection = %config.bench.collection, "configuration loaded");

    match cli.command {
        Command::Detect { threshold_ms } => commands::detect(&config, threshold_ms).await,
        Command::Bench { name } => commands::bench(&config, &name).await,
        Command::Ping => commands::ping(&config).await,
    }
}
