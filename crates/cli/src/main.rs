mod commands;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fileforge_core::{load_config_or_default, metrics, validate_config, ConversionEngine, ForgeConfig};

use commands::Command;

#[derive(Parser, Debug)]
#[command(
    name = "fileforge",
    about = "Convert files between formats through pluggable converters",
    version
)]
struct Cli {
    /// Configuration file (TOML); FILEFORGE_* environment variables override it
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Print Prometheus metrics to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let print_metrics = cli.metrics;

    let code = match run(cli).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            output::failure(&format!("{e:#}"));
            1
        }
    };

    if print_metrics {
        eprintln!("{}", metrics::gather_text());
    }
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<bool> {
    let config = load_config_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load config from {:?}", path),
        None => "Failed to load default configuration".to_string(),
    })?;
    validate_config(&config).context("Configuration validation failed")?;

    init_logging(&config, cli.debug);
    debug!(?config, "Configuration loaded");

    let engine = ConversionEngine::with_default_plugins(config)
        .await
        .context("Failed to register built-in plugins")?;

    let outcome = commands::execute(cli.command, &engine).await;
    engine.shutdown().await;
    outcome
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(config: &ForgeConfig, debug: bool) {
    let level = if debug { "debug" } else { config.logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("warn,fileforge_core={level},fileforge={level}").into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
