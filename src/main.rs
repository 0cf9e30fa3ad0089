//! Feed-Harvester main entry point
//!
//! This is the command-line interface for the feed harvester.

use anyhow::Context;
use clap::Parser;
use feed_harvester::config::{load_config_with_hash, Config};
use feed_harvester::crawler::harvest;
use feed_harvester::output::{
    connect_sinks, print_summary, MemoryKeyValueSink, MemoryLogSink, Publisher,
};
use feed_harvester::RunSummary;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Feed-Harvester: a concurrent collector for a paginated social API
///
/// Feed-Harvester fetches people, posts and comments page by page and
/// publishes every record to a Kafka topic and a Redis store.
#[derive(Parser, Debug)]
#[command(name = "feed-harvester")]
#[command(version = "1.0.0")]
#[command(about = "Harvests people, posts and comments into Kafka and Redis", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Harvest into in-memory sinks without touching Kafka or Redis
    #[arg(long, conflicts_with = "tail")]
    dry_run: bool,

    /// Print every message on the log topic until interrupted
    #[arg(long, conflicts_with_all = ["dry_run", "strict"])]
    tail: bool,

    /// Exit with an error if any unit failed or was partial
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.tail {
        handle_tail(&config).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let summary = if cli.dry_run {
        handle_dry_run(&config).await?
    } else {
        handle_harvest(&config).await?
    };

    print_summary(&summary, Some(&config_hash));

    Ok(exit_code(&summary, cli.strict))
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("feed_harvester=info,warn"),
            1 => EnvFilter::new("feed_harvester=debug,info"),
            2 => EnvFilter::new("feed_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: harvests into memory and reports what would be written
async fn handle_dry_run(config: &Config) -> anyhow::Result<RunSummary> {
    println!("=== Feed-Harvester Dry Run ===\n");
    println!("Source: {}", config.source.base_url);
    println!("Pages: {}..={}", config.pages.first, config.pages.last);
    println!("Would publish to topic '{}' on {}", config.kafka.topic, config.kafka.brokers);
    println!("Would store in {}\n", config.redis.url);

    let log = Arc::new(MemoryLogSink::new());
    let store = Arc::new(MemoryKeyValueSink::new());
    let publisher = Publisher::new(log.clone(), store.clone());

    let summary = harvest(config, publisher).await?;

    println!(
        "Captured {} log messages and {} key/value writes\n",
        log.len(),
        store.writes().len()
    );

    Ok(summary)
}

/// Handles the main harvest: connects both sinks, then runs every unit
async fn handle_harvest(config: &Config) -> anyhow::Result<RunSummary> {
    tracing::info!(
        brokers = %config.kafka.brokers,
        topic = %config.kafka.topic,
        redis = %config.redis.url,
        "Connecting sinks"
    );
    let publisher = connect_sinks(config)
        .await
        .context("failed to connect sinks")?;

    tracing::info!(
        first = config.pages.first,
        last = config.pages.last,
        "Starting harvest"
    );
    Ok(harvest(config, publisher).await?)
}

/// Handles the --tail mode: prints the log topic until Ctrl-C
#[cfg(feature = "kafka")]
async fn handle_tail(config: &Config) -> anyhow::Result<()> {
    feed_harvester::output::tail_log(&config.kafka)
        .await
        .context("failed to tail the log topic")
}

#[cfg(not(feature = "kafka"))]
async fn handle_tail(_config: &Config) -> anyhow::Result<()> {
    anyhow::bail!("--tail needs a build with the `kafka` feature")
}

/// Maps a finished run to the process exit code
fn exit_code(summary: &RunSummary, strict: bool) -> ExitCode {
    if summary.is_complete_failure() {
        tracing::error!("Every unit failed");
        ExitCode::FAILURE
    } else if strict && summary.has_failures() {
        tracing::warn!("Some units failed or were partial (--strict)");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
