//! Trawl main entry point
//!
//! This is the command-line interface for the Trawl crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use trawl::config::{load_config_with_hash, Config};
use trawl::crawler::stats::{load_statistics, print_report, print_statistics};
use trawl::crawler::{compile_config, CrawlEngine, HandlerRegistry, HttpFetcher};
use trawl::storage::open_store;
use tracing_subscriber::EnvFilter;

/// Trawl: a polite, resumable web crawler
///
/// Trawl walks the link graph from the configured seeds, routes every page
/// through allow/deny rules, and writes extracted items through the item
/// pipeline. Progress is saved after every page, so an interrupted crawl
/// picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "trawl")]
#[command(version)]
#[command(about = "A polite, resumable web crawler", long_about = None)]
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

    /// Discard saved progress and start again from the seeds
    #[arg(long)]
    fresh: bool,

    /// Validate config and show the rules and seeds without crawling
    #[arg(long, conflicts_with_all = ["stats", "fresh"])]
    dry_run: bool,

    /// Show statistics from the saved progress and exit
    #[arg(long, conflicts_with_all = ["dry_run", "fresh"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(&config, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence over the flags when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let default = if quiet {
        "error"
    } else {
        match verbose {
            0 => "trawl=info,warn",
            1 => "trawl=debug,info",
            2 => "trawl=trace,debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    // Fails on bad selectors and on rules naming an unknown handler
    let handlers = HandlerRegistry::from_config(&config.handlers)?;
    let (rules, pipeline) = compile_config(config, &handlers)?;

    println!("=== Trawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Delay: {}s to {}s",
        config.crawler.min_delay, config.crawler.max_delay
    );
    match config.crawler.fetch_timeout() {
        Some(timeout) => println!("  Fetch timeout: {}s", timeout.as_secs()),
        None => println!("  Fetch timeout: none"),
    }
    println!(
        "  Skip resource requests: {}",
        config.crawler.skip_resource_requests
    );
    println!("  Excluded schemes: {}", config.crawler.excluded_schemes.join(", "));
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nProgress:");
    println!("  Directory: {}", config.progress.directory);
    println!("  Backend: {:?}", config.progress.backend);

    println!("\nPipeline: {}", pipeline.processor_names().join(" -> "));
    if let Some(path) = &config.pipeline.csv_path {
        println!("  CSV output: {}", path);
    }

    println!("\nRules ({}):", rules.len());
    for (i, rule) in config.rules.iter().enumerate() {
        println!(
            "  {}. allow={} deny={} follow={} handler={}",
            i + 1,
            rule.allow.as_deref().unwrap_or("*"),
            rule.deny.as_deref().unwrap_or("-"),
            rule.follow,
            rule.handler.as_deref().unwrap_or("-")
        );
    }

    println!("\nHandlers ({}):", config.handlers.len());
    for (name, handler) in &config.handlers {
        let fields: Vec<&str> = handler.fields.keys().map(String::as_str).collect();
        println!("  - {} ({})", name, fields.join(", "));
    }

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the saved progress
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = open_store(&config.progress)
        .with_context(|| format!("failed to open progress at {}", config.progress.directory))?;

    let stats = load_statistics(store.as_ref())?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous progress)");
    } else {
        tracing::info!("Starting crawl (will resume saved progress)");
    }

    tracing::info!(
        "Seeds: {}, rules: {}, processors: {}",
        config.crawler.seeds.len(),
        config.rules.len(),
        config.pipeline.processors.len()
    );

    let handlers = HandlerRegistry::from_config(&config.handlers)?;
    let fetcher = HttpFetcher::from_config(&config.crawler)?;
    let mut engine = CrawlEngine::from_config(config, &handlers, Box::new(fetcher), fresh)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested, saving progress");
    };

    match engine.run_until(shutdown).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
