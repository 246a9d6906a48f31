//! Fashion-corpus main entry point
//!
//! This is the command-line interface for the fashion corpus crawler.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use fashion_corpus::config::{load_config_or_default, Config};
use fashion_corpus::crawler::{CrawlEngine, Shutdown};
use fashion_corpus::output::generate_statistics;
use fashion_corpus::storage::open_storage;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Fashion-corpus: a topic-filtered text corpus crawler
///
/// Crawls fashion publications and the Wikipedia category tree, keeps the
/// pages that read like fashion articles and stores them in SQLite.
/// Repeated runs only refresh documents that changed.
#[derive(Parser, Debug)]
#[command(name = "fashion-corpus")]
#[command(version = "1.0.0")]
#[command(about = "A deduplicated fashion text corpus crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// What to do; an interactive menu is shown when omitted
    #[arg(value_enum, value_name = "MODE")]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Crawl the configured fashion sites
    Sites,
    /// Walk the Wikipedia category tree
    Wikipedia,
    /// Wikipedia first, then the sites
    All,
    /// Regenerate statistics from the existing corpus
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, hash) = load_config_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    match (&cli.config, hash) {
        (Some(path), Some(hash)) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        ),
        _ => tracing::info!("Using built-in configuration"),
    }

    let mode = match cli.mode {
        Some(mode) => mode,
        None => prompt_mode()?,
    };

    match mode {
        Mode::Stats => handle_stats(&config),
        mode => handle_crawl(config, mode).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fashion_corpus=info,warn"),
            1 => EnvFilter::new("fashion_corpus=debug,info"),
            2 => EnvFilter::new("fashion_corpus=trace,debug"),
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

/// Asks for a mode on stdin
fn prompt_mode() -> anyhow::Result<Mode> {
    println!("=== Fashion Corpus Crawler ===\n");
    println!("  1. Crawl fashion sites");
    println!("  2. Crawl Wikipedia categories");
    println!("  3. Crawl everything (Wikipedia, then sites)");
    println!("  4. Show corpus statistics");
    print!("\nChoose 1-4: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    match line.trim() {
        "1" => Ok(Mode::Sites),
        "2" => Ok(Mode::Wikipedia),
        "3" => Ok(Mode::All),
        "4" => Ok(Mode::Stats),
        other => bail!("Unknown choice: {:?}", other),
    }
}

/// Handles the stats mode: regenerates statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    if generate_statistics(&storage, config, chrono::Utc::now())?.is_none() {
        println!("The corpus is empty.");
    }

    Ok(())
}

/// Handles the crawl modes
async fn handle_crawl(config: Config, mode: Mode) -> anyhow::Result<()> {
    let shutdown = Shutdown::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            signal.trigger();
        }
    });

    let mut engine = CrawlEngine::from_config(config, shutdown.clone())
        .context("Failed to initialize the crawler")?;

    if matches!(mode, Mode::Wikipedia | Mode::All) {
        let client = engine.wikipedia_client()?;
        let report = engine.crawl_wikipedia(&client).await;
        tracing::info!("Wikipedia: {} articles", report.documents);
    }

    if matches!(mode, Mode::Sites | Mode::All) && !shutdown.is_triggered() {
        let reports = engine.crawl_all_sites().await;
        for report in &reports {
            tracing::info!(
                "{}: {} articles, {} URLs ({:?})",
                report.name,
                report.articles,
                report.urls_visited,
                report.reason
            );
        }
    }

    generate_statistics(engine.storage(), engine.config(), chrono::Utc::now())?;

    if shutdown.is_triggered() {
        tracing::info!("Crawl interrupted; progress saved");
    } else {
        tracing::info!("Crawl completed successfully");
    }

    Ok(())
}
