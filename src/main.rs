//! Queryscope command-line interface
//!
//! Runs compliance-checked crawl batches and answer-engine analyses from the
//! terminal, standing in for the HTTP-serving layer.

use clap::{Parser, Subcommand};
use queryscope::analysis::{AnalysisOrchestrator, AnalysisRequest, AnswerEngine, HttpEngine};
use queryscope::config::load_config_with_hash;
use queryscope::crawler::{build_http_client, CrawlBatchRequest, CrawlCoordinator};
use queryscope::store::{MemoryStore, RecordStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Queryscope: compliance-aware crawl and answer-engine analysis batches
#[derive(Parser, Debug)]
#[command(name = "queryscope")]
#[command(version = "0.1.0")]
#[command(about = "Compliance-aware batch crawling and analysis", long_about = None)]
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

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a batch of URLs, respecting each site's crawl policy
    Crawl {
        /// Identifier of the analysis this batch belongs to
        #[arg(long)]
        analysis_id: String,

        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// URLs to crawl (1 to 10)
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },

    /// Generate query variations and analyze them across configured engines
    Analyze {
        /// The base query to expand
        #[arg(long)]
        query: String,

        /// Product category for category-specific phrasings
        #[arg(long)]
        category: Option<String>,

        /// Product name for product-specific phrasings
        #[arg(long)]
        product: Option<String>,

        /// Number of variations to generate (5 to 30)
        #[arg(long, default_value_t = 10)]
        count: u32,

        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and print what would run
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Crawl {
            analysis_id,
            json,
            urls,
        } => handle_crawl(config, analysis_id, urls, json).await?,
        Command::Analyze {
            query,
            category,
            product,
            count,
            json,
        } => handle_analyze(config, query, category, product, count, json).await?,
        Command::ShowConfig => handle_show_config(&config, &config_hash),
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("queryscope=info,warn"),
            1 => EnvFilter::new("queryscope=debug,info"),
            2 => EnvFilter::new("queryscope=trace,debug"),
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

/// Handles the crawl subcommand
async fn handle_crawl(
    config: queryscope::Config,
    analysis_id: String,
    urls: Vec<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_http_client(&config.user_agent)?;
    let request = CrawlBatchRequest { urls, analysis_id };

    let coordinator = CrawlCoordinator::new(client, config.crawler.clone(), request)?;

    // Log each progress snapshot as it lands.
    let mut progress = coordinator.subscribe();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let snapshot = progress.borrow().clone();
            tracing::info!(
                "Progress: {} {}/{} ({:.0}%)",
                snapshot.stage,
                snapshot.current,
                snapshot.total,
                snapshot.percentage
            );
            if snapshot.stage.is_terminal() {
                break;
            }
        }
    });

    let report = coordinator.run().await;
    watcher.await.ok();

    let store = MemoryStore::new();
    store.save_crawl_report(&report).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("=== Crawl Batch {} ===\n", report.analysis_id);
    for outcome in &report.outcomes {
        match outcome {
            queryscope::CrawlOutcome::Fetched {
                url,
                status_code,
                title,
                content,
            } => {
                println!(
                    "  fetched  {} (HTTP {}, {} bytes{})",
                    url,
                    status_code,
                    content.len(),
                    title
                        .as_deref()
                        .map(|t| format!(", title: {}", t))
                        .unwrap_or_default()
                );
            }
            queryscope::CrawlOutcome::SkippedByPolicy { url, reason } => {
                println!("  skipped  {} ({})", url, reason);
            }
            queryscope::CrawlOutcome::Failed { url, failure } => {
                println!("  failed   {} ({})", url, failure);
            }
        }
    }
    println!(
        "\n{} fetched, {} skipped, {} failed",
        report.fetched_count(),
        report.skipped_count(),
        report.failed_count()
    );

    Ok(())
}

/// Handles the analyze subcommand
async fn handle_analyze(
    config: queryscope::Config,
    query: String,
    category: Option<String>,
    product: Option<String>,
    count: u32,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_http_client(&config.user_agent)?;

    let engines: Vec<Arc<dyn AnswerEngine>> = config
        .engines
        .iter()
        .map(|entry| {
            HttpEngine::from_entry(client.clone(), entry)
                .map(|engine| Arc::new(engine) as Arc<dyn AnswerEngine>)
        })
        .collect::<Result<_, _>>()?;

    let request = AnalysisRequest {
        base_query: query,
        product_category: category,
        product_name: product,
        count,
    };

    // Analyses triggered from the CLI get a timestamp-derived id.
    let analysis_id = format!("cli-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S%3f"));
    let store = Arc::new(MemoryStore::new());

    let orchestrator =
        AnalysisOrchestrator::new(engines, store.clone(), analysis_id, request)?;

    let mut progress = orchestrator.subscribe();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let snapshot = progress.borrow().clone();
            tracing::info!(
                "Progress: {} variation {}/{}{} ({:.0}%)",
                snapshot.stage,
                snapshot.current_variation,
                snapshot.total_variations,
                snapshot
                    .current_llm
                    .as_deref()
                    .map(|e| format!(" [{}]", e))
                    .unwrap_or_default(),
                snapshot.percentage
            );
            if snapshot.stage.is_terminal() {
                break;
            }
        }
    });

    let report = orchestrator.run().await?;
    watcher.await.ok();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("=== Analysis {} ===\n", report.analysis_id);
    println!("Base query: {}\n", report.base_query);
    for outcome in &report.variations {
        println!("  {}", outcome.variation);
        for answer in &outcome.answers {
            let preview: String = answer.answer.chars().take(80).collect();
            println!("    {} -> {}", answer.engine, preview);
        }
        for failure in &outcome.failures {
            println!("    {} !! {}", failure.engine, failure.failure);
        }
    }
    println!(
        "\n{} cells succeeded, {} failed",
        report.succeeded_cell_count(),
        report.failed_cell_count()
    );

    Ok(())
}

/// Handles the show-config subcommand
fn handle_show_config(config: &queryscope::Config, config_hash: &str) {
    println!("=== Queryscope Configuration ===\n");
    println!("Config hash: {}\n", config_hash);

    println!("Crawler:");
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Robots timeout: {}s", config.crawler.robots_timeout_secs);

    println!("\nUser agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nEngines ({}):", config.engines.len());
    for engine in &config.engines {
        println!(
            "  - {} -> {} ({}s timeout)",
            engine.name, engine.endpoint, engine.timeout_secs
        );
    }

    println!("\n✓ Configuration is valid");
}
