//! Sitegauge main entry point
//!
//! Command-line interface for running a single website analysis and printing
//! the aggregated result as JSON.

use anyhow::Context;
use clap::Parser;
use sitegauge::config::{load_config, AnalysisConfig};
use sitegauge::model::{AnalysisOptions, BusinessContext, ProgressEvent};
use sitegauge::run_analysis;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Sitegauge: website quality analysis for lead qualification
///
/// Given a target URL and business context, sitegauge discovers the site's
/// pages, crawls a representative subset, runs five quality evaluators
/// (visual, SEO, content, social, accessibility), and prints a scored,
/// graded result with quick wins and a lead-priority tier.
#[derive(Parser, Debug)]
#[command(name = "sitegauge")]
#[command(version = "0.3.0")]
#[command(about = "Website quality analysis for lead qualification", long_about = None)]
struct Cli {
    /// Target website URL (http or https)
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Company name for the business context
    #[arg(long, default_value = "unknown")]
    company: String,

    /// Industry for the business context
    #[arg(long, default_value = "unknown")]
    industry: String,

    /// Maximum pages selected per evaluation concern
    #[arg(long)]
    max_pages: Option<usize>,

    /// Maximum concurrent page crawls
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print progress events to stderr while running
    #[arg(long)]
    progress: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path).context("failed to load configuration")?
        }
        None => AnalysisConfig::default(),
    };

    let context = BusinessContext::new(cli.company.clone(), cli.industry.clone());

    let mut options = AnalysisOptions::default();
    if let Some(max_pages) = cli.max_pages {
        options.max_pages_per_concern = max_pages;
    }
    if let Some(concurrency) = cli.concurrency {
        options.crawl_concurrency = concurrency;
    }
    if cli.progress {
        options.on_progress = Some(Arc::new(print_progress));
    }

    let result = run_analysis(config, &cli.url, context, options)
        .await
        .context("analysis failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitegauge=info,warn"),
            1 => EnvFilter::new("sitegauge=debug,info"),
            2 => EnvFilter::new("sitegauge=trace,debug"),
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

/// Writes one line per progress event to stderr
fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::DiscoveryStarted { url } => {
            eprintln!("discovering pages on {}", url);
        }
        ProgressEvent::DiscoveryCompleted { pages, used_fallback } => {
            if *used_fallback {
                eprintln!("discovery found nothing, using fallback pages");
            } else {
                eprintln!("discovered {} pages", pages);
            }
        }
        ProgressEvent::SelectionCompleted { unique_pages, used_fallback } => {
            eprintln!(
                "selected {} unique pages{}",
                unique_pages,
                if *used_fallback { " (fallback)" } else { "" }
            );
        }
        ProgressEvent::PageCrawled { path, success, completed, total } => {
            eprintln!(
                "[{}/{}] {} {}",
                completed,
                total,
                if *success { "crawled" } else { "failed" },
                path
            );
        }
        ProgressEvent::CrawlCompleted { succeeded, failed } => {
            eprintln!("crawl done: {} succeeded, {} failed", succeeded, failed);
        }
        ProgressEvent::EvaluatorCompleted { evaluator, failed } => {
            eprintln!(
                "{} evaluator {}",
                evaluator,
                if *failed { "failed" } else { "done" }
            );
        }
        ProgressEvent::AggregationCompleted { composite_score } => {
            eprintln!("composite score: {:.1}", composite_score);
        }
    }
}
