//! Sitegauge: a website quality analysis and lead-scoring pipeline
//!
//! This crate implements a multi-stage analysis pipeline: it discovers candidate
//! pages for a target site, selects a bounded subset per evaluation concern,
//! crawls the selection with bounded concurrency (HTML plus two-viewport
//! screenshots), fans out five independent quality evaluators in parallel, and
//! aggregates their findings into a composite score, letter grade, quick-win
//! list, and a separate lead-priority score for outreach ranking.

pub mod aggregate;
pub mod config;
pub mod crawl;
pub mod discovery;
pub mod evaluate;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod retry;
pub mod selection;

use thiserror::Error;

/// Main error type for Sitegauge operations
///
/// Degraded stages (discovery fallback, selection fallback, individual page or
/// evaluator failures) are never surfaced here; they are recorded as data on
/// the result. The only mid-pipeline hard error is a total crawl failure.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid target URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("No pages could be crawled ({attempted} attempted)")]
    CrawlTotalFailure {
        attempted: usize,
        failures: Vec<model::PageFailure>,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors from the language-model collaborator
///
/// These never cross the pipeline boundary: each AI-backed step absorbs them
/// per its own fallback contract (deterministic selection fallback, neutral
/// evaluator finding).
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model call timed out after {0}ms")]
    Timeout(u64),

    #[error("Model returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model response did not match the expected schema: {0}")]
    Schema(String),

    #[error("Model returned an empty response")]
    Empty,
}

/// Result type alias for Sitegauge operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::AnalysisConfig;
pub use model::{
    AggregatedResult, AnalysisRequest, BusinessContext, Concern, CrawledPage, DiscoveredSitemap,
    EvaluatorFinding, EvaluatorKind, Grade, LeadTier, PageSelection, ProgressEvent,
};
pub use pipeline::{run_analysis, Pipeline};
