//! Configuration module for Sitegauge
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. All policy constants (composite weights, bonus/penalty magnitudes,
//! grade bands, lead tiers) live here with defaults; nothing is read from
//! ambient globals — the pipeline takes an explicit [`AnalysisConfig`].
//!
//! # Example
//!
//! ```no_run
//! use sitegauge::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitegauge.toml")).unwrap();
//! println!("Design weight: {}", config.scoring.design_weight);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use parser::load_config;
pub use types::{
    AnalysisConfig, CrawlConfig, LeadScoringConfig, ModelConfig, RetryConfig, ScoringConfig,
};
pub use validation::validate;
