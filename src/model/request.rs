//! Analysis request types: target, business context, and per-run options

use crate::model::finding::EvaluatorKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An evaluation concern used during page selection
///
/// Each concern receives its own bounded page list. Accessibility is not a
/// selection concern: the accessibility evaluator runs over the full crawl set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Concern {
    Visual,
    Seo,
    Content,
    Social,
}

impl Concern {
    /// All selection concerns in canonical order
    pub const ALL: [Concern; 4] = [
        Concern::Visual,
        Concern::Seo,
        Concern::Content,
        Concern::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Concern::Visual => "visual",
            Concern::Seo => "seo",
            Concern::Content => "content",
            Concern::Social => "social",
        }
    }
}

impl fmt::Display for Concern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse level for prior business signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalLevel {
    Low,
    Medium,
    High,
}

/// Signals known about the prospect before the analysis runs
///
/// Supplied by the upstream prospect-discovery stage; every field is optional
/// knowledge, and the lead-priority rubric treats absence as neutral.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriorSignals {
    /// Prospect showed recent business activity (new listing, recent post, ...)
    #[serde(default)]
    pub recent_activity: bool,

    /// Known employee count, if any
    #[serde(default)]
    pub employee_count: Option<u32>,

    /// Estimated budget likelihood
    #[serde(default)]
    pub budget_likelihood: Option<SignalLevel>,

    /// Observed engagement with prior outreach
    #[serde(default)]
    pub engagement: Option<SignalLevel>,
}

/// Business context for the site under analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessContext {
    pub company_name: String,
    pub industry: String,

    #[serde(default)]
    pub prior_signals: Option<PriorSignals>,
}

impl BusinessContext {
    pub fn new(company_name: impl Into<String>, industry: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            industry: industry.into(),
            prior_signals: None,
        }
    }
}

/// Progress events emitted at stage transitions
///
/// The callback receiving these must be treated as untrusted: invocations are
/// panic-isolated so a misbehaving callback can never break the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ProgressEvent {
    DiscoveryStarted {
        url: String,
    },
    DiscoveryCompleted {
        pages: usize,
        used_fallback: bool,
    },
    SelectionCompleted {
        unique_pages: usize,
        used_fallback: bool,
    },
    PageCrawled {
        path: String,
        success: bool,
        completed: usize,
        total: usize,
    },
    CrawlCompleted {
        succeeded: usize,
        failed: usize,
    },
    EvaluatorCompleted {
        evaluator: EvaluatorKind,
        failed: bool,
    },
    AggregationCompleted {
        composite_score: f64,
    },
}

/// Non-blocking progress callback invoked at least once per stage transition
pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Per-run options for a single analysis
#[derive(Clone)]
pub struct AnalysisOptions {
    /// Maximum pages selected per evaluation concern
    pub max_pages_per_concern: usize,

    /// Maximum concurrent page crawls
    pub crawl_concurrency: usize,

    /// Timeout for a single page crawl (milliseconds)
    pub per_page_timeout_ms: u64,

    /// Timeout for a single evaluator call (milliseconds)
    pub per_evaluator_timeout_ms: u64,

    /// Per-evaluator instruction overrides
    pub custom_evaluator_prompts: HashMap<EvaluatorKind, String>,

    /// Progress callback, if the caller wants stage events
    pub on_progress: Option<ProgressCallback>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_pages_per_concern: 5,
            crawl_concurrency: 3,
            per_page_timeout_ms: 15_000,
            per_evaluator_timeout_ms: 60_000,
            custom_evaluator_prompts: HashMap::new(),
            on_progress: None,
        }
    }
}

impl fmt::Debug for AnalysisOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisOptions")
            .field("max_pages_per_concern", &self.max_pages_per_concern)
            .field("crawl_concurrency", &self.crawl_concurrency)
            .field("per_page_timeout_ms", &self.per_page_timeout_ms)
            .field("per_evaluator_timeout_ms", &self.per_evaluator_timeout_ms)
            .field(
                "custom_evaluator_prompts",
                &self.custom_evaluator_prompts.len(),
            )
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// A complete analysis request: target URL, context, and options
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub url: url::Url,
    pub context: BusinessContext,
    pub options: AnalysisOptions,
}
