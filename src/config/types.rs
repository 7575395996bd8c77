use crate::model::GradeBands;
use serde::Deserialize;

/// Main configuration structure for Sitegauge
///
/// Every section has defaults, so `AnalysisConfig::default()` is a complete
/// working configuration (pointing at the OpenAI-compatible endpoint named in
/// `[model]`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub lead: LeadScoringConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Language-model endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Base URL of an OpenAI-compatible chat-completions API
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Model used for text evaluators and page selection
    #[serde(rename = "model-name")]
    pub model_name: String,

    /// Model used for the visual evaluator (falls back to `model_name`)
    #[serde(rename = "visual-model-name", default)]
    pub visual_model_name: Option<String>,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Hard timeout on a single model request (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model_name: "gpt-4o-mini".to_string(),
            visual_model_name: Some("gpt-4o".to_string()),
            api_key_env: "SITEGAUGE_API_KEY".to_string(),
            request_timeout_ms: 90_000,
        }
    }
}

impl ModelConfig {
    pub fn visual_model(&self) -> &str {
        self.visual_model_name.as_deref().unwrap_or(&self.model_name)
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Directory screenshot files are written to
    #[serde(rename = "screenshot-dir")]
    pub screenshot_dir: String,

    /// Desktop capture viewport
    #[serde(rename = "desktop-width")]
    pub desktop_width: u32,
    #[serde(rename = "desktop-height")]
    pub desktop_height: u32,

    /// Mobile capture viewport
    #[serde(rename = "mobile-width")]
    pub mobile_width: u32,
    #[serde(rename = "mobile-height")]
    pub mobile_height: u32,

    /// User-agent string sent with page fetches
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: "./screenshots".to_string(),
            desktop_width: 1440,
            desktop_height: 900,
            mobile_width: 390,
            mobile_height: 844,
            user_agent: "Sitegauge/0.3 (website quality analysis)".to_string(),
        }
    }
}

/// Composite-score policy constants
///
/// The weights and magnitudes are product-policy values and deliberately
/// configurable; the defaults match current policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(rename = "design-weight")]
    pub design_weight: f64,
    #[serde(rename = "seo-weight")]
    pub seo_weight: f64,
    #[serde(rename = "content-weight")]
    pub content_weight: f64,
    #[serde(rename = "social-weight")]
    pub social_weight: f64,

    /// Bonus applied when the deduplicated quick-win pool reaches the minimum
    #[serde(rename = "quick-win-bonus")]
    pub quick_win_bonus: f64,
    #[serde(rename = "quick-win-pool-min")]
    pub quick_win_pool_min: usize,

    /// Accessibility score floor gating the quick-win bonus
    #[serde(rename = "accessibility-gate-min")]
    pub accessibility_gate_min: f64,

    /// Penalty when mobile usability is flagged failing
    #[serde(rename = "mobile-usability-penalty")]
    pub mobile_usability_penalty: f64,

    /// Penalty when no HTTPS is detected
    #[serde(rename = "https-penalty")]
    pub https_penalty: f64,

    /// Penalty when at most one page yielded usable evidence
    #[serde(rename = "thin-evidence-penalty")]
    pub thin_evidence_penalty: f64,

    /// Maximum quick wins in the final list
    #[serde(rename = "quick-win-limit")]
    pub quick_win_limit: usize,

    /// Maximum quick wins from any single evaluator
    #[serde(rename = "quick-win-per-evaluator-cap")]
    pub quick_win_per_evaluator_cap: usize,

    #[serde(rename = "grade-bands", default)]
    pub grade_bands: GradeBands,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            design_weight: 0.30,
            seo_weight: 0.30,
            content_weight: 0.20,
            social_weight: 0.20,
            quick_win_bonus: 5.0,
            quick_win_pool_min: 3,
            accessibility_gate_min: 40.0,
            mobile_usability_penalty: 15.0,
            https_penalty: 10.0,
            thin_evidence_penalty: 20.0,
            quick_win_limit: 5,
            quick_win_per_evaluator_cap: 2,
            grade_bands: GradeBands::default(),
        }
    }
}

/// Lead-priority rubric configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LeadScoringConfig {
    /// Minimum lead score for the hot tier
    #[serde(rename = "hot-min")]
    pub hot_min: f64,

    /// Minimum lead score for the warm tier
    #[serde(rename = "warm-min")]
    pub warm_min: f64,

    /// Industries this outreach campaign targets (case-insensitive match)
    #[serde(rename = "target-industries", default)]
    pub target_industries: Vec<String>,

    /// Ideal company size range, in employees
    #[serde(rename = "ideal-size-min")]
    pub ideal_size_min: u32,
    #[serde(rename = "ideal-size-max")]
    pub ideal_size_max: u32,
}

impl Default for LeadScoringConfig {
    fn default() -> Self {
        Self {
            hot_min: 70.0,
            warm_min: 40.0,
            target_industries: Vec::new(),
            ideal_size_min: 2,
            ideal_size_max: 50,
        }
    }
}

/// The single retry policy shared by page fetches and model calls
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// First backoff delay; doubles per attempt
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Backoff cap
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
        }
    }
}
