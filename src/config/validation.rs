use crate::config::types::{
    AnalysisConfig, CrawlConfig, LeadScoringConfig, RetryConfig, ScoringConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &AnalysisConfig) -> Result<(), ConfigError> {
    validate_scoring(&config.scoring)?;
    validate_lead(&config.lead)?;
    validate_crawl(&config.crawl)?;
    validate_retry(&config.retry)?;
    Ok(())
}

/// Validates scoring weights, penalties, and grade bands
fn validate_scoring(config: &ScoringConfig) -> Result<(), ConfigError> {
    let weights = [
        ("design-weight", config.design_weight),
        ("seo-weight", config.seo_weight),
        ("content-weight", config.content_weight),
        ("social-weight", config.social_weight),
    ];

    for (name, weight) in weights {
        if !(0.0..=1.0).contains(&weight) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 0.0 and 1.0, got {}",
                name, weight
            )));
        }
    }

    let sum: f64 = weights.iter().map(|(_, w)| w).sum();
    if (sum - 1.0).abs() > 1e-6 {
        return Err(ConfigError::Validation(format!(
            "composite weights must sum to 1.0, got {}",
            sum
        )));
    }

    for (name, value) in [
        ("quick-win-bonus", config.quick_win_bonus),
        ("mobile-usability-penalty", config.mobile_usability_penalty),
        ("https-penalty", config.https_penalty),
        ("thin-evidence-penalty", config.thin_evidence_penalty),
    ] {
        if value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 0, got {}",
                name, value
            )));
        }
    }

    if !(0.0..=100.0).contains(&config.accessibility_gate_min) {
        return Err(ConfigError::Validation(format!(
            "accessibility-gate-min must be between 0 and 100, got {}",
            config.accessibility_gate_min
        )));
    }

    if config.quick_win_limit == 0 || config.quick_win_per_evaluator_cap == 0 {
        return Err(ConfigError::Validation(
            "quick-win-limit and quick-win-per-evaluator-cap must be >= 1".to_string(),
        ));
    }

    let bands = &config.grade_bands;
    if !(bands.a_min > bands.b_min && bands.b_min > bands.c_min && bands.c_min > bands.d_min) {
        return Err(ConfigError::Validation(format!(
            "grade bands must be strictly decreasing: a={} b={} c={} d={}",
            bands.a_min, bands.b_min, bands.c_min, bands.d_min
        )));
    }
    if bands.d_min < 0.0 || bands.a_min > 100.0 {
        return Err(ConfigError::Validation(
            "grade bands must lie within [0, 100]".to_string(),
        ));
    }

    Ok(())
}

/// Validates the lead-priority tier thresholds and size range
fn validate_lead(config: &LeadScoringConfig) -> Result<(), ConfigError> {
    if config.hot_min <= config.warm_min {
        return Err(ConfigError::Validation(format!(
            "hot-min ({}) must be greater than warm-min ({})",
            config.hot_min, config.warm_min
        )));
    }

    if config.ideal_size_min > config.ideal_size_max {
        return Err(ConfigError::Validation(format!(
            "ideal-size-min ({}) must not exceed ideal-size-max ({})",
            config.ideal_size_min, config.ideal_size_max
        )));
    }

    Ok(())
}

/// Validates crawl viewports and user agent
fn validate_crawl(config: &CrawlConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("desktop-width", config.desktop_width),
        ("desktop-height", config.desktop_height),
        ("mobile-width", config.mobile_width),
        ("mobile-height", config.mobile_height),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the retry policy
fn validate_retry(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.base_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "base-delay-ms ({}) must not exceed max-delay-ms ({})",
            config.base_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}
