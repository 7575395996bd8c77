//! Lead-priority rubric
//!
//! A 0-100 score estimating how worth contacting this prospect is,
//! independent of the website-quality composite: a terrible site owned by an
//! engaged, well-funded business in a target industry is a hot lead. Unknown
//! prior signals score the neutral midpoint so absence of data never sinks or
//! inflates a lead.

use crate::config::LeadScoringConfig;
use crate::model::{BusinessContext, LeadComponents, LeadPriority, LeadTier, SignalLevel};

const NEUTRAL: f64 = 50.0;

/// Composite below this counts as a broken site for urgency purposes
const BROKEN_SITE_THRESHOLD: f64 = 40.0;

/// Scores a prospect from the finished quality composite and prior signals
pub fn score_lead(
    composite_score: f64,
    context: &BusinessContext,
    config: &LeadScoringConfig,
) -> LeadPriority {
    let signals = context.prior_signals.as_ref();

    let quality_gap = (100.0 - composite_score).clamp(0.0, 100.0);

    let broken = composite_score < BROKEN_SITE_THRESHOLD;
    let recent_activity = signals.map(|s| s.recent_activity).unwrap_or(false);
    let urgency = match (broken, recent_activity) {
        (true, true) => 90.0,
        (true, false) => 60.0,
        (false, true) => 40.0,
        (false, false) => 20.0,
    };

    let budget = signals
        .and_then(|s| s.budget_likelihood)
        .map(level_score)
        .unwrap_or(NEUTRAL);

    let industry_fit = if config.target_industries.is_empty() {
        NEUTRAL
    } else if config
        .target_industries
        .iter()
        .any(|target| target.eq_ignore_ascii_case(&context.industry))
    {
        90.0
    } else {
        30.0
    };

    let size_fit = match signals.and_then(|s| s.employee_count) {
        Some(count) if count >= config.ideal_size_min && count <= config.ideal_size_max => 90.0,
        Some(_) => 40.0,
        None => NEUTRAL,
    };

    let engagement = signals
        .and_then(|s| s.engagement)
        .map(level_score)
        .unwrap_or(NEUTRAL);

    let components = LeadComponents {
        quality_gap,
        urgency,
        budget,
        industry_fit,
        size_fit,
        engagement,
    };

    let score = (quality_gap + urgency + budget + industry_fit + size_fit + engagement) / 6.0;
    let score = score.clamp(0.0, 100.0);

    let tier = if score >= config.hot_min {
        LeadTier::Hot
    } else if score >= config.warm_min {
        LeadTier::Warm
    } else {
        LeadTier::Cold
    };

    LeadPriority {
        score,
        tier,
        components,
    }
}

fn level_score(level: SignalLevel) -> f64 {
    match level {
        SignalLevel::High => 90.0,
        SignalLevel::Medium => 60.0,
        SignalLevel::Low => 30.0,
    }
}
