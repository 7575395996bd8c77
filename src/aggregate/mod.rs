//! Results aggregation: scores, grade, quick wins, and lead priority
//!
//! Aggregation never fails. Every degraded input was already replaced with a
//! neutral placeholder upstream, so this stage is pure deterministic
//! computation over whatever evidence survived, in a fixed order: dimension
//! scores, weighted composite, bonus and penalties, clamp, grade, quick-win
//! selection, lead priority.

pub mod lead;
pub mod quick_wins;

pub use lead::score_lead;
pub use quick_wins::{pooled_quick_wins, select_quick_wins};

use crate::config::{LeadScoringConfig, ScoringConfig};
use crate::model::{
    AggregatedResult, BusinessContext, DimensionScores, EvaluatorFinding, EvaluatorKind, Grade,
    Issue, RunCounters, StageDegradation, NEUTRAL_SCORE,
};
use tracing::info;

/// Everything the aggregator needs from the earlier stages
pub struct AggregationInputs<'a> {
    pub target_url: &'a str,
    pub findings: &'a [EvaluatorFinding],
    pub context: &'a BusinessContext,

    /// Any crawled page was served over HTTPS
    pub https: bool,

    /// Pages that crawled successfully
    pub successful_pages: usize,

    pub counters: RunCounters,
    pub degradations: Vec<StageDegradation>,
}

/// Computes the final result from the evaluator findings
pub fn aggregate(
    inputs: AggregationInputs<'_>,
    scoring: &ScoringConfig,
    lead: &LeadScoringConfig,
) -> AggregatedResult {
    let dimension_scores = compute_dimensions(inputs.findings);

    let mut composite = scoring.design_weight * dimension_scores.design
        + scoring.seo_weight * dimension_scores.seo
        + scoring.content_weight * dimension_scores.content
        + scoring.social_weight * dimension_scores.social;

    // Accessibility stays out of the composite but gates the bonus: a site
    // scoring below the accessibility floor does not earn quick-win credit
    let pool = pooled_quick_wins(inputs.findings);
    if pool.len() >= scoring.quick_win_pool_min
        && dimension_scores.accessibility >= scoring.accessibility_gate_min
    {
        composite += scoring.quick_win_bonus;
    }

    if mobile_usability_failing(inputs.findings) {
        composite -= scoring.mobile_usability_penalty;
    }
    if !inputs.https {
        composite -= scoring.https_penalty;
    }
    // Thin evidence: at most one usable page means the dimension scores rest
    // on a single data point
    if inputs.successful_pages <= 1 {
        composite -= scoring.thin_evidence_penalty;
    }

    let composite = composite.clamp(0.0, 100.0);
    let grade = Grade::from_score(composite, &scoring.grade_bands);

    let quick_wins = select_quick_wins(
        &pool,
        scoring.quick_win_limit,
        scoring.quick_win_per_evaluator_cap,
    );
    let issues = merged_issues(inputs.findings);
    let lead_priority = score_lead(composite, inputs.context, lead);

    info!(
        composite,
        grade = %grade,
        issues = issues.len(),
        quick_wins = quick_wins.len(),
        lead_score = lead_priority.score,
        "Aggregation completed"
    );

    AggregatedResult {
        target_url: inputs.target_url.to_string(),
        composite_score: composite,
        grade,
        dimension_scores,
        issues,
        quick_wins,
        lead_priority,
        counters: inputs.counters,
        degradations: inputs.degradations,
    }
}

/// Per-dimension scores, one per evaluator
///
/// The design dimension averages the visual evaluator's desktop and mobile
/// scores when both were reported; a single viewport stands alone. A missing
/// finding scores neutral, same as a failed one.
fn compute_dimensions(findings: &[EvaluatorFinding]) -> DimensionScores {
    let score_of = |kind: EvaluatorKind| -> f64 {
        findings
            .iter()
            .find(|f| f.evaluator == kind)
            .map(|f| f.score)
            .unwrap_or(NEUTRAL_SCORE)
    };

    let design = findings
        .iter()
        .find(|f| f.evaluator == EvaluatorKind::Visual)
        .map(|finding| match &finding.visual {
            Some(detail) => match (detail.desktop_score, detail.mobile_score) {
                (Some(desktop), Some(mobile)) => (desktop + mobile) / 2.0,
                (Some(single), None) | (None, Some(single)) => single,
                (None, None) => finding.score,
            },
            None => finding.score,
        })
        .unwrap_or(NEUTRAL_SCORE);

    DimensionScores {
        design,
        seo: score_of(EvaluatorKind::Seo),
        content: score_of(EvaluatorKind::Content),
        social: score_of(EvaluatorKind::Social),
        accessibility: score_of(EvaluatorKind::Accessibility),
    }
}

fn mobile_usability_failing(findings: &[EvaluatorFinding]) -> bool {
    findings
        .iter()
        .find(|f| f.evaluator == EvaluatorKind::Visual)
        .and_then(|f| f.visual.as_ref())
        .map(|detail| detail.mobile_usability_failing)
        .unwrap_or(false)
}

/// Merges every evaluator's issues, dropping duplicates from the same
/// evaluator and ordering by severity, then dispatch order
fn merged_issues(findings: &[EvaluatorFinding]) -> Vec<Issue> {
    let mut issues: Vec<Issue> = Vec::new();
    let mut seen: Vec<(EvaluatorKind, String)> = Vec::new();

    for finding in findings {
        for issue in &finding.issues {
            let key = (issue.source, issue.title.to_lowercase());
            if !seen.contains(&key) {
                seen.push(key);
                issues.push(issue.clone());
            }
        }
    }

    issues.sort_by_key(|issue| (issue.severity, issue.source.dispatch_index()));
    issues
}
