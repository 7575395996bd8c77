//! Evaluator findings: issues, quick-win candidates, and scores

use serde::{Deserialize, Serialize};
use std::fmt;

/// Neutral score contributed by a failed evaluator
///
/// Infrastructure failures must not be conflated with genuine site-quality
/// failures, so a failed evaluator contributes this midpoint rather than zero.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// The fixed, closed set of evaluators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorKind {
    Visual,
    Seo,
    Content,
    Social,
    Accessibility,
}

impl EvaluatorKind {
    /// All evaluators in dispatch order
    pub const ALL: [EvaluatorKind; 5] = [
        EvaluatorKind::Visual,
        EvaluatorKind::Seo,
        EvaluatorKind::Content,
        EvaluatorKind::Social,
        EvaluatorKind::Accessibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluatorKind::Visual => "visual",
            EvaluatorKind::Seo => "seo",
            EvaluatorKind::Content => "content",
            EvaluatorKind::Social => "social",
            EvaluatorKind::Accessibility => "accessibility",
        }
    }

    /// Position in dispatch order, used as a deterministic tie-break
    pub fn dispatch_index(&self) -> usize {
        Self::ALL.iter().position(|k| k == self).unwrap_or(0)
    }
}

impl fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

/// Expected impact of a fix, ordered from most to least impactful
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// A single issue reported by an evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    pub severity: Severity,
    pub category: String,

    /// Estimated effort to fix, same scale as quick-win effort
    pub effort: Impact,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,

    /// Evaluator that reported this issue
    #[serde(default = "default_source")]
    pub source: EvaluatorKind,
}

fn default_source() -> EvaluatorKind {
    EvaluatorKind::Content
}

/// A quick-win candidate: a low-effort, high-impact fix surfaced for outreach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickWin {
    pub title: String,
    pub category: String,

    /// Page path the fix applies to
    pub page: String,

    pub impact: Impact,
    pub effort: Impact,

    /// Evaluator that surfaced this candidate
    #[serde(default = "default_source")]
    pub source: EvaluatorKind,
}

/// Visual-evaluator detail: desktop and mobile are assessed separately
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualDetail {
    pub desktop_score: Option<f64>,
    pub mobile_score: Option<f64>,

    /// Mobile usability is flagged as failing outright
    #[serde(default)]
    pub mobile_usability_failing: bool,
}

/// Output of a single evaluator
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatorFinding {
    pub evaluator: EvaluatorKind,

    /// Dimension score in [0, 100]
    pub score: f64,

    /// Ordered issue list, most severe first
    pub issues: Vec<Issue>,

    pub quick_wins: Vec<QuickWin>,

    /// Model id that produced this finding (empty for neutral findings)
    pub model_id: String,

    /// True when the evaluator failed and this is a neutral placeholder
    pub failed: bool,

    /// Present only for the visual evaluator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualDetail>,
}

impl EvaluatorFinding {
    /// The neutral finding recorded when an evaluator fails
    ///
    /// Scores the dimension at the neutral default and carries an explicit
    /// failure flag so downstream consumers can weight confidence.
    pub fn neutral(evaluator: EvaluatorKind, model_id: impl Into<String>) -> Self {
        Self {
            evaluator,
            score: NEUTRAL_SCORE,
            issues: Vec::new(),
            quick_wins: Vec::new(),
            model_id: model_id.into(),
            failed: true,
            visual: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical < Severity::High);
        assert!(Severity::High < Severity::Medium);
        assert!(Severity::Medium < Severity::Low);
    }

    #[test]
    fn test_neutral_finding() {
        let finding = EvaluatorFinding::neutral(EvaluatorKind::Seo, "");
        assert_eq!(finding.score, NEUTRAL_SCORE);
        assert!(finding.failed);
        assert!(finding.issues.is_empty());
        assert!(finding.quick_wins.is_empty());
    }

    #[test]
    fn test_dispatch_index_matches_all_order() {
        for (i, kind) in EvaluatorKind::ALL.iter().enumerate() {
            assert_eq!(kind.dispatch_index(), i);
        }
    }

    #[test]
    fn test_evaluator_kind_serde_lowercase() {
        let json = serde_json::to_string(&EvaluatorKind::Accessibility).unwrap();
        assert_eq!(json, "\"accessibility\"");
    }
}
