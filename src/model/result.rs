//! The final aggregated analysis result

use crate::model::finding::{Issue, QuickWin};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter grade mapped from the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Maps a clamped composite score to a grade via fixed bands:
    /// A [85,100], B [70,85), C [55,70), D [40,55), F [0,40)
    pub fn from_score(score: f64, bands: &GradeBands) -> Self {
        if score >= bands.a_min {
            Grade::A
        } else if score >= bands.b_min {
            Grade::B
        } else if score >= bands.c_min {
            Grade::C
        } else if score >= bands.d_min {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

/// Lower bounds of the letter-grade bands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeBands {
    #[serde(rename = "a-min", default = "default_a_min")]
    pub a_min: f64,
    #[serde(rename = "b-min", default = "default_b_min")]
    pub b_min: f64,
    #[serde(rename = "c-min", default = "default_c_min")]
    pub c_min: f64,
    #[serde(rename = "d-min", default = "default_d_min")]
    pub d_min: f64,
}

fn default_a_min() -> f64 {
    85.0
}
fn default_b_min() -> f64 {
    70.0
}
fn default_c_min() -> f64 {
    55.0
}
fn default_d_min() -> f64 {
    40.0
}

impl Default for GradeBands {
    fn default() -> Self {
        Self {
            a_min: default_a_min(),
            b_min: default_b_min(),
            c_min: default_c_min(),
            d_min: default_d_min(),
        }
    }
}

/// Per-dimension scores
///
/// Accessibility is reported here but excluded from the composite; it gates
/// bonuses and penalties instead.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionScores {
    pub design: f64,
    pub seo: f64,
    pub content: f64,
    pub social: f64,
    pub accessibility: f64,
}

/// Outreach tier derived from the lead-priority score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadTier {
    Hot,
    Warm,
    Cold,
}

/// Component breakdown of the lead-priority rubric (each in [0, 100])
#[derive(Debug, Clone, Serialize)]
pub struct LeadComponents {
    pub quality_gap: f64,
    pub urgency: f64,
    pub budget: f64,
    pub industry_fit: f64,
    pub size_fit: f64,
    pub engagement: f64,
}

/// Lead-priority score: how worth contacting this prospect is
///
/// Independent of the website-quality composite; consumed by the downstream
/// outreach stage for ranking.
#[derive(Debug, Clone, Serialize)]
pub struct LeadPriority {
    pub score: f64,
    pub tier: LeadTier,
    pub components: LeadComponents,
}

/// Pipeline stages for degradation reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Discovery,
    Selection,
    Crawl,
    Evaluation,
}

/// A stage that completed via fallback or lost part of its input
#[derive(Debug, Clone, Serialize)]
pub struct StageDegradation {
    pub stage: Stage,
    pub reason: String,
}

/// Cost and time counters for one run
#[derive(Debug, Clone, Serialize)]
pub struct RunCounters {
    pub model_calls: u32,
    pub pages_requested: usize,
    pub pages_crawled: usize,
    pub pages_failed: usize,
    pub discovery_ms: u64,
    pub selection_ms: u64,
    pub crawl_ms: u64,
    pub evaluation_ms: u64,
    pub finished_at: DateTime<Utc>,
}

/// The single immutable result of one analysis run
///
/// Aggregation cannot fail: every missing or degraded input is annotated in
/// `degradations` rather than raised, so downstream consumers can weight
/// confidence without reading logs.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedResult {
    pub target_url: String,

    /// Weighted composite in [0, 100], always present
    pub composite_score: f64,

    pub grade: Grade,
    pub dimension_scores: DimensionScores,

    /// Merged, deduplicated issues ordered by severity
    pub issues: Vec<Issue>,

    /// Top-5 diversified quick wins (at most 2 per evaluator)
    pub quick_wins: Vec<QuickWin>,

    pub lead_priority: LeadPriority,

    pub counters: RunCounters,

    /// Machine-readable list of which stages degraded and why
    pub degradations: Vec<StageDegradation>,
}
