//! Shared data model for the analysis pipeline
//!
//! Every stage of the pipeline produces exactly one immutable value consumed
//! by the next stage: discovery produces a [`DiscoveredSitemap`], selection a
//! [`PageSelection`], crawling a list of [`CrawledPage`]s, evaluation a set of
//! [`EvaluatorFinding`]s, and aggregation the final [`AggregatedResult`].
//! Nothing in this module is mutated in place after construction.

mod finding;
mod pages;
mod request;
mod result;

pub use finding::{
    EvaluatorFinding, EvaluatorKind, Impact, Issue, QuickWin, Severity, VisualDetail,
    NEUTRAL_SCORE,
};
pub use pages::{
    CrawledPage, DiscoveredSitemap, PageFailure, PageSelection, PageSignals,
};
pub use request::{
    AnalysisOptions, AnalysisRequest, BusinessContext, Concern, PriorSignals, ProgressCallback,
    ProgressEvent, SignalLevel,
};
pub use result::{
    AggregatedResult, DimensionScores, Grade, GradeBands, LeadComponents, LeadPriority, LeadTier,
    RunCounters, Stage, StageDegradation,
};
