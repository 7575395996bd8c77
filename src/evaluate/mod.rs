//! Parallel evaluation of crawled evidence
//!
//! Five evaluators (visual, SEO, content, social, accessibility) run as a
//! simultaneous fan-out over the crawl output. Failure handling lives in the
//! coordinator; evidence digestion and response parsing in the evaluators.

pub mod coordinator;
pub mod evaluators;

pub use coordinator::{run_evaluators, EvaluationInputs};
pub use evaluators::{EnrichedContext, Evaluator};
