//! Language-model collaborator interface
//!
//! Every AI-backed step (page selection and each of the five evaluators)
//! issues one structured request and expects one response matching a fixed
//! schema. The trait seam keeps the pipeline testable without a live
//! endpoint; schema-validation failures are each step's local failure and
//! never cross the pipeline boundary.

mod client;

pub use client::ChatModelClient;

use crate::ModelError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// One structured request to the model collaborator
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// System-level instructions for this step
    pub instructions: String,

    /// The step's input payload (page listings, evidence digests, ...)
    pub input: String,

    /// Screenshot file references for the visual evaluator, empty otherwise
    pub image_refs: Vec<String>,

    /// Overrides the client's default model (used by the visual evaluator)
    pub model_override: Option<String>,
}

impl ModelRequest {
    pub fn new(instructions: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            input: input.into(),
            image_refs: Vec::new(),
            model_override: None,
        }
    }
}

/// One model response
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub content: String,

    /// Model that actually served the request
    pub model_id: String,
}

/// The model collaborator seam
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;
}

/// Parses a JSON payload out of a model response
///
/// Models routinely wrap JSON in markdown code fences or surround it with
/// prose; this strips a leading fence and otherwise extracts the outermost
/// object before deserializing. Anything that still fails to parse is a
/// schema error for the calling step to absorb.
pub fn parse_json_response<T: DeserializeOwned>(content: &str) -> Result<T, ModelError> {
    let trimmed = content.trim();

    let candidate = if trimmed.starts_with("```") {
        let without_open = trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```");
        without_open.trim_end_matches("```").trim()
    } else {
        trimmed
    };

    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(first_error) => {
            // Fall back to the outermost brace span
            let start = candidate.find('{');
            let end = candidate.rfind('}');
            if let (Some(start), Some(end)) = (start, end) {
                if start < end {
                    return serde_json::from_str(&candidate[start..=end])
                        .map_err(|e| ModelError::Schema(e.to_string()));
                }
            }
            Err(ModelError::Schema(first_error.to_string()))
        }
    }
}
