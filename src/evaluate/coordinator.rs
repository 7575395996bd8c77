//! Evaluator fan-out
//!
//! All five evaluators are dispatched simultaneously and awaited together;
//! there is no inter-evaluator ordering and no shared budget. Each call is
//! independently timed out, and any failure collapses to a neutral finding so
//! one degraded dimension never poisons the rest of the run.

use crate::evaluate::evaluators::{EnrichedContext, Evaluator};
use crate::llm::ModelClient;
use crate::model::{
    BusinessContext, Concern, CrawledPage, EvaluatorFinding, EvaluatorKind, PageSelection,
    ProgressCallback, ProgressEvent,
};
use crate::pipeline::emit_progress;
use futures::future::join_all;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Inputs shared by every evaluator in one run
pub struct EvaluationInputs<'a> {
    pub pages: &'a [CrawledPage],
    pub selection: &'a PageSelection,
    pub context: &'a BusinessContext,
    pub custom_prompts: &'a HashMap<EvaluatorKind, String>,
    pub per_evaluator_timeout_ms: u64,
    pub visual_model: Option<&'a str>,
    pub on_progress: Option<ProgressCallback>,
}

/// Runs the full evaluator set over the crawled pages
///
/// Returns exactly one finding per [`EvaluatorKind`], in dispatch order. A
/// timeout, transport failure, or schema failure yields a neutral finding for
/// that evaluator, flagged as failed; the run never aborts here.
pub async fn run_evaluators(
    model: &dyn ModelClient,
    inputs: EvaluationInputs<'_>,
) -> Vec<EvaluatorFinding> {
    let EvaluationInputs {
        pages,
        selection,
        context,
        custom_prompts,
        per_evaluator_timeout_ms,
        visual_model,
        on_progress,
    } = inputs;

    let enriched = EnrichedContext::enrich(context, pages);
    let timeout = Duration::from_millis(per_evaluator_timeout_ms);

    let tasks = EvaluatorKind::ALL.into_iter().map(|kind| {
        let enriched = &enriched;
        let on_progress = on_progress.clone();
        async move {
            let partition = partition_pages(kind, pages, selection);
            let evaluator = Evaluator::new(kind);
            let instructions = custom_prompts.get(&kind).map(String::as_str);

            let outcome = tokio::time::timeout(
                timeout,
                evaluator.evaluate(model, &partition, enriched, instructions, visual_model),
            )
            .await;

            let finding = match outcome {
                Ok(Ok(finding)) => {
                    debug!(evaluator = %kind, score = finding.score, "Evaluator completed");
                    finding
                }
                Ok(Err(error)) => {
                    warn!(evaluator = %kind, %error, "Evaluator failed, recording neutral finding");
                    EvaluatorFinding::neutral(kind, "")
                }
                Err(_) => {
                    warn!(
                        evaluator = %kind,
                        timeout_ms = per_evaluator_timeout_ms,
                        "Evaluator timed out, recording neutral finding"
                    );
                    EvaluatorFinding::neutral(kind, "")
                }
            };

            emit_progress(
                &on_progress,
                ProgressEvent::EvaluatorCompleted {
                    evaluator: kind,
                    failed: finding.failed,
                },
            );

            finding
        }
    });

    join_all(tasks).await
}

/// Successful pages this evaluator should see
///
/// Concern-specific evaluators see their selected pages; accessibility sees
/// the full crawl set. A concern whose selected pages all failed to crawl
/// falls back to every successful page rather than running on nothing.
fn partition_pages<'a>(
    kind: EvaluatorKind,
    pages: &'a [CrawledPage],
    selection: &PageSelection,
) -> Vec<&'a CrawledPage> {
    let successful: Vec<&CrawledPage> = pages.iter().filter(|p| p.success).collect();

    let concern = match kind {
        EvaluatorKind::Visual => Concern::Visual,
        EvaluatorKind::Seo => Concern::Seo,
        EvaluatorKind::Content => Concern::Content,
        EvaluatorKind::Social => Concern::Social,
        EvaluatorKind::Accessibility => return successful,
    };

    let selected = selection.for_concern(concern);
    let partition: Vec<&CrawledPage> = successful
        .iter()
        .filter(|page| selected.contains(&page.path))
        .copied()
        .collect();

    if partition.is_empty() {
        successful
    } else {
        partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ModelRequest, ModelResponse};
    use crate::model::PageSignals;
    use crate::ModelError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Responds per evaluator by matching on the instruction text
    struct ScriptedModel {
        responses: Mutex<HashMap<&'static str, String>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(responses: Vec<(&'static str, &str)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(marker, body)| (marker, body.to_string()))
                        .collect(),
                ),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let responses = self.responses.lock().unwrap();
            for (marker, body) in responses.iter() {
                if request.instructions.contains(marker) {
                    return Ok(ModelResponse {
                        content: body.clone(),
                        model_id: "scripted".to_string(),
                    });
                }
            }
            Err(ModelError::Empty)
        }
    }

    /// Stalls on one marker before delegating, to provoke the per-call timeout
    struct StallingModel {
        inner: ScriptedModel,
        stall_marker: &'static str,
        stall: Duration,
    }

    #[async_trait]
    impl ModelClient for StallingModel {
        async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
            if request.instructions.contains(self.stall_marker) {
                tokio::time::sleep(self.stall).await;
            }
            self.inner.complete(request).await
        }
    }

    fn create_test_page(path: &str) -> CrawledPage {
        CrawledPage {
            path: path.to_string(),
            url: format!("https://example.com{}", path),
            success: true,
            html: Some("<html><body>content</body></html>".to_string()),
            desktop_screenshot: None,
            mobile_screenshot: None,
            signals: PageSignals::default(),
            error: None,
        }
    }

    fn create_test_selection(paths: &[&str]) -> PageSelection {
        let list: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        PageSelection::from_concern_lists(|_| list.clone(), String::new(), false)
    }

    fn inputs<'a>(
        pages: &'a [CrawledPage],
        selection: &'a PageSelection,
        context: &'a BusinessContext,
        custom_prompts: &'a HashMap<EvaluatorKind, String>,
    ) -> EvaluationInputs<'a> {
        EvaluationInputs {
            pages,
            selection,
            context,
            custom_prompts,
            per_evaluator_timeout_ms: 5_000,
            visual_model: None,
            on_progress: None,
        }
    }

    #[tokio::test]
    async fn test_one_finding_per_evaluator_in_dispatch_order() {
        let model = ScriptedModel::new(vec![
            ("visual design", r#"{"desktop_score": 80, "mobile_score": 70}"#),
            ("search-engine", r#"{"score": 60}"#),
            ("content quality", r#"{"score": 55}"#),
            ("social presence", r#"{"score": 40}"#),
            ("accessibility", r#"{"score": 65}"#),
        ]);
        let pages = vec![create_test_page("/"), create_test_page("/about")];
        let selection = create_test_selection(&["/", "/about"]);
        let context = BusinessContext::new("Acme", "plumbing");
        let prompts = HashMap::new();

        let findings =
            run_evaluators(&model, inputs(&pages, &selection, &context, &prompts)).await;

        assert_eq!(findings.len(), 5);
        for (finding, kind) in findings.iter().zip(EvaluatorKind::ALL) {
            assert_eq!(finding.evaluator, kind);
            assert!(!finding.failed);
        }
        assert_eq!(findings[0].score, 75.0);
        assert_eq!(model.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_single_failure_yields_neutral_without_poisoning_others() {
        // No scripted response for the SEO evaluator: it errors out
        let model = ScriptedModel::new(vec![
            ("visual design", r#"{"score": 80}"#),
            ("content quality", r#"{"score": 55}"#),
            ("social presence", r#"{"score": 40}"#),
            ("accessibility", r#"{"score": 65}"#),
        ]);
        let pages = vec![create_test_page("/")];
        let selection = create_test_selection(&["/"]);
        let context = BusinessContext::new("Acme", "plumbing");
        let prompts = HashMap::new();

        let findings =
            run_evaluators(&model, inputs(&pages, &selection, &context, &prompts)).await;

        let seo = &findings[EvaluatorKind::Seo.dispatch_index()];
        assert!(seo.failed);
        assert_eq!(seo.score, crate::model::NEUTRAL_SCORE);

        let others_failed = findings
            .iter()
            .filter(|f| f.evaluator != EvaluatorKind::Seo)
            .any(|f| f.failed);
        assert!(!others_failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_evaluator_yields_neutral_without_cancelling_siblings() {
        let model = StallingModel {
            inner: ScriptedModel::new(vec![
                ("visual design", r#"{"score": 80}"#),
                ("search-engine", r#"{"score": 70}"#),
                ("content quality", r#"{"score": 55}"#),
                ("social presence", r#"{"score": 40}"#),
                ("accessibility", r#"{"score": 65}"#),
            ]),
            stall_marker: "search-engine",
            stall: Duration::from_secs(10),
        };
        let pages = vec![create_test_page("/")];
        let selection = create_test_selection(&["/"]);
        let context = BusinessContext::new("Acme", "plumbing");
        let prompts = HashMap::new();

        let mut evaluation_inputs = inputs(&pages, &selection, &context, &prompts);
        evaluation_inputs.per_evaluator_timeout_ms = 100;

        let findings = run_evaluators(&model, evaluation_inputs).await;

        let seo = &findings[EvaluatorKind::Seo.dispatch_index()];
        assert!(seo.failed);
        assert_eq!(seo.score, crate::model::NEUTRAL_SCORE);

        // The stalled call never delays or degrades the other four
        assert_eq!(findings.len(), 5);
        for finding in findings.iter().filter(|f| f.evaluator != EvaluatorKind::Seo) {
            assert!(!finding.failed);
        }
        assert_eq!(
            findings[EvaluatorKind::Visual.dispatch_index()].score,
            80.0
        );
    }

    #[tokio::test]
    async fn test_custom_prompt_overrides_instructions() {
        // The scripted marker only matches the custom instruction text
        let model = ScriptedModel::new(vec![
            ("visual design", r#"{"score": 80}"#),
            ("my custom seo prompt", r#"{"score": 99}"#),
            ("content quality", r#"{"score": 55}"#),
            ("social presence", r#"{"score": 40}"#),
            ("accessibility", r#"{"score": 65}"#),
        ]);
        let pages = vec![create_test_page("/")];
        let selection = create_test_selection(&["/"]);
        let context = BusinessContext::new("Acme", "plumbing");
        let mut prompts = HashMap::new();
        prompts.insert(EvaluatorKind::Seo, "my custom seo prompt".to_string());

        let findings =
            run_evaluators(&model, inputs(&pages, &selection, &context, &prompts)).await;

        assert_eq!(findings[EvaluatorKind::Seo.dispatch_index()].score, 99.0);
    }

    #[test]
    fn test_partition_falls_back_when_selected_pages_all_failed() {
        let pages = vec![
            create_test_page("/"),
            CrawledPage::failed(
                "/pricing".to_string(),
                "https://example.com/pricing".to_string(),
                "timeout".to_string(),
            ),
        ];
        // SEO selected only the page that failed to crawl
        let selection = PageSelection::from_concern_lists(
            |concern| match concern {
                Concern::Seo => vec!["/pricing".to_string()],
                _ => vec!["/".to_string()],
            },
            String::new(),
            false,
        );

        let partition = partition_pages(EvaluatorKind::Seo, &pages, &selection);
        assert_eq!(partition.len(), 1);
        assert_eq!(partition[0].path, "/");
    }

    #[test]
    fn test_accessibility_sees_full_successful_set() {
        let pages = vec![
            create_test_page("/"),
            create_test_page("/about"),
            create_test_page("/contact"),
        ];
        // Selection only covers the homepage
        let selection = create_test_selection(&["/"]);

        let partition = partition_pages(EvaluatorKind::Accessibility, &pages, &selection);
        assert_eq!(partition.len(), 3);
    }
}
