//! The analysis pipeline: discovery, selection, crawl, evaluation, aggregation
//!
//! Stages run strictly sequentially; concurrency lives inside the crawl pool
//! and the evaluator fan-out. Every stage degrades rather than aborting —
//! the sole hard failure is a crawl that produces zero usable pages.

use crate::aggregate::{aggregate, AggregationInputs};
use crate::config::AnalysisConfig;
use crate::crawl::{build_http_client, crawl_pages, BrowserCapturer, DisabledCapturer, ScreenshotCapturer};
use crate::discovery::discover;
use crate::evaluate::{run_evaluators, EvaluationInputs};
use crate::llm::{ChatModelClient, ModelClient};
use crate::model::{
    AggregatedResult, AnalysisOptions, AnalysisRequest, BusinessContext, EvaluatorKind,
    ProgressCallback, ProgressEvent, RunCounters, Stage, StageDegradation,
};
use crate::retry::RetryPolicy;
use crate::selection::select_pages;
use crate::{AnalysisError, Result};
use chrono::Utc;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

/// Invokes the progress callback, swallowing any panic it raises
///
/// The callback is caller-supplied and untrusted; a panic inside it must not
/// take down the run.
pub(crate) fn emit_progress(on_progress: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(callback) = on_progress {
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| callback(&event)));
        if outcome.is_err() {
            warn!("Progress callback panicked, continuing without it");
        }
    }
}

/// One configured analysis pipeline
///
/// Holds the shared HTTP client, model client, screenshot capturer, and retry
/// policy. Cheap to reuse across runs; each run produces one immutable
/// [`AggregatedResult`] and performs no writes of its own.
pub struct Pipeline {
    config: AnalysisConfig,
    model: Arc<dyn ModelClient>,
    capturer: Arc<dyn ScreenshotCapturer>,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl Pipeline {
    /// Builds a pipeline from explicit collaborators
    pub fn new(
        config: AnalysisConfig,
        model: Arc<dyn ModelClient>,
        capturer: Arc<dyn ScreenshotCapturer>,
    ) -> Result<Self> {
        let retry = RetryPolicy::new(&config.retry);
        let http = build_http_client(&config.crawl)?;

        Ok(Self {
            config,
            model,
            capturer,
            http,
            retry,
        })
    }

    /// Builds a pipeline with the default model client and a headless browser
    ///
    /// The API key comes from the environment variable named in the config.
    /// When no browser can be launched, screenshots are disabled and the run
    /// proceeds on HTML evidence alone.
    pub async fn from_config(config: AnalysisConfig) -> Result<Self> {
        let retry = RetryPolicy::new(&config.retry);
        let model: Arc<dyn ModelClient> =
            Arc::new(ChatModelClient::from_env(&config.model, retry.clone())?);

        let capturer: Arc<dyn ScreenshotCapturer> = match BrowserCapturer::launch().await {
            Ok(browser) => Arc::new(browser),
            Err(e) => {
                warn!("Browser launch failed ({}), running without screenshots", e);
                Arc::new(DisabledCapturer)
            }
        };

        Self::new(config, model, capturer)
    }

    /// Runs one full analysis
    ///
    /// Returns the aggregated result, or [`AnalysisError::CrawlTotalFailure`]
    /// when zero pages could be crawled. Every other degradation is recorded
    /// inside the result.
    pub async fn run(&self, request: AnalysisRequest) -> Result<AggregatedResult> {
        let options = &request.options;
        let on_progress = options.on_progress.clone();
        let mut degradations: Vec<StageDegradation> = Vec::new();

        info!(url = %request.url, company = %request.context.company_name, "Analysis started");

        // Discovery
        emit_progress(
            &on_progress,
            ProgressEvent::DiscoveryStarted {
                url: request.url.to_string(),
            },
        );
        let started = Instant::now();
        let sitemap = discover(
            &self.http,
            &request.url,
            Duration::from_millis(options.per_page_timeout_ms),
        )
        .await;
        let discovery_ms = started.elapsed().as_millis() as u64;

        if sitemap.used_fallback {
            degradations.push(StageDegradation {
                stage: Stage::Discovery,
                reason: format!(
                    "sitemap discovery found no pages, using fallback set ({})",
                    sitemap.errors.join("; ")
                ),
            });
        }
        emit_progress(
            &on_progress,
            ProgressEvent::DiscoveryCompleted {
                pages: sitemap.paths.len(),
                used_fallback: sitemap.used_fallback,
            },
        );

        // Selection
        let started = Instant::now();
        let selection = select_pages(
            self.model.as_ref(),
            &sitemap,
            &request.context,
            options.max_pages_per_concern,
        )
        .await;
        let selection_ms = started.elapsed().as_millis() as u64;

        if selection.used_fallback {
            degradations.push(StageDegradation {
                stage: Stage::Selection,
                reason: format!("page selector degraded: {}", selection.rationale),
            });
        }
        emit_progress(
            &on_progress,
            ProgressEvent::SelectionCompleted {
                unique_pages: selection.crawl_set.len(),
                used_fallback: selection.used_fallback,
            },
        );

        // Crawl
        let started = Instant::now();
        let outcome = crawl_pages(
            &self.http,
            Arc::clone(&self.capturer),
            &self.config.crawl,
            &request.url,
            &selection.crawl_set,
            options.crawl_concurrency,
            options.per_page_timeout_ms,
            &self.retry,
            on_progress.clone(),
        )
        .await;
        let crawl_ms = started.elapsed().as_millis() as u64;

        emit_progress(
            &on_progress,
            ProgressEvent::CrawlCompleted {
                succeeded: outcome.succeeded(),
                failed: outcome.failures.len(),
            },
        );

        if outcome.succeeded() == 0 {
            return Err(AnalysisError::CrawlTotalFailure {
                attempted: selection.crawl_set.len(),
                failures: outcome.failures,
            });
        }

        for failure in &outcome.failures {
            degradations.push(StageDegradation {
                stage: Stage::Crawl,
                reason: format!("page {} failed: {}", failure.path, failure.reason),
            });
        }
        for warning in &outcome.warnings {
            degradations.push(StageDegradation {
                stage: Stage::Crawl,
                reason: warning.clone(),
            });
        }

        // Evaluation
        let started = Instant::now();
        let findings = run_evaluators(
            self.model.as_ref(),
            EvaluationInputs {
                pages: &outcome.pages,
                selection: &selection,
                context: &request.context,
                custom_prompts: &options.custom_evaluator_prompts,
                per_evaluator_timeout_ms: options.per_evaluator_timeout_ms,
                visual_model: Some(self.config.model.visual_model()),
                on_progress: on_progress.clone(),
            },
        )
        .await;
        let evaluation_ms = started.elapsed().as_millis() as u64;

        for finding in findings.iter().filter(|f| f.failed) {
            degradations.push(StageDegradation {
                stage: Stage::Evaluation,
                reason: format!(
                    "{} evaluator failed, neutral finding substituted",
                    finding.evaluator
                ),
            });
        }

        // Aggregation
        let https = outcome
            .pages
            .iter()
            .any(|page| page.success && page.signals.https);
        let counters = RunCounters {
            // One selection call plus one call per evaluator
            model_calls: 1 + EvaluatorKind::ALL.len() as u32,
            pages_requested: selection.crawl_set.len(),
            pages_crawled: outcome.succeeded(),
            pages_failed: outcome.failures.len(),
            discovery_ms,
            selection_ms,
            crawl_ms,
            evaluation_ms,
            finished_at: Utc::now(),
        };

        let result = aggregate(
            AggregationInputs {
                target_url: request.url.as_str(),
                findings: &findings,
                context: &request.context,
                https,
                successful_pages: outcome.succeeded(),
                counters,
                degradations,
            },
            &self.config.scoring,
            &self.config.lead,
        );

        emit_progress(
            &on_progress,
            ProgressEvent::AggregationCompleted {
                composite_score: result.composite_score,
            },
        );

        info!(
            composite = result.composite_score,
            grade = %result.grade,
            "Analysis finished"
        );

        Ok(result)
    }
}

/// Runs one analysis end to end with default collaborators
///
/// Convenience entry point: validates the URL, builds a pipeline from the
/// config, and runs it once.
pub async fn run_analysis(
    config: AnalysisConfig,
    url: &str,
    context: BusinessContext,
    options: AnalysisOptions,
) -> Result<AggregatedResult> {
    let url = parse_target_url(url)?;
    let pipeline = Pipeline::from_config(config).await?;
    pipeline
        .run(AnalysisRequest {
            url,
            context,
            options,
        })
        .await
}

/// Parses and validates an analysis target
pub fn parse_target_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| AnalysisError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AnalysisError::InvalidUrl {
            url: raw.to_string(),
            message: format!("unsupported scheme: {}", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(AnalysisError::InvalidUrl {
            url: raw.to_string(),
            message: "missing host".to_string(),
        });
    }

    Ok(url)
}
