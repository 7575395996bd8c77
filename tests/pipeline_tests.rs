//! End-to-end pipeline tests
//!
//! These tests run the full analysis against a wiremock HTTP server and a
//! scripted model client, with screenshots disabled.

use async_trait::async_trait;
use sitegauge::config::AnalysisConfig;
use sitegauge::crawl::DisabledCapturer;
use sitegauge::llm::{ModelClient, ModelRequest, ModelResponse};
use sitegauge::model::{
    AnalysisOptions, AnalysisRequest, BusinessContext, Grade, ProgressEvent, Stage,
};
use sitegauge::{AnalysisError, ModelError, Pipeline};
use std::sync::{Arc, Mutex};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Replies based on marker strings in the request instructions
struct ScriptedModel {
    rules: Vec<(&'static str, String)>,
}

impl ScriptedModel {
    fn new(rules: Vec<(&'static str, &str)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(marker, body)| (marker, body.to_string()))
                .collect(),
        }
    }

    /// Selection plus all five evaluators, fixed scores 80/70/60/90/50
    fn standard() -> Self {
        Self::new(vec![
            (
                "select website pages",
                r#"{"visual": ["/"], "seo": ["/about"], "content": ["/services"],
                    "social": ["/contact"], "rationale": "test selection"}"#,
            ),
            ("visual design", r#"{"desktop_score": 80, "mobile_score": 80}"#),
            ("search-engine", r#"{"score": 70}"#),
            ("content quality", r#"{"score": 60}"#),
            ("social presence", r#"{"score": 90}"#),
            ("accessibility", r#"{"score": 50}"#),
        ])
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        for (marker, body) in &self.rules {
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

fn create_test_config() -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    // Single attempt keeps failure tests fast
    config.retry.max_attempts = 1;
    config.retry.base_delay_ms = 1;
    config
}

fn create_test_pipeline(model: ScriptedModel) -> Pipeline {
    Pipeline::new(
        create_test_config(),
        Arc::new(model),
        Arc::new(DisabledCapturer),
    )
    .expect("pipeline should build")
}

fn create_test_request(base_url: &str, options: AnalysisOptions) -> AnalysisRequest {
    AnalysisRequest {
        url: Url::parse(base_url).expect("mock server URL should parse"),
        context: BusinessContext::new("Acme Plumbing", "plumbing"),
        options,
    }
}

const PAGE_HTML: &str = r#"<html><head>
    <title>Acme Plumbing</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Plumbing services">
</head><body><h1>Acme Plumbing</h1><p>We fix pipes.</p></body></html>"#;

/// Mounts 404s for robots.txt and sitemap.xml so discovery uses its fallback
async fn mount_no_discovery(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_path: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_HTML))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_with_fallback_discovery() {
    let server = MockServer::start().await;
    mount_no_discovery(&server).await;
    for page_path in ["/", "/about", "/services", "/contact", "/blog"] {
        mount_page(&server, page_path).await;
    }

    let pipeline = create_test_pipeline(ScriptedModel::standard());
    let result = pipeline
        .run(create_test_request(&server.uri(), AnalysisOptions::default()))
        .await
        .expect("run should succeed");

    // 0.3*80 + 0.3*70 + 0.2*60 + 0.2*90 = 75, minus 10 for plain http
    assert!((result.composite_score - 65.0).abs() < 1e-9);
    assert_eq!(result.grade, Grade::C);
    assert_eq!(result.dimension_scores.design, 80.0);
    assert_eq!(result.dimension_scores.accessibility, 50.0);

    // Discovery fell back, and that is the only degradation
    assert!(result
        .degradations
        .iter()
        .any(|d| d.stage == Stage::Discovery));
    assert!(!result
        .degradations
        .iter()
        .any(|d| d.stage == Stage::Evaluation));

    assert_eq!(result.counters.pages_crawled, 4);
    assert_eq!(result.counters.pages_failed, 0);
    assert_eq!(result.counters.model_calls, 6);
}

#[tokio::test]
async fn test_selection_model_failure_uses_fallback_for_every_concern() {
    let server = MockServer::start().await;
    mount_no_discovery(&server).await;
    for page_path in ["/", "/about", "/services", "/contact", "/blog"] {
        mount_page(&server, page_path).await;
    }

    // No selection rule: the selector model call fails
    let model = ScriptedModel::new(vec![
        ("visual design", r#"{"score": 80}"#),
        ("search-engine", r#"{"score": 70}"#),
        ("content quality", r#"{"score": 60}"#),
        ("social presence", r#"{"score": 90}"#),
        ("accessibility", r#"{"score": 50}"#),
    ]);
    let pipeline = create_test_pipeline(model);

    let result = pipeline
        .run(create_test_request(&server.uri(), AnalysisOptions::default()))
        .await
        .expect("run should succeed on fallback selection");

    assert!(result
        .degradations
        .iter()
        .any(|d| d.stage == Stage::Selection));
    // Fallback selects homepage + 4 pages, identically for every concern
    assert_eq!(result.counters.pages_requested, 5);
    assert_eq!(result.counters.pages_crawled, 5);
}

#[tokio::test]
async fn test_partial_crawl_failure_is_recorded_not_fatal() {
    let server = MockServer::start().await;

    // A sitemap naming three pages, one of which 404s
    let sitemap = format!(
        "<urlset><url><loc>{base}/</loc></url>\
         <url><loc>{base}/pricing</loc></url>\
         <url><loc>{base}/broken</loc></url></urlset>",
        base = server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
        .mount(&server)
        .await;
    mount_page(&server, "/").await;
    mount_page(&server, "/pricing").await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let model = ScriptedModel::new(vec![
        (
            "select website pages",
            r#"{"visual": ["/"], "seo": ["/pricing"], "content": ["/broken"],
                "social": ["/"], "rationale": "test"}"#,
        ),
        ("visual design", r#"{"score": 80}"#),
        ("search-engine", r#"{"score": 70}"#),
        ("content quality", r#"{"score": 60}"#),
        ("social presence", r#"{"score": 90}"#),
        ("accessibility", r#"{"score": 50}"#),
    ]);
    let pipeline = create_test_pipeline(model);

    let result = pipeline
        .run(create_test_request(&server.uri(), AnalysisOptions::default()))
        .await
        .expect("partial failure should not abort the run");

    assert_eq!(result.counters.pages_requested, 3);
    assert_eq!(result.counters.pages_crawled, 2);
    assert_eq!(result.counters.pages_failed, 1);

    // The degradation list names the failed path
    assert!(result
        .degradations
        .iter()
        .any(|d| d.stage == Stage::Crawl && d.reason.contains("/broken")));
    assert!(result.composite_score >= 0.0 && result.composite_score <= 100.0);
}

#[tokio::test]
async fn test_total_crawl_failure_is_a_hard_error() {
    let server = MockServer::start().await;
    mount_no_discovery(&server).await;
    for page_path in ["/", "/about", "/services", "/contact", "/blog"] {
        Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
    }

    let pipeline = create_test_pipeline(ScriptedModel::standard());
    let error = pipeline
        .run(create_test_request(&server.uri(), AnalysisOptions::default()))
        .await
        .expect_err("zero crawlable pages must abort the run");

    match error {
        AnalysisError::CrawlTotalFailure {
            attempted,
            failures,
        } => {
            assert_eq!(attempted, 4);
            assert_eq!(failures.len(), 4);
        }
        other => panic!("expected CrawlTotalFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_single_evaluator_failure_does_not_change_other_scores() {
    let server = MockServer::start().await;
    mount_no_discovery(&server).await;
    for page_path in ["/", "/about", "/services", "/contact", "/blog"] {
        mount_page(&server, page_path).await;
    }

    // SEO evaluator has no scripted response and fails
    let model = ScriptedModel::new(vec![
        (
            "select website pages",
            r#"{"visual": ["/"], "seo": ["/about"], "content": ["/services"],
                "social": ["/contact"], "rationale": "test"}"#,
        ),
        ("visual design", r#"{"score": 80}"#),
        ("content quality", r#"{"score": 60}"#),
        ("social presence", r#"{"score": 90}"#),
        ("accessibility", r#"{"score": 50}"#),
    ]);
    let pipeline = create_test_pipeline(model);

    let result = pipeline
        .run(create_test_request(&server.uri(), AnalysisOptions::default()))
        .await
        .expect("one failed evaluator should not abort the run");

    assert_eq!(result.dimension_scores.seo, 50.0);
    assert_eq!(result.dimension_scores.design, 80.0);
    assert_eq!(result.dimension_scores.content, 60.0);
    assert_eq!(result.dimension_scores.social, 90.0);
    assert!(result
        .degradations
        .iter()
        .any(|d| d.stage == Stage::Evaluation && d.reason.contains("seo")));
}

#[tokio::test]
async fn test_progress_events_cover_every_stage() {
    let server = MockServer::start().await;
    mount_no_discovery(&server).await;
    for page_path in ["/", "/about", "/services", "/contact", "/blog"] {
        mount_page(&server, page_path).await;
    }

    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let events_clone = Arc::clone(&events);

    let mut options = AnalysisOptions::default();
    options.on_progress = Some(Arc::new(move |event: &ProgressEvent| {
        let label = match event {
            ProgressEvent::DiscoveryStarted { .. } => "discovery-started",
            ProgressEvent::DiscoveryCompleted { .. } => "discovery-completed",
            ProgressEvent::SelectionCompleted { .. } => "selection-completed",
            ProgressEvent::PageCrawled { .. } => "page-crawled",
            ProgressEvent::CrawlCompleted { .. } => "crawl-completed",
            ProgressEvent::EvaluatorCompleted { .. } => "evaluator-completed",
            ProgressEvent::AggregationCompleted { .. } => "aggregation-completed",
        };
        events_clone.lock().unwrap().push(label.to_string());
    }));

    let pipeline = create_test_pipeline(ScriptedModel::standard());
    pipeline
        .run(create_test_request(&server.uri(), options))
        .await
        .expect("run should succeed");

    let seen = events.lock().unwrap();
    for expected in [
        "discovery-started",
        "discovery-completed",
        "selection-completed",
        "page-crawled",
        "crawl-completed",
        "evaluator-completed",
        "aggregation-completed",
    ] {
        assert!(
            seen.contains(&expected.to_string()),
            "missing progress event: {}",
            expected
        );
    }
    assert_eq!(
        seen.iter().filter(|e| *e == "evaluator-completed").count(),
        5
    );
}
