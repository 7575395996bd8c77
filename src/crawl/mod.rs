//! Bounded-concurrency page crawling
//!
//! Fetches the unique selected pages through a semaphore-bounded worker pool,
//! capturing HTML, two screenshots, and non-AI signals per page. A failing
//! page (timeout, non-2xx, navigation error) is recorded and excluded from
//! evaluation but never aborts the batch; results complete in any order and
//! are reassembled into request order before evaluation.

mod fetcher;
mod signals;
mod screenshot;

pub use fetcher::{build_http_client, fetch_page, FetchError, FetchedPage};
pub use screenshot::{BrowserCapturer, CaptureError, DisabledCapturer, ScreenshotCapturer, Viewport};
pub use signals::extract_signals;

use crate::config::CrawlConfig;
use crate::model::{CrawledPage, PageFailure, ProgressCallback, ProgressEvent};
use crate::pipeline::emit_progress;
use crate::retry::RetryPolicy;
use futures::future::join_all;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Everything the crawl stage produced
#[derive(Debug)]
pub struct CrawlOutcome {
    /// One record per requested page, in request order
    pub pages: Vec<CrawledPage>,

    /// Failures extracted for degradation reporting
    pub failures: Vec<PageFailure>,

    /// Non-fatal notes (screenshot misses, directory errors)
    pub warnings: Vec<String>,
}

impl CrawlOutcome {
    pub fn succeeded(&self) -> usize {
        self.pages.iter().filter(|page| page.success).count()
    }
}

/// Crawls the unique selected pages with bounded concurrency
#[allow(clippy::too_many_arguments)]
pub async fn crawl_pages(
    client: &Client,
    capturer: Arc<dyn ScreenshotCapturer>,
    config: &CrawlConfig,
    base_url: &Url,
    paths: &[String],
    concurrency: usize,
    per_page_timeout_ms: u64,
    retry: &RetryPolicy,
    on_progress: Option<ProgressCallback>,
) -> CrawlOutcome {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let completed = Arc::new(AtomicUsize::new(0));
    let total = paths.len();

    let tasks: Vec<_> = paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let semaphore = Arc::clone(&semaphore);
            let completed = Arc::clone(&completed);
            let client = client.clone();
            let capturer = Arc::clone(&capturer);
            let config = config.clone();
            let base_url = base_url.clone();
            let path = path.clone();
            let retry = retry.clone();
            let on_progress = on_progress.clone();

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    let page = CrawledPage::failed(
                        path.clone(),
                        String::new(),
                        "crawl pool shut down".to_string(),
                    );
                    return (index, page, Vec::new());
                };

                let (page, warnings) = crawl_one(
                    &client,
                    capturer.as_ref(),
                    &config,
                    &base_url,
                    &path,
                    per_page_timeout_ms,
                    &retry,
                )
                .await;

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                emit_progress(
                    &on_progress,
                    ProgressEvent::PageCrawled {
                        path: path.clone(),
                        success: page.success,
                        completed: done,
                        total,
                    },
                );

                (index, page, warnings)
            })
        })
        .collect();

    // Wait for the whole batch, then reassemble into request order
    let mut slots: Vec<Option<CrawledPage>> = (0..total).map(|_| None).collect();
    let mut warnings = Vec::new();

    for (task_index, joined) in join_all(tasks).await.into_iter().enumerate() {
        match joined {
            Ok((index, page, page_warnings)) => {
                slots[index] = Some(page);
                warnings.extend(page_warnings);
            }
            Err(e) => {
                let path = paths.get(task_index).cloned().unwrap_or_default();
                tracing::error!("Crawl task for {} panicked: {}", path, e);
                slots[task_index] = Some(CrawledPage::failed(
                    path,
                    String::new(),
                    format!("crawl task failed: {}", e),
                ));
            }
        }
    }

    let pages: Vec<CrawledPage> = slots.into_iter().flatten().collect();
    let failures: Vec<PageFailure> = pages
        .iter()
        .filter(|page| !page.success)
        .map(|page| PageFailure {
            path: page.path.clone(),
            reason: page.error.clone().unwrap_or_else(|| "unknown".to_string()),
        })
        .collect();

    tracing::info!(
        "Crawl finished: {}/{} pages succeeded, {} warnings",
        pages.len() - failures.len(),
        total,
        warnings.len()
    );

    CrawlOutcome {
        pages,
        failures,
        warnings,
    }
}

/// Crawls a single page: fetch, signals, screenshots
async fn crawl_one(
    client: &Client,
    capturer: &dyn ScreenshotCapturer,
    config: &CrawlConfig,
    base_url: &Url,
    path: &str,
    per_page_timeout_ms: u64,
    retry: &RetryPolicy,
) -> (CrawledPage, Vec<String>) {
    let full_url = match base_url.join(path) {
        Ok(url) => url,
        Err(e) => {
            return (
                CrawledPage::failed(path.to_string(), String::new(), format!("bad path: {}", e)),
                Vec::new(),
            );
        }
    };

    let timeout = Duration::from_millis(per_page_timeout_ms);
    let fetched = match fetch_page(client, full_url.as_str(), timeout, retry).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::warn!("Page {} failed: {}", path, e);
            return (
                CrawledPage::failed(path.to_string(), full_url.to_string(), e.to_string()),
                Vec::new(),
            );
        }
    };

    let final_url = Url::parse(&fetched.final_url).unwrap_or(full_url.clone());
    let signals = extract_signals(&fetched.body, &final_url, fetched.status_code);

    let mut warnings = Vec::new();
    let (desktop, mobile) = capture_screenshots(
        capturer,
        config,
        full_url.as_str(),
        path,
        timeout,
        &mut warnings,
    )
    .await;

    let page = CrawledPage {
        path: path.to_string(),
        url: full_url.to_string(),
        success: true,
        html: Some(fetched.body),
        desktop_screenshot: desktop,
        mobile_screenshot: mobile,
        signals,
        error: None,
    };

    (page, warnings)
}

/// Captures desktop and mobile screenshots, degrading to warnings on failure
async fn capture_screenshots(
    capturer: &dyn ScreenshotCapturer,
    config: &CrawlConfig,
    url: &str,
    path: &str,
    timeout: Duration,
    warnings: &mut Vec<String>,
) -> (Option<String>, Option<String>) {
    if !capturer.enabled() {
        return (None, None);
    }

    let dir = PathBuf::from(&config.screenshot_dir);
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        warnings.push(format!("screenshot dir {}: {}", dir.display(), e));
        return (None, None);
    }

    let slug = path_slug(path);
    let viewports = [
        (
            "desktop",
            Viewport {
                width: config.desktop_width,
                height: config.desktop_height,
                mobile: false,
            },
        ),
        (
            "mobile",
            Viewport {
                width: config.mobile_width,
                height: config.mobile_height,
                mobile: true,
            },
        ),
    ];

    let mut captured = [None, None];
    for (slot, (label, viewport)) in captured.iter_mut().zip(viewports) {
        let output = dir.join(format!("{}-{}.png", slug, label));
        let capture = capturer.capture(url, viewport, &output);

        match tokio::time::timeout(timeout, capture).await {
            Ok(Ok(())) => *slot = Some(output.to_string_lossy().to_string()),
            Ok(Err(e)) => warnings.push(format!("{} {} screenshot: {}", path, label, e)),
            Err(_) => warnings.push(format!(
                "{} {} screenshot timed out after {:?}",
                path, label, timeout
            )),
        }
    }

    let [desktop, mobile] = captured;
    (desktop, mobile)
}

/// File-name-safe slug for a page path
fn path_slug(path: &str) -> String {
    if path == "/" {
        return "home".to_string();
    }

    path.trim_matches('/')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
