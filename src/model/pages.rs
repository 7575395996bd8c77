//! Stage outputs for discovery, selection, and crawling

use crate::model::request::Concern;
use serde::{Deserialize, Serialize};

/// Result of the page-discovery stage
///
/// Immutable once produced. Discovery never fails: errors encountered while
/// fetching robots.txt or sitemaps are captured in `errors`, and a run that
/// found nothing falls back to a fixed page set with `used_fallback` set.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredSitemap {
    /// Ordered, deduplicated page paths (always starting with "/")
    pub paths: Vec<String>,

    /// Paths contributed per discovery route. All non-fallback paths come
    /// out of sitemap XML; the split records how the sitemap was learned:
    /// `robots_count` for sitemaps advertised in robots.txt,
    /// `sitemap_count` for the conventional `/sitemap.xml` location.
    pub sitemap_count: usize,
    pub robots_count: usize,
    pub fallback_count: usize,

    /// Wall-clock duration of the discovery stage
    pub duration_ms: u64,

    /// Errors captured as data, never raised
    pub errors: Vec<String>,

    /// True when the fixed fallback set was used
    pub used_fallback: bool,
}

impl DiscoveredSitemap {
    /// The fixed fallback page set used when discovery finds nothing
    pub const FALLBACK_PATHS: [&'static str; 5] = ["/", "/about", "/services", "/contact", "/blog"];

    /// Builds the deterministic fallback result
    pub fn fallback(duration_ms: u64, errors: Vec<String>) -> Self {
        Self {
            paths: Self::FALLBACK_PATHS.iter().map(|p| p.to_string()).collect(),
            sitemap_count: 0,
            robots_count: 0,
            fallback_count: Self::FALLBACK_PATHS.len(),
            duration_ms,
            errors,
            used_fallback: true,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

/// Result of the page-selection stage
///
/// Each concern gets an ordered, bounded path list; `crawl_set` is the
/// deduplicated union preserving first-seen order. A page may serve multiple
/// concerns. All selected paths are a subset of the discovered set.
#[derive(Debug, Clone, Serialize)]
pub struct PageSelection {
    pub visual: Vec<String>,
    pub seo: Vec<String>,
    pub content: Vec<String>,
    pub social: Vec<String>,

    /// Deduplicated union of all per-concern lists, in first-seen order
    pub crawl_set: Vec<String>,

    /// Free-text rationale from the selector (or the fallback explanation)
    pub rationale: String,

    /// True when the deterministic fallback selection was used
    pub used_fallback: bool,
}

impl PageSelection {
    /// Assembles a selection from per-concern lists, computing the union set
    pub fn from_concern_lists(
        lists: impl Fn(Concern) -> Vec<String>,
        rationale: String,
        used_fallback: bool,
    ) -> Self {
        let visual = lists(Concern::Visual);
        let seo = lists(Concern::Seo);
        let content = lists(Concern::Content);
        let social = lists(Concern::Social);

        let mut crawl_set = Vec::new();
        for path in visual.iter().chain(&seo).chain(&content).chain(&social) {
            if !crawl_set.contains(path) {
                crawl_set.push(path.clone());
            }
        }

        Self {
            visual,
            seo,
            content,
            social,
            crawl_set,
            rationale,
            used_fallback,
        }
    }

    pub fn for_concern(&self, concern: Concern) -> &[String] {
        match concern {
            Concern::Visual => &self.visual,
            Concern::Seo => &self.seo,
            Concern::Content => &self.content,
            Concern::Social => &self.social,
        }
    }
}

/// Lightweight signals extracted from a crawled page without AI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSignals {
    pub title: Option<String>,
    pub meta_description: Option<String>,

    /// Open Graph properties present on the page (property, content)
    pub og_tags: Vec<(String, String)>,

    /// Page declares a responsive viewport meta tag
    pub has_viewport_meta: bool,

    /// Detected technology markers (wordpress, shopify, react, ...)
    pub tech_markers: Vec<String>,

    /// Page was served over HTTPS
    pub https: bool,

    pub status_code: Option<u16>,
}

/// A single crawled page: evidence for the evaluators
#[derive(Debug, Clone, Serialize)]
pub struct CrawledPage {
    /// Path relative to the site root (e.g. "/about")
    pub path: String,

    /// Full URL that was fetched
    pub url: String,

    pub success: bool,

    /// Raw HTML, present only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    /// Screenshot file references, when the capture backend produced them
    pub desktop_screenshot: Option<String>,
    pub mobile_screenshot: Option<String>,

    pub signals: PageSignals,

    /// Failure reason, present only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawledPage {
    /// Builds a failed page record
    pub fn failed(path: String, url: String, error: String) -> Self {
        Self {
            path,
            url,
            success: false,
            html: None,
            desktop_screenshot: None,
            mobile_screenshot: None,
            signals: PageSignals::default(),
            error: Some(error),
        }
    }
}

/// A recorded per-page crawl failure
#[derive(Debug, Clone, Serialize)]
pub struct PageFailure {
    pub path: String,
    pub reason: String,
}
