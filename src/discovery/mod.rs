//! Page discovery via robots.txt and sitemaps
//!
//! Discovery is best-effort and never fails: it collects `Sitemap:` entries
//! from robots.txt, falls back to the conventional `/sitemap.xml` location,
//! follows one level of sitemap-index nesting, and keeps only same-host
//! pages. Every error along the way is captured as data on the result. When
//! nothing at all is found, a fixed fallback page set is returned with
//! `used_fallback` set so the caller can weight confidence accordingly.

use crate::model::DiscoveredSitemap;
use regex::Regex;
use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

/// Most sitemap URLs fetched in one discovery run (index children included)
const MAX_SITEMAP_FETCHES: usize = 6;

/// Most paths kept from discovery
const MAX_DISCOVERED_PATHS: usize = 200;

/// Discovers candidate page paths for the given site
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `base_url` - The site root
/// * `timeout` - Per-request timeout for robots/sitemap fetches
pub async fn discover(client: &Client, base_url: &Url, timeout: Duration) -> DiscoveredSitemap {
    let started = Instant::now();
    let mut errors = Vec::new();

    // Sitemap locations advertised in robots.txt
    let robots_sitemaps = match fetch_text(client, base_url, "/robots.txt", timeout).await {
        Ok(body) => sitemap_urls_from_robots(&body),
        Err(e) => {
            errors.push(format!("robots.txt: {}", e));
            Vec::new()
        }
    };

    let from_robots = !robots_sitemaps.is_empty();
    let sitemap_urls = if from_robots {
        robots_sitemaps
    } else {
        match base_url.join("/sitemap.xml") {
            Ok(url) => vec![url.to_string()],
            Err(e) => {
                errors.push(format!("sitemap.xml: {}", e));
                Vec::new()
            }
        }
    };

    let mut paths: Vec<String> = Vec::new();
    let mut fetched = 0usize;
    let mut queue: Vec<String> = sitemap_urls;

    while let Some(sitemap_url) = queue.pop() {
        if fetched >= MAX_SITEMAP_FETCHES || paths.len() >= MAX_DISCOVERED_PATHS {
            break;
        }
        fetched += 1;

        let body = match fetch_absolute(client, &sitemap_url, timeout).await {
            Ok(body) => body,
            Err(e) => {
                errors.push(format!("{}: {}", sitemap_url, e));
                continue;
            }
        };

        let locs = extract_locs(&body);
        if body.contains("<sitemapindex") {
            // One level of nesting only; children go back on the queue
            queue.extend(locs);
            continue;
        }

        for loc in locs {
            if let Some(path) = same_host_path(&loc, base_url) {
                if !paths.contains(&path) {
                    paths.push(path);
                }
                if paths.len() >= MAX_DISCOVERED_PATHS {
                    break;
                }
            }
        }
    }

    let duration_ms = started.elapsed().as_millis() as u64;

    if paths.is_empty() {
        tracing::info!(
            "Discovery found no pages for {} ({} errors), using fallback set",
            base_url,
            errors.len()
        );
        return DiscoveredSitemap::fallback(duration_ms, errors);
    }

    tracing::info!(
        "Discovery found {} pages for {} in {}ms",
        paths.len(),
        base_url,
        duration_ms
    );

    let count = paths.len();
    DiscoveredSitemap {
        paths,
        // The split records how the sitemap URL was learned, not where the
        // paths were extracted (always sitemap XML): robots-advertised
        // sitemaps count under robots_count, /sitemap.xml under
        // sitemap_count
        sitemap_count: if from_robots { 0 } else { count },
        robots_count: if from_robots { count } else { 0 },
        fallback_count: 0,
        duration_ms,
        errors,
        used_fallback: false,
    }
}

async fn fetch_text(
    client: &Client,
    base_url: &Url,
    path: &str,
    timeout: Duration,
) -> Result<String, String> {
    let url = base_url.join(path).map_err(|e| e.to_string())?;
    fetch_absolute(client, url.as_str(), timeout).await
}

async fn fetch_absolute(client: &Client, url: &str, timeout: Duration) -> Result<String, String> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status().as_u16()));
    }

    response.text().await.map_err(|e| e.to_string())
}

/// Extracts `Sitemap:` entries from robots.txt content
fn sitemap_urls_from_robots(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let lower = line.to_ascii_lowercase();
            lower
                .strip_prefix("sitemap:")
                .map(|_| line["sitemap:".len()..].trim().to_string())
        })
        .filter(|url| !url.is_empty())
        .collect()
}

/// Extracts `<loc>` entries from sitemap XML
fn extract_locs(xml: &str) -> Vec<String> {
    // Sitemaps in the wild are too inconsistent for strict XML parsing;
    // a <loc> scan accepts all of them.
    let loc_pattern = Regex::new(r"<loc>\s*([^<]+?)\s*</loc>").expect("static regex");
    loc_pattern
        .captures_iter(xml)
        .map(|capture| capture[1].trim().to_string())
        .collect()
}

/// Normalizes a discovered URL to a path when it belongs to the target host
fn same_host_path(loc: &str, base_url: &Url) -> Option<String> {
    let url = Url::parse(loc).ok()?;
    if url.host_str() != base_url.host_str() {
        return None;
    }

    let path = url.path();
    if path.is_empty() {
        Some("/".to_string())
    } else if path.len() > 1 && path.ends_with('/') {
        Some(path.trim_end_matches('/').to_string())
    } else {
        Some(path.to_string())
    }
}
