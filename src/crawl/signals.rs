//! Non-AI business-signal extraction from crawled HTML
//!
//! Extracts the lightweight technical evidence the evaluators and the
//! lead-priority rubric rely on: title, meta description, Open Graph tags,
//! the responsive viewport declaration, and technology markers. Everything
//! here is synchronous and deterministic.

use crate::model::PageSignals;
use scraper::{Html, Selector};
use url::Url;

/// Substring fingerprints for common platforms and frameworks
const TECH_FINGERPRINTS: [(&str, &str); 8] = [
    ("wp-content", "wordpress"),
    ("wp-includes", "wordpress"),
    ("cdn.shopify.com", "shopify"),
    ("static.wixstatic.com", "wix"),
    ("squarespace.com", "squarespace"),
    ("/_next/", "nextjs"),
    ("data-reactroot", "react"),
    ("gtag(", "google-analytics"),
];

/// Extracts page signals from raw HTML
pub fn extract_signals(html: &str, url: &Url, status_code: u16) -> PageSignals {
    let document = Html::parse_document(html);

    PageSignals {
        title: extract_title(&document),
        meta_description: extract_meta_content(&document, "meta[name='description']"),
        og_tags: extract_og_tags(&document),
        has_viewport_meta: extract_meta_content(&document, "meta[name='viewport']").is_some(),
        tech_markers: detect_tech_markers(html, &document),
        https: url.scheme() == "https",
        status_code: Some(status_code),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

fn extract_meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn extract_og_tags(document: &Html) -> Vec<(String, String)> {
    let Ok(selector) = Selector::parse("meta[property]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let property = element.value().attr("property")?;
            if !property.starts_with("og:") {
                return None;
            }
            let content = element.value().attr("content")?.trim();
            if content.is_empty() {
                return None;
            }
            Some((property.to_string(), content.to_string()))
        })
        .collect()
}

/// Detects technology markers from the generator meta tag and well-known
/// asset fingerprints
fn detect_tech_markers(html: &str, document: &Html) -> Vec<String> {
    let mut markers = Vec::new();

    if let Some(generator) = extract_meta_content(document, "meta[name='generator']") {
        let name = generator
            .split_whitespace()
            .next()
            .unwrap_or(&generator)
            .to_lowercase();
        markers.push(name);
    }

    for (fingerprint, marker) in TECH_FINGERPRINTS {
        if html.contains(fingerprint) && !markers.iter().any(|m| m == marker) {
            markers.push(marker.to_string());
        }
    }

    markers
}
