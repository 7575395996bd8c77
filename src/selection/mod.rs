//! Model-backed page selection with a deterministic fallback
//!
//! The selector asks the model collaborator for a ranked page list per
//! evaluation concern. The contract is strict: the response must map every
//! concern to a non-empty list of paths that exist in the discovered set. On
//! any model failure, schema mismatch, or empty/invalid concern list, the
//! whole selection falls back deterministically — homepage plus up to
//! (max−1) pages ordered by path depth then lexicographically, applied
//! identically to every concern.

use crate::llm::{parse_json_response, ModelClient, ModelRequest};
use crate::model::{BusinessContext, Concern, DiscoveredSitemap, PageSelection};
use serde::Deserialize;

/// The response schema the selector expects from the model
#[derive(Debug, Deserialize)]
struct SelectorResponse {
    #[serde(default)]
    visual: Vec<String>,
    #[serde(default)]
    seo: Vec<String>,
    #[serde(default)]
    content: Vec<String>,
    #[serde(default)]
    social: Vec<String>,
    #[serde(default)]
    rationale: Option<String>,
}

/// Selects a bounded page subset per concern
///
/// Never fails; the result's `used_fallback` flag records which strategy
/// produced it.
pub async fn select_pages(
    model: &dyn ModelClient,
    sitemap: &DiscoveredSitemap,
    context: &BusinessContext,
    max_per_concern: usize,
) -> PageSelection {
    let request = build_request(sitemap, context, max_per_concern);

    let response = match model.complete(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Page selector model call failed: {}, using fallback", e);
            return fallback_selection(sitemap, max_per_concern);
        }
    };

    let parsed: SelectorResponse = match parse_json_response(&response.content) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Page selector response invalid: {}, using fallback", e);
            return fallback_selection(sitemap, max_per_concern);
        }
    };

    let validated = |raw: &[String]| validate_concern_list(raw, sitemap, max_per_concern);
    let lists = [
        validated(&parsed.visual),
        validated(&parsed.seo),
        validated(&parsed.content),
        validated(&parsed.social),
    ];

    // One empty concern invalidates the whole response; the fallback is
    // applied identically to every concern, never mixed per concern.
    if lists.iter().any(|list| list.is_empty()) {
        tracing::warn!("Page selector left a concern empty, using fallback");
        return fallback_selection(sitemap, max_per_concern);
    }

    let [visual, seo, content, social] = lists;
    let rationale = parsed
        .rationale
        .unwrap_or_else(|| "model-selected pages".to_string());

    PageSelection::from_concern_lists(
        |concern| match concern {
            Concern::Visual => visual.clone(),
            Concern::Seo => seo.clone(),
            Concern::Content => content.clone(),
            Concern::Social => social.clone(),
        },
        rationale,
        false,
    )
}

fn build_request(
    sitemap: &DiscoveredSitemap,
    context: &BusinessContext,
    max_per_concern: usize,
) -> ModelRequest {
    let instructions = format!(
        "You select website pages for a quality audit. For each concern \
         (visual, seo, content, social) pick the at most {} most informative \
         pages from the provided list. Respond with JSON only: \
         {{\"visual\": [paths], \"seo\": [paths], \"content\": [paths], \
         \"social\": [paths], \"rationale\": \"...\"}}. Use only paths from \
         the list, and always include the homepage where relevant.",
        max_per_concern
    );

    let input = format!(
        "Company: {}\nIndustry: {}\n\nDiscovered pages:\n{}",
        context.company_name,
        context.industry,
        sitemap.paths.join("\n")
    );

    ModelRequest::new(instructions, input)
}

/// Keeps only known paths, deduplicated and bounded
fn validate_concern_list(
    raw: &[String],
    sitemap: &DiscoveredSitemap,
    max_per_concern: usize,
) -> Vec<String> {
    let mut result = Vec::new();
    for path in raw {
        let path = normalize_path(path);
        if sitemap.contains(&path) && !result.contains(&path) {
            result.push(path);
            if result.len() >= max_per_concern {
                break;
            }
        }
    }
    result
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "/".to_string();
    }
    let with_slash = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };
    if with_slash.len() > 1 && with_slash.ends_with('/') {
        with_slash.trim_end_matches('/').to_string()
    } else {
        with_slash
    }
}

/// Depth of a path in the site tree ("/" = 0, "/a" = 1, "/a/b" = 2)
fn path_depth(path: &str) -> usize {
    path.split('/').filter(|segment| !segment.is_empty()).count()
}

/// The deterministic fallback selection
///
/// Homepage plus up to (max−1) discovered pages ordered breadth-first by
/// path depth, then lexicographically. Identical for every concern.
pub fn fallback_selection(sitemap: &DiscoveredSitemap, max_per_concern: usize) -> PageSelection {
    let mut candidates: Vec<String> = sitemap
        .paths
        .iter()
        .filter(|path| path.as_str() != "/")
        .cloned()
        .collect();
    candidates.sort_by(|a, b| path_depth(a).cmp(&path_depth(b)).then_with(|| a.cmp(b)));

    let mut pages = vec!["/".to_string()];
    pages.extend(candidates.into_iter().take(max_per_concern.saturating_sub(1)));

    PageSelection::from_concern_lists(
        |_| pages.clone(),
        "deterministic fallback: homepage plus shallowest pages".to_string(),
        true,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelResponse;
    use crate::ModelError;
    use async_trait::async_trait;

    /// Replays a fixed outcome for every model call
    struct ScriptedModel {
        outcome: Result<String, String>,
    }

    impl ScriptedModel {
        fn ok(content: &str) -> Self {
            Self {
                outcome: Ok(content.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                outcome: Err("model unavailable".to_string()),
            }
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn complete(&self, _request: ModelRequest) -> Result<ModelResponse, ModelError> {
            match &self.outcome {
                Ok(content) => Ok(ModelResponse {
                    content: content.clone(),
                    model_id: "scripted".to_string(),
                }),
                Err(message) => Err(ModelError::Schema(message.clone())),
            }
        }
    }

    fn create_test_sitemap(paths: &[&str]) -> DiscoveredSitemap {
        DiscoveredSitemap {
            paths: paths.iter().map(|p| p.to_string()).collect(),
            sitemap_count: paths.len(),
            robots_count: 0,
            fallback_count: 0,
            duration_ms: 1,
            errors: vec![],
            used_fallback: false,
        }
    }

    fn create_test_context() -> BusinessContext {
        BusinessContext::new("Acme", "plumbing")
    }

    #[tokio::test]
    async fn test_valid_model_selection() {
        let sitemap = create_test_sitemap(&["/", "/about", "/services", "/contact", "/blog"]);
        let model = ScriptedModel::ok(
            r#"{"visual": ["/", "/about"], "seo": ["/", "/services"],
                "content": ["/blog"], "social": ["/contact"],
                "rationale": "spread across key templates"}"#,
        );

        let selection = select_pages(&model, &sitemap, &create_test_context(), 5).await;

        assert!(!selection.used_fallback);
        assert_eq!(selection.visual, vec!["/", "/about"]);
        assert_eq!(selection.rationale, "spread across key templates");
        assert_eq!(
            selection.crawl_set,
            vec!["/", "/about", "/services", "/blog", "/contact"]
        );
    }

    #[tokio::test]
    async fn test_unknown_paths_are_dropped() {
        let sitemap = create_test_sitemap(&["/", "/about"]);
        let model = ScriptedModel::ok(
            r#"{"visual": ["/", "/invented"], "seo": ["/about"],
                "content": ["/"], "social": ["/about"]}"#,
        );

        let selection = select_pages(&model, &sitemap, &create_test_context(), 5).await;

        assert!(!selection.used_fallback);
        assert_eq!(selection.visual, vec!["/"]);
    }

    #[tokio::test]
    async fn test_model_failure_uses_fallback_for_every_concern() {
        let sitemap = create_test_sitemap(&["/", "/b/deep", "/about", "/zzz"]);
        let model = ScriptedModel::failing();

        let selection = select_pages(&model, &sitemap, &create_test_context(), 3).await;

        assert!(selection.used_fallback);
        // Homepage first, then depth-1 pages lexicographically
        let expected = vec!["/", "/about", "/zzz"];
        for concern in Concern::ALL {
            assert_eq!(selection.for_concern(concern), expected.as_slice());
        }
    }

    #[tokio::test]
    async fn test_empty_concern_invalidates_whole_response() {
        let sitemap = create_test_sitemap(&["/", "/about"]);
        let model = ScriptedModel::ok(
            r#"{"visual": ["/"], "seo": [], "content": ["/about"], "social": ["/"]}"#,
        );

        let selection = select_pages(&model, &sitemap, &create_test_context(), 5).await;

        assert!(selection.used_fallback);
    }

    #[test]
    fn test_fallback_depth_then_lex_ordering() {
        let sitemap =
            create_test_sitemap(&["/", "/products/widgets", "/contact", "/about", "/a/b/c"]);
        let selection = fallback_selection(&sitemap, 5);

        assert_eq!(
            selection.visual,
            vec!["/", "/about", "/contact", "/products/widgets", "/a/b/c"]
        );
    }

    #[test]
    fn test_fallback_bounds_to_max() {
        let sitemap = create_test_sitemap(&["/", "/a", "/b", "/c", "/d", "/e", "/f"]);
        let selection = fallback_selection(&sitemap, 3);

        assert_eq!(selection.visual.len(), 3);
        assert_eq!(selection.visual[0], "/");
    }

    #[test]
    fn test_selection_is_subset_of_discovery() {
        let sitemap = create_test_sitemap(&["/", "/about", "/blog"]);
        let selection = fallback_selection(&sitemap, 5);

        for path in &selection.crawl_set {
            assert!(sitemap.contains(path), "{} not discovered", path);
        }
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("about"), "/about");
        assert_eq!(normalize_path("/about/"), "/about");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_path_depth() {
        assert_eq!(path_depth("/"), 0);
        assert_eq!(path_depth("/about"), 1);
        assert_eq!(path_depth("/products/widgets"), 2);
    }
}
