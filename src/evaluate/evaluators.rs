//! The five evaluator variants behind one interface
//!
//! Evaluators form a fixed, closed set selected by [`EvaluatorKind`] — no
//! runtime capability probing. Each issues one structured model request over
//! the crawled evidence for its concern and parses one schema-checked
//! response into an [`EvaluatorFinding`]. Schema failures are the caller's
//! signal to substitute a neutral finding.

use crate::llm::{parse_json_response, ModelClient, ModelRequest};
use crate::model::{
    BusinessContext, CrawledPage, EvaluatorFinding, EvaluatorKind, Impact, Issue, QuickWin,
    Severity, VisualDetail,
};
use crate::ModelError;
use scraper::Html;
use serde::Deserialize;

/// Most characters of visible text included per page digest
const DIGEST_TEXT_LIMIT: usize = 2_000;

/// Business context enriched with technical signals from the crawl
#[derive(Debug, Clone)]
pub struct EnrichedContext {
    pub business: BusinessContext,

    /// Any successful page was served over HTTPS
    pub https: bool,

    /// Union of tech markers across successful pages
    pub tech_markers: Vec<String>,
}

impl EnrichedContext {
    pub fn enrich(business: &BusinessContext, pages: &[CrawledPage]) -> Self {
        let successful: Vec<&CrawledPage> = pages.iter().filter(|p| p.success).collect();
        let https = successful.iter().any(|p| p.signals.https);

        let mut tech_markers = Vec::new();
        for page in &successful {
            for marker in &page.signals.tech_markers {
                if !tech_markers.contains(marker) {
                    tech_markers.push(marker.clone());
                }
            }
        }

        Self {
            business: business.clone(),
            https,
            tech_markers,
        }
    }
}

/// One evaluator in the fixed set
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    pub kind: EvaluatorKind,
}

/// Wire schema for an evaluator response
#[derive(Debug, Deserialize)]
struct RawFinding {
    score: Option<f64>,
    #[serde(default)]
    desktop_score: Option<f64>,
    #[serde(default)]
    mobile_score: Option<f64>,
    #[serde(default)]
    mobile_usability_failing: bool,
    #[serde(default)]
    issues: Vec<RawIssue>,
    #[serde(default)]
    quick_wins: Vec<RawQuickWin>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    title: String,
    severity: Severity,
    category: String,
    effort: Impact,
    #[serde(default)]
    recommendation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawQuickWin {
    title: String,
    category: String,
    #[serde(default)]
    page: Option<String>,
    impact: Impact,
    effort: Impact,
}

impl Evaluator {
    pub fn new(kind: EvaluatorKind) -> Self {
        Self { kind }
    }

    /// Runs this evaluator over its page partition
    ///
    /// One model call, one schema-checked response. The caller owns the
    /// timeout and the neutral-finding substitution on error.
    pub async fn evaluate(
        &self,
        model: &dyn ModelClient,
        pages: &[&CrawledPage],
        context: &EnrichedContext,
        instructions_override: Option<&str>,
        visual_model: Option<&str>,
    ) -> Result<EvaluatorFinding, ModelError> {
        let mut request = self.build_request(pages, context, instructions_override);
        if self.kind == EvaluatorKind::Visual {
            request.model_override = visual_model.map(|m| m.to_string());
        }

        let response = model.complete(request).await?;
        self.parse_finding(&response.content, &response.model_id, pages)
    }

    fn build_request(
        &self,
        pages: &[&CrawledPage],
        context: &EnrichedContext,
        instructions_override: Option<&str>,
    ) -> ModelRequest {
        let instructions = match instructions_override {
            Some(custom) => custom.to_string(),
            None => self.default_instructions(),
        };

        let digests: Vec<String> = pages.iter().map(|page| page_digest(page)).collect();
        let input = format!(
            "Company: {}\nIndustry: {}\nHTTPS: {}\nDetected technology: {}\n\n{}",
            context.business.company_name,
            context.business.industry,
            if context.https { "yes" } else { "no" },
            if context.tech_markers.is_empty() {
                "none detected".to_string()
            } else {
                context.tech_markers.join(", ")
            },
            digests.join("\n\n---\n\n")
        );

        let mut request = ModelRequest::new(instructions, input);
        if self.kind == EvaluatorKind::Visual {
            request.image_refs = pages
                .iter()
                .flat_map(|page| {
                    page.desktop_screenshot
                        .iter()
                        .chain(page.mobile_screenshot.iter())
                        .cloned()
                })
                .collect();
        }
        request
    }

    fn default_instructions(&self) -> String {
        let focus = match self.kind {
            EvaluatorKind::Visual => {
                "visual design quality on desktop and mobile: layout, hierarchy, \
                 imagery, responsiveness. Score desktop and mobile separately and \
                 set mobile_usability_failing when the mobile experience is broken."
            }
            EvaluatorKind::Seo => {
                "search-engine readiness: titles, meta descriptions, heading \
                 structure, crawlability, structured data."
            }
            EvaluatorKind::Content => {
                "content quality: clarity, completeness, calls to action, trust \
                 signals, freshness."
            }
            EvaluatorKind::Social => {
                "social presence and sharing readiness: Open Graph tags, social \
                 links, share previews."
            }
            EvaluatorKind::Accessibility => {
                "accessibility: alt text, contrast hints, landmarks, form labels, \
                 keyboard traps visible in the markup."
            }
        };

        format!(
            "You are a website quality evaluator assessing {} Respond with JSON \
             only: {{\"score\": 0-100, \"desktop_score\": optional, \
             \"mobile_score\": optional, \"mobile_usability_failing\": bool, \
             \"issues\": [{{\"title\", \"severity\": \
             \"critical|high|medium|low\", \"category\", \"effort\": \
             \"high|medium|low\", \"recommendation\"}}], \"quick_wins\": \
             [{{\"title\", \"category\", \"page\", \"impact\": \
             \"high|medium|low\", \"effort\": \"high|medium|low\"}}]}}",
            focus
        )
    }

    fn parse_finding(
        &self,
        content: &str,
        model_id: &str,
        pages: &[&CrawledPage],
    ) -> Result<EvaluatorFinding, ModelError> {
        let raw: RawFinding = parse_json_response(content)?;

        let default_page = pages
            .first()
            .map(|page| page.path.clone())
            .unwrap_or_else(|| "/".to_string());

        let mut issues: Vec<Issue> = raw
            .issues
            .into_iter()
            .map(|issue| Issue {
                title: issue.title,
                severity: issue.severity,
                category: issue.category,
                effort: issue.effort,
                recommendation: issue.recommendation,
                source: self.kind,
            })
            .collect();
        issues.sort_by_key(|issue| issue.severity);

        let quick_wins: Vec<QuickWin> = raw
            .quick_wins
            .into_iter()
            .map(|win| QuickWin {
                title: win.title,
                category: win.category,
                page: win.page.unwrap_or_else(|| default_page.clone()),
                impact: win.impact,
                effort: win.effort,
                source: self.kind,
            })
            .collect();

        let (score, visual) = if self.kind == EvaluatorKind::Visual {
            let detail = VisualDetail {
                desktop_score: raw.desktop_score.map(clamp_score),
                mobile_score: raw.mobile_score.map(clamp_score),
                mobile_usability_failing: raw.mobile_usability_failing,
            };

            // Desktop and mobile are averaged when both are reported; a
            // single report stands alone; neither falls back to the overall.
            let score = match (detail.desktop_score, detail.mobile_score) {
                (Some(desktop), Some(mobile)) => (desktop + mobile) / 2.0,
                (Some(single), None) | (None, Some(single)) => single,
                (None, None) => raw
                    .score
                    .map(clamp_score)
                    .ok_or_else(|| ModelError::Schema("visual finding has no score".to_string()))?,
            };

            (score, Some(detail))
        } else {
            let score = raw
                .score
                .map(clamp_score)
                .ok_or_else(|| ModelError::Schema("finding is missing a score".to_string()))?;
            (score, None)
        };

        Ok(EvaluatorFinding {
            evaluator: self.kind,
            score,
            issues,
            quick_wins,
            model_id: model_id.to_string(),
            failed: false,
            visual,
        })
    }
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Compact evidence digest for one page
fn page_digest(page: &CrawledPage) -> String {
    let signals = &page.signals;
    let mut digest = format!("Page: {}\n", page.path);

    if let Some(title) = &signals.title {
        digest.push_str(&format!("Title: {}\n", title));
    }
    if let Some(description) = &signals.meta_description {
        digest.push_str(&format!("Meta description: {}\n", description));
    }
    digest.push_str(&format!(
        "Open Graph tags: {}\nViewport meta: {}\n",
        signals.og_tags.len(),
        if signals.has_viewport_meta { "yes" } else { "no" }
    ));

    if let Some(html) = &page.html {
        let text = visible_text(html, DIGEST_TEXT_LIMIT);
        if !text.is_empty() {
            digest.push_str(&format!("Content excerpt:\n{}\n", text));
        }
    }

    digest
}

/// Visible text with collapsed whitespace, truncated at a char boundary
///
/// Script, style, and noscript bodies are skipped so markup-adjacent source
/// code never crowds the digest.
fn visible_text(html: &str, limit: usize) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();
    collect_visible_text(document.root_element(), &mut parts);

    let text: String = parts
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    text.chars().take(limit).collect()
}

fn collect_visible_text<'a>(element: scraper::ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(child_element) = scraper::ElementRef::wrap(child) {
            if matches!(
                child_element.value().name(),
                "script" | "style" | "noscript"
            ) {
                continue;
            }
            collect_visible_text(child_element, parts);
        } else if let Some(text) = child.value().as_text() {
            parts.push(text);
        }
    }
}
