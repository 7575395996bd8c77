//! Quick-win pooling, deduplication, and diversified ranking

use crate::model::{EvaluatorFinding, EvaluatorKind, QuickWin};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Pools every evaluator's candidates and deduplicates near-identical entries
///
/// Two candidates are near-identical when they target the same category on
/// the same page; the first in dispatch order wins. The deduplicated pool
/// size gates the quick-win composite bonus.
pub fn pooled_quick_wins(findings: &[EvaluatorFinding]) -> Vec<QuickWin> {
    let mut pool: Vec<QuickWin> = Vec::new();
    let mut seen: Vec<(String, String)> = Vec::new();

    for finding in findings {
        for win in &finding.quick_wins {
            let key = (win.category.to_lowercase(), win.page.clone());
            if !seen.contains(&key) {
                seen.push(key);
                pool.push(win.clone());
            }
        }
    }

    pool
}

/// Ranks the pool and returns the diversified top list
///
/// Order: impact descending, effort ascending, then dispatch order and title
/// as deterministic tie-breaks. No single evaluator may place more than
/// `per_evaluator_cap` entries, so one verbose evaluator cannot crowd out
/// higher-impact items from the others.
pub fn select_quick_wins(
    pool: &[QuickWin],
    limit: usize,
    per_evaluator_cap: usize,
) -> Vec<QuickWin> {
    let mut ranked: Vec<&QuickWin> = pool.iter().collect();
    ranked.sort_by(|a, b| {
        a.impact
            .cmp(&b.impact)
            .then(Reverse(a.effort).cmp(&Reverse(b.effort)))
            .then(a.source.dispatch_index().cmp(&b.source.dispatch_index()))
            .then(a.title.cmp(&b.title))
    });

    let mut per_source: HashMap<EvaluatorKind, usize> = HashMap::new();
    let mut selected = Vec::new();

    for win in ranked {
        if selected.len() >= limit {
            break;
        }
        let count = per_source.entry(win.source).or_insert(0);
        if *count >= per_evaluator_cap {
            continue;
        }
        *count += 1;
        selected.push(win.clone());
    }

    selected
}
