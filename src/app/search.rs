use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::NodeRecord;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Ids of nodes whose label or id matches `query`, best score first. Ties keep
/// graph order.
pub(super) fn search_matches(nodes: &[NodeRecord], query: &str) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = nodes
        .iter()
        .filter_map(|node| {
            let label_score = fuzzy_match_score(&matcher, &node.label, query);
            let id_score = fuzzy_match_score(&matcher, &node.id, query);
            label_score.max(id_score).map(|score| (score, node.id.clone()))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored.into_iter().map(|(_, id)| id).collect()
}

pub(super) fn best_match(nodes: &[NodeRecord], query: &str) -> Option<String> {
    search_matches(nodes, query).into_iter().next()
}
