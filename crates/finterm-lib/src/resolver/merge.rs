//! Entity scoring and local/remote reconciliation

use std::collections::HashSet;
use url::form_urlencoded;

use super::suggest::SuggestEntity;
use super::{MatchKind, ResolvedMatch};

/// Maximum matches kept after merging
pub const MERGED_RESULT_LIMIT: usize = 15;

/// Runner-up share of the best score that flags a cross-kind conflict
pub const CROSS_KIND_CONFLICT_RATIO: f64 = 0.85;

/// Runner-up share of the best score that flags a same-kind conflict
pub const SAME_KIND_CONFLICT_RATIO: f64 = 0.95;

/// Outcome of [`merge_and_score`]
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub matches: Vec<ResolvedMatch>,
    pub best: Option<ResolvedMatch>,
    pub has_conflict: bool,
}

/// Score suggest entities against the query
///
/// Exact name 100, exact symbol 95, name prefix 85, name contains 70,
/// anything else the endpoint returned 50.
pub fn entities_to_matches(query: &str, entities: &[SuggestEntity]) -> Vec<ResolvedMatch> {
    let q = query.trim().to_lowercase();

    entities
        .iter()
        .map(|entity| {
            let name = entity.name.to_lowercase();
            let score = if name == q {
                100.0
            } else if entity.symbol.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(&q)) {
                95.0
            } else if name.starts_with(&q) {
                85.0
            } else if name.contains(&q) {
                70.0
            } else {
                50.0
            };
            entity_match(entity, score)
        })
        .collect()
}

fn entity_match(entity: &SuggestEntity, score: f64) -> ResolvedMatch {
    let kind = if entity.types.iter().any(|t| t.eq_ignore_ascii_case("vocabulary")) {
        MatchKind::Vocabulary
    } else {
        MatchKind::Entity
    };

    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(cik) = &entity.cik {
        query.append_pair("cik", cik);
    }
    if let Some(symbol) = &entity.symbol {
        query.append_pair("symbol", symbol);
    }
    query.append_pair("name", &entity.name);
    let href = format!("/explorer/entity?{}", query.finish());

    let description = [
        entity.symbol.clone(),
        entity.exchange.clone(),
        entity.cik.as_ref().map(|cik| format!("CIK {cik}")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" - ");

    ResolvedMatch {
        cik: entity.cik.clone(),
        symbol: entity.symbol.clone(),
        sub_types: entity.types.clone(),
        ..ResolvedMatch::new(kind, &entity.name, description, href, score)
    }
}

/// Whether the top two of a score-sorted list are both strong and distinct
pub fn detect_conflict(matches: &[ResolvedMatch]) -> bool {
    let [best, second, ..] = matches else {
        return false;
    };

    if best.kind != second.kind {
        second.score >= best.score * CROSS_KIND_CONFLICT_RATIO
    } else {
        second.score >= best.score * SAME_KIND_CONFLICT_RATIO
            && best.label.to_lowercase() != second.label.to_lowercase()
    }
}

/// Merge entity and local matches into one ranked list
///
/// Entity matches come first so they win on duplicate keys. Duplicates are
/// keyed on kind, lowercase label, CIK, and symbol.
pub fn merge_and_score(entity_matches: Vec<ResolvedMatch>, local_matches: Vec<ResolvedMatch>) -> Merged {
    let mut seen = HashSet::new();
    let mut matches: Vec<ResolvedMatch> = entity_matches
        .into_iter()
        .chain(local_matches)
        .filter(|m| seen.insert((m.kind, m.label.to_lowercase(), m.cik.clone(), m.symbol.clone())))
        .collect();

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(MERGED_RESULT_LIMIT);

    Merged {
        best: matches.first().cloned(),
        has_conflict: detect_conflict(&matches),
        matches,
    }
}

#[cfg(test)]
mod tests {
    include!("merge.test.rs");
}
