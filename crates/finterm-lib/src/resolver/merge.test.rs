use super::*;

fn entity(name: &str, symbol: Option<&str>, cik: Option<&str>) -> SuggestEntity {
    SuggestEntity {
        name: name.to_string(),
        types: vec!["company".to_string()],
        symbol: symbol.map(str::to_string),
        cik: cik.map(str::to_string),
        exchange: Some("NASDAQ".to_string()),
    }
}

fn scored(kind: MatchKind, label: &str, score: f64) -> ResolvedMatch {
    ResolvedMatch::new(kind, label, String::new(), format!("/x/{label}"), score)
}

// ============================================================================
// Entity Scoring
// ============================================================================

#[test]
fn test_entity_score_tiers() {
    let entities = vec![
        entity("Apple", Some("AAPL"), Some("0000320193")),
        entity("Apple Hospitality REIT", Some("APLE"), None),
        entity("Pineapple Energy", Some("PEGY"), None),
        entity("Alphabet Inc", Some("GOOGL"), None),
    ];

    let scores: Vec<f64> = entities_to_matches("apple", &entities).iter().map(|m| m.score).collect();
    assert_eq!(scores, vec![100.0, 85.0, 70.0, 50.0]);
}

#[test]
fn test_entity_symbol_match() {
    let entities = vec![entity("Apple Inc.", Some("AAPL"), None)];
    let matches = entities_to_matches("aapl", &entities);
    assert_eq!(matches[0].score, 95.0);
}

#[test]
fn test_entity_href_encodes_identifiers() {
    let entities = vec![entity("Apple Inc.", Some("AAPL"), Some("0000320193"))];
    let matches = entities_to_matches("apple", &entities);

    let apple = &matches[0];
    assert_eq!(apple.kind, MatchKind::Entity);
    assert_eq!(apple.href, "/explorer/entity?cik=0000320193&symbol=AAPL&name=Apple+Inc.");
    assert_eq!(apple.cik.as_deref(), Some("0000320193"));
    assert_eq!(apple.symbol.as_deref(), Some("AAPL"));
    assert_eq!(apple.sub_types, vec!["company".to_string()]);
    assert_eq!(apple.description, "AAPL - NASDAQ - CIK 0000320193");
}

#[test]
fn test_entity_href_escapes_name() {
    let entities = vec![entity("AT&T Inc.", None, None)];
    let matches = entities_to_matches("at&t", &entities);
    assert_eq!(matches[0].href, "/explorer/entity?name=AT%26T+Inc.");
}

#[test]
fn test_vocabulary_entities_keep_their_kind() {
    let mut term = entity("Yield curve", None, None);
    term.types = vec!["vocabulary".to_string()];

    let matches = entities_to_matches("yield", &[term]);
    assert_eq!(matches[0].kind, MatchKind::Vocabulary);
}

// ============================================================================
// Conflict Detection
// ============================================================================

#[test]
fn test_cross_kind_conflict() {
    let matches = vec![
        scored(MatchKind::Country, "Georgia", 90.0),
        scored(MatchKind::Entity, "Georgia Power", 82.0),
    ];
    assert!(detect_conflict(&matches), "82 >= 90 * 0.85 with different kinds");
}

#[test]
fn test_cross_kind_below_ratio() {
    let matches = vec![
        scored(MatchKind::Country, "Georgia", 90.0),
        scored(MatchKind::Entity, "Georgia Power", 76.0),
    ];
    assert!(!detect_conflict(&matches));
}

#[test]
fn test_same_label_is_not_a_conflict() {
    let matches = vec![
        scored(MatchKind::Entity, "Apple Inc", 90.0),
        scored(MatchKind::Entity, "apple inc", 88.0),
    ];
    assert!(!detect_conflict(&matches));
}

#[test]
fn test_same_kind_distinct_labels_conflict() {
    let close = vec![
        scored(MatchKind::Entity, "Apple Inc", 90.0),
        scored(MatchKind::Entity, "Apple Hospitality", 86.0),
    ];
    assert!(detect_conflict(&close), "86 >= 90 * 0.95");

    let apart = vec![
        scored(MatchKind::Entity, "Apple Inc", 90.0),
        scored(MatchKind::Entity, "Apple Hospitality", 85.0),
    ];
    assert!(!detect_conflict(&apart));
}

#[test]
fn test_single_match_never_conflicts() {
    assert!(!detect_conflict(&[scored(MatchKind::Country, "France", 95.0)]));
    assert!(!detect_conflict(&[]));
}

// ============================================================================
// Merge
// ============================================================================

#[test]
fn test_merge_prefers_entity_on_duplicate_key() {
    let mut remote = scored(MatchKind::Dataset, "GDP", 50.0);
    remote.description = "remote".to_string();
    let mut local = scored(MatchKind::Dataset, "gdp", 100.0);
    local.description = "local".to_string();

    let merged = merge_and_score(vec![remote], vec![local]);

    assert_eq!(merged.matches.len(), 1);
    assert_eq!(merged.matches[0].description, "remote");
}

#[test]
fn test_merge_keeps_same_label_with_different_identifiers() {
    let entities = vec![
        entity("Apple", Some("AAPL"), Some("0000320193")),
        entity("Apple", Some("APLE"), Some("0001418121")),
    ];
    let merged = merge_and_score(entities_to_matches("apple", &entities), Vec::new());
    assert_eq!(merged.matches.len(), 2);
}

#[test]
fn test_merge_sorts_truncates_and_picks_best() {
    let entity_matches: Vec<ResolvedMatch> = (0..10)
        .map(|i| scored(MatchKind::Entity, &format!("Entity {i}"), 50.0 + i as f64))
        .collect();
    let local_matches: Vec<ResolvedMatch> = (0..10)
        .map(|i| scored(MatchKind::Country, &format!("Country {i}"), 61.0 + i as f64))
        .collect();

    let merged = merge_and_score(entity_matches, local_matches);

    assert_eq!(merged.matches.len(), MERGED_RESULT_LIMIT);
    assert!(merged.matches.windows(2).all(|pair| pair[0].score >= pair[1].score));
    assert_eq!(merged.best.as_ref().map(|m| m.label.as_str()), Some("Country 9"));
}

#[test]
fn test_merge_reports_conflict() {
    let merged = merge_and_score(
        vec![scored(MatchKind::Entity, "Georgia Power", 82.0)],
        vec![scored(MatchKind::Country, "Georgia", 90.0)],
    );
    assert!(merged.has_conflict);
    assert_eq!(merged.best.unwrap().label, "Georgia");
}

#[test]
fn test_merge_of_nothing() {
    let merged = merge_and_score(Vec::new(), Vec::new());
    assert!(merged.matches.is_empty());
    assert!(merged.best.is_none());
    assert!(!merged.has_conflict);
}
