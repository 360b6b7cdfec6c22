use super::*;

// ============================================================================
// Tier Tests
// ============================================================================

#[test]
fn test_exact_match_is_case_insensitive() {
    assert_eq!(score("FRANCE", "france"), 100.0);
    assert_eq!(score("  gdp ", "GDP"), 100.0);
}

#[test]
fn test_prefix_match() {
    assert_eq!(score("franc", "France"), 95.0);
}

#[test]
fn test_initials_match() {
    assert_eq!(score("gdp", "Gross Domestic Product"), 85.0);
    assert_eq!(score("cpi", "Consumer-Price Index"), 85.0);
}

#[test]
fn test_initials_skip_connector_words() {
    assert_eq!(score("usa", "United States of America"), 85.0);
    assert_eq!(score("usoa", "United States of America"), 85.0);
    assert!(score("usa", "United States of America") >= LOCAL_MATCH_THRESHOLD);
}

#[test]
fn test_word_start_match() {
    assert_eq!(score("kingdom", "United Kingdom"), 80.0);
    assert_eq!(score("dom", "Gross Domestic Product"), 80.0);
}

#[test]
fn test_contains_match() {
    assert_eq!(score("ance", "France"), 75.0);
}

#[test]
fn test_initials_prefix_match() {
    assert_eq!(score("gd", "Gross Domestic Product"), 75.0);
}

#[test]
fn test_strongest_tier_applies() {
    // "uk" is both the initials of "United Kingdom" and a subsequence
    assert_eq!(score("uk", "United Kingdom"), 85.0);
    // "ger" is a prefix of "Germany" and also contained in it
    assert_eq!(score("ger", "Germany"), 95.0);
}

// ============================================================================
// Subsequence Tests
// ============================================================================

#[test]
fn test_tight_subsequence_scores_below_threshold() {
    // f-r-n skips one character ('a') once: gap 0.5 average
    let s = score("frn", "France");
    assert!((40.0..60.0).contains(&s), "got {}", s);
    assert_eq!(s, 40.0 + 20.0 * (1.0 - 0.5 / 4.0));
}

#[test]
fn test_sparse_subsequence_scores_zero() {
    // ten characters skipped between 'a' and 'o'
    assert_eq!(score("ao", "Argentina Colombia"), 0.0);
}

#[test]
fn test_average_gap_boundary() {
    // exactly three skipped characters
    assert_eq!(score("ae", "abcde"), 40.0 + 20.0 * 0.25);
    // four skipped characters
    assert_eq!(score("af", "abcdef"), 0.0);
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_no_match_scores_zero() {
    assert_eq!(score("xyz123", "France"), 0.0);
}

#[test]
fn test_empty_inputs_score_zero() {
    assert_eq!(score("", "France"), 0.0);
    assert_eq!(score("   ", "France"), 0.0);
    assert_eq!(score("fr", ""), 0.0);
}

#[test]
fn test_scores_stay_in_range() {
    let targets = ["France", "United States of America", "Consumer Price Index", "Côte d'Ivoire"];
    let queries = ["f", "us", "cpi", "côte", "zzz", "ivoire", "ci"];

    for t in targets {
        for q in queries {
            let s = score(q, t);
            assert!((0.0..=100.0).contains(&s), "score({q:?}, {t:?}) = {s}");
        }
    }
}

#[test]
fn test_non_ascii_targets() {
    assert_eq!(score("côte", "Côte d'Ivoire"), 95.0);
    assert_eq!(score("ivoire", "Côte d'Ivoire"), 80.0);
}
