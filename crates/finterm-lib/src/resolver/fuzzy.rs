//! Tiered fuzzy scoring for explorer search
//!
//! Scores a query against a candidate label on a 0-100 scale. Both sides are
//! compared case-insensitively and the strongest applicable tier wins.
//!
//! # Tiers
//!
//! | Tier | Score |
//! |------|-------|
//! | Exact match | 100 |
//! | Target starts with query | 95 |
//! | Word initials equal query | 85 |
//! | A word of the target starts with query | 80 |
//! | Target contains query | 75 |
//! | Word initials start with query | 75 |
//! | Ordered subsequence | 40-60 by gap density |
//!
//! Initials are taken from words split on any non-alphanumeric character.
//! When the full initials do not match, connector words (`of`, `and`, `the`,
//! `for`, `de`) are dropped and the initials are compared again, so "usa"
//! matches "United States of America".
//!
//! # Examples
//!
//! ```
//! use finterm_lib::resolver::fuzzy::{score, LOCAL_MATCH_THRESHOLD};
//!
//! assert_eq!(score("france", "France"), 100.0);
//! assert_eq!(score("fra", "France"), 95.0);
//! assert!(score("usa", "United States of America") >= LOCAL_MATCH_THRESHOLD);
//! assert_eq!(score("xyz123", "France"), 0.0);
//! ```

/// Minimum score for a candidate to survive a local pass
pub const LOCAL_MATCH_THRESHOLD: f64 = 60.0;

/// Words skipped when the full initials do not match
const CONNECTOR_WORDS: [&str; 5] = ["of", "and", "the", "for", "de"];

/// Average skipped characters between matched positions above which a
/// subsequence no longer counts
const MAX_AVERAGE_GAP: f64 = 3.0;

/// Score `query` against `target`
///
/// Returns 0 for an empty query or when no tier applies.
pub fn score(query: &str, target: &str) -> f64 {
    let q = query.trim().to_lowercase();
    let t = target.trim().to_lowercase();

    if q.is_empty() || t.is_empty() {
        return 0.0;
    }
    if q == t {
        return 100.0;
    }
    if t.starts_with(&q) {
        return 95.0;
    }

    let words = words(&t);
    let all_initials = initials(words.iter().copied());
    let significant = initials(words.iter().copied().filter(|w| !CONNECTOR_WORDS.contains(w)));

    if all_initials == q || significant == q {
        return 85.0;
    }
    if words.iter().any(|w| w.starts_with(&q)) {
        return 80.0;
    }
    if t.contains(&q) || all_initials.starts_with(&q) || significant.starts_with(&q) {
        return 75.0;
    }

    subsequence_score(&q, &t)
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

fn initials<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words.filter_map(|w| w.chars().next()).collect()
}

/// Score an in-order subsequence match by how tightly it packs
///
/// Positions are taken greedily from the left. The gap between two
/// consecutive matches is the number of target characters skipped.
fn subsequence_score(query: &str, target: &str) -> f64 {
    let mut positions = Vec::with_capacity(query.len());
    let mut chars = target.chars().enumerate();

    for qc in query.chars() {
        match chars.by_ref().find(|(_, tc)| *tc == qc) {
            Some((index, _)) => positions.push(index),
            None => return 0.0,
        }
    }

    let average_gap = if positions.len() < 2 {
        0.0
    } else {
        let skipped: usize = positions.windows(2).map(|pair| pair[1] - pair[0] - 1).sum();
        skipped as f64 / (positions.len() - 1) as f64
    };

    if average_gap > MAX_AVERAGE_GAP {
        return 0.0;
    }

    40.0 + 20.0 * (1.0 - average_gap / 4.0).max(0.0)
}

#[cfg(test)]
mod tests {
    include!("fuzzy.test.rs");
}
