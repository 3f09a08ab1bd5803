//! Fuzzy keyword matching - typo tolerance for the rule-scoring tier.
//!
//! Token-level Levenshtein against keyword lists. A token only counts as a
//! fuzzy match when it is close but not identical; exact matches are the
//! keyword tier's job and score higher.

use strsim::levenshtein;

/// Maximum edit distance allowed for a token of the given length. Short
/// tokens tolerate less so "pc" never fuzzy-matches "bc".
fn allowed_distance(len: usize, max_distance: usize) -> usize {
    match len {
        0..=3 => 0,
        4..=6 => 1.min(max_distance),
        _ => max_distance,
    }
}

/// Whether `keyword` is within fuzzy distance of any query token.
pub fn keyword_fuzzy_matches(keyword: &str, tokens: &[&str], max_distance: usize) -> bool {
    tokens.iter().any(|t| token_matches(keyword, t, max_distance))
}

fn token_matches(keyword: &str, token: &str, max_distance: usize) -> bool {
    if token == keyword {
        return false;
    }
    let budget = allowed_distance(keyword.chars().count(), max_distance);
    if budget == 0 {
        return false;
    }
    // Cheap length gate before the edit-distance computation.
    let len_diff = keyword.chars().count().abs_diff(token.chars().count());
    if len_diff > budget {
        return false;
    }
    levenshtein(keyword, token) <= budget
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typo_matches() {
        let tokens = ["comande", "en", "atente"];
        assert!(keyword_fuzzy_matches("commande", &tokens, 2));
        assert!(keyword_fuzzy_matches("attente", &tokens, 2));
    }

    #[test]
    fn test_exact_match_excluded() {
        let tokens = ["commande"];
        assert!(!keyword_fuzzy_matches("commande", &tokens, 2));
    }

    #[test]
    fn test_short_tokens_strict() {
        // "pc" must never fuzzy-match "bc".
        assert!(!keyword_fuzzy_matches("pc", &["bc"], 2));
        assert!(!keyword_fuzzy_matches("dh", &["de"], 2));
    }

    #[test]
    fn test_distant_words_rejected() {
        assert!(!keyword_fuzzy_matches("fournisseur", &["livraison"], 2));
    }

    #[test]
    fn test_misspelled_supplier() {
        assert!(keyword_fuzzy_matches("fournisseur", &["fournisseure"], 2));
        assert!(keyword_fuzzy_matches("fournisseur", &["fornisseur"], 2));
    }
}
