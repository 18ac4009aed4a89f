// src/matching/tokens.rs

use std::collections::HashSet;

use crate::matching::normalize::normalize_name;

/// Token set of a name's normalized form. An empty normalized form yields an
/// empty set, which Jaccard treats as matching nothing.
pub fn tokenize(name: &str) -> HashSet<String> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return HashSet::new();
    }
    normalized.split_whitespace().map(str::to_string).collect()
}

/// Jaccard similarity of two token sets: |a ∩ b| / |a ∪ b|. Defined as 0.0
/// when either set is empty so empty names never match anything.
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn tokenize_uses_normalized_form() {
        let tokens = tokenize("Acme Technologies, Inc.");
        assert_eq!(tokens, set(&["acme", "technologies"]));
    }

    #[test]
    fn tokenize_empty_name_is_empty_set() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("LLC, Inc.").is_empty());
    }

    #[test]
    fn jaccard_is_bounded_and_symmetric() {
        let a = set(&["acme", "technologies", "global"]);
        let b = set(&["acme", "technologies"]);
        let ab = jaccard_similarity(&a, &b);
        let ba = jaccard_similarity(&b, &a);
        assert_eq!(ab, ba);
        assert!((0.0..=1.0).contains(&ab));
        assert!((ab - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn jaccard_of_identical_sets_is_one() {
        let a = set(&["summit", "behavioral", "healthcare"]);
        assert_eq!(jaccard_similarity(&a, &a), 1.0);
    }

    #[test]
    fn jaccard_with_empty_set_is_zero() {
        let a = set(&["acme"]);
        let empty = HashSet::new();
        assert_eq!(jaccard_similarity(&a, &empty), 0.0);
        assert_eq!(jaccard_similarity(&empty, &a), 0.0);
        assert_eq!(jaccard_similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn jaccard_of_disjoint_sets_is_zero() {
        let a = set(&["acme"]);
        let b = set(&["summit"]);
        assert_eq!(jaccard_similarity(&a, &b), 0.0);
    }
}
