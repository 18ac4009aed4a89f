// src/utils/config.rs

use std::env;

use log::info;

/// Jaccard threshold for resolving a holding's raw name against the
/// registry. Empirically chosen for the observed filing corpus.
pub const DEFAULT_HOLDING_TOKEN_THRESHOLD: f64 = 0.70;

/// Jaccard threshold for merging two canonical companies. Stricter than the
/// holding threshold: merging identities is higher-stakes than resolving one
/// row.
pub const DEFAULT_CONSOLIDATION_TOKEN_THRESHOLD: f64 = 0.90;

/// Minimum token count before token-overlap matching is attempted. Guards
/// against single-word over-matching ("summit").
pub const DEFAULT_MIN_TOKEN_COUNT: usize = 2;

/// Minimum token count an extracted first entity must normalize to before a
/// consolidation merge is allowed.
pub const DEFAULT_MIN_FIRST_ENTITY_TOKENS: usize = 2;

/// Tunable matching thresholds. Defaults are the corpus-observed values; all
/// of them can be overridden from the environment. None of these constants
/// are assumed to generalize beyond the observed filing corpus.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub holding_token_threshold: f64,
    pub consolidation_token_threshold: f64,
    pub min_token_count: usize,
    pub min_first_entity_tokens: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            holding_token_threshold: DEFAULT_HOLDING_TOKEN_THRESHOLD,
            consolidation_token_threshold: DEFAULT_CONSOLIDATION_TOKEN_THRESHOLD,
            min_token_count: DEFAULT_MIN_TOKEN_COUNT,
            min_first_entity_tokens: DEFAULT_MIN_FIRST_ENTITY_TOKENS,
        }
    }
}

impl MatchingConfig {
    /// Read overrides from the environment, falling back to defaults on
    /// missing or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            holding_token_threshold: parse_env_f64(
                "RESOLVER_TOKEN_THRESHOLD",
                defaults.holding_token_threshold,
            ),
            consolidation_token_threshold: parse_env_f64(
                "CONSOLIDATION_TOKEN_THRESHOLD",
                defaults.consolidation_token_threshold,
            ),
            min_token_count: parse_env_usize("RESOLVER_MIN_TOKENS", defaults.min_token_count),
            min_first_entity_tokens: parse_env_usize(
                "CONSOLIDATION_MIN_FIRST_ENTITY_TOKENS",
                defaults.min_first_entity_tokens,
            ),
        }
    }

    pub fn log_config(&self) {
        info!(
            "Matching thresholds: holding Jaccard >= {:.2}, consolidation Jaccard >= {:.2}, \
             min tokens {}, min first-entity tokens {}",
            self.holding_token_threshold,
            self.consolidation_token_threshold,
            self.min_token_count,
            self.min_first_entity_tokens
        );
    }
}

fn parse_env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_corpus_constants() {
        let config = MatchingConfig::default();
        assert_eq!(config.holding_token_threshold, 0.70);
        assert_eq!(config.consolidation_token_threshold, 0.90);
        assert_eq!(config.min_token_count, 2);
        assert_eq!(config.min_first_entity_tokens, 2);
    }

    #[test]
    fn env_overrides_are_applied() {
        env::set_var("RESOLVER_TOKEN_THRESHOLD", "0.85");
        env::set_var("RESOLVER_MIN_TOKENS", "3");

        let config = MatchingConfig::from_env();
        assert_eq!(config.holding_token_threshold, 0.85);
        assert_eq!(config.min_token_count, 3);
        assert_eq!(config.consolidation_token_threshold, 0.90);

        env::remove_var("RESOLVER_TOKEN_THRESHOLD");
        env::remove_var("RESOLVER_MIN_TOKENS");
    }

    #[test]
    fn unparsable_env_values_fall_back_to_defaults() {
        env::set_var("CONSOLIDATION_TOKEN_THRESHOLD", "not-a-number");
        let config = MatchingConfig::from_env();
        assert_eq!(config.consolidation_token_threshold, 0.90);
        env::remove_var("CONSOLIDATION_TOKEN_THRESHOLD");
    }
}
