// src/matching/first_entity.rs

use once_cell::sync::Lazy;
use regex::Regex;

/// A legal suffix immediately followed by a comma marks the end of the first
/// entity in an enumerated name ("Acme Holdco, LLC, Acme Purchaser, LLC and
/// ..."). This list is intentionally shorter than the normalizer's suffix
/// table: only suffixes that terminate a legal name are useful split points.
static SUFFIX_COMMA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:inc|llc|lp|l\.p\.|corp|corporation|ltd|limited)\s*,").unwrap()
});

static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i) and ").unwrap());

/// Minimum prefix length for an " and " split to be considered meaningful.
const MIN_AND_PREFIX_CHARS: usize = 3;

/// Extract the first constituent entity from a name that may enumerate
/// several legal entities. Best-effort heuristic, not a parser: malformed
/// input falls through to the trimmed original.
pub fn extract_first_entity(name: &str) -> String {
    let text = name.trim();
    if text.is_empty() {
        return String::new();
    }

    // "CompanyA, LLC, CompanyB, Inc." - cut after the first suffix-comma,
    // keeping the suffix and dropping the comma.
    if let Some(m) = SUFFIX_COMMA_RE.find(text) {
        // The match always ends on the ASCII comma, so end-1 is a char
        // boundary.
        return text[..m.end() - 1].trim().to_string();
    }

    // "CompanyA LLC and CompanyB Holdings LP" - take the prefix before the
    // first " and ", if it is long enough to be a name.
    if let Some(m) = AND_RE.find(text) {
        if m.start() > 0 {
            let prefix = text[..m.start()].trim();
            if prefix.chars().count() >= MIN_AND_PREFIX_CHARS {
                return prefix.to_string();
            }
        }
    }

    text.to_string()
}
