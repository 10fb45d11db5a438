//! Case-insensitive term comparison shared by blueprint binding and matching.
//!
//! Partial matches are token-aligned: the shorter term must appear as a
//! contiguous run of whole words inside the longer one, and must be at least
//! [`MIN_PARTIAL_TERM_LENGTH`] characters long. "East" therefore matches
//! "East Coast" but not "Eastern Europe".

use crate::constants::MIN_PARTIAL_TERM_LENGTH;

/// Lowercases, trims and collapses internal whitespace.
pub fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits a term into lowercase alphanumeric tokens.
pub fn tokenize(term: &str) -> Vec<String> {
    term.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Case-insensitive equality after whitespace normalization.
pub fn terms_equal(a: &str, b: &str) -> bool {
    let a = normalize_term(a);
    !a.is_empty() && a == normalize_term(b)
}

/// Bidirectional, token-aligned containment.
pub fn terms_overlap(a: &str, b: &str) -> bool {
    let a_tokens = tokenize(a);
    let b_tokens = tokenize(b);
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return false;
    }
    if a_tokens == b_tokens {
        return true;
    }

    let (short, long) = if a_tokens.len() <= b_tokens.len() {
        (a_tokens, b_tokens)
    } else {
        (b_tokens, a_tokens)
    };

    let short_len: usize = short.iter().map(|t| t.len()).sum::<usize>() + short.len() - 1;
    if short_len < MIN_PARTIAL_TERM_LENGTH {
        return false;
    }

    long.windows(short.len()).any(|window| window == short.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_token_aligned() {
        assert!(terms_overlap("East", "East Coast"));
        assert!(terms_overlap("East Coast", "east"));
        assert!(!terms_overlap("East", "Eastern Europe"));
        assert!(terms_overlap("Acme Corp", "ACME corp"));
    }

    #[test]
    fn short_terms_only_match_exactly() {
        assert!(!terms_overlap("NY", "NY Metro"));
        assert!(terms_overlap("NY", "ny"));
        assert!(!terms_overlap("", "anything"));
    }

    #[test]
    fn equality_ignores_case_and_spacing() {
        assert!(terms_equal("  Japanese  Maple ", "japanese maple"));
        assert!(!terms_equal("", ""));
    }
}
