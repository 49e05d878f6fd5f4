//! ---
//! itb_section: "03-routing-dispatch"
//! itb_subsection: "module"
//! itb_type: "source"
//! itb_scope: "code"
//! itb_description: "Wildcard matching for dotted routing keys."
//! itb_version: "v0.0.0-prealpha"
//! itb_owner: "tbd"
//! ---
use crate::{Result, RoutingError};

/// Single-term wildcard: matches any one dot-delimited term.
const SINGLE_WILDCARD: &str = "*";

/// Multi-term wildcard. Recognized only to be rejected.
const MULTI_WILDCARD: &str = "#";

fn has_term(key: &str, term: &str) -> bool {
    key.split('.').any(|t| t == term)
}

/// Decide whether a concrete routing key matches a registered pattern.
///
/// Pure function over the two dotted strings:
/// - `#` as a whole term on either side is a hard failure, never a silent
///   fallback. Like `*`, it is only recognized term-wise; a `#` embedded in
///   a longer term (`foo.b#r`) is an ordinary literal.
/// - With no wildcard on either side, matching is exact string equality.
/// - Otherwise the term sequences must have equal length, and each term pair
///   must be equal or contain a literal `*`.
///
/// A term-count mismatch is "no match", not an error.
pub fn matches(pattern: &str, key: &str) -> Result<bool> {
    if has_term(pattern, MULTI_WILDCARD) || has_term(key, MULTI_WILDCARD) {
        return Err(RoutingError::MultiLevelWildcard);
    }
    if !has_term(pattern, SINGLE_WILDCARD) && !has_term(key, SINGLE_WILDCARD) {
        return Ok(pattern == key);
    }
    let pattern_terms: Vec<&str> = pattern.split('.').collect();
    let key_terms: Vec<&str> = key.split('.').collect();
    if pattern_terms.len() != key_terms.len() {
        return Ok(false);
    }
    Ok(pattern_terms
        .iter()
        .zip(key_terms.iter())
        .all(|(p, k)| *p == SINGLE_WILDCARD || *k == SINGLE_WILDCARD || p == k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_keys_match_by_string_equality() {
        assert!(matches("testsuite.testcase.start", "testsuite.testcase.start").expect("match"));
        assert!(!matches("testsuite.testcase.start", "testsuite.testcase.stop").expect("match"));
    }

    #[test]
    fn wildcard_term_matches_any_single_term() {
        assert!(matches("fromAgent.*.packet.raw", "fromAgent.agent1.packet.raw").expect("match"));
        assert!(matches("fromAgent.*.packet.raw", "fromAgent.coap_server.packet.raw").expect("match"));
        assert!(!matches("fromAgent.*.packet.raw", "blabla.agent1.packet.raw").expect("match"));
    }

    #[test]
    fn wildcard_on_the_probe_side_also_matches() {
        assert!(matches("fromAgent.agent1.packet.raw", "fromAgent.*.packet.raw").expect("match"));
    }

    #[test]
    fn term_count_mismatch_is_no_match_not_an_error() {
        assert!(!matches("fromAgent.*.packet.raw", "fromAgent.agent1.packet").expect("match"));
        assert!(!matches("a.*", "a.b.c").expect("match"));
    }

    #[test]
    fn multi_term_wildcard_is_rejected_on_either_side() {
        assert!(matches("#", "testsuite.start").is_err());
        assert!(matches("testsuite.#", "testsuite.start").is_err());
        assert!(matches("testsuite.start", "#").is_err());
        assert!(matches("testsuite.start", "testsuite.#").is_err());
    }

    #[test]
    fn embedded_hash_is_a_literal_term_not_a_wildcard() {
        assert!(matches("foo.b#r", "foo.b#r").expect("match"));
        assert!(!matches("foo.b#r", "foo.bar").expect("match"));
        assert!(!matches("foo.b#r", "foo.b#r.baz").expect("match"));
    }

    #[test]
    fn wildcard_only_covers_whole_terms() {
        // '*' is a term-level wildcard, not a substring glob.
        assert!(!matches("fromAgent.ag*.packet.raw", "fromAgent.agent1.packet.raw").expect("match"));
    }

    #[test]
    fn every_term_pair_must_match() {
        assert!(!matches("*.testcase.start", "testsuite.testcase.stop").expect("match"));
        assert!(matches("*.testcase.start", "testsuite.testcase.start").expect("match"));
    }
}
