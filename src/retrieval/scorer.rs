//! Lexical overlap relevance scorer.
//!
//! Deterministic, pure, and independent of the vector index: each query
//! token scores 1.0 for an exact substring hit in the candidate and 0.5 for
//! a partial hit against any candidate token (either containing the other),
//! normalized by the query token count and clamped to 1.0. Per-source
//! bonuses are added downstream, after the clamp.

use super::query_tokens;

/// Score how relevant `candidate` is to `query`, in `[0.0, 1.0]`.
///
/// Not symmetric: only query tokens are scanned against the candidate.
/// Empty query or candidate scores 0.
pub fn relevance(candidate: &str, query: &str) -> f64 {
    if candidate.is_empty() || query.is_empty() {
        return 0.0;
    }

    let tokens = query_tokens(query);
    if tokens.is_empty() {
        return 0.0;
    }

    let candidate_lower = candidate.to_lowercase();
    let candidate_words: Vec<&str> = candidate_lower.split_whitespace().collect();

    let mut exact = 0usize;
    let mut partial = 0usize;
    for token in &tokens {
        if candidate_lower.contains(token.as_str()) {
            exact += 1;
        } else if candidate_words
            .iter()
            .any(|word| word.contains(token.as_str()) || token.contains(word))
        {
            partial += 1;
        }
    }

    let score = (exact as f64 + partial as f64 * 0.5) / tokens.len().max(1) as f64;
    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_texts_score_zero() {
        assert_eq!(relevance("grocery list for sunday", "quantum chromodynamics"), 0.0);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(relevance("", "some query"), 0.0);
        assert_eq!(relevance("some text", ""), 0.0);
        assert_eq!(relevance("some text", "a an"), 0.0); // all tokens too short
    }

    #[test]
    fn full_overlap_scores_one() {
        assert_eq!(relevance("project apollo uses react", "apollo react project"), 1.0);
    }

    #[test]
    fn exact_matches_are_case_insensitive_substrings() {
        // "apollo" appears inside "Apollo"; "react" inside "React"
        let score = relevance("Project Apollo uses React and Node", "Apollo React");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn partial_matches_score_half() {
        // "deploying" is not a substring of the candidate, but candidate
        // token "deploy" is contained in it
        let score = relevance("how to deploy the service", "deploying");
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn score_is_normalized_by_query_length() {
        // One exact hit out of four scoreable tokens
        let score = relevance("notes about apollo", "apollo venus jupiter saturn");
        assert!((score - 0.25).abs() < 1e-9);
    }

    #[test]
    fn score_never_exceeds_one() {
        let score = relevance("apollo apollo apollo apollo", "apollo");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn scorer_is_not_symmetric() {
        let a = relevance("apollo stack notes", "apollo");
        let b = relevance("apollo", "apollo stack notes");
        assert_eq!(a, 1.0);
        assert!(b < 1.0);
    }
}
