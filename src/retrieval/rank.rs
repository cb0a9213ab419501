//! Candidate merging and ranking.
//!
//! The three retrieval sources each contribute a candidate list; the merge
//! deduplicates by exact content (first occurrence wins, so source order
//! matters), sorts by descending score with stable tie-breaking, and caps
//! the result.

use std::collections::HashSet;

use crate::memory::types::RankedCandidate;

/// Merge candidate lists into the final ranked set.
///
/// `candidates` must already be concatenated in source order: vector first,
/// then encrypted-record, then keyword/tag — the dedup keeps whichever
/// source surfaced a given content string first.
pub fn merge_candidates(
    candidates: Vec<RankedCandidate>,
    max_candidates: usize,
) -> Vec<RankedCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique: Vec<RankedCandidate> = candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.content.clone()))
        .collect();

    // Stable sort keeps input order for equal scores
    unique.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    unique.truncate(max_candidates);
    unique
}
