//! Tiered candidate search over the project tree.
//!
//! Scope precedence: (1) the expected path's logical group, (2) configured
//! related groups, (3) the whole tree. A tier is only searched when the
//! previous one yields nothing above the low-confidence floor. When no tier
//! clears the floor, the best whole-tree candidates are still returned so
//! manual review has something to look at.

use crate::config::{group_of, groups_related, LogicalGroup};

use super::score::combined_score;
use super::{ConfidenceBand, MatchCandidate, LOW_CONFIDENCE_FLOOR, MAX_CANDIDATES};

/// Scores a set of candidate paths against the expected path and ranks them.
fn rank<'a, I>(expected: &str, files: I, groups: &[LogicalGroup]) -> Vec<MatchCandidate>
where
    I: IntoIterator<Item = &'a String>,
{
    let expected_group = group_of(groups, expected);
    let mut candidates: Vec<MatchCandidate> = files
        .into_iter()
        .filter(|path| path.as_str() != expected)
        .map(|path| {
            let score = combined_score(expected, path, groups);
            let same_group = match (expected_group, group_of(groups, path)) {
                (Some(a), Some(b)) => a.name == b.name,
                _ => false,
            };
            MatchCandidate {
                path: path.clone(),
                score,
                band: ConfidenceBand::from_score(score, same_group),
                same_group,
            }
        })
        .collect();

    // Deterministic order: score descending, same-group candidates first on
    // equal scores, then shortest path, then lexicographic.
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.same_group.cmp(&a.same_group))
            .then_with(|| a.path.len().cmp(&b.path.len()))
            .then_with(|| a.path.cmp(&b.path))
    });
    candidates
}

/// Finds ranked candidates for a missing expected path.
///
/// Returns at most [`MAX_CANDIDATES`] entries, highest similarity first,
/// deterministic for identical inputs.
#[must_use]
pub fn find_candidates(
    expected: &str,
    files: &[String],
    groups: &[LogicalGroup],
) -> Vec<MatchCandidate> {
    let expected_group = group_of(groups, expected);

    if let Some(home) = expected_group {
        // Tier 1: same logical group.
        let same_group = files.iter().filter(|path| home.contains(path));
        let ranked = rank(expected, same_group, groups);
        if ranked.first().is_some_and(|best| best.score >= LOW_CONFIDENCE_FLOOR) {
            return truncate(ranked);
        }

        // Tier 2: configured related groups.
        let related = files.iter().filter(|path| {
            group_of(groups, path)
                .is_some_and(|g| g.name != home.name && groups_related(home, g))
        });
        let ranked = rank(expected, related, groups);
        if ranked.first().is_some_and(|best| best.score >= LOW_CONFIDENCE_FLOOR) {
            return truncate(ranked);
        }
    }

    // Tier 3: whole project tree. Returned even when everything is below the
    // floor, so low-confidence matches can be listed for manual review.
    truncate(rank(expected, files.iter(), groups))
}

fn truncate(mut candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    candidates.truncate(MAX_CANDIDATES);
    candidates
}
