//! Fuzzy path matcher.
//!
//! Given an expected path that no longer resolves, searches the project tree
//! for the most likely actual location. Scoring is a weighted combination of
//! four named sub-scores (filename, keyword, directory, extension), each
//! independently testable; search proceeds in tiers from the expected path's
//! logical group outward. Results are deterministic for identical inputs.

pub mod score;
pub mod search;

use serde::{Deserialize, Serialize};

pub use score::{
    combined_score, directory_similarity, extension_similarity, filename_similarity,
    keyword_similarity,
};
pub use search::find_candidates;

/// Candidates below this combined score never satisfy a search tier.
pub const LOW_CONFIDENCE_FLOOR: f64 = 0.5;

/// How many top candidates are retained for reports and manual review.
pub const MAX_CANDIDATES: usize = 5;

/// Discretized similarity quality, used to gate automatic vs. manual
/// remediation. Ordered from weakest to strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    /// Below 0.50.
    VeryLow,
    /// At least 0.50.
    Low,
    /// At least 0.60. The floor for automatic remediation.
    Medium,
    /// At least 0.70.
    High,
    /// At least 0.80 and in the same logical group as the expected path.
    VeryHigh,
}

impl ConfidenceBand {
    /// Derives the band from a combined score and group membership.
    #[must_use]
    pub fn from_score(score: f64, same_group: bool) -> Self {
        if score >= 0.80 && same_group {
            Self::VeryHigh
        } else if score >= 0.70 {
            Self::High
        } else if score >= 0.60 {
            Self::Medium
        } else if score >= LOW_CONFIDENCE_FLOOR {
            Self::Low
        } else {
            Self::VeryLow
        }
    }
}

/// A ranked candidate for a missing expected path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Root-relative candidate path.
    pub path: String,
    /// Combined similarity score in `[0, 1]`.
    pub score: f64,
    /// Discretized confidence.
    pub band: ConfidenceBand,
    /// Whether the candidate shares the expected path's logical group.
    pub same_group: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(ConfidenceBand::from_score(0.85, true), ConfidenceBand::VeryHigh);
        assert_eq!(ConfidenceBand::from_score(0.85, false), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(0.72, true), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(0.65, false), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_score(0.55, true), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::from_score(0.3, true), ConfidenceBand::VeryLow);
    }

    #[test]
    fn bands_are_ordered_for_policy_gates() {
        assert!(ConfidenceBand::Medium >= ConfidenceBand::Medium);
        assert!(ConfidenceBand::High > ConfidenceBand::Medium);
        assert!(ConfidenceBand::Low < ConfidenceBand::Medium);
    }
}
