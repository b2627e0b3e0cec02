//! Similarity sub-scores for the fuzzy path matcher.
//!
//! Four named signals combined linearly: filename (0.40), keyword (0.30),
//! directory (0.20), extension (0.10). Each sub-score is in `[0, 1]` and
//! tested in isolation so weights and thresholds can be tuned.

use std::collections::HashSet;

use crate::config::{group_of, groups_related, LogicalGroup};

const FILENAME_WEIGHT: f64 = 0.40;
const KEYWORD_WEIGHT: f64 = 0.30;
const DIRECTORY_WEIGHT: f64 = 0.20;
const EXTENSION_WEIGHT: f64 = 0.10;

/// Score bonus when expected and candidate sit in related logical groups.
const RELATED_GROUP_BONUS: f64 = 0.2;

/// Extension families that score partial credit against each other.
const EXTENSION_FAMILIES: &[&[&str]] = &[
    &["ts", "tsx", "js", "jsx", "mts", "cts"],
    &["py", "pyi"],
    &["md", "mdx", "markdown"],
    &["yml", "yaml"],
    &["html", "htm"],
    &["css", "scss", "sass", "less"],
    &["c", "h", "cc", "cpp", "hpp"],
];

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn extension(path: &str) -> Option<String> {
    let name = basename(path);
    name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

/// Basename without its final extension, lowercased.
fn file_stem_lower(path: &str) -> String {
    let name = basename(path);
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    stem.to_lowercase()
}

/// Splits a dotted role suffix off a stem: `auth.service` -> (`auth`,
/// `service`).
fn split_role(stem: &str) -> (&str, Option<&str>) {
    stem.rsplit_once('.').map_or((stem, None), |(base, role)| (base, Some(role)))
}

/// Filename similarity: normalized edit distance between base filenames,
/// case-insensitive and suffix-aware. A differing role suffix (`.service`
/// vs `.provider`) is penalized harder than a bare rename.
#[must_use]
pub fn filename_similarity(expected: &str, candidate: &str) -> f64 {
    let a = file_stem_lower(expected);
    let b = file_stem_lower(candidate);
    let (a_base, a_role) = split_role(&a);
    let (b_base, b_role) = split_role(&b);

    match (a_role, b_role) {
        (None, None) => strsim::normalized_levenshtein(&a, &b),
        (Some(role_a), Some(role_b)) if role_a == role_b => {
            strsim::normalized_levenshtein(a_base, b_base)
        }
        _ => strsim::normalized_levenshtein(a_base, b_base) * 0.6,
    }
}

/// Splits a path into lowercase word tokens: segments split on separators
/// and camelCase boundaries.
fn tokens(path: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    for segment in path.split(['/', '-', '_', '.']) {
        let mut word = String::new();
        let mut prev_lower = false;
        for ch in segment.chars() {
            if ch.is_uppercase() && prev_lower {
                if !word.is_empty() {
                    out.insert(std::mem::take(&mut word));
                }
            }
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            word.extend(ch.to_lowercase());
        }
        if !word.is_empty() {
            out.insert(word);
        }
    }
    out
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let ratio = intersection as f64 / union as f64;
        ratio
    }
}

/// Keyword similarity: token overlap between words extracted from path
/// segments.
#[must_use]
pub fn keyword_similarity(expected: &str, candidate: &str) -> f64 {
    jaccard(&tokens(expected), &tokens(candidate))
}

fn dir_segments(path: &str) -> HashSet<String> {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').map(str::to_lowercase).collect(),
        None => HashSet::new(),
    }
}

/// Directory similarity: overlap between containing directory segments, with
/// a bonus when the two paths sit in configured related logical groups.
#[must_use]
pub fn directory_similarity(expected: &str, candidate: &str, groups: &[LogicalGroup]) -> f64 {
    let a = dir_segments(expected);
    let b = dir_segments(candidate);
    let mut score = jaccard(&a, &b);

    if let (Some(ga), Some(gb)) = (group_of(groups, expected), group_of(groups, candidate)) {
        if groups_related(ga, gb) {
            score = (score + RELATED_GROUP_BONUS).min(1.0);
        }
    }
    score
}

/// Extension similarity: exact match scores 1.0, compatible family scores
/// partial credit, incompatible scores 0.
#[must_use]
pub fn extension_similarity(expected: &str, candidate: &str) -> f64 {
    match (extension(expected), extension(candidate)) {
        (None, None) => 1.0,
        (Some(a), Some(b)) if a == b => 1.0,
        (Some(a), Some(b)) => {
            let same_family = EXTENSION_FAMILIES
                .iter()
                .any(|family| family.contains(&a.as_str()) && family.contains(&b.as_str()));
            if same_family {
                0.5
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Combined weighted similarity between an expected path and a candidate.
#[must_use]
pub fn combined_score(expected: &str, candidate: &str, groups: &[LogicalGroup]) -> f64 {
    FILENAME_WEIGHT * filename_similarity(expected, candidate)
        + KEYWORD_WEIGHT * keyword_similarity(expected, candidate)
        + DIRECTORY_WEIGHT * directory_similarity(expected, candidate, groups)
        + EXTENSION_WEIGHT * extension_similarity(expected, candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_filenames_score_one() {
        assert!((filename_similarity("src/auth-service.ts", "lib/auth-service.ts") - 1.0).abs()
            < f64::EPSILON);
    }

    #[test]
    fn filename_similarity_is_case_insensitive() {
        assert!(
            (filename_similarity("src/AuthService.ts", "src/authservice.ts") - 1.0).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn differing_role_suffix_penalized_more_than_bare_rename() {
        let role_swap = filename_similarity("src/auth.service.ts", "src/auth.provider.ts");
        let bare_rename = filename_similarity("src/auth.service.ts", "src/authn.service.ts");
        assert!(role_swap < bare_rename, "{role_swap} vs {bare_rename}");
    }

    #[test]
    fn keyword_similarity_splits_camel_case_and_separators() {
        let score = keyword_similarity("src/userProfile.ts", "src/user-profile.ts");
        assert!((score - 1.0).abs() < f64::EPSILON);

        let unrelated = keyword_similarity("src/billing.ts", "docs/deploy.md");
        assert!(unrelated < 0.2);
    }

    #[test]
    fn directory_similarity_partial_overlap() {
        let score = directory_similarity("src/auth-service.ts", "src/services/auth-service.ts", &[]);
        assert!((score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn directory_similarity_applies_related_group_bonus() {
        let groups = vec![
            LogicalGroup {
                name: "api".to_string(),
                prefixes: vec!["packages/api/".to_string()],
                related: vec!["api-svc".to_string()],
            },
            LogicalGroup {
                name: "api-svc".to_string(),
                prefixes: vec!["packages/api-svc/".to_string()],
                related: vec![],
            },
        ];
        let with_bonus = directory_similarity(
            "packages/api/user.ts",
            "packages/api-svc/user.ts",
            &groups,
        );
        let without = directory_similarity("packages/api/user.ts", "packages/api-svc/user.ts", &[]);
        assert!((with_bonus - without - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn extension_similarity_exact_family_incompatible() {
        assert!((extension_similarity("a.ts", "b.ts") - 1.0).abs() < f64::EPSILON);
        assert!((extension_similarity("a.ts", "b.tsx") - 0.5).abs() < f64::EPSILON);
        assert!(extension_similarity("a.ts", "b.rs").abs() < f64::EPSILON);
        assert!((extension_similarity("Makefile", "LICENSE") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn renamed_file_in_new_directory_scores_high() {
        // The renamed-service scenario: same filename, moved one directory
        // down, same extension.
        let score = combined_score("src/auth-service.ts", "src/services/auth-service.ts", &[]);
        assert!(score >= 0.8, "expected >= 0.8, got {score}");
    }

    #[test]
    fn unrelated_file_scores_low() {
        let score = combined_score("src/auth-service.ts", "docs/changelog.md", &[]);
        assert!(score < 0.3, "expected < 0.3, got {score}");
    }
}
