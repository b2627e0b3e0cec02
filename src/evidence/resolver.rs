//! Filesystem evidence resolver.
//!
//! Checks one parsed [`EvidenceHook`] against the real project tree. Absence
//! is data, not an error: a missing file produces `exists = false` and the
//! verifier decides what to do next. Content matchers are evaluated literally
//! or structurally; nothing is ever executed.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::EvidenceHook;
use crate::context::ServiceContext;

/// Upper bound on bytes read per file when applying a matcher.
///
/// Larger files are matched against a truncated prefix and the resolution is
/// marked reduced-confidence.
pub const MAX_MATCH_BYTES: u64 = 512 * 1024;

/// Tri-state outcome of a content matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherOutcome {
    /// Every specified matcher held (or none was specified).
    Satisfied,
    /// At least one specified matcher did not hold.
    Unsatisfied,
    /// The matcher could not be evaluated (binary content, missing file).
    Unknown,
}

/// Result of resolving one evidence hook. Produced fresh every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceResolution {
    /// The hook this resolution is for.
    pub hook: EvidenceHook,
    /// Whether the anchor file exists inside the project root.
    pub exists: bool,
    /// Content-matcher outcome.
    pub matcher: MatcherOutcome,
    /// The file was larger than the read bound; matching saw a prefix only.
    pub truncated: bool,
    /// The resolved path escapes the project root (symlink or otherwise).
    pub scope_violation: bool,
    /// Non-fatal problems encountered while resolving.
    pub errors: Vec<String>,
}

/// Checks whether `text` contains `symbol` as a whole identifier.
fn symbol_matches(text: &str, symbol: &str) -> bool {
    let pattern = format!(r"\b{}\b", regex::escape(symbol));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(text))
}

/// Checks whether `text` has a Markdown heading containing `heading`,
/// case-insensitively.
fn heading_matches(text: &str, heading: &str) -> bool {
    let needle = heading.to_lowercase();
    text.lines().any(|line| {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix('#') else { return false };
        let title = rest.trim_start_matches('#').trim();
        title.to_lowercase().contains(&needle)
    })
}

/// Checks whether markup `text` contains the given selector structurally:
/// `#id` looks for an id attribute, `.class` for a class attribute, anything
/// else for an opening tag.
fn selector_matches(text: &str, selector: &str) -> bool {
    if let Some(id) = selector.strip_prefix('#') {
        return text.contains(&format!("id=\"{id}\"")) || text.contains(&format!("id='{id}'"));
    }
    if let Some(class) = selector.strip_prefix('.') {
        return text
            .lines()
            .any(|line| line.contains("class=") && line.contains(class));
    }
    text.contains(&format!("<{selector}"))
}

/// Applies every matcher the hook specifies against file content.
fn apply_matchers(hook: &EvidenceHook, content: &str, errors: &mut Vec<String>) -> MatcherOutcome {
    let mut satisfied = true;

    if let Some(symbol) = &hook.symbol {
        satisfied &= symbol_matches(content, symbol);
    }
    if let Some(needle) = &hook.contains {
        satisfied &= content.contains(needle.as_str());
    }
    if let Some(pattern) = &hook.regex {
        match Regex::new(pattern) {
            Ok(re) => satisfied &= re.is_match(content),
            Err(e) => {
                errors.push(format!("invalid regex= pattern: {e}"));
                satisfied = false;
            }
        }
    }
    if let Some(heading) = &hook.heading {
        satisfied &= heading_matches(content, heading);
    }
    if let Some(selector) = &hook.selector {
        satisfied &= selector_matches(content, selector);
    }

    if satisfied {
        MatcherOutcome::Satisfied
    } else {
        MatcherOutcome::Unsatisfied
    }
}

/// Resolves one evidence hook against the project root.
///
/// Never raises on missing files; `command=` values are metadata only and
/// are never executed.
#[must_use]
pub fn resolve(ctx: &ServiceContext, root: &Path, hook: &EvidenceHook) -> EvidenceResolution {
    let mut resolution = EvidenceResolution {
        hook: hook.clone(),
        exists: false,
        matcher: MatcherOutcome::Unknown,
        truncated: false,
        scope_violation: false,
        errors: Vec::new(),
    };

    let full_path = root.join(&hook.path);
    if !ctx.fs.exists(&full_path) {
        return resolution;
    }

    // The parser already rejects traversal; canonicalization catches symlink
    // escapes from inside the tree.
    match (ctx.fs.canonicalize(&full_path), ctx.fs.canonicalize(root)) {
        (Ok(canonical), Ok(canonical_root)) => {
            if !canonical.starts_with(&canonical_root) {
                resolution.scope_violation = true;
                resolution
                    .errors
                    .push(format!("{} resolves outside the project root", hook.path));
                return resolution;
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            resolution.errors.push(format!("failed to canonicalize {}: {e}", hook.path));
            return resolution;
        }
    }

    resolution.exists = true;

    if !hook.has_content_matcher() {
        resolution.matcher = MatcherOutcome::Satisfied;
        return resolution;
    }

    let (bytes, truncated) = match ctx.fs.read_bytes(&full_path, MAX_MATCH_BYTES) {
        Ok(read) => read,
        Err(e) => {
            resolution.errors.push(format!("failed to read {}: {e}", hook.path));
            return resolution;
        }
    };
    resolution.truncated = truncated;

    if truncated {
        // A truncated read may end mid-sequence; decode lossily rather than
        // misclassifying text as binary.
        let content = String::from_utf8_lossy(&bytes);
        resolution.matcher = apply_matchers(hook, &content, &mut resolution.errors);
        return resolution;
    }

    match String::from_utf8(bytes) {
        Ok(content) => {
            resolution.matcher = apply_matchers(hook, &content, &mut resolution.errors);
        }
        Err(_) => {
            // Binary content with a text matcher: unknown, not a failure.
            resolution.matcher = MatcherOutcome::Unknown;
            resolution
                .errors
                .push(format!("{} is not valid UTF-8; matcher not evaluated", hook.path));
        }
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::fixed_context;
    use crate::evidence::EvidenceType;

    fn hook(path: &str) -> EvidenceHook {
        EvidenceHook {
            hook_type: EvidenceType::Code,
            path: path.to_string(),
            symbol: None,
            contains: None,
            regex: None,
            heading: None,
            selector: None,
            command: None,
            line_no: 0,
            normalized: false,
        }
    }

    #[test]
    fn missing_file_is_data_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = fixed_context();
        let resolution = resolve(&ctx, dir.path(), &hook("src/gone.rs"));
        assert!(!resolution.exists);
        assert_eq!(resolution.matcher, MatcherOutcome::Unknown);
        assert!(resolution.errors.is_empty());
    }

    #[test]
    fn existing_file_without_matcher_is_satisfied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let ctx = fixed_context();
        let resolution = resolve(&ctx, dir.path(), &hook("package.json"));
        assert!(resolution.exists);
        assert_eq!(resolution.matcher, MatcherOutcome::Satisfied);
    }

    #[test]
    fn symbol_matcher_requires_word_boundary() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("auth.rs"), "fn login_user() {}\nfn login() {}\n")
            .unwrap();
        let ctx = fixed_context();

        let mut h = hook("auth.rs");
        h.symbol = Some("login".to_string());
        assert_eq!(resolve(&ctx, dir.path(), &h).matcher, MatcherOutcome::Satisfied);

        h.symbol = Some("logout".to_string());
        assert_eq!(resolve(&ctx, dir.path(), &h).matcher, MatcherOutcome::Unsatisfied);
    }

    #[test]
    fn contains_and_regex_matchers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() { start(); }\n").unwrap();
        let ctx = fixed_context();

        let mut h = hook("main.rs");
        h.contains = Some("start()".to_string());
        assert_eq!(resolve(&ctx, dir.path(), &h).matcher, MatcherOutcome::Satisfied);

        let mut h = hook("main.rs");
        h.regex = Some(r"fn\s+main".to_string());
        assert_eq!(resolve(&ctx, dir.path(), &h).matcher, MatcherOutcome::Satisfied);
    }

    #[test]
    fn invalid_regex_is_unsatisfied_with_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), "x").unwrap();
        let ctx = fixed_context();

        let mut h = hook("main.rs");
        h.regex = Some("(unclosed".to_string());
        let resolution = resolve(&ctx, dir.path(), &h);
        assert_eq!(resolution.matcher, MatcherOutcome::Unsatisfied);
        assert!(resolution.errors[0].contains("invalid regex"));
    }

    #[test]
    fn heading_matcher_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("api.md"), "# Intro\n\n## Auth Endpoints\n").unwrap();
        let ctx = fixed_context();

        let mut h = hook("api.md");
        h.hook_type = EvidenceType::Docs;
        h.heading = Some("auth endpoints".to_string());
        assert_eq!(resolve(&ctx, dir.path(), &h).matcher, MatcherOutcome::Satisfied);

        h.heading = Some("Billing".to_string());
        assert_eq!(resolve(&ctx, dir.path(), &h).matcher, MatcherOutcome::Unsatisfied);
    }

    #[test]
    fn selector_matcher_checks_ids_classes_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("login.html"),
            "<form id=\"login-form\" class=\"card wide\">\n<button>Go</button>\n</form>\n",
        )
        .unwrap();
        let ctx = fixed_context();

        let mut h = hook("login.html");
        h.hook_type = EvidenceType::Ui;
        for selector in ["#login-form", ".card", "button"] {
            h.selector = Some(selector.to_string());
            assert_eq!(
                resolve(&ctx, dir.path(), &h).matcher,
                MatcherOutcome::Satisfied,
                "selector {selector}"
            );
        }
        h.selector = Some("#signup-form".to_string());
        assert_eq!(resolve(&ctx, dir.path(), &h).matcher, MatcherOutcome::Unsatisfied);
    }

    #[test]
    fn binary_content_with_text_matcher_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.png"), [0x89u8, 0x50, 0x4e, 0x47, 0xff, 0xfe])
            .unwrap();
        let ctx = fixed_context();

        let mut h = hook("logo.png");
        h.contains = Some("png".to_string());
        let resolution = resolve(&ctx, dir.path(), &h);
        assert!(resolution.exists);
        assert_eq!(resolution.matcher, MatcherOutcome::Unknown);
    }

    #[test]
    fn oversized_file_is_matched_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = "needle at the start\n".to_string();
        content.push_str(&"x".repeat(600 * 1024));
        std::fs::write(dir.path().join("big.txt"), &content).unwrap();
        let ctx = fixed_context();

        let mut h = hook("big.txt");
        h.contains = Some("needle".to_string());
        let resolution = resolve(&ctx, dir.path(), &h);
        assert!(resolution.truncated);
        assert_eq!(resolution.matcher, MatcherOutcome::Satisfied);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_a_scope_violation() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "s").unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
            .unwrap();
        let ctx = fixed_context();

        let resolution = resolve(&ctx, dir.path(), &hook("link.txt"));
        assert!(resolution.scope_violation);
        assert!(!resolution.exists);
    }
}
