//! Evidence hook parser.
//!
//! Turns raw evidence declaration lines into structured [`EvidenceHook`]s.
//! Malformed lines are reported as diagnostics and skipped, never fatal to
//! the run. The one hard rule: a `path=` that is really a command is rejected
//! outright, because a path/command swap makes verification meaningless.

use super::{DiagnosticSeverity, EvidenceHook, EvidenceType, ParseDiagnostic};
use crate::doc::Task;

/// CLI verbs that mark a `path=` value as a swapped-in command.
const COMMAND_VERBS: &[&str] = &[
    "npm", "npx", "yarn", "pnpm", "cargo", "make", "go", "python", "python3", "pip", "git",
    "bash", "sh", "node", "mvn", "gradle", "dotnet",
];

/// Characters that would make a path a glob pattern.
const GLOB_CHARS: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Outcome of parsing one evidence line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// The structured hook, when the line was accepted.
    pub hook: Option<EvidenceHook>,
    /// Per-line diagnostics (errors or normalization notes).
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParsedLine {
    fn rejected(diagnostic: ParseDiagnostic) -> Self {
        Self { hook: None, diagnostics: vec![diagnostic] }
    }
}

/// Splits an evidence line body into tokens, honoring double quotes.
///
/// Quotes are stripped; quoted whitespace is preserved inside the token.
fn tokenize(text: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in text.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Validates a `path=` value as a safe repo-relative path.
///
/// Returns a rejection reason for anything that is absolute, escaping,
/// glob-like, whitespace-bearing, or a swapped-in command.
fn validate_path(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some("path= value is empty".to_string());
    }
    if value.chars().any(char::is_whitespace) {
        return Some(format!(
            "path= value {value:?} contains whitespace; a path is a single token, not a command"
        ));
    }
    let first_word = value.split(['/', '\\']).next().unwrap_or(value);
    if COMMAND_VERBS.contains(&first_word) && !value.contains('/') {
        return Some(format!(
            "path= value {value:?} looks like a command, not a file path"
        ));
    }
    if value.starts_with('/') {
        return Some(format!("path= value {value:?} must be repo-relative, not absolute"));
    }
    if value.split('/').any(|segment| segment == "..") {
        return Some(format!("path= value {value:?} must not traverse outside the repo"));
    }
    if value.contains(GLOB_CHARS) {
        return Some(format!("path= value {value:?} must not contain glob metacharacters"));
    }
    None
}

/// Parses one evidence line body (the text after `evidence:`).
#[must_use]
pub fn parse_line(text: &str, line_no: usize) -> ParsedLine {
    let tokens = match tokenize(text) {
        Ok(tokens) => tokens,
        Err(reason) => return ParsedLine::rejected(ParseDiagnostic::error(line_no, reason)),
    };
    let Some(type_token) = tokens.first() else {
        return ParsedLine::rejected(ParseDiagnostic::error(line_no, "empty evidence line"));
    };

    let mut diagnostics = Vec::new();
    let mut hook = EvidenceHook {
        hook_type: EvidenceType::Code,
        path: String::new(),
        symbol: None,
        contains: None,
        regex: None,
        heading: None,
        selector: None,
        command: None,
        line_no,
        normalized: false,
    };

    // Legacy colon shorthand `type:path` upgrades in place with a note.
    let rest = if let Some((type_part, path_part)) = type_token.split_once(':') {
        let Some(hook_type) = EvidenceType::from_token(type_part) else {
            return ParsedLine::rejected(ParseDiagnostic::error(
                line_no,
                format!("unsupported legacy evidence type {type_part:?}"),
            ));
        };
        hook.hook_type = hook_type;
        hook.path = path_part.to_string();
        hook.normalized = true;
        diagnostics.push(ParseDiagnostic::note(
            line_no,
            format!(
                "legacy form upgraded to `{} path={path_part}`",
                hook_type.as_str()
            ),
        ));
        &tokens[1..]
    } else {
        let Some(hook_type) = EvidenceType::from_token(type_token) else {
            return ParsedLine::rejected(ParseDiagnostic::error(
                line_no,
                format!(
                    "unsupported evidence type {type_token:?} (expected code, test, docs, or ui)"
                ),
            ));
        };
        hook.hook_type = hook_type;
        &tokens[1..]
    };

    for token in rest {
        let Some((key, value)) = token.split_once('=') else {
            return ParsedLine::rejected(ParseDiagnostic::error(
                line_no,
                format!("expected key=value, got {token:?}"),
            ));
        };
        if value.is_empty() {
            return ParsedLine::rejected(ParseDiagnostic::error(
                line_no,
                format!("{key}= value is empty"),
            ));
        }
        let slot = match key {
            "path" => {
                if !hook.path.is_empty() {
                    return ParsedLine::rejected(ParseDiagnostic::error(
                        line_no,
                        "duplicate path= key",
                    ));
                }
                hook.path = value.to_string();
                continue;
            }
            "symbol" => &mut hook.symbol,
            "contains" => &mut hook.contains,
            "regex" => &mut hook.regex,
            "heading" => &mut hook.heading,
            "selector" => &mut hook.selector,
            "command" => &mut hook.command,
            _ => {
                return ParsedLine::rejected(ParseDiagnostic::error(
                    line_no,
                    format!("unknown evidence key {key:?}"),
                ));
            }
        };
        if slot.is_some() {
            return ParsedLine::rejected(ParseDiagnostic::error(
                line_no,
                format!("duplicate {key}= key"),
            ));
        }
        *slot = Some(value.to_string());
    }

    if hook.path.is_empty() {
        return ParsedLine::rejected(ParseDiagnostic::error(
            line_no,
            "evidence hook is missing a path=",
        ));
    }
    if let Some(reason) = validate_path(&hook.path) {
        return ParsedLine::rejected(ParseDiagnostic::error(line_no, reason));
    }
    if hook.command.is_some() && hook.hook_type != EvidenceType::Test {
        return ParsedLine::rejected(ParseDiagnostic::error(
            line_no,
            "command= is only valid on test hooks, and the path still anchors the evidence",
        ));
    }
    if hook.heading.is_some() && hook.hook_type != EvidenceType::Docs {
        return ParsedLine::rejected(ParseDiagnostic::error(
            line_no,
            "heading= requires the docs evidence type",
        ));
    }

    ParsedLine { hook: Some(hook), diagnostics }
}

/// Parses all evidence lines of a task into hooks plus diagnostics.
///
/// Hooks come back in declaration order; rejected lines contribute only
/// diagnostics.
#[must_use]
pub fn parse_task_hooks(task: &Task) -> (Vec<EvidenceHook>, Vec<ParseDiagnostic>) {
    let mut hooks = Vec::new();
    let mut diagnostics = Vec::new();
    for line in &task.evidence {
        let parsed = parse_line(&line.text, line.line_no);
        diagnostics.extend(parsed.diagnostics);
        if let Some(hook) = parsed.hook {
            hooks.push(hook);
        }
    }
    (hooks, diagnostics)
}

/// Returns `true` if any diagnostic is an error (not a note).
#[must_use]
pub fn has_errors(diagnostics: &[ParseDiagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == DiagnosticSeverity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(text: &str) -> EvidenceHook {
        let parsed = parse_line(text, 7);
        assert!(
            parsed.hook.is_some(),
            "expected hook from {text:?}, got {:?}",
            parsed.diagnostics
        );
        parsed.hook.unwrap()
    }

    fn parse_err(text: &str) -> ParseDiagnostic {
        let parsed = parse_line(text, 7);
        assert!(parsed.hook.is_none(), "expected rejection of {text:?}");
        parsed.diagnostics.into_iter().next().unwrap()
    }

    #[test]
    fn parses_code_hook_with_symbol() {
        let hook = parse_ok("code path=src/auth.rs symbol=login");
        assert_eq!(hook.hook_type, EvidenceType::Code);
        assert_eq!(hook.path, "src/auth.rs");
        assert_eq!(hook.symbol.as_deref(), Some("login"));
        assert_eq!(hook.line_no, 7);
        assert!(hook.has_content_matcher());
    }

    #[test]
    fn parses_quoted_values_with_spaces() {
        let hook = parse_ok("docs path=docs/api.md heading=\"Auth endpoints\"");
        assert_eq!(hook.heading.as_deref(), Some("Auth endpoints"));
    }

    #[test]
    fn test_hook_keeps_command_as_metadata() {
        let hook = parse_ok("test path=package.json command=\"npm run build\"");
        assert_eq!(hook.path, "package.json");
        assert_eq!(hook.command.as_deref(), Some("npm run build"));
        assert!(!hook.has_content_matcher());
    }

    #[test]
    fn quoted_command_as_path_is_a_hard_error() {
        let diag = parse_err("test path=\"npm run build\"");
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert!(diag.message.contains("whitespace"), "{}", diag.message);
    }

    #[test]
    fn bare_command_verb_as_path_is_rejected() {
        let diag = parse_err("test path=npm");
        assert!(diag.message.contains("looks like a command"), "{}", diag.message);
    }

    #[test]
    fn command_verb_as_directory_name_is_allowed() {
        // `make/` as a directory is a path, not an invocation.
        let hook = parse_ok("code path=make/rules.rs");
        assert_eq!(hook.path, "make/rules.rs");
    }

    #[test]
    fn unknown_type_is_reported_not_silently_accepted() {
        let diag = parse_err("script path=run.sh");
        assert!(diag.message.contains("unsupported evidence type"), "{}", diag.message);
    }

    #[test]
    fn legacy_colon_form_upgrades_with_note() {
        let parsed = parse_line("code:src/auth.rs", 3);
        let hook = parsed.hook.unwrap();
        assert_eq!(hook.path, "src/auth.rs");
        assert!(hook.normalized);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].severity, DiagnosticSeverity::Note);
    }

    #[test]
    fn legacy_colon_form_with_unknown_type_is_rejected() {
        let diag = parse_err("script:run.sh");
        assert!(diag.message.contains("unsupported legacy evidence type"), "{}", diag.message);
    }

    #[test]
    fn absolute_traversal_and_glob_paths_are_rejected() {
        assert!(parse_err("code path=/etc/passwd").message.contains("repo-relative"));
        assert!(parse_err("code path=../secrets.txt").message.contains("traverse"));
        assert!(parse_err("code path=src/*.rs").message.contains("glob"));
    }

    #[test]
    fn bare_tokens_and_unknown_keys_are_rejected() {
        assert!(parse_err("code src/auth.rs").message.contains("key=value"));
        assert!(parse_err("code path=src/auth.rs color=red").message.contains("unknown"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let diag = parse_err("code path=a.rs path=b.rs");
        assert!(diag.message.contains("duplicate"), "{}", diag.message);
    }

    #[test]
    fn missing_path_is_rejected() {
        let diag = parse_err("code symbol=login");
        assert!(diag.message.contains("missing a path="), "{}", diag.message);
    }

    #[test]
    fn command_on_non_test_hook_is_rejected() {
        let diag = parse_err("code path=src/auth.rs command=\"cargo test\"");
        assert!(diag.message.contains("only valid on test hooks"), "{}", diag.message);
    }

    #[test]
    fn heading_requires_docs_type() {
        let diag = parse_err("code path=docs/api.md heading=Auth");
        assert!(diag.message.contains("docs"), "{}", diag.message);
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        let diag = parse_err("docs path=docs/api.md heading=\"Auth");
        assert!(diag.message.contains("unterminated"), "{}", diag.message);
    }

    #[test]
    fn task_hooks_accumulate_in_order_with_diagnostics() {
        use crate::doc::EvidenceLine;
        let task = Task {
            id: "TSK-1".to_string(),
            title: "t".to_string(),
            checked: false,
            line_no: 0,
            indent: 0,
            parent_id: None,
            evidence: vec![
                EvidenceLine { line_no: 1, text: "code path=src/a.rs".to_string() },
                EvidenceLine { line_no: 2, text: "bogus".to_string() },
                EvidenceLine { line_no: 3, text: "test path=tests/a.rs".to_string() },
            ],
        };
        let (hooks, diagnostics) = parse_task_hooks(&task);
        assert_eq!(hooks.len(), 2);
        assert_eq!(hooks[0].path, "src/a.rs");
        assert_eq!(hooks[1].path, "tests/a.rs");
        assert_eq!(diagnostics.len(), 1);
        assert!(has_errors(&diagnostics));
    }
}
