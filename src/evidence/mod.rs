//! Evidence hooks: declared, machine-checkable claims that a task is backed
//! by a specific file or content artifact.

pub mod parser;
pub mod resolver;

use serde::{Deserialize, Serialize};

pub use parser::{parse_task_hooks, ParsedLine};
pub use resolver::{resolve, EvidenceResolution, MatcherOutcome};

/// The artifact category an evidence hook points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    /// Source code.
    Code,
    /// Test code. May carry a `command=`, but always anchors on a file.
    Test,
    /// Documentation / prose.
    Docs,
    /// UI assets or markup.
    Ui,
}

impl EvidenceType {
    /// Parses a type token from the evidence grammar.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "code" => Some(Self::Code),
            "test" => Some(Self::Test),
            "docs" => Some(Self::Docs),
            "ui" => Some(Self::Ui),
            _ => None,
        }
    }

    /// The grammar token for this type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Test => "test",
            Self::Docs => "docs",
            Self::Ui => "ui",
        }
    }
}

/// A parsed evidence hook. Immutable once parsed for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceHook {
    /// The artifact category.
    pub hook_type: EvidenceType,
    /// Repo-relative anchor path. Never a command, never a glob.
    pub path: String,
    /// Identifier to find on a word boundary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Literal substring to find.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    /// Regular expression to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Markdown heading to find (docs hooks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// Markup selector to find (`#id`, `.class`, or tag).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Associated command. Recorded as metadata only; never executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Zero-based document line the hook was parsed from.
    pub line_no: usize,
    /// Set when a legacy form was upgraded to the canonical grammar.
    #[serde(default)]
    pub normalized: bool,
}

impl EvidenceHook {
    /// Returns `true` if the hook specifies any content matcher beyond
    /// file existence.
    #[must_use]
    pub fn has_content_matcher(&self) -> bool {
        self.symbol.is_some()
            || self.contains.is_some()
            || self.regex.is_some()
            || self.heading.is_some()
            || self.selector.is_some()
    }
}

/// Severity of a per-line parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    /// The line was rejected; no hook was produced.
    Error,
    /// The line was accepted with a recorded normalization.
    Note,
}

/// A non-fatal, per-line parse diagnostic. Accumulated and reported; never
/// aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    /// Zero-based document line number.
    pub line_no: usize,
    /// Severity.
    pub severity: DiagnosticSeverity,
    /// What was wrong (or what was normalized) and why.
    pub message: String,
}

impl ParseDiagnostic {
    /// Creates an error diagnostic.
    #[must_use]
    pub fn error(line_no: usize, message: impl Into<String>) -> Self {
        Self { line_no, severity: DiagnosticSeverity::Error, message: message.into() }
    }

    /// Creates a normalization note.
    #[must_use]
    pub fn note(line_no: usize, message: impl Into<String>) -> Self {
        Self { line_no, severity: DiagnosticSeverity::Note, message: message.into() }
    }
}
