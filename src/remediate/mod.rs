//! Remediation planner.
//!
//! Turns the verifier's rename suggestions into concrete `path=` edits on the
//! task document. Only the path value of an evidence line is ever rewritten;
//! matchers, commands, and everything else on the line are untouched. The
//! same staleness guard and atomic write discipline as the synchronizer
//! apply.

use std::path::PathBuf;

use uuid::Uuid;

use crate::config::RemediatePolicy;
use crate::context::ServiceContext;
use crate::doc::TaskDocument;
use crate::matcher::ConfidenceBand;
use crate::report::VerificationReport;
use crate::sync::{check_staleness, SyncError};

/// One proposed path substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationEntry {
    /// The task whose evidence hook is stale.
    pub task_id: String,
    /// The path the hook currently declares.
    pub original_path: String,
    /// The best candidate to substitute.
    pub proposed_path: String,
    /// Confidence band of the proposed candidate.
    pub band: ConfidenceBand,
    /// Whether the substitution may be applied without human review.
    pub auto_applicable: bool,
    /// Zero-based document line of the evidence hook.
    pub line_no: usize,
    /// Lower-ranked candidates, for the human reviewing the plan.
    pub alternatives: Vec<String>,
}

/// Builds a remediation plan from a verification report.
///
/// One entry per rename suggestion that has at least one candidate; the top
/// candidate is proposed, the rest listed as alternatives. Entries come back
/// in document order because report results are stored in document order.
#[must_use]
pub fn plan(report: &VerificationReport, policy: &RemediatePolicy) -> Vec<RemediationEntry> {
    let mut entries = Vec::new();
    for result in &report.results {
        for suggestion in &result.suggestions {
            let Some(best) = suggestion.candidates.first() else { continue };
            entries.push(RemediationEntry {
                task_id: result.task_id.clone(),
                original_path: suggestion.original_path.clone(),
                proposed_path: best.path.clone(),
                band: best.band,
                auto_applicable: best.band >= policy.auto_apply_floor,
                line_no: suggestion.line_no,
                alternatives: suggestion
                    .candidates
                    .iter()
                    .skip(1)
                    .map(|c| c.path.clone())
                    .collect(),
            });
        }
    }
    entries
}

/// Replaces the path value on one evidence line.
///
/// Handles both `path=value` and `path="value"`; as a fallback, rewrites the
/// legacy `type:path` shorthand. Returns `None` when the line carries neither
/// form with the expected original path.
fn substitute_path(line: &str, original: &str, proposed: &str) -> Option<String> {
    for form in [format!("path=\"{original}\""), format!("path={original}")] {
        if let Some(at) = line.find(&form) {
            let replacement = if form.starts_with("path=\"") {
                format!("path=\"{proposed}\"")
            } else {
                format!("path={proposed}")
            };
            let mut out = String::with_capacity(line.len());
            out.push_str(&line[..at]);
            out.push_str(&replacement);
            out.push_str(&line[at + form.len()..]);
            return Some(out);
        }
    }
    // Legacy shorthand: `evidence: code:old/path`.
    let legacy = format!(":{original}");
    line.find(&legacy).map(|at| {
        let mut out = String::with_capacity(line.len());
        out.push_str(&line[..at + 1]);
        out.push_str(proposed);
        out.push_str(&line[at + legacy.len()..]);
        out
    })
}

/// Outcome of applying a remediation plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediateOutcome {
    /// How many path substitutions were applied.
    pub applied: usize,
    /// Entries skipped because they were below the auto-apply floor.
    pub skipped: usize,
    /// Whether the document was rewritten on disk.
    pub wrote: bool,
}

/// Applies the auto-applicable entries of a remediation plan, atomically.
///
/// Entries below the auto-apply floor are counted as skipped and left for
/// manual review. The staleness guard runs first; the write is
/// temp-file-then-rename, so a failure leaves the document untouched.
///
/// # Errors
///
/// Returns a [`SyncError`] on staleness, an unsafe output path, an evidence
/// line that no longer carries the expected path, or a failed write.
pub fn apply(
    ctx: &ServiceContext,
    doc: &TaskDocument,
    report: &VerificationReport,
    entries: &[RemediationEntry],
) -> Result<RemediateOutcome, SyncError> {
    check_staleness(doc, report)?;

    let Some(file_name) = doc.path.file_name() else {
        return Err(SyncError::UnsafePath(doc.path.display().to_string()));
    };

    let mut lines = doc.lines.clone();
    let mut applied = 0;
    let mut skipped = 0;
    for entry in entries {
        if !entry.auto_applicable {
            skipped += 1;
            continue;
        }
        let line = lines.get(entry.line_no).ok_or_else(|| {
            SyncError::MalformedDocument(format!(
                "evidence line {} out of range",
                entry.line_no + 1
            ))
        })?;
        let updated =
            substitute_path(line, &entry.original_path, &entry.proposed_path).ok_or_else(|| {
                SyncError::MalformedDocument(format!(
                    "line {} no longer declares path {}",
                    entry.line_no + 1,
                    entry.original_path
                ))
            })?;
        if *line != updated {
            lines[entry.line_no] = updated;
            applied += 1;
        }
    }

    if applied == 0 {
        return Ok(RemediateOutcome { applied: 0, skipped, wrote: false });
    }

    let mut content = lines.join("\n");
    if doc.trailing_newline {
        content.push('\n');
    }

    let parent = doc.path.parent().map_or_else(|| PathBuf::from("."), PathBuf::from);
    let temp_path = parent.join(format!(".{}.tmp-{}", file_name.to_string_lossy(), Uuid::new_v4()));
    ctx.fs.write(&temp_path, &content).map_err(|e| SyncError::Write(e.to_string()))?;
    ctx.fs
        .rename(&temp_path, &doc.path)
        .map_err(|e| SyncError::Write(e.to_string()))?;

    Ok(RemediateOutcome { applied, skipped, wrote: true })
}

/// Formats a remediation plan as a human-readable report.
#[must_use]
pub fn format_entries(entries: &[RemediationEntry]) -> String {
    if entries.is_empty() {
        return "No remediations proposed.".to_string();
    }
    let mut lines = Vec::new();
    for entry in entries {
        let mode = if entry.auto_applicable { "AUTO  " } else { "REVIEW" };
        lines.push(format!(
            "  {mode} {}: {} -> {} ({:?})",
            entry.task_id, entry.original_path, entry.proposed_path, entry.band
        ));
        for alternative in &entry.alternatives {
            lines.push(format!("         also considered: {alternative}"));
        }
    }
    lines.join("\n")
}
