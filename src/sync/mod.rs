//! Checkbox synchronizer.
//!
//! Reconciles a task document's completion markers with verified ground
//! truth. The rewrite touches checkbox tokens only, is idempotent (re-running
//! with the same report is a zero diff), and is all-or-nothing: staleness, an
//! unsafe path, or a malformed document abort the operation with no partial
//! write.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::config::{NeedsManualPolicy, SyncPolicy};
use crate::context::ServiceContext;
use crate::doc::TaskDocument;
use crate::report::VerificationReport;
use crate::verify::{Confidence, TaskStatus};

/// Fatal synchronization error. Any of these aborts the whole operation
/// before a single byte is written.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The report was computed against different document content.
    #[error(
        "stale report: document fingerprint {actual} does not match report fingerprint {expected}"
    )]
    Staleness {
        /// Fingerprint recorded in the report.
        expected: String,
        /// Fingerprint of the document being synchronized.
        actual: String,
    },
    /// The report was computed against a different document path.
    #[error("report was computed against {expected}, not {actual}")]
    DocumentMismatch {
        /// Document path recorded in the report.
        expected: String,
        /// Path of the document being synchronized.
        actual: String,
    },
    /// The output path cannot be written safely.
    #[error("unsafe document path: {0}")]
    UnsafePath(String),
    /// The document no longer has the structure the plan was built from.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    /// The atomic write failed.
    #[error("failed to write document: {0}")]
    Write(String),
}

/// Target state for one task's completion marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    /// Set the checkbox.
    Checked,
    /// Clear the checkbox.
    Unchecked,
    /// Leave the checkbox as it is.
    Unchanged,
}

/// Per-task synchronization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncDecision {
    /// The task ID.
    pub task_id: String,
    /// Target marker state.
    pub target: MarkerState,
    /// Why this target was chosen.
    pub reason: String,
}

/// A complete synchronization plan for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    /// Per-task decisions, in document order.
    pub decisions: Vec<SyncDecision>,
    /// Report task IDs with no matching document line.
    pub orphans: Vec<String>,
    /// Document task IDs absent from the report (left untouched).
    pub missing_in_report: Vec<String>,
    /// Why roll-up was skipped, when it was requested but not performed.
    pub rollup_skipped: Option<String>,
}

/// Decides the marker target for one verification result.
fn decide(
    status: TaskStatus,
    confidence: Option<Confidence>,
    policy: &SyncPolicy,
) -> (MarkerState, String) {
    match status {
        TaskStatus::Verified => match confidence {
            Some(Confidence::High) => {
                (MarkerState::Checked, "verified with high confidence".to_string())
            }
            Some(Confidence::Medium) if policy.treat_medium_as_verified => {
                (MarkerState::Checked, "verified with medium confidence (accepted by policy)"
                    .to_string())
            }
            _ => (
                MarkerState::Unchecked,
                "verified below the confidence the sync policy accepts".to_string(),
            ),
        },
        TaskStatus::NeedsManual => match policy.needs_manual {
            NeedsManualPolicy::Uncheck => {
                (MarkerState::Unchecked, "needs manual review (likely rename)".to_string())
            }
            NeedsManualPolicy::Leave => {
                (MarkerState::Unchanged, "needs manual review; left as-is by policy".to_string())
            }
        },
        TaskStatus::NotVerified => (MarkerState::Unchecked, "not verified".to_string()),
        TaskStatus::MissingHooks => {
            (MarkerState::Unchecked, "no evidence hooks declared".to_string())
        }
        TaskStatus::InvalidScope => {
            (MarkerState::Unchecked, "evidence outside allowed scope".to_string())
        }
    }
}

/// Builds a synchronization plan from a document and a verification report.
#[must_use]
pub fn plan(doc: &TaskDocument, report: &VerificationReport, policy: &SyncPolicy) -> SyncPlan {
    let mut decisions = Vec::new();
    let mut missing_in_report = Vec::new();

    for task in &doc.tasks {
        match report.result_for(&task.id) {
            Some(result) => {
                let (target, reason) = decide(result.status, result.confidence, policy);
                decisions.push(SyncDecision { task_id: task.id.clone(), target, reason });
            }
            None => missing_in_report.push(task.id.clone()),
        }
    }

    let orphans: Vec<String> = report
        .results
        .iter()
        .filter(|r| doc.task(&r.task_id).is_none())
        .map(|r| r.task_id.clone())
        .collect();

    let mut plan = SyncPlan { decisions, orphans, missing_in_report, rollup_skipped: None };
    if policy.rollup {
        apply_rollup(doc, &mut plan);
    }
    plan
}

/// Overrides parent decisions from their children's post-sync state.
///
/// A parent is checked only when every direct child ends up checked. Skipped
/// (and reported) when the document's indent structure is ambiguous.
fn apply_rollup(doc: &TaskDocument, plan: &mut SyncPlan) {
    if let Some(reason) = &doc.ambiguous_structure {
        plan.rollup_skipped = Some(reason.clone());
        return;
    }

    // Post-sync checked state per task, before roll-up.
    let mut final_state: Vec<bool> = doc
        .tasks
        .iter()
        .map(|task| {
            match plan
                .decisions
                .iter()
                .find(|d| d.task_id == task.id)
                .map(|d| d.target)
            {
                Some(MarkerState::Checked) => true,
                Some(MarkerState::Unchecked) => false,
                _ => task.checked,
            }
        })
        .collect();

    // Children appear after their parent, so a reverse pass settles deeper
    // levels before the parents that depend on them.
    for index in (0..doc.tasks.len()).rev() {
        let task = &doc.tasks[index];
        let children: Vec<usize> = doc
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.parent_id.as_deref() == Some(task.id.as_str()))
            .map(|(i, _)| i)
            .collect();
        if children.is_empty() {
            continue;
        }
        let all_checked = children.iter().all(|&i| final_state[i]);
        final_state[index] = all_checked;

        let target = if all_checked { MarkerState::Checked } else { MarkerState::Unchecked };
        let reason = format!("roll-up from {} children", children.len());
        match plan.decisions.iter_mut().find(|d| d.task_id == task.id) {
            Some(decision) => {
                decision.target = target;
                decision.reason = reason;
            }
            None => {
                plan.decisions.push(SyncDecision { task_id: task.id.clone(), target, reason });
            }
        }
    }
}

/// Enforces the staleness guard: the report must have been computed against
/// exactly this document content.
///
/// # Errors
///
/// Returns [`SyncError::DocumentMismatch`] or [`SyncError::Staleness`] when
/// identity does not match.
pub fn check_staleness(doc: &TaskDocument, report: &VerificationReport) -> Result<(), SyncError> {
    let doc_path = doc.path.display().to_string();
    if report.document_path != doc_path {
        return Err(SyncError::DocumentMismatch {
            expected: report.document_path.clone(),
            actual: doc_path,
        });
    }
    if report.document_fingerprint != doc.fingerprint {
        return Err(SyncError::Staleness {
            expected: report.document_fingerprint.clone(),
            actual: doc.fingerprint.clone(),
        });
    }
    Ok(())
}

/// Rewrites the checkbox token of a task line, leaving everything else as-is.
fn set_checkbox(line: &str, checked: bool) -> Option<String> {
    let open = line.find('[')?;
    let close = open + 2;
    if line.len() <= close || line.as_bytes()[close] != b']' {
        return None;
    }
    let marker = if checked { "[x]" } else { "[ ]" };
    let mut out = String::with_capacity(line.len());
    out.push_str(&line[..open]);
    out.push_str(marker);
    out.push_str(&line[close + 1..]);
    Some(out)
}

/// Outcome of applying a synchronization plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// How many checkbox tokens changed.
    pub changed: usize,
    /// Whether the document was rewritten on disk.
    pub wrote: bool,
}

/// Applies a synchronization plan to the document, atomically.
///
/// The staleness guard runs first; the new content is written to a temp file
/// in the same directory and renamed over the original, so a failure at any
/// point leaves the document untouched. When no checkbox changes, nothing is
/// written at all.
///
/// # Errors
///
/// Returns a [`SyncError`] on staleness, an unsafe output path, a document
/// line that no longer carries a checkbox, or a failed write.
pub fn apply(
    ctx: &ServiceContext,
    doc: &TaskDocument,
    report: &VerificationReport,
    plan: &SyncPlan,
) -> Result<SyncOutcome, SyncError> {
    check_staleness(doc, report)?;

    let Some(file_name) = doc.path.file_name() else {
        return Err(SyncError::UnsafePath(doc.path.display().to_string()));
    };

    let mut lines = doc.lines.clone();
    let mut changed = 0;
    for decision in &plan.decisions {
        let checked = match decision.target {
            MarkerState::Checked => true,
            MarkerState::Unchecked => false,
            MarkerState::Unchanged => continue,
        };
        let Some(task) = doc.task(&decision.task_id) else { continue };
        let line = lines.get(task.line_no).ok_or_else(|| {
            SyncError::MalformedDocument(format!("task line {} out of range", task.line_no + 1))
        })?;
        let updated = set_checkbox(line, checked).ok_or_else(|| {
            SyncError::MalformedDocument(format!(
                "line {} no longer carries a checkbox",
                task.line_no + 1
            ))
        })?;
        if *line != updated {
            lines[task.line_no] = updated;
            changed += 1;
        }
    }

    if changed == 0 {
        return Ok(SyncOutcome { changed: 0, wrote: false });
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

    Ok(SyncOutcome { changed, wrote: true })
}

/// Formats a synchronization plan as a human-readable report.
#[must_use]
pub fn format_plan(plan: &SyncPlan) -> String {
    if plan.decisions.is_empty() && plan.orphans.is_empty() && plan.missing_in_report.is_empty() {
        return "No tasks to synchronize.".to_string();
    }

    let mut lines = Vec::new();
    for decision in &plan.decisions {
        let action = match decision.target {
            MarkerState::Checked => "CHECK  ",
            MarkerState::Unchecked => "UNCHECK",
            MarkerState::Unchanged => "KEEP   ",
        };
        lines.push(format!("  {action} {}: {}", decision.task_id, decision.reason));
    }
    for orphan in &plan.orphans {
        lines.push(format!("  ORPHAN  {orphan}: in report but not in document"));
    }
    for missing in &plan.missing_in_report {
        lines.push(format!("  SKIP    {missing}: missing from report, left untouched"));
    }
    if let Some(reason) = &plan.rollup_skipped {
        lines.push(format!("  Roll-up skipped: {reason}"));
    }
    lines.join("\n")
}
