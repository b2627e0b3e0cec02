//! Confidence scorer / verifier.
//!
//! Combines parsed hooks and resolver output into a per-task status with a
//! confidence level, invoking the fuzzy path matcher when a hook's literal
//! path is missing. Each task reaches exactly one terminal status per run;
//! there are no retries.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::context::ServiceContext;
use crate::doc::{Task, TaskDocument};
use crate::evidence::parser::{self, parse_task_hooks};
use crate::evidence::resolver::{self, MatcherOutcome};
use crate::evidence::{EvidenceResolution, ParseDiagnostic};
use crate::matcher::{self, ConfidenceBand, MatchCandidate};

/// Terminal verification status for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Every hook resolved and every specified matcher held.
    Verified,
    /// Hooks exist but evidence did not hold, or nothing resolved.
    NotVerified,
    /// A missing hook has a plausible renamed/moved candidate.
    NeedsManual,
    /// The task declared no usable hooks.
    MissingHooks,
    /// A hook references a path outside the allowed scope.
    InvalidScope,
}

/// Discretized confidence in a verification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Every matcher structurally checked and fully evaluated.
    High,
    /// Existence-level or degraded evidence (unknown matchers, truncation,
    /// scan limits).
    Medium,
    /// Weak evidence only.
    Low,
}

/// A missing hook path together with its ranked rename candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameSuggestion {
    /// The path the hook expected.
    pub original_path: String,
    /// Zero-based document line of the evidence hook.
    pub line_no: usize,
    /// Ranked candidates, highest similarity first.
    pub candidates: Vec<MatchCandidate>,
}

/// One task's verification result. Computed per run; never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskVerification {
    /// The task ID.
    pub task_id: String,
    /// Terminal status.
    pub status: TaskStatus,
    /// Confidence, absent for `missing_hooks` and `invalid_scope`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    /// Per-hook resolutions.
    pub resolutions: Vec<EvidenceResolution>,
    /// Parse diagnostics accumulated for this task's evidence lines.
    pub diagnostics: Vec<ParseDiagnostic>,
    /// Rename candidates for missing hooks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<RenameSuggestion>,
    /// Run-level notes (deadline hit, scan limit reached).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Verifies one task against the project tree.
fn verify_task(
    ctx: &ServiceContext,
    root: &Path,
    task: &Task,
    files: &[String],
    config: &RunConfig,
    degraded_scan: bool,
) -> TaskVerification {
    let (hooks, diagnostics) = parse_task_hooks(task);

    let mut result = TaskVerification {
        task_id: task.id.clone(),
        status: TaskStatus::MissingHooks,
        confidence: None,
        resolutions: Vec::new(),
        diagnostics,
        suggestions: Vec::new(),
        notes: Vec::new(),
    };
    if degraded_scan {
        result.notes.push("scan file budget reached; tree view is partial".to_string());
    }

    if hooks.is_empty() {
        return result;
    }

    result.resolutions = hooks.iter().map(|hook| resolver::resolve(ctx, root, hook)).collect();

    if result.resolutions.iter().any(|r| r.scope_violation) {
        result.status = TaskStatus::InvalidScope;
        return result;
    }

    let all_exist = result.resolutions.iter().all(|r| r.exists);
    let any_unsatisfied =
        result.resolutions.iter().any(|r| r.matcher == MatcherOutcome::Unsatisfied);

    if all_exist && !any_unsatisfied {
        let fully_checked = result.resolutions.iter().all(|r| {
            r.matcher == MatcherOutcome::Satisfied && !r.truncated && r.errors.is_empty()
        });
        result.status = TaskStatus::Verified;
        result.confidence = Some(if fully_checked && !degraded_scan {
            Confidence::High
        } else {
            Confidence::Medium
        });
        return result;
    }

    // Missing files: ask the fuzzy matcher for plausible new locations.
    for resolution in result.resolutions.iter().filter(|r| !r.exists) {
        let candidates =
            matcher::find_candidates(&resolution.hook.path, files, &config.groups);
        if !candidates.is_empty() {
            result.suggestions.push(RenameSuggestion {
                original_path: resolution.hook.path.clone(),
                line_no: resolution.hook.line_no,
                candidates,
            });
        }
    }

    let has_plausible_rename = result.suggestions.iter().any(|s| {
        s.candidates.first().is_some_and(|best| best.band >= ConfidenceBand::Medium)
    });

    if has_plausible_rename {
        result.status = TaskStatus::NeedsManual;
        result.confidence = Some(Confidence::Medium);
    } else {
        result.status = TaskStatus::NotVerified;
        result.confidence = Some(Confidence::Low);
    }
    result
}

/// Outcome of verifying a whole document.
#[derive(Debug)]
pub struct VerifyOutcome {
    /// Per-task results in document order.
    pub results: Vec<TaskVerification>,
    /// Whether the tree walk hit the file budget.
    pub scan_limit_reached: bool,
}

/// Verifies every task in the document against the project root.
///
/// Per-task resolution is fanned out across a bounded worker pool; results
/// come back in document order regardless of scheduling. When the configured
/// deadline expires, remaining tasks are marked `not_verified` with a note
/// and no document write can follow from them.
///
/// # Errors
///
/// Returns an error string if the project tree cannot be enumerated at all.
///
/// # Panics
///
/// Propagates a panic from a verification worker thread.
pub fn verify_document(
    ctx: &ServiceContext,
    root: &Path,
    doc: &TaskDocument,
    config: &RunConfig,
) -> Result<VerifyOutcome, String> {
    let scan = ctx
        .tree
        .walk(root, &config.ignore, config.scan.max_files)
        .map_err(|e| format!("Failed to enumerate project tree at {}: {e}", root.display()))?;

    let deadline = config
        .verify
        .deadline_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));
    let workers = config.verify.workers.max(1);
    let chunk_size = doc.tasks.len().div_ceil(workers).max(1);

    let mut results: Vec<TaskVerification> = Vec::with_capacity(doc.tasks.len());
    if doc.tasks.is_empty() {
        return Ok(VerifyOutcome { results, scan_limit_reached: scan.limit_reached });
    }

    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for chunk in doc.tasks.chunks(chunk_size) {
            let files = &scan.files;
            let limit_reached = scan.limit_reached;
            handles.push(scope.spawn(move || {
                chunk
                    .iter()
                    .map(|task| {
                        if deadline.is_some_and(|d| Instant::now() >= d) {
                            return deadline_result(task);
                        }
                        verify_task(ctx, root, task, files, config, limit_reached)
                    })
                    .collect::<Vec<_>>()
            }));
        }
        for handle in handles {
            // A worker panic would already have poisoned the run; propagate.
            results.extend(handle.join().expect("verification worker panicked"));
        }
    });

    Ok(VerifyOutcome { results, scan_limit_reached: scan.limit_reached })
}

/// Result for a task skipped because the run deadline expired.
fn deadline_result(task: &Task) -> TaskVerification {
    TaskVerification {
        task_id: task.id.clone(),
        status: TaskStatus::NotVerified,
        confidence: Some(Confidence::Low),
        resolutions: Vec::new(),
        diagnostics: Vec::new(),
        suggestions: Vec::new(),
        notes: vec!["run deadline expired before this task was verified".to_string()],
    }
}

/// Formats verification results as a human-readable summary.
#[must_use]
pub fn format_summary(results: &[TaskVerification]) -> String {
    let mut lines = Vec::new();
    for result in results {
        let status = match result.status {
            TaskStatus::Verified => "VERIFIED",
            TaskStatus::NotVerified => "NOT VERIFIED",
            TaskStatus::NeedsManual => "NEEDS MANUAL",
            TaskStatus::MissingHooks => "MISSING HOOKS",
            TaskStatus::InvalidScope => "INVALID SCOPE",
        };
        let confidence = match result.confidence {
            Some(Confidence::High) => " (high)",
            Some(Confidence::Medium) => " (medium)",
            Some(Confidence::Low) => " (low)",
            None => "",
        };
        lines.push(format!("  [{status}]{confidence} {}", result.task_id));
        for diagnostic in &result.diagnostics {
            lines.push(format!(
                "         line {}: {}",
                diagnostic.line_no + 1,
                diagnostic.message
            ));
        }
        for suggestion in &result.suggestions {
            for candidate in suggestion.candidates.iter().take(3) {
                lines.push(format!(
                    "         {} -> {} ({:.2}, {:?})",
                    suggestion.original_path, candidate.path, candidate.score, candidate.band
                ));
            }
        }
        for note in &result.notes {
            lines.push(format!("         note: {note}"));
        }
    }
    let verified = results.iter().filter(|r| r.status == TaskStatus::Verified).count();
    lines.push(String::new());
    lines.push(format!("{verified}/{} tasks verified.", results.len()));
    lines.join("\n")
}
