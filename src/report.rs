//! Verification report artifact.
//!
//! One report is emitted per verify run and later consumed by the
//! synchronizer and remediation planner. It carries the document's identity
//! (path + content fingerprint) so a stale report can never be applied to a
//! changed document. Reports are append-only: each run writes to a fresh
//! location and never overwrites an earlier artifact.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ServiceContext;
use crate::doc::TaskDocument;
use crate::verify::TaskVerification;

/// Directory (under the project root) where report artifacts accumulate.
pub const REPORT_DIR: &str = ".attest";

/// A complete verification report for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Unique run identifier.
    pub run_id: String,
    /// When the run happened.
    pub generated_at: DateTime<Utc>,
    /// Path of the task document the run was computed against.
    pub document_path: String,
    /// SHA-256 fingerprint of the document content at verification time.
    pub document_fingerprint: String,
    /// Whether the tree walk hit the file budget during this run.
    pub scan_limit_reached: bool,
    /// Per-task results in document order.
    pub results: Vec<TaskVerification>,
}

impl VerificationReport {
    /// Builds a report from a verified document and its results.
    #[must_use]
    pub fn new(
        ctx: &ServiceContext,
        doc: &TaskDocument,
        results: Vec<TaskVerification>,
        scan_limit_reached: bool,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            generated_at: ctx.clock.now(),
            document_path: doc.path.display().to_string(),
            document_fingerprint: doc.fingerprint.clone(),
            scan_limit_reached,
            results,
        }
    }

    /// The default append-only output location for this report.
    #[must_use]
    pub fn default_output_path(&self, root: &Path) -> PathBuf {
        root.join(REPORT_DIR).join(format!("report-{}.json", self.run_id))
    }

    /// Serializes the report as JSON and writes it.
    ///
    /// # Errors
    ///
    /// Returns an error string if serialization or the write fails.
    pub fn save(&self, ctx: &ServiceContext, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize report {}: {e}", self.run_id))?;
        ctx.fs
            .write(path, &json)
            .map_err(|e| format!("Failed to write report to {}: {e}", path.display()))
    }

    /// Loads a report from disk.
    ///
    /// # Errors
    ///
    /// Returns an error string if the file cannot be read or parsed.
    pub fn load(ctx: &ServiceContext, path: &Path) -> Result<Self, String> {
        let contents = ctx
            .fs
            .read_to_string(path)
            .map_err(|e| format!("Failed to read report {}: {e}", path.display()))?;
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse report {}: {e}", path.display()))
    }

    /// Looks up the result for a task ID.
    #[must_use]
    pub fn result_for(&self, task_id: &str) -> Option<&TaskVerification> {
        self.results.iter().find(|r| r.task_id == task_id)
    }
}
