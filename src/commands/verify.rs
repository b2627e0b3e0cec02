//! `attest verify` command.

use std::path::Path;

use crate::config::RunConfig;
use crate::context::ServiceContext;
use crate::doc::TaskDocument;
use crate::report::VerificationReport;
use crate::verify::{format_summary, verify_document};
use crate::RunError;

/// Execute the `verify` command.
///
/// Verifies every task in the document against the project root, prints a
/// summary, and writes the report artifact. A run that completes exits 0
/// regardless of how many tasks verified; only a failure to run at all is an
/// error.
///
/// # Errors
///
/// Returns [`RunError::Usage`] for a bad configuration file and
/// [`RunError::Failed`] when the document cannot be read, the tree cannot be
/// scanned, or the report cannot be written.
pub fn run_with_context(
    ctx: &ServiceContext,
    document: &Path,
    root: &Path,
    config_path: Option<&Path>,
    out: Option<&Path>,
) -> Result<(), RunError> {
    let config =
        RunConfig::load_or_default(ctx, config_path).map_err(|e| RunError::Usage(e.to_string()))?;
    let doc = TaskDocument::load(ctx, document).map_err(RunError::Failed)?;

    if let Some(reason) = &doc.ambiguous_structure {
        println!("Warning: {reason}");
    }
    for line_no in &doc.stray_evidence {
        println!("Warning: line {}: evidence without a preceding task", line_no + 1);
    }

    let outcome = verify_document(ctx, root, &doc, &config).map_err(RunError::Failed)?;
    let report = VerificationReport::new(ctx, &doc, outcome.results, outcome.scan_limit_reached);

    let out_path = out.map_or_else(|| report.default_output_path(root), Path::to_path_buf);
    report.save(ctx, &out_path).map_err(RunError::Failed)?;

    println!("{}", format_summary(&report.results));
    println!("Report written to {}", out_path.display());
    Ok(())
}
