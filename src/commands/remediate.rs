//! `attest remediate` command.

use std::path::Path;

use crate::config::RunConfig;
use crate::context::ServiceContext;
use crate::doc::TaskDocument;
use crate::remediate;
use crate::report::VerificationReport;
use crate::sync;
use crate::RunError;

/// Execute the `remediate` command.
///
/// Prints proposed `path=` substitutions for missing evidence hooks; with
/// `--apply`, rewrites the auto-applicable ones atomically. Entries below the
/// configured confidence floor are never applied automatically.
///
/// # Errors
///
/// Returns [`RunError::Usage`] for a bad configuration file and
/// [`RunError::Failed`] when the document or report cannot be loaded, the
/// report is stale, or the write fails.
pub fn run_with_context(
    ctx: &ServiceContext,
    document: &Path,
    report_path: &Path,
    apply: bool,
    config_path: Option<&Path>,
) -> Result<(), RunError> {
    let config =
        RunConfig::load_or_default(ctx, config_path).map_err(|e| RunError::Usage(e.to_string()))?;

    let doc = TaskDocument::load(ctx, document).map_err(RunError::Failed)?;
    let report = VerificationReport::load(ctx, report_path).map_err(RunError::Failed)?;
    sync::check_staleness(&doc, &report).map_err(|e| RunError::Failed(e.to_string()))?;

    let entries = remediate::plan(&report, &config.remediate);

    if !apply {
        println!("Dry run -- would perform:");
        println!("{}", remediate::format_entries(&entries));
        return Ok(());
    }

    let outcome = remediate::apply(ctx, &doc, &report, &entries)
        .map_err(|e| RunError::Failed(e.to_string()))?;
    println!("{}", remediate::format_entries(&entries));
    println!(
        "Remediation complete: {} path(s) updated, {} left for review.",
        outcome.applied, outcome.skipped
    );
    if outcome.wrote {
        println!("Re-run `attest verify` to refresh the report.");
    }
    Ok(())
}
