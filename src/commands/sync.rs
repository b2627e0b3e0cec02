//! `attest sync` command.

use std::path::Path;

use crate::config::RunConfig;
use crate::context::ServiceContext;
use crate::doc::TaskDocument;
use crate::report::VerificationReport;
use crate::sync;
use crate::RunError;

/// Execute the `sync` command.
///
/// Prints the synchronization plan; with `--apply`, also rewrites the
/// document's checkboxes atomically. Without `--apply` nothing is written.
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
    rollup: bool,
    config_path: Option<&Path>,
) -> Result<(), RunError> {
    let mut config =
        RunConfig::load_or_default(ctx, config_path).map_err(|e| RunError::Usage(e.to_string()))?;
    if rollup {
        config.sync.rollup = true;
    }

    let doc = TaskDocument::load(ctx, document).map_err(RunError::Failed)?;
    let report = VerificationReport::load(ctx, report_path).map_err(RunError::Failed)?;

    // Fail fast on a stale report even for a dry run; a plan against stale
    // content is misleading.
    sync::check_staleness(&doc, &report).map_err(|e| RunError::Failed(e.to_string()))?;

    let plan = sync::plan(&doc, &report, &config.sync);

    if !apply {
        println!("Dry run -- would perform:");
        println!("{}", sync::format_plan(&plan));
        return Ok(());
    }

    let outcome =
        sync::apply(ctx, &doc, &report, &plan).map_err(|e| RunError::Failed(e.to_string()))?;
    println!("{}", sync::format_plan(&plan));
    if outcome.wrote {
        println!("Sync complete: {} checkbox(es) updated.", outcome.changed);
    } else {
        println!("Sync complete: document already up to date.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::fixed_context;

    fn write_report(ctx: &ServiceContext, dir: &Path, doc: &TaskDocument) -> std::path::PathBuf {
        use crate::verify::{Confidence, TaskStatus, TaskVerification};
        let results = vec![TaskVerification {
            task_id: "TSK-1".to_string(),
            status: TaskStatus::Verified,
            confidence: Some(Confidence::High),
            resolutions: Vec::new(),
            diagnostics: Vec::new(),
            suggestions: Vec::new(),
            notes: Vec::new(),
        }];
        let report = VerificationReport::new(ctx, doc, results, false);
        let path = dir.join("report.json");
        report.save(ctx, &path).unwrap();
        path
    }

    #[test]
    fn dry_run_leaves_the_document_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("plan.md");
        let source = "- [ ] TSK-1 A\n";
        std::fs::write(&doc_path, source).unwrap();

        let ctx = fixed_context();
        let doc = TaskDocument::load(&ctx, &doc_path).unwrap();
        let report_path = write_report(&ctx, dir.path(), &doc);

        run_with_context(&ctx, &doc_path, &report_path, false, false, None).unwrap();
        assert_eq!(std::fs::read_to_string(&doc_path).unwrap(), source);
    }

    #[test]
    fn apply_checks_the_verified_task() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("plan.md");
        std::fs::write(&doc_path, "- [ ] TSK-1 A\n").unwrap();

        let ctx = fixed_context();
        let doc = TaskDocument::load(&ctx, &doc_path).unwrap();
        let report_path = write_report(&ctx, dir.path(), &doc);

        run_with_context(&ctx, &doc_path, &report_path, true, false, None).unwrap();
        assert_eq!(std::fs::read_to_string(&doc_path).unwrap(), "- [x] TSK-1 A\n");
    }

    #[test]
    fn stale_report_fails_even_without_apply() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("plan.md");
        std::fs::write(&doc_path, "- [ ] TSK-1 A\n").unwrap();

        let ctx = fixed_context();
        let doc = TaskDocument::load(&ctx, &doc_path).unwrap();
        let report_path = write_report(&ctx, dir.path(), &doc);

        std::fs::write(&doc_path, "- [ ] TSK-1 A edited\n").unwrap();
        let err =
            run_with_context(&ctx, &doc_path, &report_path, false, false, None).unwrap_err();
        assert!(matches!(err, RunError::Failed(_)));
    }
}
