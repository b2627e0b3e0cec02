//! Command dispatch and handlers.

pub mod remediate;
pub mod sync;
pub mod verify;

use crate::cli::Command;
use crate::context::ServiceContext;
use crate::RunError;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns a [`RunError`] if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), RunError> {
    let ctx = ServiceContext::live();
    dispatch_with_context(command, &ctx)
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns a [`RunError`] if the selected command handler fails.
pub fn dispatch_with_context(command: &Command, ctx: &ServiceContext) -> Result<(), RunError> {
    match command {
        Command::Verify { document, root, config, out } => {
            verify::run_with_context(ctx, document, root, config.as_deref(), out.as_deref())
        }
        Command::Sync { document, report, apply, rollup, config } => {
            sync::run_with_context(ctx, document, report, *apply, *rollup, config.as_deref())
        }
        Command::Remediate { document, report, apply, config } => {
            remediate::run_with_context(ctx, document, report, *apply, config.as_deref())
        }
    }
}
