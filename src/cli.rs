//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `attest`.
#[derive(Debug, Parser)]
#[command(name = "attest", version, about = "Verify task documents against evidence in the tree")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify every task in a document and write a report.
    Verify {
        /// Path to the task document.
        document: PathBuf,
        /// Project root to resolve evidence against.
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Optional YAML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Report output path (defaults to .attest/report-<run-id>.json under
        /// the root).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Reconcile a document's checkboxes with a verification report.
    Sync {
        /// Path to the task document.
        document: PathBuf,
        /// Verification report produced by `attest verify`.
        #[arg(long)]
        report: PathBuf,
        /// Rewrite the document (without this flag the plan is only printed).
        #[arg(long)]
        apply: bool,
        /// Roll parent checkboxes up from their children.
        #[arg(long)]
        rollup: bool,
        /// Optional YAML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Propose (and optionally apply) path fixes for missing evidence hooks.
    Remediate {
        /// Path to the task document.
        document: PathBuf,
        /// Verification report produced by `attest verify`.
        #[arg(long)]
        report: PathBuf,
        /// Rewrite the document (without this flag the plan is only printed).
        #[arg(long)]
        apply: bool,
        /// Optional YAML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_verify_subcommand() {
        let cli = Cli::parse_from(["attest", "verify", "plan.md", "--root", "proj"]);
        match cli.command {
            Command::Verify { document, root, config, out } => {
                assert_eq!(document.to_str(), Some("plan.md"));
                assert_eq!(root.to_str(), Some("proj"));
                assert!(config.is_none());
                assert!(out.is_none());
            }
            _ => panic!("expected verify"),
        }
    }

    #[test]
    fn parses_sync_with_apply_and_rollup() {
        let cli = Cli::parse_from([
            "attest", "sync", "plan.md", "--report", "r.json", "--apply", "--rollup",
        ]);
        match cli.command {
            Command::Sync { apply, rollup, report, .. } => {
                assert!(apply);
                assert!(rollup);
                assert_eq!(report.to_str(), Some("r.json"));
            }
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn sync_requires_a_report() {
        assert!(Cli::try_parse_from(["attest", "sync", "plan.md"]).is_err());
    }

    #[test]
    fn parses_remediate_subcommand() {
        let cli = Cli::parse_from(["attest", "remediate", "plan.md", "--report", "r.json"]);
        match cli.command {
            Command::Remediate { apply, .. } => assert!(!apply),
            _ => panic!("expected remediate"),
        }
    }
}
