//! Core library entry for the `attest` CLI.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod doc;
pub mod evidence;
pub mod matcher;
pub mod ports;
pub mod remediate;
pub mod report;
pub mod sync;
pub mod verify;

use clap::error::ErrorKind;
use clap::Parser;

/// A failed CLI run, split by exit code contract: usage and configuration
/// problems exit 2, everything else that fails exits 1.
#[derive(Debug, PartialEq, Eq)]
pub enum RunError {
    /// Bad arguments or bad configuration.
    Usage(String),
    /// The command itself failed.
    Failed(String),
}

impl RunError {
    /// The process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => 2,
            Self::Failed(_) => 1,
        }
    }

    /// The message to print on stderr.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Usage(msg) | Self::Failed(msg) => msg,
        }
    }
}

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns a [`RunError`] when argument parsing fails or command execution
/// fails. `--help` and `--version` print and return `Ok`.
pub fn run<I, T>(args: I) -> Result<(), RunError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err)
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) =>
        {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(RunError::Usage(err.to_string())),
    };
    commands::dispatch(&cli.command)
}
