//! Binary entrypoint for the `attest` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match attest::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.message());
            ExitCode::from(err.exit_code())
        }
    }
}
