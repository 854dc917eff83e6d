//! CLI entrypoint for rpcctl.
//!
//! The binary delegates to [`rpcctl_cli::run`], which loads configuration,
//! parses the command line, loads plugins, and dispatches the command to the
//! engine's RPC socket.

use std::io::{self, StderrLock, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin: StdinLock<'_> = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    rpcctl_cli::run(std::env::args_os(), stdin, &mut stdout, &mut stderr)
}
