//! Command-line driver for the rpcctl control-plane client.
//!
//! The module owns argument parsing, configuration bootstrapping, plugin
//! loading and exit codes. Commands are dispatched through the plugin
//! registry to handlers that talk to the engine over one [`RpcClient`]
//! connection. The runtime can be driven from the binary entrypoint or from
//! tests where configuration loading and IO streams are substituted.
//!
//! [`RpcClient`]: rpcctl_client::RpcClient

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::iter;
use std::process::ExitCode;

use clap::Command;
use rpcctl_client::RpcClientError;
use rpcctl_config::Config;
use rpcctl_plugins::{CommandError, CommandRegistry, ParamObject};

mod cli;
mod config;
mod errors;
mod plugins;
mod session;
mod telemetry;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, command_arguments, split_config_arguments};
use errors::{AppError, render_command_error};
use session::Session;

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, R: BufRead, W: Write, E: Write> {
    pub(crate) stdin: R,
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, R: BufRead, W: Write, E: Write> IoStreams<'a, R, W, E> {
    pub(crate) const fn new(stdin: R, stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self {
            stdin,
            stdout,
            stderr,
        }
    }
}

/// Result of one server-mode command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStatus {
    Success,
    Failure,
    /// The engine closed the connection; no further command can run.
    Closed,
}

impl LineStatus {
    const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure | Self::Closed => 1,
        }
    }
}

struct CliRunner<'a, R: BufRead, W: Write, E: Write, L: ConfigLoader> {
    io: IoStreams<'a, R, W, E>,
    loader: &'a L,
}

impl<'a, R, W, E, L> CliRunner<'a, R, W, E, L>
where
    R: BufRead,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    const fn new(io: IoStreams<'a, R, W, E>, loader: &'a L) -> Self {
        Self { io, loader }
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        match self.try_run(args) {
            Ok(exit_code) => exit_code,
            Err(AppError::CliUsage(error)) if !error.use_stderr() => {
                let _ = write!(self.io.stdout, "{error}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                let _ = writeln!(self.io.stderr, "{error}");
                ExitCode::FAILURE
            }
        }
    }

    fn try_run<I>(&mut self, args: I) -> Result<ExitCode, AppError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);
        let command_args = command_arguments(&args, &split);

        let mut config = self.loader.load(&split.config_arguments)?;
        telemetry::initialise(&config)?;

        let requested: Vec<String> = config
            .plugins
            .iter()
            .cloned()
            .chain(Cli::preparse(&command_args).map(|cli| cli.plugins).unwrap_or_default())
            .collect();
        let mut registry = CommandRegistry::new();
        plugins::catalog().load(&mut registry, &requested)?;

        let matches = Cli::command_tree(&registry)
            .try_get_matches_from(&command_args)
            .map_err(AppError::CliUsage)?;
        let cli = Cli::from_matches(&matches).map_err(AppError::CliUsage)?;
        cli.apply(&mut config);
        let globals = cli.globals(&config);

        if cli.is_server {
            return self.serve(&registry, &config, &globals);
        }

        let (spec, namespace) = registry
            .resolve(&matches, &globals)
            .ok_or(AppError::MissingCommand)?;
        let mut session = Session::open(&config)?;
        let result = session.execute(&registry, spec.name(), &namespace);
        session
            .drain(&mut *self.io.stdout, &mut *self.io.stderr)
            .map_err(AppError::WriteOutput)?;
        Ok(self.report(result))
    }

    fn report(&mut self, result: Result<(), CommandError>) -> ExitCode {
        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                let _ = render_command_error(&error, &mut *self.io.stderr);
                ExitCode::FAILURE
            }
        }
    }

    /// Runs one command per line of standard input on a shared connection.
    fn serve(
        &mut self,
        registry: &CommandRegistry,
        config: &Config,
        globals: &ParamObject,
    ) -> Result<ExitCode, AppError> {
        let command = Cli::line_tree(registry);
        let mut session = Session::open(config)?;
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .io
                .stdin
                .read_line(&mut line)
                .map_err(AppError::ReadInput)?;
            if read == 0 {
                return Ok(ExitCode::SUCCESS);
            }
            if line.trim().is_empty() {
                continue;
            }
            let status = self.serve_line(registry, &command, globals, &mut session, &line)?;
            writeln!(self.io.stdout, "**STATUS={}", status.code()).map_err(AppError::WriteOutput)?;
            self.io.stdout.flush().map_err(AppError::WriteOutput)?;
            if status == LineStatus::Closed {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    fn serve_line(
        &mut self,
        registry: &CommandRegistry,
        command: &Command,
        globals: &ParamObject,
        session: &mut Session,
        line: &str,
    ) -> Result<LineStatus, AppError> {
        let Some(words) = shlex::split(line) else {
            writeln!(self.io.stderr, "unbalanced quotes in: {}", line.trim_end())
                .map_err(AppError::WriteOutput)?;
            return Ok(LineStatus::Failure);
        };
        let argv = iter::once(String::from("rpcctl")).chain(words);
        let matches = match command.clone().try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(error) => {
                write!(self.io.stderr, "{error}").map_err(AppError::WriteOutput)?;
                return Ok(LineStatus::Failure);
            }
        };
        let Some((spec, namespace)) = registry.resolve(&matches, globals) else {
            writeln!(self.io.stderr, "{}", AppError::MissingCommand)
                .map_err(AppError::WriteOutput)?;
            return Ok(LineStatus::Failure);
        };

        let result = session.execute(registry, spec.name(), &namespace);
        session
            .drain(&mut *self.io.stdout, &mut *self.io.stderr)
            .map_err(AppError::WriteOutput)?;
        match result {
            Ok(()) => Ok(LineStatus::Success),
            Err(error) => {
                render_command_error(&error, &mut *self.io.stderr).map_err(AppError::WriteOutput)?;
                if matches!(
                    error,
                    CommandError::Rpc(RpcClientError::ConnectionClosed { .. })
                ) {
                    Ok(LineStatus::Closed)
                } else {
                    Ok(LineStatus::Failure)
                }
            }
        }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
///
/// `stdin` is only read in `--server` mode.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    run_with_loader(args, IoStreams::new(stdin, stdout, stderr), &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    io: IoStreams<'_, R, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader).run(args)
}
