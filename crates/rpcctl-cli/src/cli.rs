//! Driver-level command line.
//!
//! The global flags are declared with clap's derive API; the subcommands are
//! added at runtime from the command registry.

use std::ffi::OsString;

use clap::{Arg, ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use rpcctl_config::Config;
use rpcctl_plugins::{CommandRegistry, ParamObject};
use serde_json::Value;

#[derive(Parser, Debug, Default, Clone, PartialEq)]
#[command(
    name = "rpcctl",
    about = "Control-plane client for a storage engine's JSON-RPC socket",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// Engine RPC address: a Unix socket path or a host name.
    #[arg(short = 's', value_name = "ADDR")]
    pub(crate) server_addr: Option<String>,
    /// Port used when the address names a host.
    #[arg(short = 'p', value_name = "PORT")]
    pub(crate) port: Option<u16>,
    /// Seconds to wait for each response; zero waits forever.
    #[arg(short = 't', value_name = "SECONDS")]
    pub(crate) timeout: Option<f64>,
    /// Extra connection attempts, 200 ms apart.
    #[arg(short = 'r', value_name = "RETRIES")]
    pub(crate) conn_retries: Option<u32>,
    /// Print every request and response on standard error.
    #[arg(short = 'v', long)]
    pub(crate) verbose: bool,
    /// Print requests instead of sending them.
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Read commands from standard input, one per line.
    #[arg(long = "server")]
    pub(crate) is_server: bool,
    /// Loads an optional plugin. May be repeated.
    #[arg(long = "plugin", value_name = "NAME")]
    pub(crate) plugins: Vec<String>,
}

impl Cli {
    /// Parses only the driver flags, ignoring whatever command follows.
    ///
    /// Used to learn which plugins to load before the full command tree
    /// exists. `-h/--help` is accepted and ignored so that help can list
    /// plugin commands. Returns `None` when the flags themselves do not
    /// parse; the full parse reports the problem.
    pub(crate) fn preparse(args: &[OsString]) -> Option<Self> {
        let matches = Self::command()
            .allow_external_subcommands(true)
            .disable_help_flag(true)
            .arg(
                Arg::new("help")
                    .short('h')
                    .long("help")
                    .action(ArgAction::SetTrue)
                    .hide(true),
            )
            .try_get_matches_from(args)
            .ok()?;
        Self::from_arg_matches(&matches).ok()
    }

    /// The full command tree with every registered subcommand.
    pub(crate) fn command_tree(registry: &CommandRegistry) -> clap::Command {
        registry.clap_command(Self::command())
    }

    /// Command tree for one server-mode line: registered commands only.
    ///
    /// Driver flags are fixed when the server starts, so a line that repeats
    /// them is rejected.
    pub(crate) fn line_tree(registry: &CommandRegistry) -> clap::Command {
        let root = clap::Command::new("rpcctl")
            .disable_help_subcommand(true)
            .subcommand_required(true);
        registry.clap_command(root)
    }

    pub(crate) fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        Self::from_arg_matches(matches)
    }

    /// Applies the short flags on top of the loaded configuration.
    pub(crate) fn apply(&self, config: &mut Config) {
        if let Some(server_addr) = &self.server_addr {
            config.server_addr.clone_from(server_addr);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(conn_retries) = self.conn_retries {
            config.conn_retries = conn_retries;
        }
        config.verbose |= self.verbose;
        config.dry_run |= self.dry_run;
        for plugin in &self.plugins {
            if !config.plugins.contains(plugin) {
                config.plugins.push(plugin.clone());
            }
        }
    }

    /// Namespace entries describing how the driver runs.
    ///
    /// Every key is stripped by `strip_globals` before parameters are sent.
    pub(crate) fn globals(&self, config: &Config) -> ParamObject {
        ParamObject::new()
            .with("server_addr", Value::from(config.server_addr.as_str()))
            .with("port", Value::from(config.port))
            .with("timeout", Value::from(config.timeout))
            .with("verbose", Value::Bool(config.verbose))
            .with("dry_run", Value::Bool(config.dry_run))
            .with("conn_retries", Value::from(config.conn_retries))
            .with("is_server", Value::Bool(self.is_server))
            .with(
                "rpc_plugin",
                Value::Array(config.plugins.iter().map(|name| Value::from(name.as_str())).collect()),
            )
    }
}
