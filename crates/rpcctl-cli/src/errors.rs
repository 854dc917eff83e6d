//! Error types and diagnostics rendering for the CLI runtime.

use std::io::{self, Write};
use std::sync::Arc;

use rpcctl_client::RpcClientError;
use rpcctl_config::EndpointError;
use rpcctl_plugins::{CommandError, ConfigurationError};
use serde_json::Value;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("a command must be provided unless --server is given")]
    MissingCommand,
    #[error("invalid server address: {0}")]
    Endpoint(#[from] EndpointError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Client(#[from] RpcClientError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to read commands from standard input: {0}")]
    ReadInput(io::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}

/// Writes a failed command's diagnostics.
///
/// RPC errors show the request that was sent and the engine's error object.
/// Transport failures show the parameters attempted and any partial response.
pub(crate) fn render_command_error<E: Write>(error: &CommandError, stderr: &mut E) -> io::Result<()> {
    match error {
        CommandError::Rpc(rpc) => render_rpc_error(rpc, stderr),
        other => writeln!(stderr, "{other}"),
    }
}

fn render_rpc_error<E: Write>(error: &RpcClientError, stderr: &mut E) -> io::Result<()> {
    match error {
        RpcClientError::Rpc {
            request,
            error: response,
            ..
        } => {
            writeln!(stderr, "request:\n{}", pretty(request))?;
            writeln!(stderr, "Got JSON-RPC error response")?;
            writeln!(stderr, "response:\n{}", pretty(response))
        }
        RpcClientError::ConnectionClosed { params, .. }
        | RpcClientError::Timeout { params, .. }
        | RpcClientError::Protocol { params, .. } => {
            writeln!(stderr, "{error}")?;
            if let Some(params) = params {
                writeln!(stderr, "params:\n{}", pretty(params))?;
            }
            if let Some(partial) = error.partial_output() {
                writeln!(stderr, "partial response:\n{partial}")?;
            }
            Ok(())
        }
        RpcClientError::Connection { .. } => writeln!(stderr, "{error}"),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
