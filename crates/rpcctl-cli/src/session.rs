//! One driver session: a client plus the buffers its commands write to.
//!
//! Command output and verbose traffic are collected in shared buffers so the
//! dry-run client, the traffic observer and the handler can all write while
//! the runner keeps ownership of the real output streams.

use std::io::{self, Write};
use std::mem;
use std::sync::{Arc, Mutex};
use std::thread;

use rpcctl_client::{DryRunClient, RpcCall, RpcClient, RpcClientError, WriterObserver};
use rpcctl_config::{Config, Endpoint, RETRY_DELAY};
use rpcctl_plugins::{CommandError, CommandRegistry, ParamObject};
use tracing::{debug, warn};

use crate::errors::AppError;

const DRIVER_TARGET: &str = "rpcctl_cli";

/// Cloneable in-memory writer.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Removes and returns everything written so far.
    pub(crate) fn take(&self) -> Vec<u8> {
        match self.0.lock() {
            Ok(mut bytes) => mem::take(&mut *bytes),
            Err(poisoned) => mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::other("output buffer lock poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) struct Session {
    client: Box<dyn RpcCall>,
    output: SharedBuffer,
    diagnostics: SharedBuffer,
}

impl Session {
    /// Opens a live connection, or a dry-run stand-in when configured.
    pub(crate) fn open(config: &Config) -> Result<Self, AppError> {
        let output = SharedBuffer::default();
        let diagnostics = SharedBuffer::default();
        let client: Box<dyn RpcCall> = if config.dry_run {
            Box::new(DryRunClient::new(output.clone()))
        } else {
            let endpoint = config.endpoint()?;
            let client = connect_with_retries(&endpoint, config.conn_retries)?
                .with_timeout(config.timeout())
                .with_verbose(config.verbose)
                .with_observer(Box::new(WriterObserver::new(diagnostics.clone())));
            Box::new(client)
        };
        Ok(Self {
            client,
            output,
            diagnostics,
        })
    }

    /// Runs one command against the session's client.
    pub(crate) fn execute(
        &mut self,
        registry: &CommandRegistry,
        command: &str,
        namespace: &ParamObject,
    ) -> Result<(), CommandError> {
        let mut output = self.output.clone();
        registry.dispatch(command, namespace, self.client.as_mut(), &mut output)
    }

    /// Moves buffered traffic to `stderr` and command output to `stdout`.
    pub(crate) fn drain<W: Write, E: Write>(&self, stdout: &mut W, stderr: &mut E) -> io::Result<()> {
        stderr.write_all(&self.diagnostics.take())?;
        stdout.write_all(&self.output.take())?;
        stderr.flush()?;
        stdout.flush()
    }
}

/// Connects to `endpoint`, retrying refused connections.
///
/// Each attempt builds a fresh client. Only connection failures are retried.
pub(crate) fn connect_with_retries(
    endpoint: &Endpoint,
    retries: u32,
) -> Result<RpcClient, RpcClientError> {
    let mut attempt = 0u32;
    loop {
        match RpcClient::connect(endpoint) {
            Ok(client) => {
                debug!(target: DRIVER_TARGET, %endpoint, attempt, "connected");
                return Ok(client);
            }
            Err(error) if error.is_connection() && attempt < retries => {
                attempt += 1;
                warn!(
                    target: DRIVER_TARGET,
                    %endpoint,
                    attempt,
                    retries,
                    %error,
                    "connection failed; retrying"
                );
                thread::sleep(RETRY_DELAY);
            }
            Err(error) => return Err(error),
        }
    }
}
