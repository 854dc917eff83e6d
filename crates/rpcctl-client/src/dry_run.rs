//! Client stand-in that prints requests instead of sending them.

use std::io::Write;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::CLIENT_TARGET;
use crate::call::{CallOptions, Outcome, RpcCall};
use crate::error::RpcClientError;

/// Writes each request it is handed and reports a `null` result.
///
/// No socket is opened, so every command can be rehearsed against an engine
/// that is not running.
#[derive(Debug)]
pub struct DryRunClient<W> {
    writer: W,
}

impl<W: Write> DryRunClient<W> {
    /// Creates a dry-run client writing to `writer`.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RpcCall for DryRunClient<W> {
    fn call_with(
        &mut self,
        method: &str,
        params: Option<Map<String, Value>>,
        _options: CallOptions,
    ) -> Result<Outcome, RpcClientError> {
        let params = params.filter(|params| !params.is_empty()).map(Value::Object);
        let request = json!({ "method": method, "params": params });
        debug!(target: CLIENT_TARGET, method, "dry run, request not sent");
        let rendered =
            serde_json::to_string_pretty(&request).unwrap_or_else(|_| request.to_string());
        writeln!(self.writer, "Request:\n{rendered}").map_err(|error| {
            RpcClientError::Protocol {
                method: method.to_owned(),
                params: params.clone(),
                message: format!("failed to write dry-run request: {error}"),
                raw: Vec::new(),
            }
        })?;
        Ok(Outcome::Value(Value::Null))
    }
}
