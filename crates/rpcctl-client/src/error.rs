//! Failure classification for RPC calls.
//!
//! Every failure reduces to one of five kinds. Each variant carries enough
//! context (method, parameters attempted, bytes buffered so far) to render a
//! diagnostic without consulting logs. I/O errors are wrapped in `Arc` so the
//! error stays cheap to clone and move.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Errors raised while establishing a client or performing a call.
#[derive(Debug, Clone, Error)]
pub enum RpcClientError {
    /// The transport could not be established.
    #[error("failed to connect to {endpoint}: {source}")]
    Connection {
        /// Endpoint that was dialled.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The engine closed the stream before a complete response arrived.
    #[error("connection closed while waiting for response to '{method}'")]
    ConnectionClosed {
        /// Method of the call in progress.
        method: String,
        /// Parameters that were sent.
        params: Option<Value>,
        /// Bytes received before the stream closed.
        partial: Vec<u8>,
        /// Socket error that ended the stream, when it did not close cleanly.
        #[source]
        source: Option<Arc<io::Error>>,
    },

    /// No complete response arrived within the deadline.
    #[error("timed out after {timeout:?} waiting for response to '{method}'")]
    Timeout {
        /// Method of the call in progress.
        method: String,
        /// Parameters that were sent.
        params: Option<Value>,
        /// Deadline that elapsed.
        timeout: Duration,
        /// Bytes received before the deadline elapsed. Never a valid result.
        partial: Vec<u8>,
    },

    /// The engine answered with a well-formed error response.
    #[error("'{method}' failed: {error}")]
    Rpc {
        /// Method of the failed call.
        method: String,
        /// The full request that was sent.
        request: Value,
        /// The engine's error object, verbatim.
        error: Value,
    },

    /// The response could not be interpreted.
    #[error("malformed response to '{method}': {message}")]
    Protocol {
        /// Method of the call in progress.
        method: String,
        /// Parameters that were sent.
        params: Option<Value>,
        /// Description of the violation.
        message: String,
        /// Raw bytes received.
        raw: Vec<u8>,
    },
}

impl RpcClientError {
    /// Method name the failure relates to, when a call was in progress.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Connection { .. } => None,
            Self::ConnectionClosed { method, .. }
            | Self::Timeout { method, .. }
            | Self::Rpc { method, .. }
            | Self::Protocol { method, .. } => Some(method),
        }
    }

    /// Bytes buffered before the failure, lossily decoded, when any arrived.
    #[must_use]
    pub fn partial_output(&self) -> Option<String> {
        let bytes = match self {
            Self::ConnectionClosed { partial, .. } | Self::Timeout { partial, .. } => partial,
            Self::Protocol { raw, .. } => raw,
            Self::Connection { .. } | Self::Rpc { .. } => return None,
        };
        (!bytes.is_empty()).then(|| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Returns `true` when the failure happened before any request was sent.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
