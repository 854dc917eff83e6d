//! Synchronous JSON-RPC client bound to a single engine socket.
//!
//! A client owns exactly one connection, issues one request at a time, and
//! never pipelines. Responses are assembled from however many reads it takes
//! for [`ResponseBuffer`] to yield a complete document.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rpcctl_config::Endpoint;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::call::{CallOptions, Outcome, RpcCall, TERMINATE_METHODS};
use crate::error::RpcClientError;
use crate::framing::{Frame, ResponseBuffer};
use crate::observer::{TracingObserver, TrafficObserver};
use crate::protocol::{Request, Response, response_id};
use crate::transport::{Connection, connect};
use crate::CLIENT_TARGET;

const READ_CHUNK: usize = 4096;

/// Client for one engine endpoint.
///
/// The socket is opened by [`RpcClient::connect`] and released by
/// [`RpcClient::close`] or on drop, whichever happens first.
pub struct RpcClient {
    endpoint: Endpoint,
    connection: Option<Connection>,
    next_id: u64,
    timeout: Option<Duration>,
    verbose: bool,
    observer: Box<dyn TrafficObserver>,
    terminate_methods: Vec<String>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RpcClient")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.connection.is_some())
            .field("next_id", &self.next_id)
            .field("timeout", &self.timeout)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

enum ReadOutcome {
    /// A complete document and the raw bytes it was decoded from.
    Document { document: Value, raw: Vec<u8> },
    Closed(Vec<u8>),
}

impl RpcClient {
    /// Opens the connection. Failure is final; retries belong to the caller.
    pub fn connect(endpoint: &Endpoint) -> Result<Self, RpcClientError> {
        debug!(target: CLIENT_TARGET, %endpoint, "connecting to engine");
        let connection = connect(endpoint).map_err(|source| RpcClientError::Connection {
            endpoint: endpoint.to_string(),
            source: Arc::new(source),
        })?;
        Ok(Self {
            endpoint: endpoint.clone(),
            connection: Some(connection),
            next_id: 1,
            timeout: None,
            verbose: false,
            observer: Box::new(TracingObserver),
            terminate_methods: TERMINATE_METHODS.iter().map(|&m| m.to_owned()).collect(),
        })
    }

    /// Sets the default per-call deadline; `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables verbose traffic output for every call.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Replaces the observer that receives verbose traffic.
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn TrafficObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replaces the set of methods whose success closes the connection.
    #[must_use]
    pub fn with_terminate_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terminate_methods = methods.into_iter().map(Into::into).collect();
        self
    }

    /// Endpoint this client is bound to.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns `true` while the socket is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Releases the socket. Closing an already closed client does nothing.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(error) = connection.shutdown() {
                debug!(target: CLIENT_TARGET, %error, "socket shutdown failed");
            }
            debug!(target: CLIENT_TARGET, endpoint = %self.endpoint, "connection closed");
        }
    }

    fn is_terminate_method(&self, method: &str) -> bool {
        self.terminate_methods.iter().any(|m| m == method)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn perform(
        &mut self,
        method: &str,
        params: Option<Map<String, Value>>,
        options: CallOptions,
    ) -> Result<Outcome, RpcClientError> {
        let timeout = options.resolve_timeout(self.timeout);
        let verbose = options.resolve_verbose(self.verbose);
        let id = self.allocate_id();
        let request = Request::new(method, id, params);
        let attempted = request.params().cloned().map(Value::Object);

        let Some(connection) = self.connection.as_mut() else {
            return Err(RpcClientError::ConnectionClosed {
                method: method.to_owned(),
                params: attempted,
                partial: Vec::new(),
                source: None,
            });
        };

        let bytes = request
            .to_bytes()
            .map_err(|error| RpcClientError::Protocol {
                method: method.to_owned(),
                params: attempted.clone(),
                message: format!("failed to serialise request: {error}"),
                raw: Vec::new(),
            })?;
        if verbose {
            self.observer.request(&request.to_value());
        }
        debug!(target: CLIENT_TARGET, method, id, request_bytes = bytes.len(), "sending request");

        let closed = |source: io::Error| RpcClientError::ConnectionClosed {
            method: method.to_owned(),
            params: attempted.clone(),
            partial: Vec::new(),
            source: Some(Arc::new(source)),
        };
        connection.set_write_timeout(timeout).map_err(closed)?;
        connection.write_all(&bytes).map_err(closed)?;
        connection.flush().map_err(closed)?;

        let deadline = timeout.map(|timeout| (Instant::now() + timeout, timeout));
        let read = read_document(connection, deadline);
        let (document, raw) = match read {
            Ok(ReadOutcome::Document { document, raw }) => (document, raw),
            Ok(ReadOutcome::Closed(partial)) => {
                self.close();
                if partial.is_empty() && self.is_terminate_method(method) {
                    debug!(target: CLIENT_TARGET, method, "engine closed connection after terminate request");
                    return Ok(Outcome::Terminated);
                }
                return Err(RpcClientError::ConnectionClosed {
                    method: method.to_owned(),
                    params: attempted,
                    partial,
                    source: None,
                });
            }
            Err(failure) => {
                self.close();
                return Err(failure.into_error(method, attempted));
            }
        };

        if verbose {
            self.observer.response(&document);
        }
        if let Some(received) = response_id(&document)
            && received != id
        {
            warn!(target: CLIENT_TARGET, method, expected = id, received, "response id mismatch");
        }

        match Response::classify(document) {
            Response::Result(value) => Ok(Outcome::Value(value)),
            Response::Error(error) => Err(RpcClientError::Rpc {
                method: method.to_owned(),
                request: request.to_value(),
                error,
            }),
            Response::Malformed(message) => Err(RpcClientError::Protocol {
                method: method.to_owned(),
                params: attempted,
                message: message.to_owned(),
                raw,
            }),
        }
    }
}

impl RpcCall for RpcClient {
    fn call_with(
        &mut self,
        method: &str,
        params: Option<Map<String, Value>>,
        options: CallOptions,
    ) -> Result<Outcome, RpcClientError> {
        self.perform(method, params, options)
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.close();
    }
}

enum ReadFailure {
    Timeout { timeout: Duration, partial: Vec<u8> },
    Io { partial: Vec<u8>, source: io::Error },
    Syntax { raw: Vec<u8>, source: serde_json::Error },
}

impl ReadFailure {
    fn into_error(self, method: &str, params: Option<Value>) -> RpcClientError {
        match self {
            Self::Timeout { timeout, partial } => RpcClientError::Timeout {
                method: method.to_owned(),
                params,
                timeout,
                partial,
            },
            Self::Io { partial, source } => RpcClientError::ConnectionClosed {
                method: method.to_owned(),
                params,
                partial,
                source: Some(Arc::new(source)),
            },
            Self::Syntax { raw, source } => RpcClientError::Protocol {
                method: method.to_owned(),
                params,
                message: format!("invalid JSON: {source}"),
                raw,
            },
        }
    }
}

/// Reads until one complete document is buffered, the peer closes, or the
/// deadline passes.
fn read_document(
    connection: &mut Connection,
    deadline: Option<(Instant, Duration)>,
) -> Result<ReadOutcome, ReadFailure> {
    let mut buffer = ResponseBuffer::default();
    let mut chunk = [0_u8; READ_CHUNK];
    loop {
        let remaining = match deadline {
            Some((at, timeout)) => {
                let now = Instant::now();
                if now >= at {
                    return Err(ReadFailure::Timeout {
                        timeout,
                        partial: buffer.into_bytes(),
                    });
                }
                Some(at - now)
            }
            None => None,
        };
        if let Err(source) = connection.set_read_timeout(remaining) {
            return Err(ReadFailure::Io {
                partial: buffer.into_bytes(),
                source,
            });
        }

        let read = match connection.read(&mut chunk) {
            Ok(read) => read,
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(source) => {
                return Err(ReadFailure::Io {
                    partial: buffer.into_bytes(),
                    source,
                });
            }
        };
        if read == 0 {
            return Ok(ReadOutcome::Closed(buffer.into_bytes()));
        }
        buffer.extend(chunk.get(..read).unwrap_or_default());

        match buffer.try_parse() {
            Ok(Frame::Incomplete) => {}
            Ok(Frame::Complete { document, trailing }) => {
                if trailing > 0 {
                    warn!(target: CLIENT_TARGET, trailing, "discarding bytes after response document");
                }
                return Ok(ReadOutcome::Document {
                    document,
                    raw: buffer.into_bytes(),
                });
            }
            Err(source) => {
                return Err(ReadFailure::Syntax {
                    raw: buffer.into_bytes(),
                    source,
                });
            }
        }
    }
}
