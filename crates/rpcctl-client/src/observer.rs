//! Hooks for surfacing raw traffic in verbose mode.

use std::io::Write;
use std::sync::Mutex;

use serde_json::Value;

/// Receives the exact request and decoded response of verbose calls.
///
/// Observers run synchronously before the call returns or fails and have no
/// influence on its outcome.
pub trait TrafficObserver: Send {
    /// Called with the request just before it is written.
    fn request(&self, request: &Value);

    /// Called with the decoded response document before it is classified.
    fn response(&self, response: &Value);
}

/// Observer that emits traffic as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TrafficObserver for TracingObserver {
    fn request(&self, request: &Value) {
        tracing::info!(target: crate::CLIENT_TARGET, %request, "request");
    }

    fn response(&self, response: &Value) {
        tracing::info!(target: crate::CLIENT_TARGET, %response, "response");
    }
}

/// Observer that prints pretty JSON blocks to a writer.
pub struct WriterObserver<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterObserver<W> {
    /// Wraps a writer such as standard error.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, label: &str, value: &Value) {
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        // Verbose output is best effort and must not change the call outcome.
        let _ = writeln!(writer, "{label}:\n{rendered}");
        let _ = writer.flush();
    }
}

impl<W: Write + Send> TrafficObserver for WriterObserver<W> {
    fn request(&self, request: &Value) {
        self.emit("request", request);
    }

    fn response(&self, response: &Value) {
        self.emit("response", response);
    }
}
