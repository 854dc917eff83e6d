//! The calling surface shared by live and dry-run clients.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::RpcClientError;

/// Methods whose success is signalled by the engine closing the socket.
pub const TERMINATE_METHODS: &[&str] = &["spdk_kill_instance", "kill_instance"];

/// Successful outcome of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The decoded `result` member, whatever JSON it held.
    Value(Value),
    /// A terminate-target method closed the connection without replying.
    Terminated,
}

impl Outcome {
    /// Returns the result value, mapping [`Outcome::Terminated`] to `null`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Terminated => Value::Null,
        }
    }

    /// Returns `true` for the terminated sentinel.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// Per-call overrides of the client-wide defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    timeout: Option<Option<Duration>>,
    verbose: Option<bool>,
}

impl CallOptions {
    /// Bounds this call by `timeout`.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(Some(timeout));
        self
    }

    /// Lets this call wait indefinitely.
    #[must_use]
    pub const fn no_timeout(mut self) -> Self {
        self.timeout = Some(None);
        self
    }

    /// Enables or disables verbose traffic output for this call.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub(crate) fn resolve_timeout(self, default: Option<Duration>) -> Option<Duration> {
        self.timeout.unwrap_or(default)
    }

    pub(crate) fn resolve_verbose(self, default: bool) -> bool {
        self.verbose.unwrap_or(default)
    }
}

/// Anything that can carry a method call to the engine.
///
/// Command handlers receive a `&mut dyn RpcCall`, which lets the driver swap
/// the live client for a dry-run client or a test double.
pub trait RpcCall {
    /// Performs a call with the client-wide defaults.
    fn call(
        &mut self,
        method: &str,
        params: Option<Map<String, Value>>,
    ) -> Result<Outcome, RpcClientError> {
        self.call_with(method, params, CallOptions::default())
    }

    /// Performs a call with per-call overrides.
    fn call_with(
        &mut self,
        method: &str,
        params: Option<Map<String, Value>>,
        options: CallOptions,
    ) -> Result<Outcome, RpcClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_fall_back_to_client_defaults() {
        let options = CallOptions::default();
        assert_eq!(
            options.resolve_timeout(Some(Duration::from_secs(60))),
            Some(Duration::from_secs(60))
        );
        assert!(options.resolve_verbose(true));
    }

    #[test]
    fn options_override_client_defaults() {
        let options = CallOptions::default().no_timeout().verbose(false);
        assert_eq!(options.resolve_timeout(Some(Duration::from_secs(60))), None);
        assert!(!options.resolve_verbose(true));
    }

    #[test]
    fn terminated_maps_to_null() {
        assert!(Outcome::Terminated.is_terminated());
        assert_eq!(Outcome::Terminated.into_value(), Value::Null);
    }
}
