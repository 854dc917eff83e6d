//! Shared configuration for the rpcctl control-plane client.
//!
//! Settings are layered by `ortho_config`: built-in defaults, then an
//! optional configuration file (`--config-path` or `RPCCTL_CONFIG_PATH`),
//! then `RPCCTL_*` environment variables, then long command-line flags.
//! The crate also owns [`Endpoint`], the classification of a server address
//! into a Unix socket path or an IPv4/IPv6 host.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod endpoint;
mod logging;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_PORT, DEFAULT_SERVER_ADDR, DEFAULT_TIMEOUT_SECS, RETRY_DELAY,
    default_log_filter, default_log_filter_string, default_log_format, default_port,
    default_server_addr, default_timeout_secs,
};
pub use endpoint::{AddressFamily, Endpoint, EndpointError};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved settings for one invocation of the control-plane client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "RPCCTL")]
pub struct Config {
    /// Unix socket path or host name of the engine's RPC listener.
    #[serde(default = "default_server_addr")]
    pub server_addr: String,
    /// TCP port used when `server_addr` names a host.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds to wait for a complete response; zero or less waits forever.
    #[serde(default = "default_timeout_secs")]
    pub timeout: f64,
    /// Extra connection attempts made before giving up.
    #[serde(default)]
    pub conn_retries: u32,
    /// Echo every request and response.
    #[serde(default)]
    pub verbose: bool,
    /// Print requests instead of sending them.
    #[serde(default)]
    pub dry_run: bool,
    /// Optional plugins to load in addition to the builtin set.
    #[serde(default)]
    pub plugins: Vec<String>,
    /// `tracing` filter directive applied to diagnostics.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for diagnostics.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: default_server_addr(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT_SECS,
            conn_retries: 0,
            verbose: false,
            dry_run: false,
            plugins: Vec::new(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Classifies the configured server address.
    pub fn endpoint(&self) -> Result<Endpoint, EndpointError> {
        Endpoint::resolve(&self.server_addr, self.port)
    }

    /// Per-call deadline, or `None` when calls may wait indefinitely.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout > 0.0 {
            Duration::try_from_secs_f64(self.timeout).ok()
        } else {
            None
        }
    }

    /// Filter directive for the diagnostics subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for the diagnostics subscriber.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
