use std::time::Duration;

/// Default engine socket used when no address is configured.
pub const DEFAULT_SERVER_ADDR: &str = "/var/tmp/spdk.sock";

/// Default TCP port used when the server address names a host.
pub const DEFAULT_PORT: u16 = 5260;

/// Default time, in seconds, to wait for a complete response.
pub const DEFAULT_TIMEOUT_SECS: f64 = 60.0;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Pause between connection attempts when retries are configured.
pub const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Owned server address used where allocation is required (e.g. serde).
pub fn default_server_addr() -> String {
    DEFAULT_SERVER_ADDR.to_owned()
}

/// Default TCP port.
pub const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default response timeout in seconds.
pub const fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

/// Default log filter expression used by the binary.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}
