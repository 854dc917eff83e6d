use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Address family requested for a TCP endpoint.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AddressFamily {
    /// Resolve the host to an IPv4 address.
    Ipv4,
    /// Resolve the host to an IPv6 address.
    Ipv6,
}

/// Location of the engine's RPC socket.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum Endpoint {
    /// Unix domain socket endpoint.
    Unix { path: Utf8PathBuf },
    /// TCP socket endpoint.
    Tcp {
        host: String,
        port: u16,
        family: AddressFamily,
    },
}

impl Endpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP endpoint for the given address family.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16, family: AddressFamily) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
            family,
        }
    }

    /// Classifies a server address the way operators type it.
    ///
    /// An address starting with a path separator names a Unix socket. A
    /// bracketed literal (`[::1]`) or any address containing a colon is an
    /// IPv6 host, and everything else is treated as an IPv4 host. The port
    /// only applies to the TCP forms.
    pub fn resolve(address: &str, port: u16) -> Result<Self, EndpointError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(EndpointError::Empty);
        }
        if address.starts_with('/') || address.starts_with(std::path::MAIN_SEPARATOR) {
            return Ok(Self::unix(address));
        }
        if let Some(inner) = address
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            if inner.is_empty() {
                return Err(EndpointError::EmptyBracketedHost(address.to_owned()));
            }
            return Ok(Self::tcp(inner, port, AddressFamily::Ipv6));
        }
        if address.contains(':') {
            return Ok(Self::tcp(address, port, AddressFamily::Ipv6));
        }
        Ok(Self::tcp(address, port, AddressFamily::Ipv4))
    }

    /// Returns the Unix socket path when the endpoint uses the Unix transport.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "{path}"),
            Self::Tcp {
                host,
                port,
                family: AddressFamily::Ipv4,
            } => write!(formatter, "{host}:{port}"),
            Self::Tcp {
                host,
                port,
                family: AddressFamily::Ipv6,
            } => write!(formatter, "[{host}]:{port}"),
        }
    }
}

/// Errors encountered while classifying a server address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// No address was supplied.
    #[error("server address must not be empty")]
    Empty,
    /// Brackets enclosed nothing.
    #[error("missing IPv6 host in '{0}'")]
    EmptyBracketedHost(String),
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn absolute_path_is_unix_socket() {
        let endpoint = Endpoint::resolve("/var/tmp/spdk.sock", 5260).expect("valid address");
        assert_eq!(endpoint, Endpoint::unix("/var/tmp/spdk.sock"));
        assert_eq!(endpoint.to_string(), "/var/tmp/spdk.sock");
    }

    #[rstest]
    #[case("::1", "::1")]
    #[case("fe80::1", "fe80::1")]
    #[case("[::1]", "::1")]
    fn colon_or_brackets_select_ipv6(#[case] address: &str, #[case] host: &str) {
        let endpoint = Endpoint::resolve(address, 4420).expect("valid address");
        assert_eq!(endpoint, Endpoint::tcp(host, 4420, AddressFamily::Ipv6));
    }

    #[rstest]
    #[case("127.0.0.1")]
    #[case("localhost")]
    fn plain_host_selects_ipv4(#[case] address: &str) {
        let endpoint = Endpoint::resolve(address, 5260).expect("valid address");
        assert_eq!(endpoint, Endpoint::tcp(address, 5260, AddressFamily::Ipv4));
    }

    #[test]
    fn display_brackets_ipv6_hosts() {
        let endpoint = Endpoint::tcp("::1", 5260, AddressFamily::Ipv6);
        assert_eq!(endpoint.to_string(), "[::1]:5260");
    }

    #[rstest]
    #[case("", EndpointError::Empty)]
    #[case("   ", EndpointError::Empty)]
    #[case("[]", EndpointError::EmptyBracketedHost(String::from("[]")))]
    fn rejects_unusable_addresses(#[case] address: &str, #[case] expected: EndpointError) {
        assert_eq!(Endpoint::resolve(address, 1), Err(expected));
    }
}
