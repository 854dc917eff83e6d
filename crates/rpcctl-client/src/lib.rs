//! JSON-RPC transport for driving a storage engine over its control socket.
//!
//! [`RpcClient`] owns one Unix or TCP connection to the engine and performs
//! strictly sequential calls on it. Responses are not delimited on the wire,
//! so the client buffers reads until an incremental parse yields a complete
//! JSON document, then classifies it as a result, an engine error, or a
//! protocol violation.
//!
//! Handlers talk to the engine through the [`RpcCall`] trait so the live
//! client can be replaced by a [`DryRunClient`] or a test double.
//!
//! # Example
//!
//! ```rust,no_run
//! use rpcctl_client::{RpcCall, RpcClient};
//! use rpcctl_config::Endpoint;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = Endpoint::resolve("/var/tmp/spdk.sock", 5260)?;
//! let mut client = RpcClient::connect(&endpoint)?;
//! let version = client.call("spdk_get_version", None)?.into_value();
//! println!("{version}");
//! # Ok(())
//! # }
//! ```

mod call;
mod client;
mod dry_run;
mod error;
mod framing;
mod observer;
pub mod protocol;
mod transport;

#[cfg(test)]
mod test_support;

pub use self::call::{CallOptions, Outcome, RpcCall, TERMINATE_METHODS};
pub use self::client::RpcClient;
pub use self::dry_run::DryRunClient;
pub use self::error::RpcClientError;
pub use self::observer::{TracingObserver, TrafficObserver, WriterObserver};

/// Tracing target for client operations.
pub(crate) const CLIENT_TARGET: &str = "rpcctl_client";
