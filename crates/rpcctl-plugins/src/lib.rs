//! Command registry and parameter shaping for `rpcctl`.
//!
//! Commands are contributed by [`Plugin`]s. Each plugin returns a list of
//! [`CommandSpec`]s declaring a subcommand name, its arguments, and the
//! handler to run. The [`CommandRegistry`] keeps them in registration order,
//! rejects duplicate names at load time, builds the clap command tree, and
//! dispatches a parsed command line to the matching handler together with
//! the live client.
//!
//! Handlers turn the parsed namespace into RPC parameters with the
//! [`ParamObject`] pipeline (`strip_globals`, `remove_null`,
//! `apply_defaults`, `group_as`).
//!
//! # Example
//!
//! ```rust,no_run
//! use rpcctl_plugins::{ArgKind, ArgSpec, CommandRegistry, CommandSpec, output};
//!
//! let spec = CommandSpec::new("bdev_get_bdevs", "List block devices", |invocation| {
//!     let params = invocation.args.clone().strip_globals().remove_null();
//!     let result = invocation.client.call("bdev_get_bdevs", params.into_wire())?;
//!     output::print_dict(invocation.output, &result.into_value())?;
//!     Ok(())
//! })
//! .arg(ArgSpec::option("name", ArgKind::String).short('b'));
//!
//! let mut registry = CommandRegistry::new();
//! registry.register("bdev", spec).expect("valid command");
//! ```

pub mod error;
pub mod output;
pub mod params;
pub mod registry;
pub mod spec;

pub use self::error::{CommandError, ConfigurationError};
pub use self::params::{GLOBAL_KEYS, Param, ParamObject};
pub use self::registry::{CommandRegistry, Plugin, PluginCatalog};
pub use self::spec::{ArgKind, ArgSpec, CommandSpec, HandlerFn, Invocation};
