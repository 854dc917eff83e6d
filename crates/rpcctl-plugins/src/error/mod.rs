//! Errors raised while registering and dispatching commands.
//!
//! [`ConfigurationError`] is raised synchronously while plugins register
//! their commands, never at call time. [`CommandError`] covers everything a
//! handler can fail with once dispatch has started.

use std::io;
use std::sync::Arc;

use rpcctl_client::RpcClientError;
use thiserror::Error;

/// Problems with the set of registered commands, detected at startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Two command specs share a name.
    #[error("command '{name}' from plugin '{plugin}' is already registered by plugin '{existing}'")]
    DuplicateCommand {
        /// Colliding command name.
        name: String,
        /// Plugin that registered the command first.
        existing: String,
        /// Plugin attempting the second registration.
        plugin: String,
    },

    /// A command declares the same argument twice.
    #[error("command '{command}' declares argument '{argument}' more than once")]
    DuplicateArgument {
        /// Command being registered.
        command: String,
        /// Repeated argument name.
        argument: String,
    },

    /// An argument name would be removed by global stripping.
    #[error("command '{command}' declares reserved argument '{argument}'")]
    ReservedArgument {
        /// Command being registered.
        command: String,
        /// Reserved argument name.
        argument: String,
    },

    /// Two arguments of one command share a short flag.
    #[error("command '{command}' uses short flag '-{short}' more than once")]
    ConflictingShort {
        /// Command being registered.
        command: String,
        /// Repeated short flag.
        short: char,
    },

    /// A command or argument name is unusable.
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// Offending name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// An argument declaration is inconsistent.
    #[error("command '{command}' argument '{argument}': {reason}")]
    InvalidArgument {
        /// Command being registered.
        command: String,
        /// Offending argument.
        argument: String,
        /// Why the declaration was rejected.
        reason: &'static str,
    },

    /// A plugin was requested that the manifest does not list.
    #[error("unknown plugin '{name}'")]
    UnknownPlugin {
        /// Requested plugin name.
        name: String,
    },
}

/// Failures raised while running a command.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// No command with this name is registered.
    #[error("unknown command '{name}'")]
    UnknownCommand {
        /// Requested command name.
        name: String,
    },

    /// A required argument was not supplied.
    #[error("missing required argument '{argument}'")]
    MissingArgument {
        /// Argument name.
        argument: String,
    },

    /// An argument was supplied with an unusable value.
    #[error("invalid value for '{argument}': {message}")]
    InvalidArgument {
        /// Argument name.
        argument: String,
        /// Description of the problem.
        message: String,
    },

    /// The RPC call failed.
    #[error(transparent)]
    Rpc(#[from] RpcClientError),

    /// Writing the command's output failed.
    #[error("failed to write command output: {0}")]
    Output(#[source] Arc<io::Error>),
}

impl CommandError {
    /// Builds an [`CommandError::InvalidArgument`].
    #[must_use]
    pub fn invalid(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }
}

impl From<io::Error> for CommandError {
    fn from(error: io::Error) -> Self {
        Self::Output(Arc::new(error))
    }
}

#[cfg(test)]
mod tests;
