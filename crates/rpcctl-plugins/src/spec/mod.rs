//! Command and argument declarations contributed by plugins.
//!
//! A [`CommandSpec`] names a subcommand, lists its [`ArgSpec`]s in order, and
//! binds the handler that runs it. Specs are validated when they enter a
//! registry and are immutable afterwards.

use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use rpcctl_client::RpcCall;
use serde_json::Value;

use crate::error::{CommandError, ConfigurationError};
use crate::params::{GLOBAL_KEYS, Param, ParamObject};

/// Value type of a declared argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Free-form text.
    String,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// Boolean switch; `false` unless given.
    Flag,
    /// One or more text values.
    List,
}

/// Declaration of one command argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    name: String,
    kind: ArgKind,
    positional: bool,
    required: bool,
    short: Option<char>,
    long: Option<String>,
    help: String,
    default: Option<Value>,
}

impl ArgSpec {
    /// Declares a required positional argument.
    #[must_use]
    pub fn positional(name: impl Into<String>, kind: ArgKind) -> Self {
        Self {
            name: name.into(),
            kind,
            positional: true,
            required: true,
            short: None,
            long: None,
            help: String::new(),
            default: None,
        }
    }

    /// Declares an optional `--long-name` argument.
    ///
    /// The long flag is the name with underscores turned into dashes.
    #[must_use]
    pub fn option(name: impl Into<String>, kind: ArgKind) -> Self {
        let name = name.into();
        let long = name.replace('_', "-");
        Self {
            name,
            kind,
            positional: false,
            required: false,
            short: None,
            long: Some(long),
            help: String::new(),
            default: None,
        }
    }

    /// Adds a short flag.
    #[must_use]
    pub const fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Overrides the long flag.
    #[must_use]
    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Makes an option mandatory.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks a positional argument as optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value used when the argument is not supplied.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Parameter key the argument populates.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type.
    #[must_use]
    pub const fn kind(&self) -> ArgKind {
        self.kind
    }

    /// Returns `true` for positional arguments.
    #[must_use]
    pub const fn is_positional(&self) -> bool {
        self.positional
    }

    /// Returns `true` when the argument must be supplied.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Short flag, if any.
    #[must_use]
    pub const fn short_flag(&self) -> Option<char> {
        self.short
    }

    fn to_clap(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone()).required(self.required);
        if !self.help.is_empty() {
            arg = arg.help(self.help.clone());
        }
        if !self.positional {
            if let Some(long) = &self.long {
                arg = arg.long(long.clone());
            }
            if let Some(short) = self.short {
                arg = arg.short(short);
            }
        }
        match self.kind {
            ArgKind::String => arg.value_parser(value_parser!(String)),
            ArgKind::Integer => arg
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true),
            ArgKind::Float => arg
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true),
            ArgKind::Flag => arg.action(ArgAction::SetTrue),
            ArgKind::List => arg
                .value_parser(value_parser!(String))
                .num_args(1..)
                .action(ArgAction::Append),
        }
    }

    fn extract(&self, matches: &ArgMatches) -> Param {
        let supplied = match self.kind {
            ArgKind::String => matches
                .get_one::<String>(&self.name)
                .map(|text| Value::from(text.as_str())),
            ArgKind::Integer => matches.get_one::<i64>(&self.name).map(|n| Value::from(*n)),
            ArgKind::Float => matches.get_one::<f64>(&self.name).map(|n| Value::from(*n)),
            ArgKind::Flag => matches
                .get_flag(&self.name)
                .then_some(Value::Bool(true))
                .or_else(|| self.default.is_none().then_some(Value::Bool(false))),
            ArgKind::List => matches.get_many::<String>(&self.name).map(|values| {
                Value::Array(values.map(|text| Value::from(text.as_str())).collect())
            }),
        };
        match (supplied, &self.default) {
            (Some(value), _) => Param::Value(value),
            (None, Some(default)) => Param::Value(default.clone()),
            (None, None) => Param::Absent,
        }
    }
}

/// What a handler receives when its command runs.
pub struct Invocation<'a> {
    /// Parsed argument namespace, including the driver's global keys.
    pub args: &'a ParamObject,
    /// Connection to the engine.
    pub client: &'a mut dyn RpcCall,
    /// Destination for command output.
    pub output: &'a mut dyn Write,
}

/// Function bound to a command.
pub type HandlerFn = dyn Fn(Invocation<'_>) -> Result<(), CommandError> + Send + Sync;

/// Registry entry mapping a subcommand to its arguments and handler.
#[derive(Clone)]
pub struct CommandSpec {
    name: String,
    help: String,
    args: Vec<ArgSpec>,
    handler: Arc<HandlerFn>,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("help", &self.help)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    /// Declares a command bound to `handler`.
    #[must_use]
    pub fn new<F>(name: impl Into<String>, help: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Invocation<'_>) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            help: help.into(),
            args: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Appends an argument declaration.
    #[must_use]
    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    /// Command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text.
    #[must_use]
    pub fn help_text(&self) -> &str {
        &self.help
    }

    /// Argument declarations in order.
    #[must_use]
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// Checks the declaration for problems that would only show at runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for unusable names, repeated or
    /// reserved arguments, clashing short flags, and flags declared as
    /// positionals.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_name(&self.name)?;
        let mut names = HashSet::new();
        let mut shorts = HashSet::new();
        for arg in &self.args {
            validate_name(&arg.name)?;
            if !names.insert(arg.name.as_str()) {
                return Err(ConfigurationError::DuplicateArgument {
                    command: self.name.clone(),
                    argument: arg.name.clone(),
                });
            }
            if GLOBAL_KEYS.contains(&arg.name.as_str()) {
                return Err(ConfigurationError::ReservedArgument {
                    command: self.name.clone(),
                    argument: arg.name.clone(),
                });
            }
            if arg.positional && arg.kind == ArgKind::Flag {
                return Err(ConfigurationError::InvalidArgument {
                    command: self.name.clone(),
                    argument: arg.name.clone(),
                    reason: "flags cannot be positional",
                });
            }
            if let Some(short) = arg.short
                && (short == 'h' || !shorts.insert(short))
            {
                return Err(ConfigurationError::ConflictingShort {
                    command: self.name.clone(),
                    short,
                });
            }
        }
        Ok(())
    }

    /// Builds the clap subcommand for this spec.
    #[must_use]
    pub fn to_clap(&self) -> Command {
        let mut command = Command::new(self.name.clone());
        if !self.help.is_empty() {
            command = command.about(self.help.clone());
        }
        self.args
            .iter()
            .fold(command, |command, arg| command.arg(arg.to_clap()))
    }

    /// Builds the argument namespace from parsed subcommand matches.
    ///
    /// `globals` supplies the driver-level keys; declared arguments follow
    /// in declaration order, absent ones marked [`Param::Absent`].
    #[must_use]
    pub fn namespace(&self, matches: &ArgMatches, globals: &ParamObject) -> ParamObject {
        let mut namespace = globals.clone();
        namespace.insert("called_rpc_name", Value::from(self.name.as_str()));
        for arg in &self.args {
            namespace.insert(arg.name.clone(), arg.extract(matches));
        }
        namespace
    }

    /// Runs the handler.
    ///
    /// # Errors
    ///
    /// Propagates whatever the handler returns.
    pub fn run(&self, invocation: Invocation<'_>) -> Result<(), CommandError> {
        (self.handler)(invocation)
    }
}

fn validate_name(name: &str) -> Result<(), ConfigurationError> {
    let reason = if name.is_empty() {
        "name must not be empty"
    } else if name.starts_with('-') {
        "name must not start with '-'"
    } else if name.chars().any(char::is_whitespace) {
        "name must not contain whitespace"
    } else {
        return Ok(());
    };
    Err(ConfigurationError::InvalidName {
        name: name.to_owned(),
        reason,
    })
}

#[cfg(test)]
mod tests;
