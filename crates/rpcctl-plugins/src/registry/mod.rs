//! Command registry and plugin catalog.
//!
//! Plugins implement [`Plugin`] and hand their [`CommandSpec`]s to a
//! [`CommandRegistry`], which keeps them in registration order and rejects
//! name collisions. A [`PluginCatalog`] is the explicit manifest of plugins
//! the driver knows how to load.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::io::Write;

use clap::{ArgMatches, Command};
use rpcctl_client::RpcCall;
use tracing::debug;

use crate::error::{CommandError, ConfigurationError};
use crate::params::ParamObject;
use crate::spec::{CommandSpec, Invocation};

const REGISTRY_TARGET: &str = "rpcctl_plugins::registry";

/// A unit of commands loaded as a whole.
pub trait Plugin: Send + Sync {
    /// Name used to select the plugin.
    fn name(&self) -> &str;

    /// Commands the plugin contributes, in the order they should appear.
    fn commands(&self) -> Vec<CommandSpec>;
}

#[derive(Debug, Clone)]
struct Entry {
    plugin: String,
    spec: CommandSpec,
}

/// Ordered set of uniquely named commands.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single command on behalf of `plugin`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the command is malformed or its name
    /// is already taken.
    pub fn register(
        &mut self,
        plugin: &str,
        spec: CommandSpec,
    ) -> Result<(), ConfigurationError> {
        spec.validate()?;
        self.ensure_vacant(plugin, spec.name())?;
        self.insert(plugin, spec);
        Ok(())
    }

    /// Registers every command of `plugin`, or none of them.
    ///
    /// Returns the number of commands added.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] found among the plugin's
    /// commands; the registry is left unchanged.
    pub fn load_plugin(&mut self, plugin: &dyn Plugin) -> Result<usize, ConfigurationError> {
        let name = plugin.name();
        let specs = plugin.commands();
        let mut batch = HashSet::new();
        for spec in &specs {
            spec.validate()?;
            self.ensure_vacant(name, spec.name())?;
            if !batch.insert(spec.name()) {
                return Err(ConfigurationError::DuplicateCommand {
                    name: spec.name().to_owned(),
                    existing: name.to_owned(),
                    plugin: name.to_owned(),
                });
            }
        }
        let count = specs.len();
        for spec in specs {
            self.insert(name, spec);
        }
        debug!(target: REGISTRY_TARGET, plugin = name, commands = count, "plugin loaded");
        Ok(count)
    }

    /// Looks up a command by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.entry(name).map(|entry| &entry.spec)
    }

    /// Name of the plugin that registered `name`.
    #[must_use]
    pub fn plugin_of(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|entry| entry.plugin.as_str())
    }

    /// Command names in registration order.
    #[must_use]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.spec.name())
    }

    /// Commands in registration order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.entries.iter().map(|entry| &entry.spec)
    }

    /// Returns the number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds every registered command to `root` as a subcommand.
    #[must_use]
    pub fn clap_command(&self, root: Command) -> Command {
        root.subcommands(self.iter().map(CommandSpec::to_clap))
    }

    /// Finds the command selected in `matches` and builds its namespace.
    #[must_use]
    pub fn resolve(
        &self,
        matches: &ArgMatches,
        globals: &ParamObject,
    ) -> Option<(&CommandSpec, ParamObject)> {
        let (name, sub_matches) = matches.subcommand()?;
        let spec = self.get(name)?;
        Some((spec, spec.namespace(sub_matches, globals)))
    }

    /// Runs the handler registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownCommand`] for unregistered names and
    /// otherwise whatever the handler returns.
    pub fn dispatch(
        &self,
        name: &str,
        args: &ParamObject,
        client: &mut dyn RpcCall,
        output: &mut dyn Write,
    ) -> Result<(), CommandError> {
        let spec = self.get(name).ok_or_else(|| CommandError::UnknownCommand {
            name: name.to_owned(),
        })?;
        debug!(target: REGISTRY_TARGET, command = name, "dispatching");
        spec.run(Invocation {
            args,
            client,
            output,
        })
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.index
            .get(name)
            .and_then(|position| self.entries.get(*position))
    }

    fn ensure_vacant(&self, plugin: &str, name: &str) -> Result<(), ConfigurationError> {
        match self.plugin_of(name) {
            Some(existing) => Err(ConfigurationError::DuplicateCommand {
                name: name.to_owned(),
                existing: existing.to_owned(),
                plugin: plugin.to_owned(),
            }),
            None => Ok(()),
        }
    }

    fn insert(&mut self, plugin: &str, spec: CommandSpec) {
        self.index.insert(spec.name().to_owned(), self.entries.len());
        self.entries.push(Entry {
            plugin: plugin.to_owned(),
            spec,
        });
    }
}

struct CatalogEntry {
    plugin: Box<dyn Plugin>,
    default_enabled: bool,
}

/// Manifest of the plugins the driver can load.
#[derive(Default)]
pub struct PluginCatalog {
    entries: Vec<CatalogEntry>,
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_list()
            .entries(self.entries.iter().map(|entry| entry.plugin.name()))
            .finish()
    }
}

impl PluginCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin; `default_enabled` plugins load without being requested.
    #[must_use]
    pub fn with(mut self, plugin: impl Plugin + 'static, default_enabled: bool) -> Self {
        self.entries.push(CatalogEntry {
            plugin: Box::new(plugin),
            default_enabled,
        });
        self
    }

    /// Plugin names in catalog order.
    #[must_use]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.plugin.name())
    }

    /// Loads the default plugins plus those named in `requested`.
    ///
    /// Plugins load in catalog order regardless of the order requested;
    /// naming a plugin twice, or naming a default one, has no extra effect.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownPlugin`] before loading anything
    /// when a requested name is not in the catalog, and otherwise the first
    /// registration error.
    pub fn load<S: AsRef<str>>(
        &self,
        registry: &mut CommandRegistry,
        requested: &[S],
    ) -> Result<(), ConfigurationError> {
        let known: HashSet<&str> = self.names().collect();
        if let Some(unknown) = requested
            .iter()
            .map(AsRef::as_ref)
            .find(|name| !known.contains(name))
        {
            return Err(ConfigurationError::UnknownPlugin {
                name: unknown.to_owned(),
            });
        }
        for entry in &self.entries {
            let name = entry.plugin.name();
            let wanted = requested.iter().any(|requested| requested.as_ref() == name);
            if entry.default_enabled || wanted {
                registry.load_plugin(entry.plugin.as_ref())?;
            }
        }
        Ok(())
    }
}
