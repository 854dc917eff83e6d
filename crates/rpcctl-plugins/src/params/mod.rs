//! Shaping parsed command arguments into RPC parameter objects.
//!
//! A [`ParamObject`] is an ordered list of key/value pairs in which every
//! value is either [`Param::Absent`] (the argument was not supplied), a JSON
//! value (including an explicit `null`), or a nested group. Handlers start
//! from the parsed argument namespace and chain the transforms they need:
//!
//! 1. [`ParamObject::strip_globals`] drops CLI plumbing keys.
//! 2. [`ParamObject::remove_null`] drops absent arguments.
//! 3. [`ParamObject::apply_defaults`] fills keys that are missing entirely.
//! 4. [`ParamObject::group_as`] moves related keys into a nested object.
//!
//! The object is converted to a JSON map only at the transport boundary by
//! [`ParamObject::into_wire`].

use serde_json::{Map, Value};

use crate::error::CommandError;

/// Keys that describe how the CLI runs rather than what the engine should do.
pub const GLOBAL_KEYS: &[&str] = &[
    "server_addr",
    "port",
    "timeout",
    "verbose",
    "dry_run",
    "conn_retries",
    "is_server",
    "rpc_plugin",
    "called_rpc_name",
    "func",
    "client",
];

/// One parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// The argument was not supplied.
    Absent,
    /// A supplied value. `Value::Null` is an explicit null, not an absence.
    Value(Value),
    /// A nested object produced by grouping.
    Group(ParamObject),
}

impl Param {
    /// Returns `true` for [`Param::Absent`].
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Converts the parameter to JSON, or `None` when it is absent.
    #[must_use]
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Absent => None,
            Self::Value(value) => Some(value),
            Self::Group(group) => Some(Value::Object(group.into_map())),
        }
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<ParamObject> for Param {
    fn from(group: ParamObject) -> Self {
        Self::Group(group)
    }
}

/// Ordered RPC parameters with explicit absence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamObject {
    entries: Vec<(String, Param)>,
}

impl ParamObject {
    /// Creates an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Param>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`ParamObject::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        self.insert(key, value);
        self
    }

    /// Marks `key` as present but not supplied.
    pub fn insert_absent(&mut self, key: impl Into<String>) {
        self.insert(key, Param::Absent);
    }

    /// Looks up a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Param> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Looks up a supplied JSON value, skipping absent keys and groups.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        match self.get(key) {
            Some(Param::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Removes and returns a parameter.
    pub fn remove(&mut self, key: &str) -> Option<Param> {
        let index = self
            .entries
            .iter()
            .position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns `true` when `key` is present, even if it is absent-valued.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of keys, including absent-valued ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the object holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Key/value pairs in insertion order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Drops every key listed in [`GLOBAL_KEYS`].
    #[must_use]
    pub fn strip_globals(mut self) -> Self {
        self.entries
            .retain(|(key, _)| !GLOBAL_KEYS.contains(&key.as_str()));
        self
    }

    /// Drops every absent-valued key. Falsy values and explicit nulls stay.
    #[must_use]
    pub fn remove_null(mut self) -> Self {
        self.entries.retain(|(_, value)| !value.is_absent());
        self
    }

    /// Inserts each default whose key is missing entirely.
    ///
    /// A key that is present is never overwritten, whatever its value.
    #[must_use]
    pub fn apply_defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        for (key, value) in defaults {
            let key = key.into();
            if !self.contains_key(&key) {
                self.entries.push((key, value.into()));
            }
        }
        self
    }

    /// Moves the supplied `sources` into a nested object stored at `dest`.
    ///
    /// Absent-valued sources stay at the top level. The destination is
    /// created even when no source was moved, so callers that must omit
    /// empty groups have to check for that themselves.
    #[must_use]
    pub fn group_as(mut self, dest: impl Into<String>, sources: &[&str]) -> Self {
        let mut group = Self::new();
        for source in sources {
            let supplied = self
                .get(source)
                .is_some_and(|value| !value.is_absent());
            if supplied && let Some(value) = self.remove(source) {
                group.entries.push(((*source).to_owned(), value));
            }
        }
        self.insert(dest, group);
        self
    }

    /// Converts to a JSON map, dropping absent values at every level.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.entries
            .into_iter()
            .filter_map(|(key, value)| value.into_json().map(|json| (key, json)))
            .collect()
    }

    /// Wire form of the parameters; `None` when nothing would be sent.
    #[must_use]
    pub fn into_wire(self) -> Option<Map<String, Value>> {
        let map = self.into_map();
        (!map.is_empty()).then_some(map)
    }

    /// Returns a supplied string argument.
    ///
    /// # Errors
    ///
    /// Fails when the key is absent or does not hold a string.
    pub fn require_str(&self, key: &str) -> Result<&str, CommandError> {
        match self.value(key) {
            Some(Value::String(text)) => Ok(text),
            Some(other) => Err(CommandError::invalid(key, format!("expected a string, got {other}"))),
            None => Err(CommandError::MissingArgument {
                argument: key.to_owned(),
            }),
        }
    }

    /// Returns a supplied integer argument.
    ///
    /// # Errors
    ///
    /// Fails when the key is absent or does not hold an integer.
    pub fn require_i64(&self, key: &str) -> Result<i64, CommandError> {
        let value = self.value(key).ok_or_else(|| CommandError::MissingArgument {
            argument: key.to_owned(),
        })?;
        value
            .as_i64()
            .ok_or_else(|| CommandError::invalid(key, format!("expected an integer, got {value}")))
    }
}

impl FromIterator<(String, Param)> for ParamObject {
    fn from_iter<T: IntoIterator<Item = (String, Param)>>(iter: T) -> Self {
        let mut object = Self::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}
