//! Layered configuration loading.
//!
//! Every layer produces a TOML table that is merged over the tables of the
//! layers before it. Nested tables merge key by key; any other value is
//! replaced outright.

use std::ffi::OsString;
use std::path::PathBuf;
use std::{env, fs, io};

use anyhow::{Context as _, Result};
use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use toml::map::Entry;
use toml::{Table, Value};

/// Builds a configuration value out of a stack of layers.
#[must_use]
pub struct Builder {
    table: Table,
    error: Option<anyhow::Error>,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            table: Table::new(),
            error: None,
        }
    }

    /// Merges another layer over the current state.
    ///
    /// The first failing layer is reported by [`Builder::build`] and every
    /// later layer is skipped.
    pub fn add_layer<L: Layer>(mut self, layer: L) -> Self {
        if self.error.is_none() {
            match layer.load() {
                Ok(Some(table)) => merge_tables(&mut self.table, table),
                Ok(None) => {},
                Err(why) => self.error = Some(why),
            }
        }

        self
    }

    pub fn build<T: DeserializeOwned>(self) -> Result<T> {
        if let Some(why) = self.error {
            return Err(why);
        }

        T::deserialize(self.table).context("cannot deserialize config")
    }
}

/// A source of configuration values.
pub trait Layer {
    /// Loads the table for this layer. [`None`] means the layer is empty.
    fn load(&self) -> Result<Option<Table>>;
}

/// Loads a TOML file from disk.
#[must_use]
pub struct File {
    path: PathBuf,
    required: bool,
}

impl File {
    /// Required by default.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }

    /// An optional file that does not exist is treated as empty.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

impl Layer for File {
    fn load(&self) -> Result<Option<Table>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => parse_table(&text)
                .with_context(|| format!("failed to load config {:?}", self.path))
                .map(Some),
            Err(why) if !self.required && why.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(why) => {
                Err(why).with_context(|| format!("cannot read required config {:?}", self.path))
            },
        }
    }
}

/// Parses TOML from a string, usually one embedded in the binary.
#[must_use]
pub struct TomlText<'a>(&'a str);

impl<'a> TomlText<'a> {
    pub fn new(text: &'a str) -> Self {
        Self(text)
    }
}

impl Layer for TomlText<'_> {
    fn load(&self) -> Result<Option<Table>> {
        parse_table(self.0).context("embedded config is invalid").map(Some)
    }
}

/// Reads environment variables.
///
/// Names are lowercased and split on `__` (two underscores) into nested keys,
/// so `BOT__MONGODB_URI` sets `bot.mongodb_uri`. Values are always strings;
/// values that aren't valid UTF-8 are converted lossily so they still show
/// up in deserialization errors.
#[must_use]
pub struct Env {
    vars: Option<Vec<(OsString, OsString)>>,
}

impl Env {
    /// Uses the variables of the current process.
    pub fn new() -> Self {
        Self { vars: None }
    }

    /// Uses a fixed set of variables instead of the process environment.
    #[cfg_attr(not(test), expect(dead_code))]
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let vars = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { vars: Some(vars) }
    }

    fn insert_var(table: &mut Table, key: OsString, value: OsString) {
        // keys that aren't utf-8 can't name any config field
        let Ok(mut key) = key.into_string() else {
            return;
        };

        key.make_ascii_lowercase();
        let value = value
            .into_string()
            .unwrap_or_else(|v| v.to_string_lossy().into_owned());

        let path: SmallVec<[&str; 8]> = key.split("__").collect();
        insert_at(table, &path, Value::String(value));
    }
}

impl Layer for Env {
    fn load(&self) -> Result<Option<Table>> {
        let mut table = Table::new();
        match &self.vars {
            Some(vars) => {
                for (key, value) in vars {
                    Self::insert_var(&mut table, key.clone(), value.clone());
                }
            },
            None => {
                for (key, value) in env::vars_os() {
                    Self::insert_var(&mut table, key, value);
                }
            },
        }

        Ok(Some(table))
    }
}

fn parse_table(text: &str) -> Result<Table> {
    toml::from_str(text).context("config toml is invalid")
}

fn merge_tables(target: &mut Table, source: Table) {
    for (key, value) in source {
        match target.entry(key) {
            Entry::Vacant(entry) => _ = entry.insert(value),
            Entry::Occupied(mut entry) => match (entry.get_mut(), value) {
                (Value::Table(a), Value::Table(b)) => merge_tables(a, b),
                (a, b) => *a = b,
            },
        }
    }
}

fn insert_at(table: &mut Table, path: &[&str], value: Value) {
    let [first, rest @ ..] = path else {
        return;
    };

    if rest.is_empty() {
        table.insert((*first).to_owned(), value);
        return;
    }

    let entry = table
        .entry((*first).to_owned())
        .or_insert_with(|| Value::Table(Table::new()));

    if !entry.is_table() {
        *entry = Value::Table(Table::new());
    }

    if let Value::Table(inner) = entry {
        insert_at(inner, rest, value);
    }
}
