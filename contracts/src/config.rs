use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::errors::ConfigError;

/// Where a configuration tree comes from. The accessor only ever asks a
/// source to load once.
pub trait ConfigSource: Send + Sync {
    /// A human readable name for the source, used in log messages
    fn describe(&self) -> String;

    fn load(&self) -> Result<Table, ConfigError>;
}

/// A TOML configuration file on disk.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Table, ConfigError> {
        let path = self.describe();
        let text = read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        parse_table(&path, &text)
    }
}

/// Parse configuration text; `origin` is only used for error messages.
pub fn parse_table(origin: &str, text: &str) -> Result<Table, ConfigError> {
    toml::from_str::<Table>(text).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })
}

/// A loaded configuration tree, addressed with dotted keys such as
/// `contract.MCD_VOW.address`.
///
/// Each key segment is matched exactly if possible, and otherwise without
/// regard to ASCII case, so `contract.mcd_vow.abi` still finds a
/// `[contract.MCD_VOW]` table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigTree {
    root: Table,
}

impl ConfigTree {
    pub fn new(root: Table) -> Self {
        ConfigTree { root }
    }

    pub fn root(&self) -> &Table {
        &self.root
    }

    /// The raw value at `key`, if there is one
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let mut value = get_segment(&self.root, segments.next()?)?;
        for segment in segments {
            value = get_segment(value.as_table()?, segment)?;
        }
        Some(value)
    }

    /// The string at `key` with environment references like `${VAR}`
    /// expanded. Numbers and booleans are rendered as text. A missing or
    /// empty value is an error.
    pub fn get_string(&self, key: &str) -> Result<String, ConfigError> {
        let raw = self.get_raw_string(key)?;
        let value = shellexpand::env(&raw)
            .map_err(|e| ConfigError::Expand {
                key: key.to_string(),
                reason: e.to_string(),
            })?
            .into_owned();
        if value.is_empty() {
            return Err(ConfigError::MissingKey(key.to_string()));
        }
        Ok(value)
    }

    /// Like `get_string`, but the value is returned exactly as written.
    /// Used for values such as ABI JSON where `$` is ordinary text.
    pub fn get_raw_string(&self, key: &str) -> Result<String, ConfigError> {
        let value = match self.lookup(key) {
            None => return Err(ConfigError::MissingKey(key.to_string())),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Integer(i)) => i.to_string(),
            Some(Value::Float(f)) => f.to_string(),
            Some(Value::Boolean(b)) => b.to_string(),
            Some(_) => {
                return Err(ConfigError::WrongType {
                    key: key.to_string(),
                    expected: "a string",
                })
            }
        };
        if value.is_empty() {
            return Err(ConfigError::MissingKey(key.to_string()));
        }
        Ok(value)
    }

    /// The list of strings at `key`. A single string is split on whitespace
    /// and a missing key gives an empty list.
    pub fn get_string_list(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        let wrong_type = || ConfigError::WrongType {
            key: key.to_string(),
            expected: "a list of strings",
        };
        match self.lookup(key) {
            None => Ok(vec![]),
            Some(Value::String(s)) => Ok(s.split_whitespace().map(str::to_string).collect()),
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| value.as_str().map(str::to_string).ok_or_else(wrong_type))
                .collect(),
            Some(_) => Err(wrong_type()),
        }
    }

    /// The integer at `key`, or `None` if the key is not set. Strings that
    /// hold an integer are accepted too.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>, ConfigError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Value::Integer(i)) => Ok(Some(*i)),
            Some(Value::String(s)) => {
                s.trim()
                    .parse()
                    .map(Some)
                    .map_err(|e| ConfigError::InvalidValue {
                        key: key.to_string(),
                        reason: format!("`{}` is not an integer: {}", s, e),
                    })
            }
            Some(_) => Err(ConfigError::WrongType {
                key: key.to_string(),
                expected: "an integer",
            }),
        }
    }

    /// Names of the direct child tables of `key`, sorted
    pub fn child_tables(&self, key: &str) -> Vec<(&str, &Table)> {
        let table = match self.lookup(key).and_then(Value::as_table) {
            Some(table) => table,
            None => return vec![],
        };
        let mut children: Vec<_> = table
            .iter()
            .filter_map(|(name, value)| value.as_table().map(|t| (name.as_str(), t)))
            .collect();
        children.sort_by(|a, b| a.0.cmp(b.0));
        children
    }

    /// Generate a JSON representation of the tree.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }
}

pub(crate) fn get_segment<'a>(table: &'a Table, segment: &str) -> Option<&'a Value> {
    table.get(segment).or_else(|| {
        table
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(segment))
            .map(|(_, value)| value)
    })
}
