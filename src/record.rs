//! Loading CV data files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A CV record: free-form fields keyed by name.
///
/// No schema is enforced. Values may be strings, numbers, nested mappings or
/// lists of mappings (jobs, degrees, ...); templates decide what to read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

/// Data file formats understood by [`Record::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Yaml,
    Json,
}

impl DataFormat {
    /// Pick a format from the file extension; anything that is not `.json`
    /// is read as YAML, which is a superset of JSON anyway.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => DataFormat::Json,
            _ => DataFormat::Yaml,
        }
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse a data file.
    ///
    /// # Errors
    ///
    /// - [`Error::InputNotFound`] if the file does not exist
    /// - [`Error::InputParse`] if it is malformed or its root is not a mapping
    /// - [`Error::Io`] for any other read failure
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::InputNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;

        let record = Self::parse(&text, DataFormat::from_path(path))
            .map_err(|message| Error::InputParse {
                path: path.to_path_buf(),
                message,
            })?;

        tracing::debug!(path = %path.display(), fields = record.len(), "loaded CV record");
        Ok(record)
    }

    /// Parse a record from text in the given format.
    ///
    /// An empty document yields an empty record.
    pub fn parse_str(text: &str, format: DataFormat) -> Result<Self> {
        Self::parse(text, format).map_err(|message| Error::InputParse {
            path: PathBuf::from("<memory>"),
            message,
        })
    }

    fn parse(text: &str, format: DataFormat) -> std::result::Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = match format {
            DataFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string())?,
            DataFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string())?,
        };

        match value {
            Value::Object(fields) => Ok(Self { fields }),
            Value::Null => Ok(Self::default()),
            other => Err(format!(
                "expected a mapping at the top level, found {}",
                kind_of(&other)
            )),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
