//! Named dataset sources: where the cache gets a table the first time it is asked for.

use super::column::Column;
use super::dataset::Dataset;
use super::error::TableError;
use super::value::{DataType, Value};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Materialises a named table as an in-memory dataset.
pub trait DatasetSource: Send + Sync {
    fn load(&self, name: &str) -> Result<Dataset, TableError>;
    fn exists(&self, name: &str) -> bool;
}

/// A source backed by datasets registered up front.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, Dataset>,
}

impl MemorySource {
    pub fn new() -> Self { Self::default() }

    pub fn with_table(mut self, name: impl Into<String>, table: Dataset) -> Self {
        self.insert(name, table);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, table: Dataset) {
        self.tables.insert(name.into(), table);
    }
}

impl DatasetSource for MemorySource {
    fn load(&self, name: &str) -> Result<Dataset, TableError> {
        self.tables.get(name).cloned().ok_or_else(|| TableError::DatasetNotFound(name.to_string()))
    }

    fn exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

/// Reads `<root>/<name>.json`, a column-oriented document:
///
/// ```json
/// { "columns": [ { "name": "snr", "dtype": "STRING", "values": ["a", null] } ] }
/// ```
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    root: PathBuf,
}

#[derive(Deserialize)]
struct JsonTable {
    columns: Vec<JsonColumn>,
}

#[derive(Deserialize)]
struct JsonColumn {
    name: String,
    dtype: DataType,
    values: Vec<serde_json::Value>,
}

impl JsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", name))
    }
}

impl DatasetSource for JsonDirSource {
    fn load(&self, name: &str) -> Result<Dataset, TableError> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(TableError::DatasetNotFound(name.to_string()));
        }
        let source_err = |message: String| TableError::Source { name: name.to_string(), message };
        let text = std::fs::read_to_string(&path).map_err(|e| source_err(e.to_string()))?;
        let table: JsonTable = serde_json::from_str(&text).map_err(|e| source_err(e.to_string()))?;

        let mut ds = Dataset::new();
        for col in table.columns {
            let values = col
                .values
                .iter()
                .map(|v| json_to_value(v).cast(col.dtype))
                .collect::<Result<Vec<_>, _>>()?;
            ds.push_column(col.name, Column::new(col.dtype, values)?)?;
        }
        Ok(ds)
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }
}

fn json_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        serde_json::Value::String(s) => Value::Str(s.clone()),
        other => Value::Str(other.to_string()),
    }
}
