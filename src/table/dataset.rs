//! The in-memory tabular dataset passed through a pipeline.
//!
//! A `Dataset` is an ordered list of named columns sharing one row count.
//! Columns are reference-counted, so deriving a new version of a dataset with
//! one column added or replaced does not copy the others. Column names keep
//! the case they were given but are looked up case-insensitively.

use super::column::Column;
use super::error::TableError;
use super::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

const KEY_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<(String, Arc<Column>)>,
    n_rows: usize,
}

impl Dataset {
    pub fn new() -> Self { Self::default() }

    /// Builds a dataset from `(name, column)` pairs in order. Repeated names
    /// are kept as separate columns.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut ds = Self::new();
        for (name, column) in columns {
            ds.push_column(name, column)?;
        }
        Ok(ds)
    }

    pub fn n_rows(&self) -> usize { self.n_rows }
    pub fn n_columns(&self) -> usize { self.columns.len() }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// First column called `name`.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| self.columns[i].1.as_ref())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> + '_ {
        self.columns.iter().map(|(name, col)| (name.as_str(), col.as_ref()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    fn check_length(&self, name: &str, column: &Column) -> Result<(), TableError> {
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(TableError::LengthMismatch {
                name: name.to_string(),
                expected: self.n_rows,
                actual: column.len(),
            });
        }
        Ok(())
    }

    /// Appends a column without looking for an existing one of the same name.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), TableError> {
        let name = name.into();
        self.check_length(&name, &column)?;
        self.n_rows = column.len();
        self.columns.push((name, Arc::new(column)));
        Ok(())
    }

    /// Replaces the first column called `name`, or appends it.
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), TableError> {
        let name = name.into();
        self.check_length(&name, &column)?;
        self.n_rows = column.len();
        match self.position(&name) {
            Some(i) => self.columns[i].1 = Arc::new(column),
            None => self.columns.push((name, Arc::new(column))),
        }
        Ok(())
    }

    /// Returns a new version of the dataset with `name` added or overwritten.
    pub fn with_column(&self, name: impl Into<String>, column: Column) -> Result<Dataset, TableError> {
        let mut next = self.clone();
        next.set_column(name, column)?;
        Ok(next)
    }

    pub fn select(&self, names: &[&str]) -> Result<Dataset, TableError> {
        let mut columns = Vec::with_capacity(names.len());
        for &name in names {
            let i = self.position(name).ok_or_else(|| TableError::ColumnNotFound(name.to_string()))?;
            columns.push(self.columns[i].clone());
        }
        Ok(Dataset { columns, n_rows: self.n_rows })
    }

    pub fn take(&self, rows: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), Arc::new(col.take(rows))))
            .collect();
        Dataset { columns, n_rows: rows.len() }
    }

    pub fn filter(&self, mask: &[bool]) -> Result<Dataset, TableError> {
        if mask.len() != self.n_rows {
            return Err(TableError::LengthMismatch {
                name: "<mask>".into(),
                expected: self.n_rows,
                actual: mask.len(),
            });
        }
        let columns: Vec<_> = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), Arc::new(col.filter(mask))))
            .collect();
        let n_rows = mask.iter().filter(|&&keep| keep).count();
        Ok(Dataset { columns, n_rows })
    }

    /// Keeps the first occurrence of every distinct row.
    pub fn distinct(&self) -> Dataset {
        let all: Vec<&Column> = self.columns.iter().map(|(_, c)| c.as_ref()).collect();
        let mut seen = std::collections::HashSet::new();
        let rows: Vec<usize> = (0..self.n_rows)
            .filter(|&row| seen.insert(render_row(&all, row)))
            .collect();
        self.take(&rows)
    }

    /// Looks up `column` from `right` for every row of `self`, matching on
    /// `keys`. Each key may occur at most once in `right` (many-to-one);
    /// rows with a null key or no match get a null.
    pub fn lookup(&self, right: &Dataset, keys: &[&str], column: &str) -> Result<Column, TableError> {
        let left_keys = self.key_columns(keys)?;
        let right_keys = right.key_columns(keys)?;
        let values = right.column(column).ok_or_else(|| TableError::ColumnNotFound(column.to_string()))?;

        let mut index: HashMap<String, usize> = HashMap::with_capacity(right.n_rows);
        for row in 0..right.n_rows {
            if let Some(key) = row_key(&right_keys, row) {
                if index.insert(key.clone(), row).is_some() {
                    return Err(TableError::DuplicateJoinKey { key: key.replace(KEY_SEPARATOR, "|") });
                }
            }
        }

        let rows: Vec<Option<usize>> = (0..self.n_rows)
            .map(|row| row_key(&left_keys, row).and_then(|k| index.get(&k).copied()))
            .collect();
        let joined = rows
            .into_iter()
            .map(|r| r.map_or(Value::Null, |r| values.get(r).clone()))
            .collect();
        Column::new(values.dtype(), joined)
    }

    pub(crate) fn key_columns<'a>(&'a self, keys: &[&str]) -> Result<Vec<&'a Column>, TableError> {
        keys.iter()
            .map(|&k| self.column(k).ok_or_else(|| TableError::ColumnNotFound(k.to_string())))
            .collect()
    }
}

/// Joins the values of `columns` at `row` into one key, `None` if any is null.
pub fn row_key(columns: &[&Column], row: usize) -> Option<String> {
    let mut key = String::new();
    for (i, col) in columns.iter().enumerate() {
        let value = col.get(row);
        if value.is_null() {
            return None;
        }
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(&value.to_string());
    }
    Some(key)
}

fn render_row(columns: &[&Column], row: usize) -> String {
    columns
        .iter()
        .map(|c| format!("{:?}", c.get(row)))
        .collect::<Vec<_>>()
        .join("\u{1f}")
}
