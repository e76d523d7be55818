//! A typed column of nullable values.

use super::error::TableError;
use super::value::{DataType, Value};
use chrono::NaiveDate;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    dtype: DataType,
    values: Vec<Value>,
}

impl Column {
    /// Builds a column, rejecting any non-null value of another type.
    pub fn new(dtype: DataType, values: Vec<Value>) -> Result<Self, TableError> {
        if let Some(bad) = values.iter().find(|v| !v.is_null() && v.dtype() != Some(dtype)) {
            return Err(TableError::TypeMismatch { value: bad.to_string(), dtype });
        }
        Ok(Self { dtype, values })
    }

    pub fn nulls(dtype: DataType, len: usize) -> Self {
        Self { dtype, values: vec![Value::Null; len] }
    }

    pub fn from_strs<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let values = values.into_iter().map(|v| v.map_or(Value::Null, |s| Value::Str(s.into()))).collect();
        Self { dtype: DataType::String, values }
    }

    pub fn from_bools<I: IntoIterator<Item = Option<bool>>>(values: I) -> Self {
        Self { dtype: DataType::Boolean, values: values.into_iter().map(Value::from).collect() }
    }

    pub fn from_ints<I: IntoIterator<Item = Option<i64>>>(values: I) -> Self {
        Self { dtype: DataType::Integer, values: values.into_iter().map(Value::from).collect() }
    }

    pub fn from_floats<I: IntoIterator<Item = Option<f64>>>(values: I) -> Self {
        Self { dtype: DataType::Float, values: values.into_iter().map(Value::from).collect() }
    }

    pub fn from_dates<I: IntoIterator<Item = Option<NaiveDate>>>(values: I) -> Self {
        Self { dtype: DataType::Datetime, values: values.into_iter().map(Value::from).collect() }
    }

    pub fn dtype(&self) -> DataType { self.dtype }
    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
    pub fn values(&self) -> &[Value] { &self.values }
    pub fn iter(&self) -> std::slice::Iter<'_, Value> { self.values.iter() }

    #[inline(always)]
    pub fn get(&self, row: usize) -> &Value {
        self.values.get(row).unwrap_or(&Value::Null)
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Fraction of non-missing entries in `[0, 1]`. An empty column has fill rate 0.
    pub fn fill_rate(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        (self.len() - self.null_count()) as f64 / self.len() as f64
    }

    /// Keeps every non-null value of `self` and fills its gaps from `other`.
    /// The result has the type of `self`; fill values are cast to it.
    pub fn fill_null(&self, other: &Column) -> Result<Column, TableError> {
        if other.len() != self.len() {
            return Err(TableError::LengthMismatch {
                name: "<fill>".into(),
                expected: self.len(),
                actual: other.len(),
            });
        }
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(mine, theirs)| if mine.is_null() { theirs.cast(self.dtype) } else { Ok(mine.clone()) })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Column { dtype: self.dtype, values })
    }

    pub fn cast(&self, dtype: DataType) -> Result<Column, TableError> {
        if dtype == self.dtype {
            return Ok(self.clone());
        }
        let values = self.values.iter().map(|v| v.cast(dtype)).collect::<Result<Vec<_>, _>>()?;
        Ok(Column { dtype, values })
    }

    pub fn take(&self, rows: &[usize]) -> Column {
        Column { dtype: self.dtype, values: rows.iter().map(|&r| self.get(r).clone()).collect() }
    }

    pub fn filter(&self, mask: &[bool]) -> Column {
        let values = self
            .values
            .iter()
            .zip(mask)
            .filter(|&(_, &keep)| keep)
            .map(|(v, _)| v.clone())
            .collect();
        Column { dtype: self.dtype, values }
    }

    /// The distinct non-null values rendered as text, sorted.
    pub fn distinct_strings(&self) -> BTreeSet<String> {
        self.values.iter().filter(|v| !v.is_null()).map(|v| v.to_string()).collect()
    }

    /// Number of rows whose value differs from `other`.
    pub fn count_differences(&self, other: &Column) -> usize {
        self.values.iter().zip(&other.values).filter(|(a, b)| a != b).count()
    }
}
