//! Scalar cell values and the closed set of column data types.

use super::error::TableError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The data type of a column. This is a closed enumeration: every variable
/// the register knows about is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::String => "STRING",
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Boolean => "BOOLEAN",
            DataType::Datetime => "DATETIME",
        };
        f.write_str(s)
    }
}

impl FromStr for DataType {
    type Err = TableError;

    /// Accepts the canonical names in any case, plus the aliases found in
    /// older metadata files (`str`, `int`, `bool`, `date`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "string[pyarrow]" => Ok(DataType::String),
            "integer" | "int" | "int64" | "int64[pyarrow]" => Ok(DataType::Integer),
            "float" | "float64" | "double" => Ok(DataType::Float),
            "boolean" | "bool" | "bool[pyarrow]" => Ok(DataType::Boolean),
            "datetime" | "date" | "datetime64" => Ok(DataType::Datetime),
            other => Err(TableError::UnknownDataType(other.to_string())),
        }
    }
}

/// A single cell. `Null` marks a missing entry in any column type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The data type this value belongs to, `None` for `Null`.
    pub fn dtype(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Str(_) => Some(DataType::String),
            Value::Int(_) => Some(DataType::Integer),
            Value::Float(_) => Some(DataType::Float),
            Value::Bool(_) => Some(DataType::Boolean),
            Value::Date(_) => Some(DataType::Datetime),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Converts the value to `dtype`. `Null` stays `Null`; an empty string
    /// becomes `Null` for every non-string target.
    pub fn cast(&self, dtype: DataType) -> Result<Value, TableError> {
        if self.dtype() == Some(dtype) || self.is_null() {
            return Ok(self.clone());
        }
        let fail = || TableError::Cast {
            value: self.to_string(),
            dtype,
        };

        if let Value::Str(s) = self {
            if s.trim().is_empty() && dtype != DataType::String {
                return Ok(Value::Null);
            }
        }

        let cast = match (dtype, self) {
            (DataType::String, v) => Value::Str(v.to_string()),

            (DataType::Integer, Value::Float(f)) if f.fract() == 0.0 => Value::Int(*f as i64),
            (DataType::Integer, Value::Bool(b)) => Value::Int(i64::from(*b)),
            (DataType::Integer, Value::Str(s)) => Value::Int(s.trim().parse().map_err(|_| fail())?),

            (DataType::Float, Value::Int(i)) => Value::Float(*i as f64),
            (DataType::Float, Value::Bool(b)) => Value::Float(if *b { 1.0 } else { 0.0 }),
            (DataType::Float, Value::Str(s)) => Value::Float(s.trim().parse().map_err(|_| fail())?),

            (DataType::Boolean, Value::Int(0)) => Value::Bool(false),
            (DataType::Boolean, Value::Int(1)) => Value::Bool(true),
            (DataType::Boolean, Value::Str(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Value::Bool(true),
                "false" | "0" => Value::Bool(false),
                _ => return Err(fail()),
            },

            (DataType::Datetime, Value::Str(s)) => Value::Date(parse_date(s).ok_or_else(fail)?),

            _ => return Err(fail()),
        };
        Ok(cast)
    }
}

/// Parses `YYYY-MM-DD` or the compact `YYYYMMDD` form used in register extracts.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("STRING", DataType::String)]
    #[case("str", DataType::String)]
    #[case("Int64", DataType::Integer)]
    #[case("bool[pyarrow]", DataType::Boolean)]
    #[case("datetime", DataType::Datetime)]
    #[case(" float ", DataType::Float)]
    fn test_dtype_parsing(#[case] input: &str, #[case] expected: DataType) {
        assert_eq!(input.parse::<DataType>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_dtype_is_rejected() {
        assert!(matches!("decimal".parse::<DataType>(), Err(TableError::UnknownDataType(_))));
    }

    #[rstest]
    #[case(Value::from("42"), DataType::Integer, Value::Int(42))]
    #[case(Value::from(""), DataType::Integer, Value::Null)]
    #[case(Value::Int(1), DataType::Boolean, Value::Bool(true))]
    #[case(Value::from("False"), DataType::Boolean, Value::Bool(false))]
    #[case(Value::Int(7), DataType::String, Value::from("7"))]
    #[case(Value::from("20200815"), DataType::Datetime, Value::Date(NaiveDate::from_ymd_opt(2020, 8, 15).unwrap()))]
    #[case(Value::Null, DataType::Float, Value::Null)]
    fn test_cast(#[case] input: Value, #[case] dtype: DataType, #[case] expected: Value) {
        assert_eq!(input.cast(dtype).unwrap(), expected);
    }

    #[test]
    fn test_cast_failure_reports_value() {
        let err = Value::from("abc").cast(DataType::Integer).unwrap_err();
        assert_eq!(
            err,
            TableError::Cast { value: "abc".into(), dtype: DataType::Integer }
        );
    }
}
