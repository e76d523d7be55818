//! Defines the error types for the table module.
use super::value::DataType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch { name: String, expected: usize, actual: usize },
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
    #[error("Value '{value}' does not belong in a {dtype} column")]
    TypeMismatch { value: String, dtype: DataType },
    #[error("Cannot cast '{value}' to {dtype}")]
    Cast { value: String, dtype: DataType },
    #[error("Unknown data type '{0}'")]
    UnknownDataType(String),
    #[error("Join key '{key}' matches more than one row of the right-hand table")]
    DuplicateJoinKey { key: String },
    #[error("Dataset '{0}' not found")]
    DatasetNotFound(String),
    #[error("Failed to read dataset '{name}': {message}")]
    Source { name: String, message: String },
}
