//! Defines the error types for the quality module, and the helpers every
//! check uses to either raise or log what it found.
use crate::codelist::CodelistError;
use crate::table::{Column, Dataset};
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// The rule family a quality error comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityErrorKind {
    Width,
    Format,
    Pattern,
    Consistency,
    NotUniqueWithinPerson,
    Completeness,
    /// A column named in the configuration is absent from the data.
    ColumnNotFound,
    DuplicatedColumn,
    InvalidCode,
    Outdated,
    Dtype,
}

/// One data-quality violation. Describes the data, never the setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityError {
    pub kind: QualityErrorKind,
    pub message: String,
}

impl QualityError {
    pub fn new(kind: QualityErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl fmt::Display for QualityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for QualityError {}

/// Every violation found in one pass, raised together.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} quality error(s):\n{}", .errors.len(), render(.errors))]
pub struct QualityErrorGroup {
    pub errors: Vec<QualityError>,
}

fn render(errors: &[QualityError]) -> String {
    errors.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n")
}

/// A check could not run because its configuration is wrong. Never pooled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    #[error(transparent)]
    Codelist(#[from] CodelistError),
    #[error("Invalid pattern for column '{column}': {source}")]
    Pattern {
        column: String,
        #[source]
        source: regex::Error,
    },
}

/// Failure of a check or of the suite as a whole.
#[derive(Error, Debug)]
pub enum SuiteError {
    #[error(transparent)]
    Quality(#[from] QualityErrorGroup),
    #[error("Check '{check}' could not run: {source}")]
    Check {
        check: String,
        #[source]
        source: CheckError,
    },
}

pub fn raise_errors_if_any(errors: Vec<QualityError>) -> Result<(), QualityErrorGroup> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(QualityErrorGroup { errors })
    }
}

pub fn warn_errors_if_any(errors: &[QualityError]) {
    for error in errors {
        warn!(kind = ?error.kind, "{}", error.message);
    }
}

pub fn add_error_if_present(errors: &mut Vec<QualityError>, error: Option<QualityError>) {
    if let Some(error) = error {
        errors.push(error);
    }
}

/// The one place a check decides between raising and logging.
pub fn conclude(errors: Vec<QualityError>, raise_errors: bool) -> Result<Vec<QualityError>, QualityErrorGroup> {
    if raise_errors {
        raise_errors_if_any(errors)?;
        Ok(Vec::new())
    } else {
        warn_errors_if_any(&errors);
        Ok(errors)
    }
}

/// Renders offending values the same way in every message: `["a", "b"]`.
pub(crate) fn render_values<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    format!("{:?}", values.into_iter().collect::<Vec<_>>())
}

/// Column accessor for subchecks: absent columns are `None`, never an error.
pub fn get_column<'a>(df: &'a Dataset, name: &str) -> Option<&'a Column> {
    df.column(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{capture_logs, warnings};

    fn errors() -> Vec<QualityError> {
        vec![
            QualityError::new(QualityErrorKind::Width, "first"),
            QualityError::new(QualityErrorKind::InvalidCode, "second"),
        ]
    }

    #[test]
    fn test_raise_carries_every_error() {
        let group = raise_errors_if_any(errors()).unwrap_err();
        assert_eq!(group.errors, errors());
        let text = group.to_string();
        assert!(text.starts_with("2 quality error(s)"));
        assert!(text.contains("first") && text.contains("second"));
        assert!(raise_errors_if_any(Vec::new()).is_ok());
    }

    #[test]
    fn test_warn_logs_in_order_and_returns() {
        let (_, events) = capture_logs(|| warn_errors_if_any(&errors()));
        let messages: Vec<&str> = warnings(&events).iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_conclude_modes() {
        assert_eq!(conclude(errors(), false).unwrap(), errors());
        assert_eq!(conclude(errors(), true).unwrap_err().errors.len(), 2);
        assert_eq!(conclude(Vec::new(), true).unwrap(), Vec::new());
    }

    #[test]
    fn test_add_error_if_present() {
        let mut list = Vec::new();
        add_error_if_present(&mut list, None);
        add_error_if_present(&mut list, Some(QualityError::new(QualityErrorKind::Format, "x")));
        assert_eq!(list.len(), 1);
    }
}
