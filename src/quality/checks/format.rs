//! Shape of individual code values: fixed length with an allowed leading
//! character, or a full regular expression.
use crate::quality::config::CodeFormat;
use crate::quality::error::{
    add_error_if_present, conclude, get_column, render_values, CheckError, QualityError, QualityErrorGroup, QualityErrorKind,
    SuiteError,
};
use crate::table::Dataset;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

pub fn check_code_formats(
    df: &Dataset,
    formats: &[CodeFormat],
    raise_errors: bool,
) -> Result<Vec<QualityError>, QualityErrorGroup> {
    conclude(format_errors(df, formats), raise_errors)
}

pub(crate) fn format_errors(df: &Dataset, formats: &[CodeFormat]) -> Vec<QualityError> {
    let mut errors = Vec::new();
    for format in formats {
        add_error_if_present(&mut errors, check_code_format(df, format));
    }
    errors
}

fn check_code_format(df: &Dataset, format: &CodeFormat) -> Option<QualityError> {
    let values = get_column(df, &format.column)?;
    let offenders: BTreeSet<String> = values
        .distinct_strings()
        .into_iter()
        .filter(|code| {
            let leading_ok = format.leading.is_empty()
                || code.chars().next().map_or(false, |c| format.leading.contains(c));
            code.chars().count() != format.length || !leading_ok
        })
        .collect();
    if offenders.is_empty() {
        return None;
    }
    Some(QualityError::new(
        QualityErrorKind::Format,
        format!(
            "Column '{}' has codes that are not {} characters starting with one of '{}': {}",
            format.column,
            format.length,
            format.leading,
            render_values(&offenders)
        ),
    ))
}

/// Every non-null value must match its column's pattern in full. A pattern
/// that does not compile stops the check.
pub fn check_patterns(
    df: &Dataset,
    patterns: &BTreeMap<String, String>,
    raise_errors: bool,
) -> Result<Vec<QualityError>, SuiteError> {
    let errors = pattern_errors(df, patterns)
        .map_err(|source| SuiteError::Check { check: "patterns".to_string(), source })?;
    Ok(conclude(errors, raise_errors)?)
}

pub(crate) fn pattern_errors(
    df: &Dataset,
    patterns: &BTreeMap<String, String>,
) -> Result<Vec<QualityError>, CheckError> {
    let mut errors = Vec::new();
    for (column, pattern) in patterns {
        let regex = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|source| CheckError::Pattern { column: column.clone(), source })?;
        add_error_if_present(&mut errors, check_pattern(df, column, &regex));
    }
    Ok(errors)
}

fn check_pattern(df: &Dataset, column: &str, regex: &Regex) -> Option<QualityError> {
    let values = get_column(df, column)?;
    let offenders: BTreeSet<String> = values.distinct_strings().into_iter().filter(|v| !regex.is_match(v)).collect();
    if offenders.is_empty() {
        return None;
    }
    Some(QualityError::new(
        QualityErrorKind::Pattern,
        format!("Column '{}' has values not matching /{}/: {}", column, regex.as_str(), render_values(&offenders)),
    ))
}
