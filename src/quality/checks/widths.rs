use crate::quality::error::{
    add_error_if_present, conclude, get_column, render_values, QualityError, QualityErrorGroup, QualityErrorKind,
};
use crate::table::Dataset;
use std::collections::{BTreeMap, BTreeSet};

/// Reports each column whose values have a width outside the allowed ones,
/// listing the distinct offending values once.
pub fn check_widths(
    df: &Dataset,
    widths: &BTreeMap<String, Vec<usize>>,
    raise_errors: bool,
) -> Result<Vec<QualityError>, QualityErrorGroup> {
    conclude(width_errors(df, widths), raise_errors)
}

pub(crate) fn width_errors(df: &Dataset, widths: &BTreeMap<String, Vec<usize>>) -> Vec<QualityError> {
    let mut errors = Vec::new();
    for (column, allowed) in widths {
        add_error_if_present(&mut errors, check_width(df, column, allowed));
    }
    errors
}

fn check_width(df: &Dataset, column: &str, allowed: &[usize]) -> Option<QualityError> {
    let values = get_column(df, column)?;
    let offenders: BTreeSet<String> = values
        .distinct_strings()
        .into_iter()
        .filter(|v| !allowed.contains(&v.chars().count()))
        .collect();
    if offenders.is_empty() {
        return None;
    }
    Some(QualityError::new(
        QualityErrorKind::Width,
        format!("Column '{}' has values with widths other than {:?}: {}", column, allowed, render_values(&offenders)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn widths(column: &str, allowed: &[usize]) -> BTreeMap<String, Vec<usize>> {
        BTreeMap::from([(column.to_string(), allowed.to_vec())])
    }

    #[test]
    fn test_single_error_names_offender() {
        let df = Dataset::from_columns([("code", Column::from_strs([Some("aa"), Some("bb"), Some("x")]))]).unwrap();
        let errors = width_errors(&df, &widths("code", &[2]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("\"x\""));
        assert!(!errors[0].message.contains("\"aa\""));
    }

    #[test]
    fn test_offenders_listed_once_and_nulls_ignored() {
        let df =
            Dataset::from_columns([("code", Column::from_strs([Some("x"), Some("x"), None, Some("abc")]))]).unwrap();
        let errors = width_errors(&df, &widths("code", &[2]));
        assert!(errors[0].message.ends_with(": [\"abc\", \"x\"]"));
    }

    #[test]
    fn test_absent_column_is_not_a_violation() {
        let df = Dataset::from_columns([("other", Column::from_strs([Some("x")]))]).unwrap();
        assert!(check_width(&df, "code", &[2]).is_none());
        assert_eq!(check_widths(&df, &widths("code", &[2]), true).unwrap(), Vec::new());
    }

    #[test]
    fn test_raise_mode_returns_group() {
        let df = Dataset::from_columns([("code", Column::from_strs([Some("x")]))]).unwrap();
        assert_eq!(check_widths(&df, &widths("code", &[2]), true).unwrap_err().errors.len(), 1);
    }
}
