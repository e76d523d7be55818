use crate::quality::config::ConsistencyRule;
use crate::quality::error::{add_error_if_present, conclude, get_column, QualityError, QualityErrorGroup, QualityErrorKind};
use crate::table::Dataset;

/// Cross-column rules of the form "when A is x, B must not be y".
pub fn check_consistency(
    df: &Dataset,
    rules: &[ConsistencyRule],
    raise_errors: bool,
) -> Result<Vec<QualityError>, QualityErrorGroup> {
    conclude(consistency_errors(df, rules), raise_errors)
}

pub(crate) fn consistency_errors(df: &Dataset, rules: &[ConsistencyRule]) -> Vec<QualityError> {
    let mut errors = Vec::new();
    for rule in rules {
        add_error_if_present(&mut errors, check_rule(df, rule));
    }
    errors
}

fn check_rule(df: &Dataset, rule: &ConsistencyRule) -> Option<QualityError> {
    let when = get_column(df, &rule.when_column)?;
    let then = get_column(df, &rule.then_column)?;
    let violations = when
        .iter()
        .zip(then.iter())
        .filter(|(w, t)| !w.is_null() && !t.is_null())
        .filter(|(w, t)| w.to_string() == rule.equals && t.to_string() == rule.not_equals)
        .count();
    if violations == 0 {
        return None;
    }
    Some(QualityError::new(
        QualityErrorKind::Consistency,
        format!(
            "{} row(s) where '{}' is '{}' have '{}' set to '{}'",
            violations, rule.when_column, rule.equals, rule.then_column, rule.not_equals
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn rule() -> ConsistencyRule {
        ConsistencyRule {
            when_column: "uh_erutland".into(),
            equals: "true".into(),
            then_column: "utd_skoleland".into(),
            not_equals: "000".into(),
        }
    }

    #[test]
    fn test_violation_is_counted() {
        let df = Dataset::from_columns([
            ("uh_erutland", Column::from_bools([Some(true), Some(true), Some(false)])),
            ("utd_skoleland", Column::from_strs([Some("000"), Some("106"), Some("000")])),
        ])
        .unwrap();
        let errors = consistency_errors(&df, &[rule()]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("1 row(s)"));
    }

    #[test]
    fn test_vacuous_when_condition_never_holds() {
        let df = Dataset::from_columns([
            ("uh_erutland", Column::from_bools([Some(false), None])),
            ("utd_skoleland", Column::from_strs([Some("000"), Some("000")])),
        ])
        .unwrap();
        assert!(consistency_errors(&df, &[rule()]).is_empty());
    }

    #[test]
    fn test_absent_column_is_skipped() {
        let df = Dataset::from_columns([("uh_erutland", Column::from_bools([Some(true)]))]).unwrap();
        assert!(check_rule(&df, &rule()).is_none());
    }
}
