use crate::quality::config::Completeness;
use crate::quality::error::{add_error_if_present, conclude, get_column, QualityError, QualityErrorGroup, QualityErrorKind};
use crate::table::{Dataset, Value};
use std::cmp::Ordering;

/// Compares the share of non-missing values per configured column with its
/// lower bound. A configured column missing from the data is reported as
/// such, never as 0% filled.
pub fn check_completeness(
    df: &Dataset,
    config: &Completeness,
    raise_errors: bool,
) -> Result<Vec<QualityError>, QualityErrorGroup> {
    conclude(completeness_errors(df, config), raise_errors)
}

pub(crate) fn completeness_errors(df: &Dataset, config: &Completeness) -> Vec<QualityError> {
    let slice = last_period(df, config.period_column.as_deref());
    let mut errors = Vec::new();
    for (column, threshold) in &config.thresholds {
        add_error_if_present(&mut errors, check_threshold(&slice, column, *threshold));
    }
    errors
}

fn compare_periods(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// The rows of the latest period, or all rows without a period column.
fn last_period(df: &Dataset, period_column: Option<&str>) -> Dataset {
    let Some(periods) = period_column.and_then(|p| get_column(df, p)) else {
        return df.clone();
    };
    let Some(last) = periods.iter().filter(|v| !v.is_null()).max_by(|a, b| compare_periods(a, b)) else {
        return df.clone();
    };
    let rows: Vec<usize> = (0..df.n_rows()).filter(|&row| periods.get(row) == last).collect();
    df.take(&rows)
}

fn check_threshold(df: &Dataset, column: &str, threshold: f64) -> Option<QualityError> {
    let Some(values) = get_column(df, column) else {
        return Some(QualityError::new(
            QualityErrorKind::ColumnNotFound,
            format!("Column '{}' has a completeness threshold but is absent from the data", column),
        ));
    };
    if values.is_empty() {
        return None;
    }
    let percent = values.fill_rate() * 100.0;
    (percent < threshold).then(|| {
        QualityError::new(
            QualityErrorKind::Completeness,
            format!("Column '{}' is {:.2}% filled, below the required {:.2}%", column, percent, threshold),
        )
    })
}
