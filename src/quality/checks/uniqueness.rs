use crate::quality::config::UniqueWithinPerson;
use crate::quality::error::{add_error_if_present, conclude, get_column, QualityError, QualityErrorGroup, QualityErrorKind};
use crate::table::{Column, Dataset};
use std::collections::{BTreeSet, HashMap};

/// Person-level columns must hold a single value per person.
pub fn check_unique_within_person(
    df: &Dataset,
    config: &UniqueWithinPerson,
    raise_errors: bool,
) -> Result<Vec<QualityError>, QualityErrorGroup> {
    conclude(uniqueness_errors(df, config), raise_errors)
}

pub(crate) fn uniqueness_errors(df: &Dataset, config: &UniqueWithinPerson) -> Vec<QualityError> {
    let mut errors = Vec::new();
    for column in &config.columns {
        add_error_if_present(&mut errors, check_unique(df, config, column));
    }
    errors
}

/// The person a row belongs to: the primary key, or the secondary key when
/// the primary one is missing or the primary column is absent.
fn person_key(primary: Option<&Column>, secondary: Option<&Column>, row: usize) -> Option<String> {
    if let Some(value) = primary.map(|c| c.get(row)).filter(|v| !v.is_null()) {
        return Some(format!("p:{}", value));
    }
    let value = secondary?.get(row);
    (!value.is_null()).then(|| format!("s:{}", value))
}

fn check_unique(df: &Dataset, config: &UniqueWithinPerson, column: &str) -> Option<QualityError> {
    let values = get_column(df, column)?;
    let primary = get_column(df, &config.primary_key);
    let secondary = config.secondary_key.as_deref().and_then(|k| get_column(df, k));
    if primary.is_none() && secondary.is_none() {
        return None;
    }

    let mut seen: HashMap<String, BTreeSet<String>> = HashMap::new();
    for row in 0..df.n_rows() {
        let value = values.get(row);
        if value.is_null() {
            continue;
        }
        if let Some(person) = person_key(primary, secondary, row) {
            seen.entry(person).or_default().insert(value.to_string());
        }
    }

    let varying = seen.values().filter(|v| v.len() > 1).count();
    if varying == 0 {
        return None;
    }
    Some(QualityError::new(
        QualityErrorKind::NotUniqueWithinPerson,
        format!("Column '{}' takes more than one value for {} person(s)", column, varying),
    ))
}
