use super::required;
use crate::derive::error::ComputeError;
use crate::table::{Column, DataType, Dataset, Value};

/// Country code of Norway in the school-country classification.
const NORWAY: &str = "000";
/// `utd_fullfoertkode` value for a completed education.
const COMPLETED: &str = "8";

/// Whether a `utd_fullfoertkode` value marks the education as completed.
pub(super) fn is_completed(fullfoertkode: &Value) -> bool {
    fullfoertkode.as_str().map_or(false, |f| f.trim() == COMPLETED)
}

/// Whether the education took place abroad. Unknown when no school country is recorded.
pub fn uh_erutland(df: &Dataset) -> Result<Column, ComputeError> {
    let skoleland = required(df, "utd_skoleland")?.cast(DataType::String)?;
    Ok(Column::from_bools(skoleland.iter().map(|v| match v {
        Value::Str(code) => Some(code.trim() != NORWAY),
        _ => None,
    })))
}

/// Completed primary school in Norway: a level-2 NUS code, not abroad, and
/// marked as completed.
pub fn gr_ergrunnskole_fullfort(df: &Dataset) -> Result<Column, ComputeError> {
    let nus2000 = required(df, "nus2000")?.cast(DataType::String)?;
    let erutland = required(df, "uh_erutland")?.cast(DataType::Boolean)?;
    let fullfoert = required(df, "utd_fullfoertkode")?.cast(DataType::String)?;

    let values = (0..df.n_rows()).map(|row| {
        let level_two = nus2000.get(row).as_str().map_or(false, |n| n.starts_with('2'));
        let abroad = erutland.get(row).as_bool().unwrap_or(false);
        let completed = is_completed(fullfoert.get(row));
        Some(level_two && !abroad && completed)
    });
    Ok(Column::from_bools(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gr_ergrunnskole_fullfort_only_level_two() {
        let df = Dataset::from_columns([
            ("nus2000", Column::from_strs([Some("2000"), Some("3000")])),
            ("uh_erutland", Column::from_bools([Some(false), Some(false)])),
            ("utd_fullfoertkode", Column::from_strs([Some("8"), Some("8")])),
        ])
        .unwrap();
        assert_eq!(
            gr_ergrunnskole_fullfort(&df).unwrap(),
            Column::from_bools([Some(true), Some(false)])
        );
    }

    #[test]
    fn test_gr_ergrunnskole_fullfort_abroad_or_incomplete() {
        let df = Dataset::from_columns([
            ("nus2000", Column::from_strs([Some("211111"), Some("211111"), None])),
            ("uh_erutland", Column::from_bools([Some(true), Some(false), Some(false)])),
            ("utd_fullfoertkode", Column::from_strs([Some("8"), Some("4"), Some("8")])),
        ])
        .unwrap();
        assert_eq!(
            gr_ergrunnskole_fullfort(&df).unwrap(),
            Column::from_bools([Some(false), Some(false), Some(false)])
        );
    }

    #[test]
    fn test_uh_erutland() {
        let df = Dataset::from_columns([("utd_skoleland", Column::from_strs([Some("000"), Some("106"), None]))]).unwrap();
        assert_eq!(uh_erutland(&df).unwrap(), Column::from_bools([Some(false), Some(true), None]));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        assert!(uh_erutland(&Dataset::new()).is_err());
    }
}
