//! Schema-level checks: repeated column names, retired variables and column
//! types that disagree with the metadata.
use crate::metadata::MetadataRegistry;
use crate::quality::error::{conclude, QualityError, QualityErrorGroup, QualityErrorKind};
use crate::table::{DataType, Dataset};
use std::collections::BTreeMap;

pub fn check_duplicated_columns(df: &Dataset, raise_errors: bool) -> Result<Vec<QualityError>, QualityErrorGroup> {
    conclude(duplicated_column_errors(df), raise_errors)
}

pub(crate) fn duplicated_column_errors(df: &Dataset) -> Vec<QualityError> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for name in df.column_names() {
        *counts.entry(name.to_lowercase()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, n)| {
            QualityError::new(QualityErrorKind::DuplicatedColumn, format!("Column '{}' occurs {} times", name, n))
        })
        .collect()
}

pub fn check_outdated_variables(
    df: &Dataset,
    metadata: &MetadataRegistry,
    raise_errors: bool,
) -> Result<Vec<QualityError>, QualityErrorGroup> {
    conclude(outdated_errors(df, metadata), raise_errors)
}

pub(crate) fn outdated_errors(df: &Dataset, metadata: &MetadataRegistry) -> Vec<QualityError> {
    df.column_names()
        .filter_map(|name| {
            let comment = metadata.get_spec(name)?.outdated_comment.as_ref()?;
            Some(QualityError::new(
                QualityErrorKind::Outdated,
                format!("Column '{}' is outdated: {}", name, comment),
            ))
        })
        .collect()
}

/// Columns whose type differs from the declared one. Untyped all-null
/// columns and columns unknown to the metadata are ignored.
pub fn check_dtypes(
    df: &Dataset,
    metadata: &MetadataRegistry,
    raise_errors: bool,
) -> Result<Vec<QualityError>, QualityErrorGroup> {
    conclude(dtype_errors(df, metadata), raise_errors)
}

pub(crate) fn dtype_errors(df: &Dataset, metadata: &MetadataRegistry) -> Vec<QualityError> {
    df.columns()
        .filter_map(|(name, column)| {
            let spec = metadata.get_spec(name)?;
            let untyped = column.null_count() == column.len() && column.dtype() == DataType::String;
            (spec.dtype != column.dtype() && !untyped).then(|| {
                QualityError::new(
                    QualityErrorKind::Dtype,
                    format!("Column '{}' is {} but should be {}", name, column.dtype(), spec.dtype),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::VariableSpec;
    use crate::table::Column;

    fn metadata() -> MetadataRegistry {
        MetadataRegistry::new([
            VariableSpec::new("nus2000", DataType::String),
            VariableSpec::new("pers_alder", DataType::Integer),
            VariableSpec::new("utd_gammel", DataType::String).outdated("replaced by nus2000"),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicated_columns() {
        let df = Dataset::from_columns([
            ("nus2000", Column::from_strs([Some("1")])),
            ("snr", Column::from_strs([Some("a")])),
            ("NUS2000", Column::from_strs([Some("2")])),
        ])
        .unwrap();
        let errors = duplicated_column_errors(&df);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'nus2000' occurs 2 times"));
    }

    #[test]
    fn test_outdated_reports_comment() {
        let df = Dataset::from_columns([
            ("utd_gammel", Column::from_strs([Some("1")])),
            ("nus2000", Column::from_strs([Some("1")])),
        ])
        .unwrap();
        let errors = outdated_errors(&df, &metadata());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("replaced by nus2000"));
    }

    #[test]
    fn test_dtype_mismatch() {
        let df = Dataset::from_columns([
            ("pers_alder", Column::from_strs([Some("16")])),
            ("nus2000", Column::from_strs([Some("211111")])),
            ("ukjent", Column::from_ints([Some(1)])),
        ])
        .unwrap();
        let errors = dtype_errors(&df, &metadata());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("pers_alder"));
    }
}
