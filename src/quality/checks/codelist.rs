use crate::codelist::{CodelistError, CodelistService};
use crate::metadata::{MetadataRegistry, VariableSpec};
use crate::quality::error::{conclude, render_values, QualityError, QualityErrorKind, SuiteError};
use crate::table::{Column, DataType, Dataset};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Validity window for the codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Reports values outside each column's classification. Boolean columns,
/// exempt columns (codelist 0) and variant-mapped columns are skipped. An
/// unknown codelist is a configuration error and stops the check.
pub fn check_codelists(
    df: &Dataset,
    metadata: &MetadataRegistry,
    codelists: &dyn CodelistService,
    range: CodeRange,
    raise_errors: bool,
) -> Result<Vec<QualityError>, SuiteError> {
    let errors = codelist_errors(df, metadata, codelists, range)
        .map_err(|source| SuiteError::Check { check: "codelists".to_string(), source: source.into() })?;
    Ok(conclude(errors, raise_errors)?)
}

pub(crate) fn codelist_errors(
    df: &Dataset,
    metadata: &MetadataRegistry,
    codelists: &dyn CodelistService,
    range: CodeRange,
) -> Result<Vec<QualityError>, CodelistError> {
    let mut errors = Vec::new();
    for (name, column) in df.columns() {
        let Some(spec) = metadata.get_spec(name) else { continue };
        if let Some(error) = check_codes(name, column, spec, codelists, range)? {
            errors.push(error);
        }
    }
    Ok(errors)
}

fn check_codes(
    name: &str,
    column: &Column,
    spec: &VariableSpec,
    codelists: &dyn CodelistService,
    range: CodeRange,
) -> Result<Option<QualityError>, CodelistError> {
    let Some(codelist) = spec.codelist_ref.as_ref() else { return Ok(None) };
    if codelist.is_exempt()
        || codelist.variant.is_some()
        || spec.dtype == DataType::Boolean
        || column.dtype() == DataType::Boolean
    {
        return Ok(None);
    }

    let mut valid = codelists.get_valid_codes(codelist.id, range.from, range.to)?;
    valid.extend(spec.codelist_extras.iter().cloned());
    let invalid: BTreeSet<String> = column.distinct_strings().difference(&valid).cloned().collect();
    if invalid.is_empty() {
        return Ok(None);
    }
    Ok(Some(QualityError::new(
        QualityErrorKind::InvalidCode,
        format!("Column '{}' has codes outside codelist {}: {}", name, codelist.id, render_values(&invalid)),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codelist::StaticCodelists;
    use crate::metadata::CodelistRef;

    fn codelists() -> StaticCodelists {
        StaticCodelists::new().with_codes(36, &[("211111", "Grunnskole"), ("311111", "VGS")])
    }

    fn errors_for(spec: VariableSpec, column: Column) -> Result<Vec<QualityError>, CodelistError> {
        let name = spec.name.clone();
        let metadata = MetadataRegistry::new([spec]).unwrap();
        let df = Dataset::from_columns([(name, column)]).unwrap();
        codelist_errors(&df, &metadata, &codelists(), CodeRange::default())
    }

    #[test]
    fn test_extra_codes_are_accepted() {
        let spec = VariableSpec::new("nus2000", DataType::String)
            .codelist(CodelistRef::new(36))
            .codelist_extras(&["ZZ"]);
        let errors = errors_for(spec, Column::from_strs([Some("211111"), Some("ZZ"), None])).unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_invalid_codes_listed() {
        let spec = VariableSpec::new("nus2000", DataType::String).codelist(CodelistRef::new(36));
        let errors = errors_for(spec, Column::from_strs([Some("999999"), Some("ZZ"), Some("ZZ")])).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("[\"999999\", \"ZZ\"]"));
    }

    #[test]
    fn test_exempt_and_boolean_columns_skipped() {
        let exempt = VariableSpec::new("fritekst", DataType::String).codelist(CodelistRef::new(0));
        assert!(errors_for(exempt, Column::from_strs([Some("anything")])).unwrap().is_empty());

        let boolean = VariableSpec::new("uh_erutland", DataType::Boolean).codelist(CodelistRef::new(36));
        assert!(errors_for(boolean, Column::from_bools([Some(true)])).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_codelist_is_fatal() {
        let spec = VariableSpec::new("nus2000", DataType::String).codelist(CodelistRef::new(404));
        assert_eq!(
            errors_for(spec, Column::from_strs([Some("1")])).unwrap_err(),
            CodelistError::UnknownCodelist(404)
        );
    }
}
