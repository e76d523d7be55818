//! Runs every registered check, pools what they find and decides once.
use super::checks::{registered_checks, QualityCheck, QualityContext};
use super::error::{conclude, QualityError, SuiteError};
use crate::table::Dataset;
use rayon::prelude::*;
use tracing::info;

/// Runs the registered checks. With `raise_errors` the pooled violations are
/// returned as one [`SuiteError::Quality`]; otherwise they are logged as
/// warnings and returned.
pub fn run_quality_suite(
    df: &Dataset,
    ctx: &QualityContext<'_>,
    raise_errors: bool,
) -> Result<Vec<QualityError>, SuiteError> {
    run_checks(df, ctx, &registered_checks(), raise_errors)
}

pub fn run_checks(
    df: &Dataset,
    ctx: &QualityContext<'_>,
    checks: &[Box<dyn QualityCheck>],
    raise_errors: bool,
) -> Result<Vec<QualityError>, SuiteError> {
    // Checks are independent, so they may run in any order; collecting keeps
    // the pooled list in registration order.
    let found: Vec<Result<Vec<QualityError>, SuiteError>> = checks
        .par_iter()
        .map(|check| {
            check
                .find(df, ctx)
                .map_err(|source| SuiteError::Check { check: check.name().to_string(), source })
        })
        .collect();

    let mut pooled = Vec::new();
    for errors in found {
        pooled.extend(errors?);
    }
    info!(checks = checks.len(), errors = pooled.len(), rows = df.n_rows(), "quality suite finished");
    Ok(conclude(pooled, raise_errors)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codelist::StaticCodelists;
    use crate::metadata::{CodelistRef, MetadataRegistry, VariableSpec};
    use crate::quality::config::QualityConfig;
    use crate::quality::error::QualityErrorKind;
    use crate::table::{Column, DataType};
    use crate::testing::{capture_logs, warnings};
    use std::collections::BTreeMap;

    struct Fixture {
        metadata: MetadataRegistry,
        codelists: StaticCodelists,
        config: QualityConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let metadata = MetadataRegistry::new([
                VariableSpec::new("nus2000", DataType::String)
                    .codelist(CodelistRef::new(36))
                    .codelist_extras(&["ZZ"]),
                VariableSpec::new("utd_gammel", DataType::String).outdated("no longer collected"),
            ])
            .unwrap();
            let config = QualityConfig {
                widths: BTreeMap::from([("nus2000".to_string(), vec![6])]),
                ..QualityConfig::default()
            };
            Self { metadata, codelists: StaticCodelists::new().with_codes(36, &[("211111", "Grunnskole")]), config }
        }

        fn ctx(&self) -> QualityContext<'_> {
            QualityContext { metadata: &self.metadata, codelists: &self.codelists, config: &self.config }
        }
    }

    fn dirty() -> Dataset {
        Dataset::from_columns([
            ("nus2000", Column::from_strs([Some("211111"), Some("ZZ"), Some("x")])),
            ("utd_gammel", Column::from_strs([Some("1"), None, None])),
            ("utd_gammel", Column::from_strs([Some("1"), None, None])),
        ])
        .unwrap()
    }

    #[test]
    fn test_warn_mode_never_fails_and_pools_everything() {
        let fixture = Fixture::new();
        let errors = run_quality_suite(&dirty(), &fixture.ctx(), false).unwrap();
        let kinds: Vec<QualityErrorKind> = errors.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&QualityErrorKind::Width));
        assert!(kinds.contains(&QualityErrorKind::DuplicatedColumn));
        assert!(kinds.contains(&QualityErrorKind::Outdated));
        assert!(kinds.contains(&QualityErrorKind::InvalidCode));
    }

    #[test]
    fn test_raise_mode_raises_once_with_every_error() {
        let fixture = Fixture::new();
        let pooled = run_quality_suite(&dirty(), &fixture.ctx(), false).unwrap();
        match run_quality_suite(&dirty(), &fixture.ctx(), true) {
            Err(SuiteError::Quality(group)) => assert_eq!(group.errors, pooled),
            other => panic!("expected a pooled failure, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_data_passes_in_raise_mode() {
        let fixture = Fixture::new();
        let df = Dataset::from_columns([("nus2000", Column::from_strs([Some("211111"), None]))]).unwrap();
        assert_eq!(run_quality_suite(&df, &fixture.ctx(), true).unwrap(), Vec::new());
    }

    #[test]
    fn test_warn_mode_logs_each_error() {
        let fixture = Fixture::new();
        let (result, events) = capture_logs(|| run_quality_suite(&dirty(), &fixture.ctx(), false));
        assert_eq!(warnings(&events).len(), result.unwrap().len());
    }

    #[test]
    fn test_subchecks_tolerate_absent_columns() {
        let mut fixture = Fixture::new();
        fixture.config = toml::from_str(
            r#"
            patterns = { utd_skolekom = "[0-9]{4}" }
            [widths]
            nus2000 = [6]
            [[formats]]
            column = "utd_skolekom"
            length = 4
            [[consistency]]
            when_column = "a"
            equals = "1"
            then_column = "b"
            not_equals = "2"
            [unique_within_person]
            columns = ["pers_kjoenn"]
            "#,
        )
        .unwrap();
        let df = Dataset::from_columns([("unrelated", Column::from_strs([Some("x")]))]).unwrap();
        assert_eq!(run_quality_suite(&df, &fixture.ctx(), true).unwrap(), Vec::new());
    }

    #[test]
    fn test_unknown_codelist_stops_the_suite() {
        let mut fixture = Fixture::new();
        fixture.metadata =
            MetadataRegistry::new([VariableSpec::new("nus2000", DataType::String).codelist(CodelistRef::new(7))])
                .unwrap();
        let df = Dataset::from_columns([("nus2000", Column::from_strs([Some("211111")]))]).unwrap();
        assert!(matches!(
            run_quality_suite(&df, &fixture.ctx(), false),
            Err(SuiteError::Check { ref check, .. }) if check == "codelists"
        ));
    }
}
