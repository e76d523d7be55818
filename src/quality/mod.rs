//! Rule-based data-quality checks with pooled raise-or-warn reporting.
pub mod checks;
pub mod config;
pub mod error;
pub mod suite;

pub use checks::{
    check_code_formats, check_codelists, check_completeness, check_consistency, check_dtypes,
    check_duplicated_columns, check_outdated_variables, check_patterns, check_unique_within_person, check_widths,
    registered_checks, CodeRange, QualityCheck, QualityContext,
};
pub use config::{CodeFormat, Completeness, ConsistencyRule, QualityConfig, UniqueWithinPerson};
pub use error::{
    add_error_if_present, conclude, get_column, raise_errors_if_any, warn_errors_if_any, CheckError, QualityError,
    QualityErrorGroup, QualityErrorKind, SuiteError,
};
pub use suite::{run_checks, run_quality_suite};
