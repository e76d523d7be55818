//! The check library. Each submodule exposes public `check_*` functions that
//! conclude on their own, and pure finders the suite pools.
pub mod codelist;
pub mod columns;
pub mod completeness;
pub mod consistency;
pub mod format;
pub mod uniqueness;
pub mod widths;

use super::config::QualityConfig;
use super::error::{CheckError, QualityError};
use crate::codelist::CodelistService;
use crate::metadata::MetadataRegistry;
use crate::table::Dataset;

pub use codelist::{check_codelists, CodeRange};
pub use columns::{check_dtypes, check_duplicated_columns, check_outdated_variables};
pub use completeness::check_completeness;
pub use consistency::check_consistency;
pub use format::{check_code_formats, check_patterns};
pub use uniqueness::check_unique_within_person;
pub use widths::check_widths;

/// Everything a check may consult besides the dataset.
#[derive(Clone, Copy)]
pub struct QualityContext<'a> {
    pub metadata: &'a MetadataRegistry,
    pub codelists: &'a dyn CodelistService,
    pub config: &'a QualityConfig,
}

/// A check the suite can run. Implementations neither log nor raise; they
/// only report what they find.
pub trait QualityCheck: Send + Sync {
    fn name(&self) -> &'static str;
    fn find(&self, df: &Dataset, ctx: &QualityContext<'_>) -> Result<Vec<QualityError>, CheckError>;
}

type FindFn = fn(&Dataset, &QualityContext<'_>) -> Result<Vec<QualityError>, CheckError>;

struct Check {
    name: &'static str,
    find: FindFn,
}

impl QualityCheck for Check {
    fn name(&self) -> &'static str {
        self.name
    }

    fn find(&self, df: &Dataset, ctx: &QualityContext<'_>) -> Result<Vec<QualityError>, CheckError> {
        (self.find)(df, ctx)
    }
}

/// The checks `run_quality_suite` runs.
pub fn registered_checks() -> Vec<Box<dyn QualityCheck>> {
    let table: [(&'static str, FindFn); 10] = [
        ("widths", |df, ctx| Ok(widths::width_errors(df, &ctx.config.widths))),
        ("code_formats", |df, ctx| Ok(format::format_errors(df, &ctx.config.formats))),
        ("patterns", |df, ctx| format::pattern_errors(df, &ctx.config.patterns)),
        ("consistency", |df, ctx| Ok(consistency::consistency_errors(df, &ctx.config.consistency))),
        ("unique_within_person", |df, ctx| {
            Ok(uniqueness::uniqueness_errors(df, &ctx.config.unique_within_person))
        }),
        ("completeness", |df, ctx| Ok(completeness::completeness_errors(df, &ctx.config.completeness))),
        ("duplicated_columns", |df, _| Ok(columns::duplicated_column_errors(df))),
        ("outdated_variables", |df, ctx| Ok(columns::outdated_errors(df, ctx.metadata))),
        ("dtypes", |df, ctx| Ok(columns::dtype_errors(df, ctx.metadata))),
        ("codelists", |df, ctx| {
            let range = CodeRange { from: ctx.config.codelist_from, to: ctx.config.codelist_to };
            Ok(codelist::codelist_errors(df, ctx.metadata, ctx.codelists, range)?)
        }),
    ];
    table
        .into_iter()
        .map(|(name, find)| Box::new(Check { name, find }) as Box<dyn QualityCheck>)
        .collect()
}
