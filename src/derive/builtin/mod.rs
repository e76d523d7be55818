//! Built-in base functions, keyed by the variable they produce. A built-in is
//! installed only when the metadata declares the variable and its
//! prerequisites; the prerequisites always come from the metadata.
pub mod education;
pub mod person;
pub mod ranking;

use super::derivation::{PureFn, ReduceFn};
use super::error::ComputeError;
use crate::table::{Column, Dataset, TableError};

pub enum Builtin {
    Pure(PureFn),
    /// Reduces the caller's data to one row per join key.
    Reduce(ReduceFn),
}

pub fn catalog() -> Vec<(&'static str, Builtin)> {
    vec![
        ("uh_erutland", Builtin::Pure(education::uh_erutland)),
        ("gr_ergrunnskole_fullfort", Builtin::Pure(education::gr_ergrunnskole_fullfort)),
        ("pers_alder", Builtin::Pure(person::pers_alder)),
        ("utd_hoeyeste_nus2000", Builtin::Reduce(ranking::utd_hoeyeste_nus2000)),
    ]
}

pub(crate) fn required<'a>(df: &'a Dataset, name: &str) -> Result<&'a Column, ComputeError> {
    df.column(name).ok_or_else(|| TableError::ColumnNotFound(name.to_string()).into())
}
