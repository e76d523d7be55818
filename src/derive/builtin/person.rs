use super::required;
use crate::derive::error::ComputeError;
use crate::table::{Column, DataType, Dataset};
use chrono::{Datelike, NaiveDate};

fn whole_years(birth: NaiveDate, at: NaiveDate) -> Option<i64> {
    let mut years = i64::from(at.year() - birth.year());
    if (at.month(), at.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    (years >= 0).then_some(years)
}

/// Age in whole years when the activity started.
pub fn pers_alder(df: &Dataset) -> Result<Column, ComputeError> {
    let birth = required(df, "pers_foedselsdato")?.cast(DataType::Datetime)?;
    let start = required(df, "utd_aktivitet_start")?.cast(DataType::Datetime)?;
    Ok(Column::from_ints((0..df.n_rows()).map(|row| {
        match (birth.get(row).as_date(), start.get(row).as_date()) {
            (Some(b), Some(s)) => whole_years(b, s),
            _ => None,
        }
    })))
}
