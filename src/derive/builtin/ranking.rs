use super::education::is_completed;
use super::required;
use crate::derive::error::ComputeError;
use crate::derive::rank::{pick_best_per_group, rank_text, RankKeyBuilder};
use crate::table::{row_key, Column, DataType, Dataset};

/// The highest education per person, one row per `snr`.
///
/// Records are ranked by completion (completed first), NUS level, end date
/// (latest first) and finally the full NUS code.
pub fn utd_hoeyeste_nus2000(df: &Dataset) -> Result<Dataset, ComputeError> {
    let snr = required(df, "snr")?;
    let nus2000 = required(df, "nus2000")?.cast(DataType::String)?;
    let fullfoert = required(df, "utd_fullfoertkode")?.cast(DataType::String)?;
    let slutt = required(df, "utd_aktivitet_slutt")?.cast(DataType::Datetime)?;
    let n = df.n_rows();

    let status = (0..n)
        .map(|row| Some(if is_completed(fullfoert.get(row)) { "2" } else { "1" }.to_string()))
        .collect();
    // Level 9 is "unspecified" and ranks below every known level.
    let level = (0..n)
        .map(|row| {
            nus2000
                .get(row)
                .as_str()
                .and_then(|code| code.chars().next())
                .filter(|c| *c != '9')
                .map(String::from)
        })
        .collect();
    let end_date = slutt.iter().map(rank_text).collect();
    let code = nus2000.iter().map(rank_text).collect();

    let keys = RankKeyBuilder::new(n)
        .component("status", status, 1, '1')
        .component("level", level, 1, '0')
        .component("utd_aktivitet_slutt", end_date, 8, '0')
        .component("nus2000", code, 6, '0')
        .build()?;

    let groups: Vec<Option<String>> = (0..n).map(|row| row_key(&[snr], row)).collect();
    let best = pick_best_per_group(&groups, &keys);

    Ok(Dataset::from_columns([
        ("snr", snr.take(&best)),
        ("utd_hoeyeste_nus2000", nus2000.take(&best)),
    ])?)
}
