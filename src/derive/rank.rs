//! Composite rank keys and "best record per group" selection.
//!
//! A rank key concatenates fixed-width, sentinel-padded numeric components so
//! that plain string ordering on the key reproduces the intended multi-key
//! ordering. This only holds when every key has the same width, so the keys
//! are validated before anyone sorts on them.

use crate::table::Value;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RankError {
    #[error("Component '{component}' value '{value}' does not fit in {width} characters")]
    TooWide { component: String, value: String, width: usize },
    #[error("Rank keys have unequal lengths ({shortest} to {longest})")]
    UnequalLength { shortest: usize, longest: usize },
    #[error("Rank key '{0}' starts with a zero")]
    LeadingZero(String),
    #[error("Rank key '{0}' is not numeric")]
    NonNumeric(String),
    #[error("Component '{component}' has {actual} values, expected {expected}")]
    RowCount { component: String, expected: usize, actual: usize },
}

/// Text of a value as used inside a rank key: dates compact as `YYYYMMDD`.
pub fn rank_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Date(d) => Some(d.format("%Y%m%d").to_string()),
        other => Some(other.to_string()),
    }
}

struct Component {
    label: String,
    values: Vec<Option<String>>,
    width: usize,
    missing: char,
}

pub struct RankKeyBuilder {
    n_rows: usize,
    components: Vec<Component>,
}

impl RankKeyBuilder {
    pub fn new(n_rows: usize) -> Self {
        Self { n_rows, components: Vec::new() }
    }

    /// Adds a component. Values shorter than `width` are left-padded with
    /// zeros; missing values become `missing` repeated `width` times.
    pub fn component(mut self, label: &str, values: Vec<Option<String>>, width: usize, missing: char) -> Self {
        self.components.push(Component { label: label.to_string(), values, width, missing });
        self
    }

    pub fn build(&self) -> Result<Vec<String>, RankError> {
        for c in &self.components {
            if c.values.len() != self.n_rows {
                return Err(RankError::RowCount {
                    component: c.label.clone(),
                    expected: self.n_rows,
                    actual: c.values.len(),
                });
            }
        }

        let mut keys = Vec::with_capacity(self.n_rows);
        for row in 0..self.n_rows {
            let mut key = String::new();
            for c in &self.components {
                match &c.values[row] {
                    Some(v) if v.chars().count() > c.width => {
                        return Err(RankError::TooWide {
                            component: c.label.clone(),
                            value: v.clone(),
                            width: c.width,
                        })
                    }
                    Some(v) => key.push_str(&format!("{:0>width$}", v, width = c.width)),
                    None => key.extend(std::iter::repeat(c.missing).take(c.width)),
                }
            }
            keys.push(key);
        }
        validate_rank_keys(&keys)?;
        Ok(keys)
    }
}

/// All keys equally long, no leading zero, digits only.
pub fn validate_rank_keys(keys: &[String]) -> Result<(), RankError> {
    let shortest = keys.iter().map(String::len).min().unwrap_or(0);
    let longest = keys.iter().map(String::len).max().unwrap_or(0);
    if shortest != longest {
        return Err(RankError::UnequalLength { shortest, longest });
    }
    for key in keys {
        if !key.chars().all(|c| c.is_ascii_digit()) {
            return Err(RankError::NonNumeric(key.clone()));
        }
        if key.starts_with('0') {
            return Err(RankError::LeadingZero(key.clone()));
        }
    }
    Ok(())
}

/// Index of the highest-ranked row of every group, in row order. Rows with
/// no group are skipped. Equal keys keep their original order, so callers
/// must make the trailing components a total order within each group.
pub fn pick_best_per_group(groups: &[Option<String>], keys: &[String]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..groups.len().min(keys.len())).collect();
    order.sort_by(|&a, &b| keys[b].cmp(&keys[a]));

    let mut seen = HashSet::new();
    let mut best: Vec<usize> = order
        .into_iter()
        .filter(|&row| groups[row].as_ref().map_or(false, |g| seen.insert(g.clone())))
        .collect();
    best.sort_unstable();
    best
}
