//! Reconciliation of a freshly derived column with the column it replaces.

use crate::table::{Column, TableError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side wins where both the existing and the derived column hold a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Keep existing values, derive only into the gaps.
    #[default]
    Old,
    /// Keep derived values, fall back to existing ones where derivation gave nothing.
    New,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Old => "old",
            Priority::New => "new",
        })
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "old" => Ok(Priority::Old),
            "new" => Ok(Priority::New),
            other => Err(format!("priority must be 'old' or 'new', got '{}'", other)),
        }
    }
}

/// Outcome of a merge, with the numbers the resolver reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub column: Column,
    /// Share of rows that differ from the lower-priority source.
    pub changed_fraction: f64,
    pub fill_before: f64,
    pub fill_after: f64,
}

impl Reconciled {
    /// True when the merge left fewer filled rows than the existing column had.
    pub fn lost_values(&self) -> bool {
        self.fill_after < self.fill_before
    }
}

pub fn reconcile(existing: &Column, derived: &Column, priority: Priority) -> Result<Reconciled, TableError> {
    let (primary, secondary) = match priority {
        Priority::Old => (existing, derived),
        Priority::New => (derived, existing),
    };
    let column = primary.fill_null(secondary)?;
    let changed_fraction = if column.is_empty() {
        0.0
    } else {
        column.count_differences(secondary) as f64 / column.len() as f64
    };
    let fill_after = column.fill_rate();
    Ok(Reconciled { column, changed_fraction, fill_before: existing.fill_rate(), fill_after })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn existing() -> Column {
        Column::from_strs([Some("a"), None, Some("c"), None])
    }

    fn derived() -> Column {
        Column::from_strs([Some("x"), Some("y"), None, None])
    }

    #[test]
    fn test_old_priority_keeps_existing_values() {
        let r = reconcile(&existing(), &derived(), Priority::Old).unwrap();
        assert_eq!(r.column, Column::from_strs([Some("a"), Some("y"), Some("c"), None]));
        // Rows 0 and 2 differ from the derived column.
        assert_eq!(r.changed_fraction, 0.5);
        assert!(!r.lost_values());
    }

    #[test]
    fn test_new_priority_keeps_derived_values() {
        let r = reconcile(&existing(), &derived(), Priority::New).unwrap();
        assert_eq!(r.column, Column::from_strs([Some("x"), Some("y"), Some("c"), None]));
        // Rows 0 and 1 differ from the existing column.
        assert_eq!(r.changed_fraction, 0.5);
    }

    #[test]
    fn test_priorities_differ_only_where_both_are_filled_and_disagree() {
        let old = reconcile(&existing(), &derived(), Priority::Old).unwrap().column;
        let new = reconcile(&existing(), &derived(), Priority::New).unwrap().column;
        let differing: Vec<usize> = (0..old.len()).filter(|&i| old.get(i) != new.get(i)).collect();
        assert_eq!(differing, vec![0]);
    }

    #[test]
    fn test_fully_filled_column_is_unchanged_with_old_priority() {
        let full = Column::from_bools([Some(true), Some(false)]);
        let r = reconcile(&full, &Column::from_bools([Some(false), None]), Priority::Old).unwrap();
        assert_eq!(r.column, full);
    }

    #[test]
    fn test_lost_values_detected() {
        let r = Reconciled {
            column: Column::from_bools([None]),
            changed_fraction: 0.0,
            fill_before: 1.0,
            fill_after: 0.0,
        };
        assert!(r.lost_values());
    }

    #[rstest]
    #[case("old", Priority::Old)]
    #[case(" NEW ", Priority::New)]
    fn test_parse(#[case] input: &str, #[case] expected: Priority) {
        assert_eq!(input.parse::<Priority>().unwrap(), expected);
    }
}
