//! Rule parameters for the quality checks, deserialized from the `[quality]`
//! section of the engine configuration.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Column -> allowed string widths.
    pub widths: BTreeMap<String, Vec<usize>>,
    pub formats: Vec<CodeFormat>,
    /// Column -> regular expression every non-null value must match in full.
    pub patterns: BTreeMap<String, String>,
    pub consistency: Vec<ConsistencyRule>,
    pub unique_within_person: UniqueWithinPerson,
    pub completeness: Completeness,
    /// Restricts the codelist check to codes valid within this range.
    pub codelist_from: Option<NaiveDate>,
    pub codelist_to: Option<NaiveDate>,
}

/// A code column with a fixed length and a restricted first character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFormat {
    pub column: String,
    pub length: usize,
    /// Allowed first characters; empty allows any.
    #[serde(default)]
    pub leading: String,
}

/// `when column == value then other != forbidden`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyRule {
    pub when_column: String,
    pub equals: String,
    pub then_column: String,
    pub not_equals: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniqueWithinPerson {
    pub primary_key: String,
    /// Used for rows where the primary key is missing.
    pub secondary_key: Option<String>,
    /// Columns that must not vary within one person.
    pub columns: Vec<String>,
}

impl Default for UniqueWithinPerson {
    fn default() -> Self {
        Self { primary_key: "snr".to_string(), secondary_key: Some("fnr".to_string()), columns: Vec::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Completeness {
    /// When set, only the rows of the latest period are measured.
    pub period_column: Option<String>,
    /// Column -> minimum percentage (0-100) of non-missing values.
    pub thresholds: BTreeMap<String, f64>,
}
