//! A codelist service backed by classifications held in memory, typically
//! loaded from the engine configuration or built in tests.

use super::service::{select_variant, CodelistError, CodelistService};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
}

impl CodeEntry {
    /// Whether the validity interval of the code overlaps `[from, to]`.
    fn overlaps(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
        let starts_in_time = match (self.valid_from, to) {
            (Some(start), Some(to)) => start <= to,
            _ => true,
        };
        let ends_in_time = match (self.valid_to, from) {
            (Some(end), Some(from)) => end >= from,
            _ => true,
        };
        starts_in_time && ends_in_time
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub description: String,
    pub mapping: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correspondence {
    pub source: u32,
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
    /// An empty target marks a source code without counterpart.
    pub mapping: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub codes: Vec<CodeEntry>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub correspondences: Vec<Correspondence>,
}

/// Classifications keyed by id. Keys are strings so the map can be written
/// as a TOML table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCodelists {
    classifications: BTreeMap<String, Classification>,
}

impl StaticCodelists {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, id: u32, classification: Classification) {
        self.classifications.insert(id.to_string(), classification);
    }

    /// Adds codes valid at all times.
    pub fn with_codes(mut self, id: u32, codes: &[(&str, &str)]) -> Self {
        let entry = self.classifications.entry(id.to_string()).or_default();
        entry.codes.extend(codes.iter().map(|(code, name)| CodeEntry {
            code: code.to_string(),
            name: name.to_string(),
            valid_from: None,
            valid_to: None,
        }));
        self
    }

    pub fn with_code_entry(mut self, id: u32, entry: CodeEntry) -> Self {
        self.classifications.entry(id.to_string()).or_default().codes.push(entry);
        self
    }

    pub fn with_variant(mut self, id: u32, description: &str, mapping: &[(&str, &str)]) -> Self {
        let variant = Variant {
            description: description.to_string(),
            mapping: mapping.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        };
        self.classifications.entry(id.to_string()).or_default().variants.push(variant);
        self
    }

    pub fn with_correspondence(mut self, source: u32, target: u32, mapping: &[(&str, &str)]) -> Self {
        let correspondence = Correspondence {
            source,
            valid_from: None,
            valid_to: None,
            mapping: mapping.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        };
        self.classifications.entry(target.to_string()).or_default().correspondences.push(correspondence);
        self
    }

    fn classification(&self, id: u32) -> Result<&Classification, CodelistError> {
        self.classifications.get(&id.to_string()).ok_or(CodelistError::UnknownCodelist(id))
    }
}

impl CodelistService for StaticCodelists {
    fn get_valid_codes(
        &self,
        id: u32,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<BTreeSet<String>, CodelistError> {
        Ok(self
            .classification(id)?
            .codes
            .iter()
            .filter(|c| c.overlaps(from, to))
            .map(|c| c.code.clone())
            .collect())
    }

    fn get_variant_mapping(&self, id: u32, search_term: &str) -> Result<HashMap<String, String>, CodelistError> {
        let classification = self.classification(id)?;
        let index = select_variant(
            id,
            classification.variants.iter().map(|v| v.description.as_str()),
            search_term,
        )?;
        Ok(classification.variants[index].mapping.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn get_correspondence_mapping(
        &self,
        source_id: u32,
        target_id: u32,
        as_of: NaiveDate,
    ) -> Result<HashMap<String, Option<String>>, CodelistError> {
        let correspondence = self
            .classification(target_id)?
            .correspondences
            .iter()
            .filter(|c| c.source == source_id)
            .find(|c| c.valid_from.map_or(true, |d| d <= as_of) && c.valid_to.map_or(true, |d| d >= as_of))
            .ok_or(CodelistError::NoCorrespondence { source_id, target_id, as_of })?;

        Ok(correspondence
            .mapping
            .iter()
            .map(|(k, v)| (k.clone(), Some(v.clone()).filter(|v| !v.is_empty())))
            .collect())
    }

    fn get_labels(&self, id: u32) -> Result<HashMap<String, String>, CodelistError> {
        Ok(self.classification(id)?.codes.iter().map(|c| (c.code.clone(), c.name.clone())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn codelists() -> StaticCodelists {
        StaticCodelists::new()
            .with_codes(36, &[("211111", "Grunnskole"), ("311111", "Videregående")])
            .with_code_entry(
                36,
                CodeEntry {
                    code: "999998".into(),
                    name: "Utgått".into(),
                    valid_from: None,
                    valid_to: Some(date(2010, 12, 31)),
                },
            )
            .with_variant(36, "Utdanningsnivå", &[("211111", "2"), ("311111", "3")])
            .with_correspondence(131, 36, &[("0301", "03"), ("9999", "")])
    }

    #[test]
    fn test_valid_codes_respect_date_range() {
        let all = codelists().get_valid_codes(36, None, None).unwrap();
        assert!(all.contains("999998"));
        let recent = codelists().get_valid_codes(36, Some(date(2020, 1, 1)), None).unwrap();
        assert!(!recent.contains("999998"));
        assert!(recent.contains("211111"));
    }

    #[test]
    fn test_unknown_codelist() {
        assert_eq!(
            codelists().get_valid_codes(1, None, None).unwrap_err(),
            CodelistError::UnknownCodelist(1)
        );
    }

    #[test]
    fn test_variant_mapping() {
        let mapping = codelists().get_variant_mapping(36, "utdanningsnivå").unwrap();
        assert_eq!(mapping.get("311111").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_correspondence_mapping_marks_missing_targets() {
        let mapping = codelists().get_correspondence_mapping(131, 36, date(2024, 1, 1)).unwrap();
        assert_eq!(mapping.get("0301"), Some(&Some("03".to_string())));
        assert_eq!(mapping.get("9999"), Some(&None));
    }

    #[test]
    fn test_labels() {
        let labels = codelists().get_labels(36).unwrap();
        assert_eq!(labels.get("211111").map(String::as_str), Some("Grunnskole"));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let codelists: StaticCodelists = toml::from_str(
            r#"
            [36]
            name = "NUS2000"
            codes = [{ code = "211111", name = "Grunnskole" }]
            "#,
        )
        .unwrap();
        assert_eq!(codelists.get_valid_codes(36, None, None).unwrap().len(), 1);
    }
}
