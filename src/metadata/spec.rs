//! The variable specification: everything the engine knows about one named column.

use crate::table::{DataType, TableError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Prerequisite lists are almost always short.
pub type NameList = SmallVec<[String; 4]>;

/// Reference to an external classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodelistRef {
    /// Classification id. `0` marks a variable exempt from codelist validation.
    pub id: u32,
    /// Search term selecting a variant of the classification.
    pub variant: Option<String>,
    /// Source classification of a correspondence table into `id`.
    pub correspondence_from: Option<u32>,
    /// Date the correspondence is looked up at.
    pub as_of: Option<NaiveDate>,
}

impl CodelistRef {
    pub fn new(id: u32) -> Self {
        Self { id, variant: None, correspondence_from: None, as_of: None }
    }

    pub fn is_exempt(&self) -> bool {
        self.id == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    /// Lower-case, unique.
    pub name: String,
    pub derived_from: NameList,
    pub dtype: DataType,
    pub renamed_from: Vec<String>,
    pub codelist_ref: Option<CodelistRef>,
    /// Literal codes accepted in addition to the classification's own codes.
    pub codelist_extras: Vec<String>,
    pub join_keys: NameList,
    pub source_datasets: Vec<String>,
    /// Set when the variable is retired; holds the reason.
    pub outdated_comment: Option<String>,
    pub description: Option<String>,
}

impl VariableSpec {
    pub fn new(name: &str, dtype: DataType) -> Self {
        Self {
            name: normalize_name(name),
            derived_from: NameList::new(),
            dtype,
            renamed_from: Vec::new(),
            codelist_ref: None,
            codelist_extras: Vec::new(),
            join_keys: NameList::new(),
            source_datasets: Vec::new(),
            outdated_comment: None,
            description: None,
        }
    }

    pub fn derived_from(mut self, names: &[&str]) -> Self {
        self.derived_from = names.iter().map(|n| normalize_name(n)).collect();
        self
    }

    pub fn renamed_from(mut self, names: &[&str]) -> Self {
        self.renamed_from = names.iter().map(|n| normalize_name(n)).collect();
        self
    }

    pub fn codelist(mut self, codelist: CodelistRef) -> Self {
        self.codelist_ref = Some(codelist);
        self
    }

    pub fn codelist_extras(mut self, codes: &[&str]) -> Self {
        self.codelist_extras = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn joined_from(mut self, datasets: &[&str], keys: &[&str]) -> Self {
        self.source_datasets = datasets.iter().map(|d| d.to_string()).collect();
        self.join_keys = keys.iter().map(|k| normalize_name(k)).collect();
        self
    }

    pub fn outdated(mut self, comment: &str) -> Self {
        self.outdated_comment = Some(comment.to_string());
        self
    }

    pub fn is_derivable(&self) -> bool {
        !self.derived_from.is_empty()
    }

    pub fn is_join(&self) -> bool {
        !self.source_datasets.is_empty() || !self.join_keys.is_empty()
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A string or a list of strings. Older metadata files write single
/// prerequisites without brackets.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// A variable entry as it appears in a metadata file. This is the only place
/// where the loose on-disk forms are accepted; everything downstream sees a
/// `VariableSpec`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawVariableSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub derived_from: Option<OneOrMany>,
    pub dtype: String,
    #[serde(default)]
    pub renamed_from: Option<OneOrMany>,
    #[serde(default, alias = "klass_codelist")]
    pub codelist: Option<u32>,
    #[serde(default, alias = "klass_variant")]
    pub codelist_variant: Option<String>,
    #[serde(default, alias = "klass_correspondence_from")]
    pub codelist_correspondence_from: Option<u32>,
    #[serde(default)]
    pub codelist_as_of: Option<NaiveDate>,
    #[serde(default, alias = "klass_extra_codes")]
    pub codelist_extras: Option<OneOrMany>,
    #[serde(default)]
    pub join_keys: Option<OneOrMany>,
    #[serde(default)]
    pub source_datasets: Option<OneOrMany>,
    #[serde(default)]
    pub outdated_comment: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RawVariableSpec {
    /// Normalises the entry. `key` is the table key the entry was found under
    /// and is used when the entry carries no explicit name.
    pub fn normalize(self, key: &str) -> Result<VariableSpec, TableError> {
        let names = |v: Option<OneOrMany>| -> Vec<String> {
            v.map(OneOrMany::into_vec)
                .unwrap_or_default()
                .iter()
                .map(|s| normalize_name(s))
                .filter(|s| !s.is_empty())
                .collect()
        };
        let literals = |v: Option<OneOrMany>| -> Vec<String> {
            v.map(OneOrMany::into_vec).unwrap_or_default().into_iter().map(|s| s.trim().to_string()).collect()
        };

        let codelist_ref = self.codelist.map(|id| CodelistRef {
            id,
            variant: self.codelist_variant.clone().filter(|v| !v.trim().is_empty()),
            correspondence_from: self.codelist_correspondence_from,
            as_of: self.codelist_as_of,
        });

        Ok(VariableSpec {
            name: normalize_name(self.name.as_deref().unwrap_or(key)),
            derived_from: names(self.derived_from).into_iter().collect(),
            dtype: self.dtype.parse()?,
            renamed_from: names(self.renamed_from),
            codelist_ref,
            codelist_extras: literals(self.codelist_extras),
            join_keys: names(self.join_keys).into_iter().collect(),
            source_datasets: literals(self.source_datasets),
            outdated_comment: self.outdated_comment.filter(|c| !c.trim().is_empty()),
            description: self.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_accepts_loose_forms() {
        let raw: RawVariableSpec = toml::from_str(
            r#"
            derived_from = "NUS2000"
            dtype = "bool[pyarrow]"
            renamed_from = ["Old_Name", " "]
            klass_codelist = 36
            klass_variant = "Nivå"
            "#,
        )
        .unwrap();
        let spec = raw.normalize("Gr_Something").unwrap();
        assert_eq!(spec.name, "gr_something");
        assert_eq!(spec.derived_from.as_slice(), ["nus2000".to_string()]);
        assert_eq!(spec.dtype, DataType::Boolean);
        assert_eq!(spec.renamed_from, vec!["old_name".to_string()]);
        assert_eq!(spec.codelist_ref.unwrap().variant.as_deref(), Some("Nivå"));
    }

    #[test]
    fn test_normalize_rejects_unknown_dtype() {
        let raw: RawVariableSpec = toml::from_str(r#"dtype = "complex""#).unwrap();
        assert!(raw.normalize("x").is_err());
    }

    #[test]
    fn test_builder_flags() {
        let spec = VariableSpec::new("pers_kjoenn", DataType::String).joined_from(&["befolkning"], &["snr"]);
        assert!(spec.is_join());
        assert!(!spec.is_derivable());
        assert!(CodelistRef::new(0).is_exempt());
    }
}
