//! Read-only lookup of variable specifications.
use super::spec::{normalize_name, RawVariableSpec, VariableSpec};
use crate::table::TableError;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Variable '{0}' is defined more than once")]
    DuplicateVariable(String),
    #[error("Alias '{alias}' of '{variable}' collides with '{existing}'")]
    AliasCollision { alias: String, variable: String, existing: String },
    #[error("Variable '{name}': {source}")]
    InvalidDtype {
        name: String,
        #[source]
        source: TableError,
    },
    #[error("Failed to parse metadata: {0}")]
    Parse(String),
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    specs: BTreeMap<String, VariableSpec>,
    /// Historical name -> current name.
    aliases: HashMap<String, String>,
}

impl MetadataRegistry {
    pub fn new(specs: impl IntoIterator<Item = VariableSpec>) -> Result<Self, MetadataError> {
        let mut registry = Self::default();
        for spec in specs {
            if registry.specs.contains_key(&spec.name) {
                return Err(MetadataError::DuplicateVariable(spec.name));
            }
            registry.specs.insert(spec.name.clone(), spec);
        }

        for spec in registry.specs.values() {
            for alias in &spec.renamed_from {
                let existing = if registry.specs.contains_key(alias) {
                    Some(alias.clone())
                } else {
                    registry.aliases.get(alias).cloned()
                };
                if let Some(existing) = existing {
                    return Err(MetadataError::AliasCollision {
                        alias: alias.clone(),
                        variable: spec.name.clone(),
                        existing,
                    });
                }
                registry.aliases.insert(alias.clone(), spec.name.clone());
            }
        }
        Ok(registry)
    }

    pub fn from_raw(raw: BTreeMap<String, RawVariableSpec>) -> Result<Self, MetadataError> {
        let specs = raw
            .into_iter()
            .map(|(key, entry)| {
                entry.normalize(&key).map_err(|source| MetadataError::InvalidDtype { name: key.clone(), source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(specs)
    }

    /// Parses a TOML document with one table per variable.
    pub fn from_toml_str(text: &str) -> Result<Self, MetadataError> {
        let raw: BTreeMap<String, RawVariableSpec> =
            toml::from_str(text).map_err(|e| MetadataError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    /// Parses a JSON object with one entry per variable.
    pub fn from_json_str(text: &str) -> Result<Self, MetadataError> {
        let raw: BTreeMap<String, RawVariableSpec> =
            serde_json::from_str(text).map_err(|e| MetadataError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    /// Loads a `.toml` or `.json` metadata file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| MetadataError::Io { path: path.display().to_string(), source })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    /// Case-insensitive lookup that follows rename aliases.
    pub fn get_spec(&self, name: &str) -> Option<&VariableSpec> {
        let key = normalize_name(name);
        if let Some(spec) = self.specs.get(&key) {
            return Some(spec);
        }
        let current = self.aliases.get(&key)?;
        info!(old = %key, new = %current, "variable has been renamed");
        self.specs.get(current)
    }

    /// Resolves a name or alias to the current variable name, without logging.
    pub fn resolve_name(&self, name: &str) -> Option<&str> {
        let key = normalize_name(name);
        if let Some((name, _)) = self.specs.get_key_value(&key) {
            return Some(name.as_str());
        }
        self.aliases.get(&key).map(String::as_str)
    }

    pub fn all_names(&self) -> BTreeSet<String> {
        self.specs.keys().cloned().collect()
    }

    pub fn specs(&self) -> impl Iterator<Item = &VariableSpec> + '_ {
        self.specs.values()
    }

    pub fn len(&self) -> usize { self.specs.len() }
    pub fn is_empty(&self) -> bool { self.specs.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::DataType;
    use std::io::Write;

    const METADATA: &str = r#"
        [nus2000]
        dtype = "STRING"
        renamed_from = "utd_nus2000"
        klass_codelist = 36

        [gr_ergrunnskole_fullfort]
        dtype = "BOOLEAN"
        derived_from = ["nus2000", "uh_erutland", "utd_fullfoertkode"]
    "#;

    #[test]
    fn test_get_spec_is_case_insensitive() {
        let registry = MetadataRegistry::from_toml_str(METADATA).unwrap();
        let spec = registry.get_spec("NUS2000").unwrap();
        assert_eq!(spec.name, "nus2000");
        assert_eq!(spec.codelist_ref.as_ref().map(|c| c.id), Some(36));
    }

    #[test]
    fn test_get_spec_follows_renames() {
        let registry = MetadataRegistry::from_toml_str(METADATA).unwrap();
        assert_eq!(registry.get_spec("utd_nus2000").map(|s| s.name.as_str()), Some("nus2000"));
        assert_eq!(registry.resolve_name("Utd_Nus2000"), Some("nus2000"));
        assert!(registry.get_spec("unknown").is_none());
    }

    #[test]
    fn test_all_names() {
        let registry = MetadataRegistry::from_toml_str(METADATA).unwrap();
        let names: Vec<_> = registry.all_names().into_iter().collect();
        assert_eq!(names, vec!["gr_ergrunnskole_fullfort", "nus2000"]);
    }

    #[test]
    fn test_duplicate_definitions_are_rejected() {
        let specs = vec![
            VariableSpec::new("snr", DataType::String),
            VariableSpec::new("SNR", DataType::String),
        ];
        assert!(matches!(MetadataRegistry::new(specs), Err(MetadataError::DuplicateVariable(_))));
    }

    #[test]
    fn test_alias_colliding_with_variable_is_rejected() {
        let specs = vec![
            VariableSpec::new("snr", DataType::String),
            VariableSpec::new("fnr", DataType::String).renamed_from(&["snr"]),
        ];
        assert!(matches!(MetadataRegistry::new(specs), Err(MetadataError::AliasCollision { .. })));
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"snr": {{"dtype": "STRING"}}, "pers_alder": {{"dtype": "INTEGER", "derived_from": ["pers_foedselsdato"]}}}}"#).unwrap();
        let registry = MetadataRegistry::load(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get_spec("pers_alder").unwrap().is_derivable());
    }
}
