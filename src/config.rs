//! Engine configuration: variable metadata, quality rules and optional
//! static codelists, read from one TOML or JSON file.
use crate::codelist::StaticCodelists;
use crate::metadata::{MetadataError, MetadataRegistry, RawVariableSpec};
use crate::quality::QualityConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory of `<name>.json` datasets served to join derivations.
    pub datasets_dir: Option<PathBuf>,
    pub variables: BTreeMap<String, RawVariableSpec>,
    pub quality: QualityConfig,
    pub codelists: StaticCodelists,
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads by extension; anything but `.json` is read as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    pub fn metadata(&self) -> Result<MetadataRegistry, ConfigError> {
        Ok(MetadataRegistry::from_raw(self.variables.clone())?)
    }
}
