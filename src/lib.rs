// Variable derivation and data-quality engine for the national education
// register. Load metadata into an `Engine`, derive columns through the
// dependency graph, then validate the result with the quality suite.

pub mod codelist;
pub mod config;
pub mod derive;
pub mod logging;
pub mod metadata;
pub mod pipeline;
pub mod quality;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, EngineConfig};
pub use derive::{DeriveError, Priority};
pub use pipeline::{Engine, PipelineError};
pub use quality::{QualityError, QualityErrorGroup, QualityErrorKind, SuiteError};
pub use table::{Column, DataType, Dataset, Value};
