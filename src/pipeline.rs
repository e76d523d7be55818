//! The `Engine` owns everything one run needs: metadata, the derivation
//! registry, the codelist service and the dataset cache.
use crate::codelist::CodelistService;
use crate::config::{ConfigError, EngineConfig};
use crate::derive::{DerivationRegistry, DeriveEnv, DeriveError, Priority, Resolver};
use crate::metadata::MetadataRegistry;
use crate::quality::{run_quality_suite, QualityConfig, QualityContext, QualityError, SuiteError};
use crate::table::{Dataset, DatasetCache, DatasetSource, JsonDirSource, MemorySource};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Derive(#[from] DeriveError),
    #[error(transparent)]
    Quality(#[from] SuiteError),
}

pub struct Engine {
    metadata: MetadataRegistry,
    registry: DerivationRegistry,
    codelists: Box<dyn CodelistService>,
    datasets: DatasetCache,
    quality: QualityConfig,
}

impl Engine {
    pub fn new(
        metadata: MetadataRegistry,
        codelists: impl CodelistService + 'static,
        source: impl DatasetSource + 'static,
        quality: QualityConfig,
    ) -> Result<Self, DeriveError> {
        let registry = DerivationRegistry::build(&metadata)?;
        Ok(Self { metadata, registry, codelists: Box::new(codelists), datasets: DatasetCache::new(source), quality })
    }

    /// Builds an engine from a config; codelists come from the config itself.
    pub fn from_config(config: EngineConfig) -> Result<Self, PipelineError> {
        let metadata = config.metadata()?;
        let engine = match &config.datasets_dir {
            Some(dir) => Self::new(metadata, config.codelists, JsonDirSource::new(dir), config.quality)?,
            None => Self::new(metadata, config.codelists, MemorySource::new(), config.quality)?,
        };
        Ok(engine)
    }

    pub fn metadata(&self) -> &MetadataRegistry { &self.metadata }
    pub fn registry(&self) -> &DerivationRegistry { &self.registry }
    pub fn datasets(&self) -> &DatasetCache { &self.datasets }

    /// Drops every cached dataset so the next access reads the source again.
    pub fn reset(&self) {
        self.datasets.reset();
    }

    fn resolver(&self) -> Resolver<'_> {
        let env = DeriveEnv { metadata: &self.metadata, codelists: self.codelists.as_ref(), datasets: &self.datasets };
        Resolver::new(&self.registry, env)
    }

    fn quality_context(&self) -> QualityContext<'_> {
        QualityContext { metadata: &self.metadata, codelists: self.codelists.as_ref(), config: &self.quality }
    }

    pub fn derive(&self, name: &str, df: &Dataset, priority: Priority) -> Result<Dataset, DeriveError> {
        self.resolver().derive(name, df, priority)
    }

    pub fn derive_many(&self, names: &[&str], df: &Dataset, priority: Priority) -> Result<Dataset, DeriveError> {
        self.resolver().derive_many(names, df, priority)
    }

    pub fn validate(&self, df: &Dataset, raise_errors: bool) -> Result<Vec<QualityError>, SuiteError> {
        run_quality_suite(df, &self.quality_context(), raise_errors)
    }

    /// Derives `targets` in order, then runs the quality suite on the result.
    pub fn process(
        &self,
        df: &Dataset,
        targets: &[&str],
        priority: Priority,
        raise_errors: bool,
    ) -> Result<(Dataset, Vec<QualityError>), PipelineError> {
        let derived = self.derive_many(targets, df, priority)?;
        let errors = self.validate(&derived, raise_errors)?;
        info!(
            targets = targets.len(),
            columns = derived.n_columns(),
            rows = derived.n_rows(),
            quality_errors = errors.len(),
            "processing finished"
        );
        Ok((derived, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityErrorKind;
    use crate::table::Column;

    const CONFIG: &str = r#"
        [variables.snr]
        dtype = "string"

        [variables.utd_skoleland]
        dtype = "string"

        [variables.uh_erutland]
        dtype = "boolean"
        derived_from = "utd_skoleland"

        [variables.nus2000]
        dtype = "string"
        klass_codelist = 36

        [variables.nus2000_label]
        dtype = "string"
        derived_from = "nus2000"

        [variables.utd_fullfoertkode]
        dtype = "string"

        [variables.gr_ergrunnskole_fullfort]
        dtype = "boolean"
        derived_from = ["nus2000", "uh_erutland", "utd_fullfoertkode"]

        [quality.widths]
        nus2000 = [6]

        [codelists.36]
        codes = [{ code = "211111", name = "Grunnskole" }, { code = "311111", name = "VGS" }]
    "#;

    fn engine() -> Engine {
        Engine::from_config(EngineConfig::from_toml_str(CONFIG).unwrap()).unwrap()
    }

    fn input() -> Dataset {
        Dataset::from_columns([
            ("snr", Column::from_strs([Some("a"), Some("b")])),
            ("utd_skoleland", Column::from_strs([Some("000"), Some("106")])),
            ("nus2000", Column::from_strs([Some("211111"), Some("3111")])),
            ("utd_fullfoertkode", Column::from_strs([Some("8"), Some("8")])),
        ])
        .unwrap()
    }

    #[test]
    fn test_process_derives_then_validates() {
        let engine = engine();
        let (out, errors) = engine
            .process(&input(), &["gr_ergrunnskole_fullfort", "nus2000_label"], Priority::Old, false)
            .unwrap();
        assert_eq!(out.column("gr_ergrunnskole_fullfort").unwrap(), &Column::from_bools([Some(true), Some(false)]));
        assert_eq!(out.column("nus2000_label").unwrap(), &Column::from_strs([Some("Grunnskole"), None]));
        let kinds: Vec<QualityErrorKind> = errors.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![QualityErrorKind::Width, QualityErrorKind::InvalidCode]);
    }

    #[test]
    fn test_process_raises_pooled_errors() {
        let result = engine().process(&input(), &[], Priority::Old, true);
        assert!(matches!(result, Err(PipelineError::Quality(SuiteError::Quality(ref g))) if g.errors.len() == 2));
    }

    #[test]
    fn test_configuration_errors_are_fatal() {
        let err = engine().derive("snr", &input(), Priority::Old).unwrap_err();
        assert_eq!(err, DeriveError::NoDependenciesDefined("snr".into()));
    }

    #[test]
    fn test_reset_clears_dataset_cache() {
        let table = Dataset::from_columns([("snr", Column::from_strs([Some("a")]))]).unwrap();
        let engine = Engine::new(
            MetadataRegistry::default(),
            crate::codelist::StaticCodelists::new(),
            MemorySource::new().with_table("slekt_snr", table),
            QualityConfig::default(),
        )
        .unwrap();
        engine.datasets().get("slekt_snr").unwrap();
        assert_eq!(engine.datasets().cached_names(), vec!["slekt_snr".to_string()]);
        engine.reset();
        assert!(engine.datasets().cached_names().is_empty());
    }
}
