//! The `Derivation` interface and the pure and join-shaped implementations.

use super::error::ComputeError;
use crate::codelist::CodelistService;
use crate::metadata::MetadataRegistry;
use crate::table::{Column, Dataset, DatasetCache};
use std::fmt;
use tracing::debug;

/// Everything a base function may consult besides the dataset itself.
#[derive(Clone, Copy)]
pub struct DeriveEnv<'a> {
    pub metadata: &'a MetadataRegistry,
    pub codelists: &'a dyn CodelistService,
    pub datasets: &'a DatasetCache,
}

/// How a derivation produces its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivationKind {
    /// Row-wise computation from columns already present.
    Pure,
    /// A reduced table at join-key grain, left-joined back onto the data.
    Join,
    /// Codes mapped through a variant of a classification.
    VariantLookup,
    /// Codes mapped through a correspondence between two classifications.
    CorrespondenceLookup,
    /// Codes mapped to their names.
    LabelLookup,
}

impl fmt::Display for DerivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a base function hands back to the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum Derived {
    /// One value per row of the input.
    Column(Column),
    /// One row per join key, holding the join keys and the target column.
    Reduced(Dataset),
}

pub trait Derivation: Send + Sync {
    /// Lower-case name of the variable this derivation produces.
    fn name(&self) -> &str;
    /// Variables that must be present before `compute` can run.
    fn dependencies(&self) -> &[String];
    fn kind(&self) -> DerivationKind;
    /// Keys a `Reduced` result is joined on.
    fn join_keys(&self) -> &[String] {
        &[]
    }
    fn compute(&self, df: &Dataset, env: &DeriveEnv<'_>) -> Result<Derived, ComputeError>;
}

pub type PureFn = fn(&Dataset) -> Result<Column, ComputeError>;
pub type ReduceFn = fn(&Dataset) -> Result<Dataset, ComputeError>;

pub struct PureDerivation {
    name: String,
    dependencies: Vec<String>,
    func: PureFn,
}

impl PureDerivation {
    pub fn new(name: &str, dependencies: &[String], func: PureFn) -> Self {
        Self { name: name.to_lowercase(), dependencies: dependencies.to_vec(), func }
    }
}

impl Derivation for PureDerivation {
    fn name(&self) -> &str { &self.name }
    fn dependencies(&self) -> &[String] { &self.dependencies }
    fn kind(&self) -> DerivationKind { DerivationKind::Pure }

    fn compute(&self, df: &Dataset, _env: &DeriveEnv<'_>) -> Result<Derived, ComputeError> {
        (self.func)(df).map(Derived::Column)
    }
}

/// Where a join derivation gets its reduced table from.
pub enum Reducer {
    /// The target column of the first listed auxiliary dataset that has it.
    Sources(Vec<String>),
    /// A reduction of the caller's own data, e.g. one record per person.
    Custom(ReduceFn),
}

pub struct JoinDerivation {
    name: String,
    dependencies: Vec<String>,
    join_keys: Vec<String>,
    reducer: Reducer,
}

impl JoinDerivation {
    pub fn new(name: &str, dependencies: &[String], join_keys: &[String], reducer: Reducer) -> Self {
        Self {
            name: name.to_lowercase(),
            dependencies: dependencies.to_vec(),
            join_keys: join_keys.to_vec(),
            reducer,
        }
    }

    fn reduce_from_sources(&self, sources: &[String], env: &DeriveEnv<'_>) -> Result<Dataset, ComputeError> {
        let mut wanted: Vec<&str> = self.join_keys.iter().map(String::as_str).collect();
        wanted.push(&self.name);

        for source in sources {
            if !env.datasets.exists(source) {
                debug!(dataset = %source, variable = %self.name, "source dataset not available");
                continue;
            }
            let available = env.datasets.columns(source)?;
            if !wanted.iter().all(|w| available.iter().any(|a| a == w)) {
                continue;
            }
            let keys = &self.join_keys;
            let has_keys = |ds: &Dataset, row: usize| keys.iter().all(|k| ds.column(k).map_or(false, |c| !c.get(row).is_null()));
            let projected = env.datasets.project(source, &wanted, Some(&has_keys))?;
            return Ok(projected.distinct());
        }
        Err(ComputeError::Failed(format!(
            "none of the source datasets {:?} provide {:?}",
            sources, wanted
        )))
    }
}

impl Derivation for JoinDerivation {
    fn name(&self) -> &str { &self.name }
    fn dependencies(&self) -> &[String] { &self.dependencies }
    fn kind(&self) -> DerivationKind { DerivationKind::Join }
    fn join_keys(&self) -> &[String] { &self.join_keys }

    fn compute(&self, df: &Dataset, env: &DeriveEnv<'_>) -> Result<Derived, ComputeError> {
        let reduced = match &self.reducer {
            Reducer::Sources(sources) => self.reduce_from_sources(sources, env)?,
            Reducer::Custom(func) => func(df)?,
        };
        Ok(Derived::Reduced(reduced))
    }
}
