//! A lazy, named view over a dataset source.
//!
//! The first successful request for a name constructs the dataset and keeps
//! it; later requests return the same handle. `reset()` forgets everything,
//! which is required whenever the underlying source is reconfigured.

use super::dataset::Dataset;
use super::error::TableError;
use super::source::DatasetSource;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

pub struct DatasetCache {
    source: Box<dyn DatasetSource>,
    loaded: Mutex<HashMap<String, Arc<Dataset>>>,
}

impl std::fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetCache").field("loaded", &self.cached_names()).finish()
    }
}

impl DatasetCache {
    pub fn new(source: impl DatasetSource + 'static) -> Self {
        Self { source: Box::new(source), loaded: Mutex::new(HashMap::new()) }
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, Arc<Dataset>>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.loaded.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, name: &str) -> Result<Arc<Dataset>, TableError> {
        if let Some(ds) = self.guard().get(name) {
            return Ok(Arc::clone(ds));
        }
        debug!(dataset = name, "loading dataset");
        let ds = Arc::new(self.source.load(name)?);
        // Another caller may have raced us here; the first registration wins.
        let mut loaded = self.guard();
        let entry = loaded.entry(name.to_string()).or_insert(ds);
        Ok(Arc::clone(entry))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.guard().contains_key(name) || self.source.exists(name)
    }

    pub fn columns(&self, name: &str) -> Result<Vec<String>, TableError> {
        Ok(self.get(name)?.column_names().map(str::to_string).collect())
    }

    /// Projects `columns` of the named dataset, keeping rows accepted by `filter`.
    pub fn project(
        &self,
        name: &str,
        columns: &[&str],
        filter: Option<&dyn Fn(&Dataset, usize) -> bool>,
    ) -> Result<Dataset, TableError> {
        let ds = self.get(name)?;
        let ds = match filter {
            Some(keep) => {
                let mask: Vec<bool> = (0..ds.n_rows()).map(|row| keep(ds.as_ref(), row)).collect();
                ds.filter(&mask)?
            }
            None => ds.as_ref().clone(),
        };
        ds.select(columns)
    }

    pub fn cached_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.guard().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn reset(&self) {
        let mut loaded = self.guard();
        debug!(count = loaded.len(), "resetting dataset cache");
        loaded.clear();
    }
}
