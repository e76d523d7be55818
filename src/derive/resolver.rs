//! Runs a derivation: satisfies its prerequisites, computes the column and
//! merges it into the dataset.
//!
//! Configuration problems surface as [`DeriveError`]. Everything that goes
//! wrong while computing is contained: one warning is logged and the input
//! dataset is returned as it was.

use super::derivation::{Derivation, DeriveEnv, Derived};
use super::error::DeriveError;
use super::priority::{reconcile, Priority};
use super::registry::DerivationRegistry;
use crate::table::{Column, Dataset, TableError};
use std::fmt::Display;
use tracing::{debug, info, warn};

pub struct Resolver<'a> {
    registry: &'a DerivationRegistry,
    env: DeriveEnv<'a>,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a DerivationRegistry, env: DeriveEnv<'a>) -> Self {
        Self { registry, env }
    }

    /// Derives `name` into `df`, recursively deriving missing prerequisites first.
    pub fn derive(&self, name: &str, df: &Dataset, priority: Priority) -> Result<Dataset, DeriveError> {
        let mut stack = Vec::new();
        self.derive_inner(name, df, priority, &mut stack)
    }

    /// Derives each name in turn, feeding every result into the next.
    pub fn derive_many(&self, names: &[&str], df: &Dataset, priority: Priority) -> Result<Dataset, DeriveError> {
        let mut current = df.clone();
        for name in names {
            current = self.derive(name, &current, priority)?;
        }
        Ok(current)
    }

    fn canonical(&self, name: &str) -> String {
        self.env
            .metadata
            .resolve_name(name)
            .map(str::to_string)
            .unwrap_or_else(|| name.trim().to_lowercase())
    }

    fn derive_inner(
        &self,
        name: &str,
        df: &Dataset,
        priority: Priority,
        stack: &mut Vec<String>,
    ) -> Result<Dataset, DeriveError> {
        let name = self.canonical(name);
        let Some(derivation) = self.registry.get(&name).cloned() else {
            return Err(match self.env.metadata.get_spec(&name) {
                Some(spec) if !spec.is_derivable() => DeriveError::NoDependenciesDefined(name),
                _ => DeriveError::NotDerivable(name),
            });
        };
        if derivation.dependencies().is_empty() {
            return Err(DeriveError::NoDependenciesDefined(name));
        }
        if let Some(start) = stack.iter().position(|n| *n == name) {
            let mut path = stack[start..].to_vec();
            path.push(name);
            return Err(DeriveError::Cycle { path });
        }

        stack.push(name.clone());
        let result = self.run(&name, derivation.as_ref(), df, priority, stack);
        stack.pop();
        result
    }

    fn run(
        &self,
        name: &str,
        derivation: &dyn Derivation,
        df: &Dataset,
        priority: Priority,
        stack: &mut Vec<String>,
    ) -> Result<Dataset, DeriveError> {
        let mut current = df.clone();
        for dep in derivation.dependencies() {
            if current.has_column(dep) || !self.registry.contains(dep) {
                continue;
            }
            debug!(variable = %name, prerequisite = %dep, "deriving missing prerequisite");
            current = self.derive_inner(dep, &current, priority, stack)?;
        }

        let missing: Vec<&str> = derivation
            .dependencies()
            .iter()
            .map(String::as_str)
            .filter(|dep| !current.has_column(dep))
            .collect();
        if !missing.is_empty() {
            warn!(variable = %name, missing = ?missing, "cannot derive, prerequisites are not available");
            return Ok(df.clone());
        }

        if let Some(existing) = current.column(name) {
            info!(variable = %name, fill_rate = existing.fill_rate(), "existing column before derivation");
        }

        let computed = match derivation.compute(&current, &self.env) {
            Ok(computed) => computed,
            Err(error) => return contain(name, error.escalate(name)?, df),
        };

        let column = match computed {
            Derived::Column(column) => column,
            Derived::Reduced(reduced) => {
                let keys: Vec<&str> = derivation.join_keys().iter().map(String::as_str).collect();
                match current.lookup(&reduced, &keys, name) {
                    Ok(column) => column,
                    Err(source @ TableError::DuplicateJoinKey { .. }) => {
                        return Err(DeriveError::AmbiguousJoin { name: name.to_string(), source })
                    }
                    Err(error) => return contain(name, error, df),
                }
            }
        };

        if column.len() != current.n_rows() {
            let error = TableError::LengthMismatch {
                name: name.to_string(),
                expected: current.n_rows(),
                actual: column.len(),
            };
            return contain(name, error, df);
        }

        let column = match self.conform(name, column) {
            Ok(column) => column,
            Err(error) => return contain(name, error, df),
        };

        let merged = match current.column(name) {
            Some(existing) => match reconcile(existing, &column, priority) {
                Ok(outcome) => {
                    info!(
                        variable = %name,
                        %priority,
                        changed_fraction = outcome.changed_fraction,
                        fill_rate = outcome.fill_after,
                        "merged derived values into existing column"
                    );
                    if outcome.lost_values() {
                        warn!(
                            variable = %name,
                            before = outcome.fill_before,
                            after = outcome.fill_after,
                            "fill rate decreased during derivation"
                        );
                    }
                    outcome.column
                }
                Err(error) => return contain(name, error, df),
            },
            None => column,
        };

        match current.with_column(name, merged) {
            Ok(next) => Ok(next),
            Err(error) => contain(name, error, df),
        }
    }

    /// Casts a computed column to the dtype the metadata declares for it.
    fn conform(&self, name: &str, column: Column) -> Result<Column, TableError> {
        match self.env.metadata.get_spec(name) {
            Some(spec) if spec.dtype != column.dtype() => column.cast(spec.dtype),
            _ => Ok(column),
        }
    }
}

fn contain(name: &str, error: impl Display, df: &Dataset) -> Result<Dataset, DeriveError> {
    warn!(variable = %name, %error, "derivation failed, returning the input unchanged");
    Ok(df.clone())
}
