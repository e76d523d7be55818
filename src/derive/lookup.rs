//! Derivations that translate codes through the codelist service.

use super::derivation::{Derivation, DerivationKind, DeriveEnv, Derived};
use super::error::ComputeError;
use crate::table::{Column, Dataset, TableError, Value};
use chrono::NaiveDate;
use std::collections::HashMap;

fn source_column<'a>(df: &'a Dataset, source: &str) -> Result<&'a Column, ComputeError> {
    df.column(source).ok_or_else(|| ComputeError::Table(TableError::ColumnNotFound(source.to_string())))
}

/// Maps every non-null value through `lookup`; unmapped values become null.
fn translate<F>(column: &Column, lookup: F) -> Column
where
    F: Fn(&str) -> Option<String>,
{
    Column::from_strs(column.iter().map(|v| match v {
        Value::Null => None,
        other => lookup(&other.to_string()),
    }))
}

pub struct VariantLookup {
    name: String,
    dependencies: Vec<String>,
    codelist: u32,
    search_term: String,
}

impl VariantLookup {
    pub fn new(name: &str, source: &str, codelist: u32, search_term: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            dependencies: vec![source.to_lowercase()],
            codelist,
            search_term: search_term.to_string(),
        }
    }
}

impl Derivation for VariantLookup {
    fn name(&self) -> &str { &self.name }
    fn dependencies(&self) -> &[String] { &self.dependencies }
    fn kind(&self) -> DerivationKind { DerivationKind::VariantLookup }

    fn compute(&self, df: &Dataset, env: &DeriveEnv<'_>) -> Result<Derived, ComputeError> {
        let mapping = env.codelists.get_variant_mapping(self.codelist, &self.search_term)?;
        let source = source_column(df, &self.dependencies[0])?;
        Ok(Derived::Column(translate(source, |code| mapping.get(code).cloned())))
    }
}

pub struct CorrespondenceLookup {
    name: String,
    dependencies: Vec<String>,
    source_codelist: u32,
    target_codelist: u32,
    as_of: Option<NaiveDate>,
}

impl CorrespondenceLookup {
    pub fn new(name: &str, source: &str, source_codelist: u32, target_codelist: u32, as_of: Option<NaiveDate>) -> Self {
        Self {
            name: name.to_lowercase(),
            dependencies: vec![source.to_lowercase()],
            source_codelist,
            target_codelist,
            as_of,
        }
    }
}

impl Derivation for CorrespondenceLookup {
    fn name(&self) -> &str { &self.name }
    fn dependencies(&self) -> &[String] { &self.dependencies }
    fn kind(&self) -> DerivationKind { DerivationKind::CorrespondenceLookup }

    fn compute(&self, df: &Dataset, env: &DeriveEnv<'_>) -> Result<Derived, ComputeError> {
        // Without a configured date the correspondence in force today is used.
        let as_of = self.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
        let mapping: HashMap<String, Option<String>> =
            env.codelists.get_correspondence_mapping(self.source_codelist, self.target_codelist, as_of)?;
        let source = source_column(df, &self.dependencies[0])?;
        Ok(Derived::Column(translate(source, |code| mapping.get(code).cloned().flatten())))
    }
}

pub struct LabelLookup {
    name: String,
    dependencies: Vec<String>,
    codelist: u32,
}

impl LabelLookup {
    pub fn new(name: &str, source: &str, codelist: u32) -> Self {
        Self { name: name.to_lowercase(), dependencies: vec![source.to_lowercase()], codelist }
    }
}

impl Derivation for LabelLookup {
    fn name(&self) -> &str { &self.name }
    fn dependencies(&self) -> &[String] { &self.dependencies }
    fn kind(&self) -> DerivationKind { DerivationKind::LabelLookup }

    fn compute(&self, df: &Dataset, env: &DeriveEnv<'_>) -> Result<Derived, ComputeError> {
        let labels = env.codelists.get_labels(self.codelist)?;
        let source = source_column(df, &self.dependencies[0])?;
        Ok(Derived::Column(translate(source, |code| labels.get(code).cloned())))
    }
}
