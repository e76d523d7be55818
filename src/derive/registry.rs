//! Builds the name -> derivation dispatch table from the metadata.

use super::builtin::{self, Builtin};
use super::derivation::{Derivation, DerivationKind, JoinDerivation, PureDerivation, Reducer};
use super::error::DeriveError;
use super::lookup::{CorrespondenceLookup, LabelLookup, VariantLookup};
use crate::metadata::{MetadataRegistry, VariableSpec};
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

const LABEL_SUFFIX: &str = "_label";

/// Read-only after construction. Build a fresh one to pick up new metadata.
#[derive(Default, Clone)]
pub struct DerivationRegistry {
    derivations: BTreeMap<String, Arc<dyn Derivation>>,
}

impl std::fmt::Debug for DerivationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.derivations.iter().map(|(name, d)| (name, d.kind())))
            .finish()
    }
}

impl DerivationRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers every derivable variable in `metadata` using the built-in catalog.
    pub fn build(metadata: &MetadataRegistry) -> Result<Self, DeriveError> {
        Self::build_with(metadata, builtin::catalog())
    }

    pub fn build_with<'a>(
        metadata: &MetadataRegistry,
        catalog: impl IntoIterator<Item = (&'a str, Builtin)>,
    ) -> Result<Self, DeriveError> {
        let catalog: HashMap<&str, Builtin> = catalog.into_iter().collect();
        let mut registry = Self::empty();

        for spec in metadata.specs() {
            if !spec.is_derivable() {
                continue;
            }
            match select(spec, metadata, catalog.get(spec.name.as_str()))? {
                Some(derivation) => registry.register(derivation),
                None => debug!(variable = %spec.name, "no derivation matches; skipping"),
            }
        }

        // Reject cycles up front; the resolver also guards against them at runtime.
        registry.dependency_order()?;
        info!(count = registry.len(), "derivation registry built");
        Ok(registry)
    }

    /// Adds or replaces the derivation for its name.
    pub fn register(&mut self, derivation: Arc<dyn Derivation>) {
        self.derivations.insert(derivation.name().to_string(), derivation);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Derivation>> {
        self.derivations.get(&name.trim().to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.derivations.keys().map(String::as_str)
    }

    pub fn kind_of(&self, name: &str) -> Option<DerivationKind> {
        self.get(name).map(|d| d.kind())
    }

    pub fn len(&self) -> usize { self.derivations.len() }
    pub fn is_empty(&self) -> bool { self.derivations.is_empty() }

    /// Registered names ordered so that every derivation comes after the
    /// registered derivations it depends on.
    pub fn dependency_order(&self) -> Result<Vec<String>, DeriveError> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for (name, derivation) in &self.derivations {
            graph.add_node(name.as_str());
            for dep in derivation.dependencies() {
                if dep == name {
                    return Err(DeriveError::Cycle { path: vec![name.clone(), name.clone()] });
                }
                if self.derivations.contains_key(dep) {
                    graph.add_edge(dep.as_str(), name.as_str(), ());
                }
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(String::from).collect()),
            Err(cycle) => Err(DeriveError::Cycle { path: cycle_path(&graph, cycle.node_id()) }),
        }
    }
}

/// Picks the derivation shape for one spec. Built-ins take precedence, then
/// joins, labels, variants and correspondences.
fn select(
    spec: &VariableSpec,
    metadata: &MetadataRegistry,
    builtin: Option<&Builtin>,
) -> Result<Option<Arc<dyn Derivation>>, DeriveError> {
    let deps = &spec.derived_from[..];

    if let Some(builtin) = builtin {
        let derivation: Arc<dyn Derivation> = match builtin {
            Builtin::Pure(func) => Arc::new(PureDerivation::new(&spec.name, deps, *func)),
            Builtin::Reduce(func) => {
                let keys = join_keys(spec)?;
                Arc::new(JoinDerivation::new(&spec.name, deps, &keys, Reducer::Custom(*func)))
            }
        };
        return Ok(Some(derivation));
    }

    if spec.is_join() {
        let keys = join_keys(spec)?;
        if spec.source_datasets.is_empty() {
            return Ok(None);
        }
        let reducer = Reducer::Sources(spec.source_datasets.clone());
        return Ok(Some(Arc::new(JoinDerivation::new(&spec.name, deps, &keys, reducer))));
    }

    let source = &deps[0];
    if let Some(base) = spec.name.strip_suffix(LABEL_SUFFIX) {
        let codelist = metadata
            .get_spec(base)
            .and_then(|b| b.codelist_ref.as_ref())
            .filter(|c| !c.is_exempt());
        if let Some(codelist) = codelist {
            return Ok(Some(Arc::new(LabelLookup::new(&spec.name, source, codelist.id))));
        }
    }

    let Some(codelist) = spec.codelist_ref.as_ref() else {
        return Ok(None);
    };
    if let Some(term) = &codelist.variant {
        return Ok(Some(Arc::new(VariantLookup::new(&spec.name, source, codelist.id, term))));
    }
    if let Some(from) = codelist.correspondence_from {
        let lookup = CorrespondenceLookup::new(&spec.name, source, from, codelist.id, codelist.as_of);
        return Ok(Some(Arc::new(lookup)));
    }
    Ok(None)
}

fn join_keys(spec: &VariableSpec) -> Result<Vec<String>, DeriveError> {
    if spec.join_keys.is_empty() {
        return Err(DeriveError::MissingJoinKeys {
            name: spec.name.clone(),
            datasets: spec.source_datasets.clone(),
        });
    }
    Ok(spec.join_keys.to_vec())
}

/// Follows "derived from" edges inside the strongly connected component of
/// `start` until it returns to `start`.
fn cycle_path(graph: &DiGraphMap<&str, ()>, start: &str) -> Vec<String> {
    let members: HashSet<&str> = tarjan_scc(graph)
        .into_iter()
        .find(|scc| scc.contains(&start))
        .unwrap_or_default()
        .into_iter()
        .collect();
    let mut path = vec![start];
    if !walk(graph, start, start, &members, &mut path) {
        path.truncate(1);
    }
    path.into_iter().map(String::from).collect()
}

fn walk<'a>(
    graph: &DiGraphMap<&'a str, ()>,
    start: &'a str,
    node: &'a str,
    members: &HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> bool {
    for dep in graph.neighbors_directed(node, Direction::Incoming) {
        if dep == start {
            path.push(start);
            return true;
        }
        if members.contains(dep) && !path.contains(&dep) {
            path.push(dep);
            if walk(graph, start, dep, members, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}
