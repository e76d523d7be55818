//! Defines the error types for the derive module.
use super::rank::RankError;
use crate::codelist::CodelistError;
use crate::table::TableError;
use thiserror::Error;

/// Fatal problems: the derivation setup itself is wrong. These are never
/// retried and never downgraded to warnings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeriveError {
    #[error("No derivation is registered for '{0}'")]
    NotDerivable(String),
    #[error("'{0}' has no derived_from entries and cannot be derived")]
    NoDependenciesDefined(String),
    #[error("'{name}' is joined from {datasets:?} but declares no join keys")]
    MissingJoinKeys { name: String, datasets: Vec<String> },
    #[error("Join for '{name}' is not many-to-one: {source}")]
    AmbiguousJoin { name: String, source: TableError },
    #[error("Cyclic derivation: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },
    #[error("Codelist configuration for '{name}' is invalid: {source}")]
    Codelist { name: String, source: CodelistError },
}

/// A failure inside a base function. The resolver contains these, except
/// codelist failures, which are configuration problems and escalate to
/// [`DeriveError`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Codelist(#[from] CodelistError),
    #[error(transparent)]
    Rank(#[from] RankError),
    #[error("{0}")]
    Failed(String),
}

impl ComputeError {
    /// The fatal counterpart of this error, if it has one.
    pub fn escalate(self, name: &str) -> Result<Self, DeriveError> {
        match self {
            ComputeError::Codelist(source) => Err(DeriveError::Codelist { name: name.to_string(), source }),
            other => Ok(other),
        }
    }
}
