use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodelistError {
    #[error("Codelist {0} is not known")]
    UnknownCodelist(u32),
    #[error("No variant of codelist {id} has a description starting with '{search_term}'")]
    NoVariantMatch { id: u32, search_term: String },
    #[error("Search term '{search_term}' matches several variants of codelist {id}: {matches:?}")]
    AmbiguousVariant { id: u32, search_term: String, matches: Vec<String> },
    #[error("No correspondence from codelist {source_id} to {target_id} valid at {as_of}")]
    NoCorrespondence { source_id: u32, target_id: u32, as_of: NaiveDate },
}

/// Access to an external classification service.
///
/// Implementations must be shareable between threads, since quality checks
/// may consult them from a worker pool.
pub trait CodelistService: Send + Sync {
    /// Codes valid at some point within `[from, to]`; unbounded ends are open.
    fn get_valid_codes(
        &self,
        id: u32,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<BTreeSet<String>, CodelistError>;

    /// Mapping of the single variant whose description starts with
    /// `search_term` (case-insensitive). See [`select_variant`].
    fn get_variant_mapping(&self, id: u32, search_term: &str) -> Result<HashMap<String, String>, CodelistError>;

    /// Source code -> target code, `None` where the source code has no target.
    fn get_correspondence_mapping(
        &self,
        source_id: u32,
        target_id: u32,
        as_of: NaiveDate,
    ) -> Result<HashMap<String, Option<String>>, CodelistError>;

    /// Code -> human-readable name.
    fn get_labels(&self, id: u32) -> Result<HashMap<String, String>, CodelistError>;
}

/// Picks the one description starting with `search_term`, ignoring case.
/// Zero or several matches are configuration errors.
pub fn select_variant<'a, I>(id: u32, descriptions: I, search_term: &str) -> Result<usize, CodelistError>
where
    I: IntoIterator<Item = &'a str>,
{
    let term = search_term.trim().to_lowercase();
    let hits: Vec<(usize, &str)> = descriptions
        .into_iter()
        .enumerate()
        .filter(|(_, d)| d.to_lowercase().starts_with(&term))
        .collect();

    match hits.as_slice() {
        [(index, _)] => Ok(*index),
        [] => Err(CodelistError::NoVariantMatch { id, search_term: search_term.to_string() }),
        many => Err(CodelistError::AmbiguousVariant {
            id,
            search_term: search_term.to_string(),
            matches: many.iter().map(|(_, d)| d.to_string()).collect(),
        }),
    }
}
