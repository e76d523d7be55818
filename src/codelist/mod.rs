//! The classification (codelist) boundary: valid code sets, variant mappings,
//! correspondence tables and labels.
pub mod service;
pub mod static_codelists;

pub use service::{select_variant, CodelistError, CodelistService};
pub use static_codelists::{Classification, CodeEntry, Correspondence, StaticCodelists, Variant};
