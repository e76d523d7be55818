//! Variable metadata: the specification of every column the register knows
//! about, loaded once from configuration and read-only afterwards.
pub mod registry;
pub mod spec;

pub use registry::{MetadataError, MetadataRegistry};
pub use spec::{CodelistRef, NameList, OneOrMany, RawVariableSpec, VariableSpec};
