//! Variable derivation: the registry of derivations built from the metadata
//! and the resolver that runs them against a dataset.
pub mod builtin;
pub mod derivation;
pub mod error;
pub mod lookup;
pub mod priority;
pub mod rank;
pub mod registry;
pub mod resolver;

pub use derivation::{Derivation, DerivationKind, DeriveEnv, Derived, JoinDerivation, PureDerivation, Reducer};
pub use error::{ComputeError, DeriveError};
pub use lookup::{CorrespondenceLookup, LabelLookup, VariantLookup};
pub use priority::{reconcile, Priority, Reconciled};
pub use rank::{pick_best_per_group, validate_rank_keys, RankError, RankKeyBuilder};
pub use registry::DerivationRegistry;
pub use resolver::Resolver;
