//! Prefab value engine.
//!
//! Given a record type from a [`TypeCatalog`](prefab_core::TypeCatalog),
//! produces the fixtures an equality-contract verifier needs: two instances
//! that differ in every field (red and black), a distinct instance equal to
//! red, and a default instance. Every type reachable from the record's
//! fields gets a memoized red/black pair in a [`ValueRegistry`] along the
//! way, and recursive type graphs are reported with the cycle that
//! caused them.
//!
//! Start with [`FixtureSession`]; [`GraphBuilder`], [`ObjectBuilder`] and
//! [`FieldMutator`] are the lower-level pieces it is made of.

pub mod builder;
pub mod config;
pub mod cycle;
pub mod error;
pub mod hints;
pub mod instantiate;
pub mod mutator;
pub mod objects;
pub mod registry;
mod seeds;
pub mod session;
pub mod stash;
pub mod trace;

pub use builder::GraphBuilder;
pub use config::BuildConfig;
pub use cycle::CycleGuard;
pub use error::EngineError;
pub use hints::{NonNullFields, NullabilityHints};
pub use instantiate::{RawInstantiator, ZeroInstantiator};
pub use mutator::FieldMutator;
pub use objects::{Fixtures, ObjectBuilder, UnsupportedField};
pub use registry::{FieldOverrides, PrefabPair, ValueRegistry};
pub use session::{FixtureSession, VerificationFailure};
pub use stash::StaticStash;
pub use trace::BuildEvent;
