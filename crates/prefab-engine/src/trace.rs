//! Build trace recording.
//!
//! When tracing is enabled via [`BuildConfig::trace_enabled`], the graph
//! builder records a [`BuildEvent`] for every registry decision it makes.
//!
//! [`BuildConfig::trace_enabled`]: crate::config::BuildConfig::trace_enabled

use prefab_core::{FieldKey, TypeTag};
use serde::Serialize;

/// A single step of fixture construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BuildEvent {
    /// Construction of a type's pair started at the given guard depth.
    Enter { tag: TypeTag, depth: usize },
    /// A pair was stored in the registry.
    Registered { tag: TypeTag },
    /// A field's type was first needed during mutation and built on demand.
    Lazy { tag: TypeTag },
    /// A field was left untouched because its type cannot be built.
    SkippedField { field: FieldKey, reason: String },
    /// A type reached itself.
    Cycle { path: Vec<TypeTag> },
}

impl BuildEvent {
    pub fn tag(&self) -> Option<&TypeTag> {
        match self {
            BuildEvent::Enter { tag, .. }
            | BuildEvent::Registered { tag }
            | BuildEvent::Lazy { tag } => Some(tag),
            BuildEvent::SkippedField { .. } | BuildEvent::Cycle { .. } => None,
        }
    }
}
