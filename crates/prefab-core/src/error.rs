//! Core error types for prefab-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of the descriptor model.

use thiserror::Error;

/// Errors produced while registering or inspecting type descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Attempting to register a type name that already exists in the catalog.
    #[error("duplicate type name: '{name}'")]
    DuplicateTypeName { name: String },

    /// A tag refers to a type the catalog does not know.
    #[error("unknown type: '{name}'")]
    UnknownType { name: String },

    /// A field lookup by name failed.
    #[error("type {owner} has no field named '{field}'")]
    FieldNotFound { owner: String, field: String },

    /// A superclass chain loops back on itself.
    #[error("inheritance cycle through type '{name}'")]
    InheritanceCycle { name: String },
}
