//! Engine error types.
//!
//! All failures carry enough context (tags, field keys, recursion paths) to
//! be rendered as user-facing messages by the session layer.

use prefab_core::{CoreError, FieldKey, TypeTag};
use thiserror::Error;

/// Errors raised while registering prefab values or building fixtures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A type graph reaches a type that is already under construction and
    /// no prefab values break the loop.
    #[error(
        "Recursive datastructure.\nAdd prefab values for one of the following types: {}.",
        render_path(.path)
    )]
    Recursion { path: Vec<TypeTag> },

    /// The raw instantiator could not produce an instance.
    #[error("cannot instantiate {tag}: {reason}")]
    Instantiation { tag: TypeTag, reason: String },

    /// A type with no safe construction path was reached.
    #[error("unsupported type {tag}: {reason}")]
    Unsupported { tag: TypeTag, reason: String },

    /// A field whose value cannot be read or written on the given target.
    #[error("cannot access field {field}: {reason}")]
    FieldAccess { field: FieldKey, reason: String },

    /// An enum with no constants has no values to offer.
    #[error("enum {tag} declares no constants")]
    EmptyEnum { tag: TypeTag },

    /// User-supplied prefab values are unusable.
    #[error("invalid prefab values for {subject}: {reason}")]
    InvalidPrefab { subject: String, reason: String },

    /// A value does not have the shape its type requires.
    #[error("value of kind {found} does not fit type {tag}")]
    ValueMismatch { tag: TypeTag, found: &'static str },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl EngineError {
    /// Short, stable name of the failure kind.
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::Recursion { .. } => "recursion",
            EngineError::Instantiation { .. } => "instantiation",
            EngineError::Unsupported { .. } => "unsupported",
            EngineError::FieldAccess { .. } => "field-access",
            EngineError::EmptyEnum { .. } => "empty-enum",
            EngineError::InvalidPrefab { .. } => "invalid-prefab",
            EngineError::ValueMismatch { .. } => "value-mismatch",
            EngineError::Core(_) => "descriptor",
        }
    }

    /// Whether the failure only concerns one field's type, so building can
    /// skip that field and go on.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            EngineError::Unsupported { .. }
                | EngineError::EmptyEnum { .. }
                | EngineError::Core(CoreError::UnknownType { .. })
        )
    }
}

fn render_path(path: &[TypeTag]) -> String {
    let names: Vec<String> = path.iter().map(ToString::to_string).collect();
    format!("[{}]", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursion_message_lists_path() {
        let err = EngineError::Recursion {
            path: vec![TypeTag::of("X"), TypeTag::of("Y")],
        };
        insta::assert_snapshot!(err.to_string(), @r"
        Recursive datastructure.
        Add prefab values for one of the following types: [X, Y].
        ");
        assert_eq!(err.category(), "recursion");
    }

    #[test]
    fn unknown_types_count_as_unsupported() {
        let err = EngineError::from(CoreError::UnknownType {
            name: "Socket".into(),
        });
        assert!(err.is_unsupported());
        assert_eq!(err.category(), "descriptor");
        assert!(!EngineError::Recursion { path: vec![] }.is_unsupported());
    }
}
