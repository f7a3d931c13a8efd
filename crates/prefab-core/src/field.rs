//! Read-only metadata about one enumerated field.

use crate::name::{FieldKey, TypeName};
use crate::tag::TypeTag;
use crate::types::DeclaredType;

/// One field of a type, as produced by
/// [`TypeCatalog::fields_of`](crate::catalog::TypeCatalog::fields_of).
///
/// `tag` is already resolved against the generic context the field was
/// enumerated in. For array fields it is the component's tag and
/// `is_array` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub key: FieldKey,
    pub declared: DeclaredType,
    /// The (resolved) type that declares the field; differs from the
    /// enumerated type for inherited fields.
    pub enclosing: TypeTag,
    pub tag: TypeTag,
    pub is_array: bool,
    pub is_static: bool,
    pub is_final: bool,
    pub is_transient: bool,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn owner(&self) -> &TypeName {
        &self.key.owner
    }

    pub fn is_constant(&self) -> bool {
        self.is_static && self.is_final
    }

    /// Whether graph traversal descends into this field's type.
    pub fn is_traversed(&self) -> bool {
        !self.is_static
    }
}
