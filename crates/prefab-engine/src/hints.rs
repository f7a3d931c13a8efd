//! Nullability hints: which fields the default fixture must populate.

use std::collections::HashSet;

use prefab_core::{FieldDescriptor, FieldKey, TypeName};

/// Answers whether a field may be left null in a default instance.
pub trait NullabilityHints {
    fn is_required_non_null(&self, field: &FieldDescriptor) -> bool;
}

/// Hints from an explicit list of fields and types. Empty by default,
/// meaning every field may stay at its zero value.
#[derive(Debug, Clone, Default)]
pub struct NonNullFields {
    fields: HashSet<FieldKey>,
    types: HashSet<TypeName>,
}

impl NonNullFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a single field non-null.
    pub fn field(mut self, key: FieldKey) -> Self {
        self.fields.insert(key);
        self
    }

    /// Marks every field declared by `owner` non-null.
    pub fn all_of(mut self, owner: impl Into<TypeName>) -> Self {
        self.types.insert(owner.into());
        self
    }
}

impl NullabilityHints for NonNullFields {
    fn is_required_non_null(&self, field: &FieldDescriptor) -> bool {
        self.fields.contains(&field.key) || self.types.contains(field.owner())
    }
}
