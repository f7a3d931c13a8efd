//! The value registry: one red/black pair per type tag, and per-field
//! overrides.
//!
//! Pairs are written once and never replaced by derived values. A second
//! build of the same tag is a lookup.

use std::collections::HashMap;

use prefab_core::{FieldKey, TypeCatalog, TypeName, TypeTag, Value};

use crate::error::EngineError;
use crate::seeds;

/// Two distinct values of one type, plus a value equal to but (for
/// objects) not identical with `red`.
#[derive(Debug, Clone)]
pub struct PrefabPair {
    pub red: Value,
    pub black: Value,
    pub red_copy: Value,
}

impl PrefabPair {
    /// A pair whose red copy is `red` itself.
    pub fn new(red: Value, black: Value) -> Self {
        let red_copy = red.clone();
        PrefabPair {
            red,
            black,
            red_copy,
        }
    }

    pub fn with_copy(red: Value, black: Value, red_copy: Value) -> Self {
        PrefabPair {
            red,
            black,
            red_copy,
        }
    }

    /// Black if `current` equals red, otherwise red.
    pub fn other(&self, current: &Value, catalog: &TypeCatalog) -> Value {
        if self.red.equals(current, catalog) {
            self.black.clone()
        } else {
            self.red.clone()
        }
    }

    /// Whether red and black cannot be told apart.
    pub fn is_degenerate(&self, catalog: &TypeCatalog) -> bool {
        self.red.equals(&self.black, catalog)
    }

    /// Checks a user-supplied pair. Null values are always rejected; equal
    /// values only when `strict`.
    pub(crate) fn validate(
        &self,
        subject: &str,
        tag: &TypeTag,
        catalog: &TypeCatalog,
        strict: bool,
    ) -> Result<(), EngineError> {
        let invalid = |reason: &str| EngineError::InvalidPrefab {
            subject: subject.to_string(),
            reason: reason.to_string(),
        };
        if self.red.is_null() {
            return Err(invalid("red value is null"));
        }
        if self.black.is_null() {
            return Err(invalid("black value is null"));
        }
        if !seeds::fits(catalog, tag, &self.red) || !seeds::fits(catalog, tag, &self.black) {
            return Err(invalid(&format!("values are not of type {tag}")));
        }
        if !self.red.equals(&self.red_copy, catalog) {
            return Err(invalid("red copy is not equal to red"));
        }
        if self.is_degenerate(catalog) {
            if strict {
                return Err(invalid("both values are equal"));
            }
            tracing::warn!(%subject, "accepting prefab values that are equal to each other");
        }
        Ok(())
    }
}

/// Memoized pairs keyed by full type tag.
#[derive(Debug, Clone)]
pub struct ValueRegistry {
    entries: HashMap<TypeTag, PrefabPair>,
}

impl ValueRegistry {
    /// A registry holding the seeded pairs for scalars, `String` and
    /// `Object`.
    pub fn new() -> Self {
        ValueRegistry {
            entries: seeds::seeded_pairs().into_iter().collect(),
        }
    }

    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn get(&self, tag: &TypeTag) -> Option<&PrefabPair> {
        self.entries.get(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores a derived pair unless the tag already has one. Returns the
    /// pair now registered.
    pub(crate) fn insert(&mut self, tag: TypeTag, pair: PrefabPair) -> &PrefabPair {
        self.entries.entry(tag).or_insert(pair)
    }

    /// Registers user-supplied values, replacing anything already known
    /// for `tag`.
    pub fn put_manual(
        &mut self,
        tag: TypeTag,
        pair: PrefabPair,
        catalog: &TypeCatalog,
        strict: bool,
    ) -> Result<(), EngineError> {
        pair.validate(&tag.to_string(), &tag, catalog, strict)?;
        tracing::debug!(%tag, "registered manual prefab values");
        self.entries.insert(tag, pair);
        Ok(())
    }
}

impl Default for ValueRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// User-supplied pairs for individual fields, consulted before the
/// registry when that field is mutated.
///
/// Entries are scoped to the type they were given for: an override of an
/// inherited field on `Sub` leaves the same field on other subclasses of
/// its declaring type alone.
#[derive(Debug, Clone, Default)]
pub struct FieldOverrides {
    entries: HashMap<(TypeName, FieldKey), PrefabPair>,
}

impl FieldOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// The override for `key` on instances of `owner`.
    pub fn get(&self, owner: &TypeName, key: &FieldKey) -> Option<&PrefabPair> {
        self.entries.get(&(owner.clone(), key.clone()))
    }

    pub fn contains(&self, owner: &TypeName, key: &FieldKey) -> bool {
        self.get(owner, key).is_some()
    }

    pub fn put(
        &mut self,
        owner: TypeName,
        key: FieldKey,
        field_tag: &TypeTag,
        pair: PrefabPair,
        catalog: &TypeCatalog,
        strict: bool,
    ) -> Result<(), EngineError> {
        pair.validate(&format!("{owner}.{}", key.name), field_tag, catalog, strict)?;
        self.entries.insert((owner, key), pair);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use prefab_core::ScalarKind;

    use super::*;

    #[test]
    fn new_registry_is_seeded() {
        let registry = ValueRegistry::new();
        // 12 scalars, String, Object
        assert_eq!(registry.len(), 14);
        let pair = registry.get(&TypeTag::scalar(ScalarKind::I32)).unwrap();
        assert_eq!(pair.red, Value::I32(1));
        assert_eq!(pair.black, Value::I32(2));
        assert!(registry.contains(&TypeTag::object()));
    }

    #[test]
    fn derived_insert_does_not_replace() {
        let mut registry = ValueRegistry::new();
        let tag = TypeTag::of("Thing");
        registry.insert(tag.clone(), PrefabPair::new(Value::I32(1), Value::I32(2)));
        let kept = registry.insert(tag, PrefabPair::new(Value::I32(5), Value::I32(6)));
        assert_eq!(kept.red, Value::I32(1));
    }

    #[test]
    fn other_alternates() {
        let catalog = TypeCatalog::new();
        let pair = PrefabPair::new(Value::text("a"), Value::text("b"));
        assert_eq!(pair.other(&Value::text("a"), &catalog), Value::text("b"));
        assert_eq!(pair.other(&Value::text("b"), &catalog), Value::text("a"));
        assert_eq!(pair.other(&Value::Null, &catalog), Value::text("a"));
    }

    #[test]
    fn manual_values_are_validated() {
        let catalog = TypeCatalog::new();
        let mut registry = ValueRegistry::new();
        let tag = TypeTag::of("String");

        let null = PrefabPair::new(Value::Null, Value::text("b"));
        assert!(matches!(
            registry.put_manual(tag.clone(), null, &catalog, true),
            Err(EngineError::InvalidPrefab { .. })
        ));

        let equal = PrefabPair::new(Value::text("a"), Value::text("a"));
        assert!(registry
            .put_manual(tag.clone(), equal.clone(), &catalog, true)
            .is_err());
        assert!(registry.put_manual(tag.clone(), equal, &catalog, false).is_ok());

        let wrong_kind = PrefabPair::new(Value::I32(1), Value::I32(2));
        assert!(registry.put_manual(tag, wrong_kind, &catalog, true).is_err());
    }

    #[test]
    fn manual_values_replace_seeds() {
        let catalog = TypeCatalog::new();
        let mut registry = ValueRegistry::new();
        let tag = TypeTag::scalar(ScalarKind::I32);
        registry
            .put_manual(
                tag.clone(),
                PrefabPair::new(Value::I32(10), Value::I32(20)),
                &catalog,
                true,
            )
            .unwrap();
        assert_eq!(registry.get(&tag).unwrap().red, Value::I32(10));
    }
}
