//! Whole-instance construction: red, black, red copy and default
//! fixtures for a record type.
//!
//! Red is a fresh instance with every field changed once. Black is a fresh
//! instance with every field changed twice, so each field differs from
//! red's. The red copy has red's field values in a distinct instance, and
//! the default instance keeps zero values except where a nullability hint
//! demands one.

use prefab_core::{FieldDescriptor, FieldKey, ObjectRef, TypeTag, Value};
use serde::Serialize;

use crate::builder::GraphBuilder;
use crate::cycle::CycleGuard;
use crate::error::EngineError;
use crate::instantiate::stand_in_of;
use crate::mutator::FieldMutator;
use crate::registry::PrefabPair;

/// A field that was left at its zero value because its type cannot be
/// built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedField {
    pub field: FieldKey,
    pub reason: String,
}

/// Everything downstream equality checks need for one type.
#[derive(Debug, Clone)]
pub struct Fixtures {
    pub tag: TypeTag,
    pub red: Value,
    pub black: Value,
    pub red_copy: Value,
    pub default: Value,
    pub unsupported: Vec<UnsupportedField>,
}

/// Builds instances field by field through a [`GraphBuilder`].
pub struct ObjectBuilder<'b, 'c> {
    builder: &'b mut GraphBuilder<'c>,
}

impl<'b, 'c> ObjectBuilder<'b, 'c> {
    pub fn new(builder: &'b mut GraphBuilder<'c>) -> Self {
        ObjectBuilder { builder }
    }

    /// All fixtures for `tag`. Non-record types get their registry pair and
    /// zero value.
    pub fn build(&mut self, tag: &TypeTag) -> Result<Fixtures, EngineError> {
        let catalog = self.builder.catalog();
        if catalog.require(tag)?.as_record().is_none() {
            let pair = self.builder.give_pair(tag)?;
            return Ok(Fixtures {
                tag: tag.clone(),
                red: pair.red,
                black: pair.black,
                red_copy: pair.red_copy,
                default: catalog.zero_of(tag),
                unsupported: Vec::new(),
            });
        }
        self.guarded(tag, |this, concrete, guard| {
            let unsupported = this.builder.prepare_fields(concrete, guard)?;
            let red = this.scrambled(tag, 1, &unsupported, guard)?;
            let black = this.scrambled(tag, 2, &unsupported, guard)?;
            let red_copy = this.copy_of(&red)?;
            let default = this.default_in(tag, guard)?;
            Ok(Fixtures {
                tag: tag.clone(),
                red: Value::Object(red),
                black: Value::Object(black),
                red_copy: Value::Object(red_copy),
                default: Value::Object(default),
                unsupported,
            })
        })
    }

    /// A fresh instance with every field changed once.
    pub fn red_object(&mut self, tag: &TypeTag) -> Result<ObjectRef, EngineError> {
        self.guarded(tag, |this, concrete, guard| {
            let unsupported = this.builder.prepare_fields(concrete, guard)?;
            this.scrambled(tag, 1, &unsupported, guard)
        })
    }

    /// A fresh instance with every field changed twice.
    pub fn black_object(&mut self, tag: &TypeTag) -> Result<ObjectRef, EngineError> {
        self.guarded(tag, |this, concrete, guard| {
            let unsupported = this.builder.prepare_fields(concrete, guard)?;
            this.scrambled(tag, 2, &unsupported, guard)
        })
    }

    /// A fresh instance with zero values, except for fields that must not
    /// be null.
    pub fn default_object(&mut self, tag: &TypeTag) -> Result<ObjectRef, EngineError> {
        self.guarded(tag, |this, _, guard| this.default_in(tag, guard))
    }

    /// A distinct instance holding the same field values as `source`.
    pub fn copy_of(&mut self, source: &ObjectRef) -> Result<ObjectRef, EngineError> {
        if !self.builder.config().distinct_red_copy {
            return Ok(source.clone());
        }
        let catalog = self.builder.catalog();
        let tag = source.tag();
        let copy = self.builder.instantiator.instantiate(catalog, &tag)?;
        let fields = catalog.fields_of(&tag)?;
        let mut mutator = FieldMutator::new(&mut *self.builder);
        for field in fields.iter().filter(|f| f.is_traversed()) {
            mutator.copy_field(source, &copy, field)?;
        }
        Ok(copy)
    }

    /// The red/black/red-copy triple for a record the guard already holds.
    pub(crate) fn pair_in(
        &mut self,
        tag: &TypeTag,
        guard: &mut CycleGuard,
    ) -> Result<PrefabPair, EngineError> {
        let concrete = stand_in_of(self.builder.catalog(), tag)?;
        let unsupported = self.builder.prepare_fields(&concrete, guard)?;
        let red = self.scrambled(tag, 1, &unsupported, guard)?;
        let black = self.scrambled(tag, 2, &unsupported, guard)?;
        let red_copy = self.copy_of(&red)?;
        Ok(PrefabPair::with_copy(
            Value::Object(red),
            Value::Object(black),
            Value::Object(red_copy),
        ))
    }

    /// Runs `body` with `tag` pushed on a fresh guard, passing the concrete
    /// tag instances will actually have.
    fn guarded<T>(
        &mut self,
        tag: &TypeTag,
        body: impl FnOnce(&mut Self, &TypeTag, &mut CycleGuard) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let concrete = stand_in_of(self.builder.catalog(), tag)?;
        let mut guard = CycleGuard::new();
        self.builder.enter(tag, &mut guard)?;
        let result = body(self, &concrete, &mut guard);
        guard.pop(tag);
        result
    }

    fn scrambled(
        &mut self,
        tag: &TypeTag,
        times: usize,
        skip: &[UnsupportedField],
        guard: &mut CycleGuard,
    ) -> Result<ObjectRef, EngineError> {
        let object = self.builder.instantiate(tag)?;
        let fields = self.traversed_fields(&object, skip)?;
        let mut mutator = FieldMutator::new(&mut *self.builder);
        for _ in 0..times {
            for field in &fields {
                mutator.change_field_in(&object, field, guard)?;
            }
        }
        Ok(object)
    }

    fn default_in(
        &mut self,
        tag: &TypeTag,
        guard: &mut CycleGuard,
    ) -> Result<ObjectRef, EngineError> {
        let catalog = self.builder.catalog();
        let object = self.builder.instantiate(tag)?;
        let required: Vec<FieldDescriptor> = self
            .traversed_fields(&object, &[])?
            .into_iter()
            .filter(|f| {
                catalog.zero_of_field(f).is_null() && self.builder.hints.is_required_non_null(f)
            })
            .collect();
        let mut mutator = FieldMutator::new(&mut *self.builder);
        for field in &required {
            match mutator.change_field_in(&object, field, guard) {
                Ok(()) => {}
                Err(err) if err.is_unsupported() => {
                    tracing::warn!(field = %field.key, error = %err, "required field left null");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(object)
    }

    /// Instance fields of `object`'s actual type, minus the skipped ones.
    fn traversed_fields(
        &self,
        object: &ObjectRef,
        skip: &[UnsupportedField],
    ) -> Result<Vec<FieldDescriptor>, EngineError> {
        let fields = self.builder.catalog().fields_of(&object.tag())?;
        Ok(fields
            .into_iter()
            .filter(|f| f.is_traversed() && !skip.iter().any(|s| s.field == f.key))
            .collect())
    }
}
