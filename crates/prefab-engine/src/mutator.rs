//! Field-level mutation: moving one field of one instance to a different
//! value of its type.
//!
//! The value a field moves to depends on its type:
//! - a field with an override alternates between the override's pair
//! - enums move from the first constant to the second, and from anything
//!   else to the first; a single-constant enum stays put
//! - array fields mutate element 0, creating a one-element array first
//! - everything else, scalars included, alternates between its registry
//!   pair, building the pair on demand if the type has not been seen yet
//!
//! Alternation makes two changes in a row cancel out for any field that
//! starts at one of its pair's values.
//!
//! Static fields live in the catalog, not in the target. Static final
//! fields are never written.

use prefab_core::{FieldDescriptor, ObjectRef, TypeKind, TypeName, TypeTag, Value};

use crate::builder::GraphBuilder;
use crate::cycle::CycleGuard;
use crate::error::EngineError;
use crate::trace::BuildEvent;

/// Changes, resets and copies individual fields.
pub struct FieldMutator<'b, 'c> {
    builder: &'b mut GraphBuilder<'c>,
}

impl<'b, 'c> FieldMutator<'b, 'c> {
    pub fn new(builder: &'b mut GraphBuilder<'c>) -> Self {
        FieldMutator { builder }
    }

    /// Sets `field` of `target` to a value different from its current one.
    pub fn change_field(
        &mut self,
        target: &ObjectRef,
        field: &FieldDescriptor,
    ) -> Result<(), EngineError> {
        let mut guard = CycleGuard::new();
        self.change_field_in(target, field, &mut guard)
    }

    pub(crate) fn change_field_in(
        &mut self,
        target: &ObjectRef,
        field: &FieldDescriptor,
        guard: &mut CycleGuard,
    ) -> Result<(), EngineError> {
        if field.is_constant() {
            return Ok(());
        }
        if field.is_static {
            self.builder.stash.backup(field.owner());
        }
        let current = self.read(target, field)?;
        let owner = target.tag().raw().clone();
        let next = self.next_for_field(&owner, field, &current, guard)?;
        self.write(target, field, next)
    }

    /// Resets `field` of `target` to the zero value of its type.
    pub fn default_field(
        &mut self,
        target: &ObjectRef,
        field: &FieldDescriptor,
    ) -> Result<(), EngineError> {
        if field.is_constant() {
            return Ok(());
        }
        if field.is_static {
            self.builder.stash.backup(field.owner());
        }
        let zero = self.builder.catalog.zero_of_field(field);
        self.write(target, field, zero)
    }

    /// Copies `field` from `from` into `to`. Object values are shared, not
    /// cloned. Static fields belong to neither instance and are skipped.
    pub fn copy_field(
        &mut self,
        from: &ObjectRef,
        to: &ObjectRef,
        field: &FieldDescriptor,
    ) -> Result<(), EngineError> {
        if field.is_static {
            return Ok(());
        }
        let value = self.read(from, field)?;
        self.write(to, field, value)
    }

    fn next_for_field(
        &mut self,
        owner: &TypeName,
        field: &FieldDescriptor,
        current: &Value,
        guard: &mut CycleGuard,
    ) -> Result<Value, EngineError> {
        let catalog = self.builder.catalog;
        if let Some(pair) = self.builder.overrides.get(owner, &field.key) {
            return Ok(pair.other(current, catalog));
        }
        if !field.is_array {
            return self.next_value(&field.tag, current, guard);
        }
        let mut items = match current {
            Value::Array(items) if !items.is_empty() => items.clone(),
            _ => vec![catalog.zero_of(&field.tag)],
        };
        items[0] = self.next_value(&field.tag, &items[0], guard)?;
        Ok(Value::Array(items))
    }

    /// The value of type `tag` that a slot holding `current` moves to.
    pub(crate) fn next_value(
        &mut self,
        tag: &TypeTag,
        current: &Value,
        guard: &mut CycleGuard,
    ) -> Result<Value, EngineError> {
        let catalog = self.builder.catalog;
        let def = catalog.require(tag)?;
        if let TypeKind::Enum(constants) = &def.kind {
            return match constants.len() {
                0 => Err(EngineError::EmptyEnum { tag: tag.clone() }),
                1 => Ok(current.clone()),
                _ => {
                    let first = Value::constant(def.name.clone(), 0);
                    let index = if *current == first { 1 } else { 0 };
                    Ok(Value::constant(def.name.clone(), index))
                }
            };
        }
        if !self.builder.registry.contains(tag) {
            tracing::trace!(%tag, "building prefab values on demand");
            self.builder.record(BuildEvent::Lazy { tag: tag.clone() });
            self.builder.realize(tag, guard)?;
        }
        Ok(self.builder.pair_of(tag)?.other(current, catalog))
    }

    fn read(&self, target: &ObjectRef, field: &FieldDescriptor) -> Result<Value, EngineError> {
        let value = if field.is_static {
            self.builder.catalog.static_value(&field.key)
        } else {
            target.borrow().get(&field.key).cloned()
        };
        value.ok_or_else(|| missing(field))
    }

    fn write(
        &self,
        target: &ObjectRef,
        field: &FieldDescriptor,
        value: Value,
    ) -> Result<(), EngineError> {
        if field.is_static {
            self.builder.catalog.set_static_value(&field.key, value)?;
            return Ok(());
        }
        let mut instance = target.borrow_mut();
        let slot = instance.fields.get_mut(&field.key).ok_or_else(|| missing(field))?;
        *slot = value;
        Ok(())
    }
}

fn missing(field: &FieldDescriptor) -> EngineError {
    EngineError::FieldAccess {
        field: field.key.clone(),
        reason: "target has no such field".to_string(),
    }
}
