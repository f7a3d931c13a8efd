//! The [`GraphBuilder`]: walks a type's field graph and makes sure every
//! type it reaches has a registered prefab pair.
//!
//! Records are built depth-first. Each record tag is pushed on a
//! [`CycleGuard`] while its fields are prepared and its red and black
//! instances are made, so a type that reaches itself is reported instead of
//! overflowing the stack. Containers and arrays are built from their
//! element pairs and never sit on the guard themselves; a list of trees
//! inside a tree is reported as the cycle `[Tree]`.

use prefab_core::{FieldDescriptor, Instance, ObjectRef, TypeCatalog, TypeKind, TypeTag, Value};

use crate::config::BuildConfig;
use crate::cycle::CycleGuard;
use crate::error::EngineError;
use crate::hints::{NonNullFields, NullabilityHints};
use crate::instantiate::{stand_in_of, RawInstantiator, ZeroInstantiator};
use crate::objects::{ObjectBuilder, UnsupportedField};
use crate::registry::{FieldOverrides, PrefabPair, ValueRegistry};
use crate::seeds;
use crate::stash::StaticStash;
use crate::trace::BuildEvent;

/// Owns the registry and everything needed to extend it.
pub struct GraphBuilder<'c> {
    pub(crate) catalog: &'c TypeCatalog,
    pub(crate) registry: ValueRegistry,
    pub(crate) overrides: FieldOverrides,
    pub(crate) instantiator: Box<dyn RawInstantiator + 'c>,
    pub(crate) hints: Box<dyn NullabilityHints + 'c>,
    pub(crate) stash: StaticStash<'c>,
    config: BuildConfig,
    trace: Option<Vec<BuildEvent>>,
}

impl<'c> GraphBuilder<'c> {
    pub fn new(catalog: &'c TypeCatalog) -> Self {
        Self::with_config(catalog, BuildConfig::default())
    }

    pub fn with_config(catalog: &'c TypeCatalog, config: BuildConfig) -> Self {
        GraphBuilder {
            catalog,
            registry: ValueRegistry::new(),
            overrides: FieldOverrides::new(),
            instantiator: Box::new(ZeroInstantiator),
            hints: Box::new(NonNullFields::new()),
            stash: StaticStash::acquire(catalog, config.restore_statics),
            trace: config.trace_enabled.then(Vec::new),
            config,
        }
    }

    pub fn with_instantiator(mut self, instantiator: impl RawInstantiator + 'c) -> Self {
        self.instantiator = Box::new(instantiator);
        self
    }

    pub fn with_hints(mut self, hints: impl NullabilityHints + 'c) -> Self {
        self.hints = Box::new(hints);
        self
    }

    pub fn catalog(&self) -> &'c TypeCatalog {
        self.catalog
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn registry(&self) -> &ValueRegistry {
        &self.registry
    }

    // -------------------------------------------------------------------
    // User-supplied values
    // -------------------------------------------------------------------

    /// Registers a red/black pair for `tag`, taking precedence over any
    /// derived pair.
    pub fn add_prefab(
        &mut self,
        tag: TypeTag,
        red: Value,
        black: Value,
    ) -> Result<(), EngineError> {
        self.add_prefab_pair(tag, PrefabPair::new(red, black))
    }

    pub fn add_prefab_pair(&mut self, tag: TypeTag, pair: PrefabPair) -> Result<(), EngineError> {
        self.registry
            .put_manual(tag, pair, self.catalog, self.config.strict_prefabs)
    }

    /// Registers a red/black pair for one field of `owner`. The field is
    /// found by name among `owner`'s own and inherited fields. The pair only
    /// applies to instances of `owner` (or of its stand-in, for abstract
    /// types), not to other types that inherit the same field.
    pub fn add_field_prefab(
        &mut self,
        owner: &TypeTag,
        field: &str,
        red: Value,
        black: Value,
    ) -> Result<(), EngineError> {
        let descriptor = self.catalog.field_named(owner, field)?;
        let value_tag = if descriptor.is_array {
            TypeTag::array_of(descriptor.tag.clone())
        } else {
            descriptor.tag.clone()
        };
        let concrete = stand_in_of(self.catalog, owner)?;
        self.overrides.put(
            concrete.raw().clone(),
            descriptor.key,
            &value_tag,
            PrefabPair::new(red, black),
            self.catalog,
            self.config.strict_prefabs,
        )
    }

    // -------------------------------------------------------------------
    // Registry access
    // -------------------------------------------------------------------

    /// Builds and registers a pair for `tag` and everything it reaches.
    /// A tag that is already registered is left alone.
    pub fn ensure_registered(&mut self, tag: &TypeTag) -> Result<(), EngineError> {
        let mut guard = CycleGuard::new();
        self.realize(tag, &mut guard)
    }

    pub fn give_pair(&mut self, tag: &TypeTag) -> Result<PrefabPair, EngineError> {
        self.ensure_registered(tag)?;
        Ok(self.pair_of(tag)?.clone())
    }

    pub fn give_red(&mut self, tag: &TypeTag) -> Result<Value, EngineError> {
        self.ensure_registered(tag)?;
        Ok(self.pair_of(tag)?.red.clone())
    }

    pub fn give_black(&mut self, tag: &TypeTag) -> Result<Value, EngineError> {
        self.ensure_registered(tag)?;
        Ok(self.pair_of(tag)?.black.clone())
    }

    pub fn give_red_copy(&mut self, tag: &TypeTag) -> Result<Value, EngineError> {
        self.ensure_registered(tag)?;
        Ok(self.pair_of(tag)?.red_copy.clone())
    }

    /// The value of `tag`'s pair that `current` is not.
    pub fn give_other(&mut self, tag: &TypeTag, current: &Value) -> Result<Value, EngineError> {
        self.ensure_registered(tag)?;
        Ok(self.pair_of(tag)?.other(current, self.catalog))
    }

    pub(crate) fn pair_of(&self, tag: &TypeTag) -> Result<&PrefabPair, EngineError> {
        self.registry
            .get(tag)
            .ok_or_else(|| EngineError::Instantiation {
                tag: tag.clone(),
                reason: "no prefab values registered".to_string(),
            })
    }

    // -------------------------------------------------------------------
    // Trace and statics
    // -------------------------------------------------------------------

    pub fn trace(&self) -> &[BuildEvent] {
        self.trace.as_deref().unwrap_or(&[])
    }

    pub fn take_trace(&mut self) -> Vec<BuildEvent> {
        self.trace.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub(crate) fn record(&mut self, event: BuildEvent) {
        if let Some(trace) = &mut self.trace {
            trace.push(event);
        }
    }

    /// Puts static fields back the way they were before this builder first
    /// touched them, then starts a fresh snapshot.
    pub fn release_statics(&mut self) {
        let fresh = StaticStash::acquire(self.catalog, self.config.restore_statics);
        std::mem::replace(&mut self.stash, fresh).release();
    }

    // -------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------

    /// Registers a pair for `tag` within an in-flight traversal.
    pub(crate) fn realize(
        &mut self,
        tag: &TypeTag,
        guard: &mut CycleGuard,
    ) -> Result<(), EngineError> {
        if self.registry.contains(tag) {
            return Ok(());
        }
        let catalog = self.catalog;
        let def = catalog.require(tag)?;

        let pair = match &def.kind {
            TypeKind::Scalar(kind) => seeds::scalar_pair(*kind),
            TypeKind::Text => PrefabPair::with_copy(
                Value::text("one"),
                Value::text("two"),
                Value::text("one"),
            ),
            TypeKind::Object => {
                // Bare instances, equal only to themselves.
                let bare = || Value::Object(ObjectRef::new(Instance::new(tag.clone())));
                PrefabPair::new(bare(), bare())
            }
            TypeKind::Enum(_) => seeds::enum_pair(tag, def)?,
            TypeKind::Array => {
                let component = tag.generic_or_object(0);
                self.realize(&component, guard)?;
                seeds::array_pair(self.pair_of(&component)?)
            }
            TypeKind::Container(kind) => {
                let args: Vec<TypeTag> =
                    (0..kind.arity()).map(|i| tag.generic_or_object(i)).collect();
                let mut pairs = Vec::with_capacity(args.len());
                for arg in &args {
                    self.realize(arg, guard)?;
                    pairs.push(self.pair_of(arg)?.clone());
                }
                seeds::container_pair(*kind, &pairs)
            }
            TypeKind::Record(_) => self.build_record(tag, guard)?,
            TypeKind::Opaque => {
                return Err(EngineError::Unsupported {
                    tag: tag.clone(),
                    reason: "type has no construction path".to_string(),
                })
            }
        };

        if pair.is_degenerate(catalog) {
            tracing::debug!(%tag, "derived prefab values are equal to each other");
        }
        self.registry.insert(tag.clone(), pair);
        self.record(BuildEvent::Registered { tag: tag.clone() });
        Ok(())
    }

    fn build_record(
        &mut self,
        tag: &TypeTag,
        guard: &mut CycleGuard,
    ) -> Result<PrefabPair, EngineError> {
        self.enter(tag, guard)?;
        tracing::debug!(%tag, depth = guard.depth(), "building prefab values");
        let result = ObjectBuilder::new(self).pair_in(tag, guard);
        guard.pop(tag);
        result
    }

    /// Pushes a record tag on the guard, recording the cycle if it closes
    /// one.
    pub(crate) fn enter(
        &mut self,
        tag: &TypeTag,
        guard: &mut CycleGuard,
    ) -> Result<(), EngineError> {
        if let Err(err) = guard.push(tag) {
            if let EngineError::Recursion { path } = &err {
                tracing::debug!(%tag, depth = guard.depth(), "type graph reached itself");
                self.record(BuildEvent::Cycle { path: path.clone() });
            }
            return Err(err);
        }
        self.record(BuildEvent::Enter {
            tag: tag.clone(),
            depth: guard.depth(),
        });
        self.stash.backup(tag.raw());
        Ok(())
    }

    /// Registers the type of every traversed field of `tag`.
    ///
    /// Fields with an override are skipped: their values never come from
    /// the registry. Fields whose type cannot be built are reported back
    /// and left out; any other failure aborts.
    pub(crate) fn prepare_fields(
        &mut self,
        tag: &TypeTag,
        guard: &mut CycleGuard,
    ) -> Result<Vec<UnsupportedField>, EngineError> {
        let mut skipped = Vec::new();
        for field in self.catalog.fields_of(tag)? {
            if !field.is_traversed() || self.overrides.contains(tag.raw(), &field.key) {
                continue;
            }
            match self.realize(&field.tag, guard) {
                Ok(()) => {}
                Err(err) if err.is_unsupported() => skipped.push(self.skip(&field, &err)),
                Err(err) => return Err(err),
            }
        }
        Ok(skipped)
    }

    fn skip(&mut self, field: &FieldDescriptor, err: &EngineError) -> UnsupportedField {
        let reason = err.to_string();
        tracing::warn!(field = %field.key, %reason, "leaving field at its zero value");
        self.record(BuildEvent::SkippedField {
            field: field.key.clone(),
            reason: reason.clone(),
        });
        UnsupportedField {
            field: field.key.clone(),
            reason,
        }
    }

    /// A fresh instance of `tag`, going through the stand-in for abstract
    /// types.
    pub(crate) fn instantiate(&self, tag: &TypeTag) -> Result<ObjectRef, EngineError> {
        let is_abstract = self
            .catalog
            .require(tag)?
            .as_record()
            .is_some_and(|record| record.is_abstract);
        if is_abstract {
            self.instantiator
                .instantiate_anonymous_subtype(self.catalog, tag)
        } else {
            self.instantiator.instantiate(self.catalog, tag)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use prefab_core::{DeclaredType, FieldDef, FieldwiseEquality, ScalarKind, TypeDef};

    use super::*;

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(
                TypeDef::record(
                    "Point",
                    vec![
                        FieldDef::new("x", DeclaredType::scalar(ScalarKind::I32)),
                        FieldDef::new("y", DeclaredType::scalar(ScalarKind::I32)),
                    ],
                )
                .with_equality(Rc::new(FieldwiseEquality)),
            )
            .unwrap();
        catalog
            .register(TypeDef::enumeration("Color", &["RED", "GREEN", "BLUE"]))
            .unwrap();
        catalog.register(TypeDef::new("Socket", TypeKind::Opaque)).unwrap();
        catalog
    }

    #[test]
    fn containers_pair_their_elements() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let tag = TypeTag::generic("List", [TypeTag::of("Color")]);
        builder.ensure_registered(&tag).unwrap();
        let pair = builder.registry().get(&tag).unwrap();
        assert_eq!(pair.red, Value::List(vec![Value::constant("Color", 0)]));
        assert_eq!(pair.black, Value::List(vec![Value::constant("Color", 1)]));
        assert!(builder.registry().contains(&TypeTag::of("Color")));
    }

    #[test]
    fn unresolved_generics_use_object_pair() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let red = builder.give_red(&TypeTag::of("Optional")).unwrap();
        let object_red = builder.give_red(&TypeTag::object()).unwrap();
        assert_eq!(red, Value::Optional(Some(Box::new(object_red))));
    }

    #[test]
    fn nested_arrays_wrap_component_pairs() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let tag = TypeTag::array_of(TypeTag::scalar(ScalarKind::Bool));
        assert_eq!(
            builder.give_black(&tag).unwrap(),
            Value::Array(vec![Value::Bool(false)])
        );
    }

    #[test]
    fn records_are_memoized() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let tag = TypeTag::of("Point");
        let first = builder.give_red(&tag).unwrap();
        let second = builder.give_red(&tag).unwrap();
        assert_eq!(first, second, "same object, not just an equal one");
        assert_eq!(first.to_string(), "Point{x=1, y=1}");
        assert_eq!(builder.give_black(&tag).unwrap().to_string(), "Point{x=2, y=2}");
    }

    #[test]
    fn give_other_alternates() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let tag = TypeTag::of("Color");
        let red = builder.give_red(&tag).unwrap();
        let black = builder.give_other(&tag, &red).unwrap();
        assert_eq!(black, Value::constant("Color", 1));
        assert_eq!(builder.give_other(&tag, &black).unwrap(), red);
    }

    #[test]
    fn opaque_types_are_unsupported() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let err = builder.ensure_registered(&TypeTag::of("Socket")).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn manual_prefab_wins_over_derivation() {
        let catalog = catalog();
        let mut builder = GraphBuilder::new(&catalog);
        let tag = TypeTag::of("Color");
        builder
            .add_prefab(tag.clone(), Value::constant("Color", 2), Value::constant("Color", 0))
            .unwrap();
        builder.ensure_registered(&tag).unwrap();
        assert_eq!(builder.give_red(&tag).unwrap(), Value::constant("Color", 2));
    }

    #[test]
    fn trace_records_registrations_when_enabled() {
        let catalog = catalog();
        let mut builder = GraphBuilder::with_config(&catalog, BuildConfig::default().with_trace());
        builder.ensure_registered(&TypeTag::of("Point")).unwrap();
        let trace = builder.take_trace();
        assert_eq!(
            trace.first(),
            Some(&BuildEvent::Enter {
                tag: TypeTag::of("Point"),
                depth: 1
            })
        );
        assert_eq!(
            trace.last(),
            Some(&BuildEvent::Registered {
                tag: TypeTag::of("Point")
            })
        );
        assert!(builder.trace().is_empty());

        let mut quiet = GraphBuilder::new(&catalog);
        quiet.ensure_registered(&TypeTag::of("Point")).unwrap();
        assert!(quiet.trace().is_empty());
    }
}
