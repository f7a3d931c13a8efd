//! The [`TypeCatalog`]: every type definition the engine can see, plus the
//! current values of static fields.
//!
//! On construction the catalog pre-registers the built-in types:
//! - the 12 scalars (`bool`, `i8`..`u64`, `f32`, `f64`, `char`)
//! - `String` (text), `Object` (top type / unresolved marker)
//! - `array` (nested arrays), `List`, `Set`, `Map`, `Optional`

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::equality::EqualityContract;
use crate::error::CoreError;
use crate::field::FieldDescriptor;
use crate::name::{FieldKey, TypeName};
use crate::tag::TypeTag;
use crate::types::{
    ContainerKind, DeclaredType, FieldDef, GenericParam, ScalarKind, TypeDef, TypeKind,
};
use crate::value::Value;

/// Registry of type definitions, keyed by [`TypeName`].
///
/// Static field values live here as well, behind a `RefCell`, because they
/// belong to the type rather than to any instance. They are mutated through
/// a shared `&TypeCatalog` while fixtures are built.
#[derive(Debug)]
pub struct TypeCatalog {
    defs: IndexMap<TypeName, TypeDef>,
    statics: RefCell<HashMap<FieldKey, Value>>,
}

impl TypeCatalog {
    /// Creates a catalog with all built-in types registered.
    pub fn new() -> Self {
        let mut defs = IndexMap::new();
        let mut builtin = |def: TypeDef| {
            defs.insert(def.name.clone(), def);
        };

        for kind in ScalarKind::ALL {
            builtin(TypeDef::new(kind.name(), TypeKind::Scalar(kind)));
        }
        builtin(TypeDef::new(TypeTag::TEXT, TypeKind::Text));
        builtin(TypeDef::new(TypeTag::OBJECT, TypeKind::Object));
        builtin(
            TypeDef::new(TypeTag::ARRAY, TypeKind::Array).with_params(vec![GenericParam::new("E")]),
        );
        for kind in [ContainerKind::List, ContainerKind::Set, ContainerKind::Optional] {
            builtin(
                TypeDef::new(kind.name(), TypeKind::Container(kind))
                    .with_params(vec![GenericParam::new("E")]),
            );
        }
        builtin(
            TypeDef::new(ContainerKind::Map.name(), TypeKind::Container(ContainerKind::Map))
                .with_params(vec![GenericParam::new("K"), GenericParam::new("V")]),
        );

        TypeCatalog {
            defs,
            statics: RefCell::new(HashMap::new()),
        }
    }

    /// Registers a type definition.
    ///
    /// Static fields of a record start out at their declared initial value,
    /// or at the zero value of their type.
    pub fn register(&mut self, def: TypeDef) -> Result<(), CoreError> {
        if self.defs.contains_key(&def.name) {
            return Err(CoreError::DuplicateTypeName {
                name: def.name.to_string(),
            });
        }
        if let Some(record) = def.as_record() {
            let mut statics = self.statics.borrow_mut();
            for field in record.fields.iter().filter(|f| f.is_static) {
                let initial = match &field.initial {
                    Some(value) => value.clone(),
                    None => self.zero_of_declared(&field.declared),
                };
                statics.insert(FieldKey::new(def.name.clone(), &field.name), initial);
            }
        }
        self.defs.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn get(&self, name: &TypeName) -> Option<&TypeDef> {
        self.defs.get(name)
    }

    /// Looks up the definition for a tag's raw type.
    pub fn require(&self, tag: &TypeTag) -> Result<&TypeDef, CoreError> {
        self.defs.get(tag.raw()).ok_or_else(|| CoreError::UnknownType {
            name: tag.raw().to_string(),
        })
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.defs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// The equality contract of a type, inherited from the nearest
    /// superclass that declares one.
    pub fn equality_of(&self, name: &TypeName) -> Option<Rc<dyn EqualityContract>> {
        let mut seen = HashSet::new();
        let mut current = self.defs.get(name)?;
        loop {
            if let Some(contract) = &current.equality {
                return Some(Rc::clone(contract));
            }
            if !seen.insert(current.name.clone()) {
                return None;
            }
            let superclass = match &current.as_record()?.superclass {
                Some(DeclaredType::Named { name, .. }) => name,
                _ => return None,
            };
            current = self.defs.get(superclass)?;
        }
    }

    /// Enumerates every non-synthetic field of `tag`: its own fields in
    /// declaration order, then those of each superclass. Superclasses are
    /// resolved in the generic context of the type that extends them.
    ///
    /// The order is stable across calls.
    pub fn fields_of(&self, tag: &TypeTag) -> Result<Vec<FieldDescriptor>, CoreError> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut current = tag.clone();

        loop {
            if !seen.insert(current.raw().clone()) {
                return Err(CoreError::InheritanceCycle {
                    name: tag.raw().to_string(),
                });
            }
            let def = self.require(&current)?;
            let Some(record) = def.as_record() else {
                break;
            };
            for field in record.fields.iter().filter(|f| !f.is_synthetic) {
                result.push(self.describe(field, &current));
            }
            match &record.superclass {
                Some(superclass) => current = TypeTag::resolve(superclass, &current, self),
                None => break,
            }
        }
        Ok(result)
    }

    /// Finds one field by name, searching the type before its superclasses.
    pub fn field_named(&self, tag: &TypeTag, name: &str) -> Result<FieldDescriptor, CoreError> {
        self.fields_of(tag)?
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| CoreError::FieldNotFound {
                owner: tag.to_string(),
                field: name.to_string(),
            })
    }

    fn describe(&self, field: &FieldDef, enclosing: &TypeTag) -> FieldDescriptor {
        let (is_array, tag) = match &field.declared {
            DeclaredType::Array(component) => (true, TypeTag::resolve(component, enclosing, self)),
            other => (false, TypeTag::resolve(other, enclosing, self)),
        };
        FieldDescriptor {
            key: FieldKey::new(enclosing.raw().clone(), &field.name),
            declared: field.declared.clone(),
            enclosing: enclosing.clone(),
            tag,
            is_array,
            is_static: field.is_static,
            is_final: field.is_final,
            is_transient: field.is_transient,
        }
    }

    /// The value a raw-instantiated slot of this type holds: zero for
    /// scalars, null for everything else.
    pub fn zero_of(&self, tag: &TypeTag) -> Value {
        match self.get(tag.raw()).map(|def| &def.kind) {
            Some(TypeKind::Scalar(kind)) => kind.zero(),
            _ => Value::Null,
        }
    }

    /// Zero value for a field: arrays are absent until populated.
    pub fn zero_of_field(&self, field: &FieldDescriptor) -> Value {
        if field.is_array {
            Value::Null
        } else {
            self.zero_of(&field.tag)
        }
    }

    fn zero_of_declared(&self, declared: &DeclaredType) -> Value {
        match declared {
            DeclaredType::Named { name, .. } => self.zero_of(&TypeTag::of(name.clone())),
            _ => Value::Null,
        }
    }

    // -------------------------------------------------------------------
    // Static field store
    // -------------------------------------------------------------------

    pub fn static_value(&self, key: &FieldKey) -> Option<Value> {
        self.statics.borrow().get(key).cloned()
    }

    /// Overwrites a static field's value. Returns the previous value.
    pub fn set_static_value(&self, key: &FieldKey, value: Value) -> Result<Value, CoreError> {
        let mut statics = self.statics.borrow_mut();
        match statics.get_mut(key) {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(CoreError::FieldNotFound {
                owner: key.owner.to_string(),
                field: key.name.to_string(),
            }),
        }
    }

    /// Copies out the static fields declared by `owner`.
    pub fn statics_of(&self, owner: &TypeName) -> Vec<(FieldKey, Value)> {
        self.statics
            .borrow()
            .iter()
            .filter(|(key, _)| &key.owner == owner)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldDef, TypeDef};

    fn scalar_field(name: &str, kind: ScalarKind) -> FieldDef {
        FieldDef::new(name, DeclaredType::scalar(kind))
    }

    #[test]
    fn new_catalog_has_builtins() {
        let catalog = TypeCatalog::new();
        // 12 scalars + String + Object + array + List, Set, Optional, Map
        assert_eq!(catalog.len(), 19);
        assert!(catalog.contains(&TypeName::new("i32")));
        assert!(catalog.contains(&TypeName::new("Map")));
        assert!(catalog.get(&TypeName::new("Object")).unwrap().is_seeded());
    }

    #[test]
    fn duplicate_name_returns_error() {
        let mut catalog = TypeCatalog::new();
        catalog.register(TypeDef::record("Foo", vec![])).unwrap();
        match catalog.register(TypeDef::record("Foo", vec![])) {
            Err(CoreError::DuplicateTypeName { name }) => assert_eq!(name, "Foo"),
            other => panic!("expected DuplicateTypeName, got {other:?}"),
        }
    }

    #[test]
    fn fields_of_preserves_declaration_order_and_skips_synthetic() {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(TypeDef::record(
                "Ordered",
                vec![
                    scalar_field("z", ScalarKind::I32),
                    scalar_field("this$0", ScalarKind::I64).synthetic(),
                    scalar_field("a", ScalarKind::Bool),
                ],
            ))
            .unwrap();

        let fields = catalog.fields_of(&TypeTag::of("Ordered")).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["z", "a"]);

        let again = catalog.fields_of(&TypeTag::of("Ordered")).unwrap();
        assert_eq!(fields, again);
    }

    #[test]
    fn inherited_fields_resolve_in_subclass_context() {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(
                TypeDef::record("Holder", vec![FieldDef::new("value", DeclaredType::var("T"))])
                    .with_params(vec![GenericParam::new("T")]),
            )
            .unwrap();
        catalog
            .register(
                TypeDef::record("Named", vec![scalar_field("id", ScalarKind::I32)]).extending(
                    DeclaredType::generic("Holder", vec![DeclaredType::named("String")]),
                ),
            )
            .unwrap();

        let fields = catalog.fields_of(&TypeTag::of("Named")).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key, FieldKey::new("Named", "id"));
        assert_eq!(fields[1].key, FieldKey::new("Holder", "value"));
        assert_eq!(fields[1].tag, TypeTag::of("String"));
        assert_eq!(
            fields[1].enclosing,
            TypeTag::generic("Holder", [TypeTag::of("String")])
        );
    }

    #[test]
    fn array_field_tag_is_component() {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(TypeDef::record(
                "Bytes",
                vec![FieldDef::new(
                    "data",
                    DeclaredType::array(DeclaredType::scalar(ScalarKind::U8)),
                )],
            ))
            .unwrap();
        let field = catalog.field_named(&TypeTag::of("Bytes"), "data").unwrap();
        assert!(field.is_array);
        assert_eq!(field.tag, TypeTag::scalar(ScalarKind::U8));
        assert_eq!(catalog.zero_of_field(&field), Value::Null);
    }

    #[test]
    fn inheritance_cycle_is_reported() {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(TypeDef::record("A", vec![]).extending(DeclaredType::named("B")))
            .unwrap();
        catalog
            .register(TypeDef::record("B", vec![]).extending(DeclaredType::named("A")))
            .unwrap();
        assert!(matches!(
            catalog.fields_of(&TypeTag::of("A")),
            Err(CoreError::InheritanceCycle { .. })
        ));
    }

    #[test]
    fn static_fields_start_at_initial_or_zero() {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(TypeDef::record(
                "Counter",
                vec![
                    scalar_field("count", ScalarKind::I32).static_with(Value::I32(7)),
                    FieldDef {
                        is_static: true,
                        ..scalar_field("hits", ScalarKind::I64)
                    },
                ],
            ))
            .unwrap();

        let count = FieldKey::new("Counter", "count");
        let hits = FieldKey::new("Counter", "hits");
        assert_eq!(catalog.static_value(&count), Some(Value::I32(7)));
        assert_eq!(catalog.static_value(&hits), Some(Value::I64(0)));

        let previous = catalog.set_static_value(&count, Value::I32(8)).unwrap();
        assert_eq!(previous, Value::I32(7));
        assert_eq!(catalog.statics_of(&TypeName::new("Counter")).len(), 2);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let catalog = TypeCatalog::new();
        assert!(matches!(
            catalog.require(&TypeTag::of("Missing")),
            Err(CoreError::UnknownType { .. })
        ));
    }
}
