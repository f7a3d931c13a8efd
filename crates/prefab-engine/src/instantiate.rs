//! Raw instantiation: producing a record instance without running any
//! constructor logic, with every instance field at its zero value.

use prefab_core::{Instance, ObjectRef, TypeCatalog, TypeKind, TypeTag};

use crate::error::EngineError;

/// Produces fresh, zero-initialized instances.
///
/// Each call must return a new object; the engine calls it exactly once per
/// instance it hands out.
pub trait RawInstantiator {
    /// A zeroed instance of the concrete record type `tag`.
    fn instantiate(&self, catalog: &TypeCatalog, tag: &TypeTag) -> Result<ObjectRef, EngineError>;

    /// A zeroed instance of some concrete subtype of the abstract record
    /// `tag`.
    fn instantiate_anonymous_subtype(
        &self,
        catalog: &TypeCatalog,
        tag: &TypeTag,
    ) -> Result<ObjectRef, EngineError>;
}

/// Builds instances straight from catalog descriptors. Abstract types are
/// instantiated through their registered stand-in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroInstantiator;

impl ZeroInstantiator {
    fn zeroed(catalog: &TypeCatalog, tag: &TypeTag) -> Result<ObjectRef, EngineError> {
        let mut instance = Instance::new(tag.clone());
        for field in catalog.fields_of(tag)? {
            if field.is_static {
                continue;
            }
            let zero = catalog.zero_of_field(&field);
            instance.fields.insert(field.key, zero);
        }
        Ok(ObjectRef::new(instance))
    }
}

impl RawInstantiator for ZeroInstantiator {
    fn instantiate(&self, catalog: &TypeCatalog, tag: &TypeTag) -> Result<ObjectRef, EngineError> {
        let def = catalog.require(tag)?;
        match &def.kind {
            TypeKind::Record(record) if record.is_abstract => Err(EngineError::Instantiation {
                tag: tag.clone(),
                reason: "type is abstract".to_string(),
            }),
            TypeKind::Record(_) => Self::zeroed(catalog, tag),
            _ => Err(EngineError::Instantiation {
                tag: tag.clone(),
                reason: "not a record type".to_string(),
            }),
        }
    }

    fn instantiate_anonymous_subtype(
        &self,
        catalog: &TypeCatalog,
        tag: &TypeTag,
    ) -> Result<ObjectRef, EngineError> {
        let stand_in = stand_in_of(catalog, tag)?;
        self.instantiate(catalog, &stand_in)
    }
}

/// The concrete tag instances of `tag` are built as: the stand-in (carrying
/// `tag`'s generic arguments) for abstract records, `tag` itself otherwise.
pub fn stand_in_of(catalog: &TypeCatalog, tag: &TypeTag) -> Result<TypeTag, EngineError> {
    let def = catalog.require(tag)?;
    match def.as_record() {
        Some(record) if record.is_abstract => match &record.stand_in {
            Some(name) => Ok(TypeTag::generic(name.clone(), tag.generics().iter().cloned())),
            None => Err(EngineError::Instantiation {
                tag: tag.clone(),
                reason: "abstract type has no stand-in subtype".to_string(),
            }),
        },
        _ => Ok(tag.clone()),
    }
}

#[cfg(test)]
mod tests {
    use prefab_core::{DeclaredType, FieldDef, FieldKey, ScalarKind, TypeDef, TypeName, Value};

    use super::*;

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(
                TypeDef::record(
                    "Shape",
                    vec![FieldDef::new("sides", DeclaredType::scalar(ScalarKind::I32))],
                )
                .abstract_with(Some(TypeName::new("AnyShape"))),
            )
            .unwrap();
        catalog
            .register(
                TypeDef::record(
                    "AnyShape",
                    vec![
                        FieldDef::new("label", DeclaredType::named("String")),
                        FieldDef::new("count", DeclaredType::scalar(ScalarKind::I64))
                            .static_with(Value::I64(3)),
                    ],
                )
                .extending(DeclaredType::named("Shape")),
            )
            .unwrap();
        catalog
            .register(TypeDef::record("Blob", vec![]).abstract_with(None))
            .unwrap();
        catalog
    }

    #[test]
    fn instances_are_zeroed_and_skip_statics() {
        let catalog = catalog();
        let object = ZeroInstantiator
            .instantiate(&catalog, &TypeTag::of("AnyShape"))
            .unwrap();
        let instance = object.borrow();
        assert_eq!(instance.fields.len(), 2);
        assert_eq!(instance.get(&FieldKey::new("AnyShape", "label")), Some(&Value::Null));
        assert_eq!(instance.get(&FieldKey::new("Shape", "sides")), Some(&Value::I32(0)));
    }

    #[test]
    fn every_call_is_a_new_object() {
        let catalog = catalog();
        let tag = TypeTag::of("AnyShape");
        let a = ZeroInstantiator.instantiate(&catalog, &tag).unwrap();
        let b = ZeroInstantiator.instantiate(&catalog, &tag).unwrap();
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn abstract_types_go_through_stand_in() {
        let catalog = catalog();
        let shape = TypeTag::of("Shape");
        assert!(matches!(
            ZeroInstantiator.instantiate(&catalog, &shape),
            Err(EngineError::Instantiation { .. })
        ));
        let object = ZeroInstantiator
            .instantiate_anonymous_subtype(&catalog, &shape)
            .unwrap();
        assert_eq!(object.tag(), TypeTag::of("AnyShape"));
    }

    #[test]
    fn abstract_without_stand_in_fails() {
        let catalog = catalog();
        assert!(matches!(
            ZeroInstantiator.instantiate_anonymous_subtype(&catalog, &TypeTag::of("Blob")),
            Err(EngineError::Instantiation { .. })
        ));
    }
}
