//! Pairs that never need building: scalars, text and the top type, plus
//! the rules that derive container, array and enum pairs from their parts.

use prefab_core::{
    ContainerKind, Instance, ObjectRef, ScalarKind, TypeCatalog, TypeDef, TypeTag, Value,
};

use crate::error::EngineError;
use crate::registry::PrefabPair;

pub(crate) fn scalar_pair(kind: ScalarKind) -> PrefabPair {
    let (red, black) = match kind {
        ScalarKind::Bool => (Value::Bool(true), Value::Bool(false)),
        ScalarKind::I8 => (Value::I8(1), Value::I8(2)),
        ScalarKind::I16 => (Value::I16(1), Value::I16(2)),
        ScalarKind::I32 => (Value::I32(1), Value::I32(2)),
        ScalarKind::I64 => (Value::I64(1), Value::I64(2)),
        ScalarKind::U8 => (Value::U8(1), Value::U8(2)),
        ScalarKind::U16 => (Value::U16(1), Value::U16(2)),
        ScalarKind::U32 => (Value::U32(1), Value::U32(2)),
        ScalarKind::U64 => (Value::U64(1), Value::U64(2)),
        ScalarKind::F32 => (Value::F32(0.5), Value::F32(1.0)),
        ScalarKind::F64 => (Value::F64(0.5), Value::F64(1.0)),
        ScalarKind::Char => (Value::Char('a'), Value::Char('b')),
    };
    PrefabPair::new(red, black)
}

/// Every pair a fresh registry starts with.
pub(crate) fn seeded_pairs() -> Vec<(TypeTag, PrefabPair)> {
    let mut pairs: Vec<(TypeTag, PrefabPair)> = ScalarKind::ALL
        .into_iter()
        .map(|kind| (TypeTag::scalar(kind), scalar_pair(kind)))
        .collect();
    pairs.push((
        TypeTag::of(TypeTag::TEXT),
        PrefabPair::with_copy(Value::text("one"), Value::text("two"), Value::text("one")),
    ));
    // Two bare objects, equal only to themselves.
    let object = || Value::Object(ObjectRef::new(Instance::new(TypeTag::object())));
    pairs.push((TypeTag::object(), PrefabPair::new(object(), object())));
    pairs
}

/// A single-element container of each element pair's red, and of its black.
///
/// `elements` holds one pair per generic argument: `[E]` for lists, sets
/// and optionals, `[K, V]` for maps.
pub(crate) fn container_pair(kind: ContainerKind, elements: &[PrefabPair]) -> PrefabPair {
    let pick = |which: fn(&PrefabPair) -> &Value, at: usize| -> Value {
        elements.get(at).map_or(Value::Null, |pair| which(pair).clone())
    };
    let build = |which: fn(&PrefabPair) -> &Value| -> Value {
        match kind {
            ContainerKind::List => Value::List(vec![pick(which, 0)]),
            ContainerKind::Set => Value::Set(vec![pick(which, 0)]),
            ContainerKind::Optional => Value::Optional(Some(Box::new(pick(which, 0)))),
            ContainerKind::Map => Value::Map(vec![(pick(which, 0), pick(which, 1))]),
        }
    };
    PrefabPair::with_copy(
        build(|p| &p.red),
        build(|p| &p.black),
        build(|p| &p.red_copy),
    )
}

/// Single-element arrays of the component's red and black.
pub(crate) fn array_pair(component: &PrefabPair) -> PrefabPair {
    PrefabPair::with_copy(
        Value::Array(vec![component.red.clone()]),
        Value::Array(vec![component.black.clone()]),
        Value::Array(vec![component.red_copy.clone()]),
    )
}

/// The first two constants. A lone constant pairs with null.
pub(crate) fn enum_pair(tag: &TypeTag, def: &TypeDef) -> Result<PrefabPair, EngineError> {
    let constant = |index: u32| Value::constant(def.name.clone(), index);
    match def.constants().len() {
        0 => Err(EngineError::EmptyEnum { tag: tag.clone() }),
        1 => Ok(PrefabPair::new(constant(0), Value::Null)),
        _ => Ok(PrefabPair::new(constant(0), constant(1))),
    }
}

/// Whether a pair's values both fit `catalog`'s idea of the type. Only
/// checks what can be checked cheaply: scalar variants and object tags.
pub(crate) fn fits(catalog: &TypeCatalog, tag: &TypeTag, value: &Value) -> bool {
    use prefab_core::TypeKind;

    let Some(def) = catalog.get(tag.raw()) else {
        return true;
    };
    match (&def.kind, value) {
        (_, Value::Null) => true,
        (TypeKind::Scalar(kind), v) => kind.zero().type_name() == v.type_name(),
        (TypeKind::Text, v) => matches!(v, Value::Text(_)),
        (TypeKind::Enum(_), Value::Enum { ty, .. }) => ty == &def.name,
        (TypeKind::Enum(_), _) => false,
        (TypeKind::Record(_), Value::Object(_)) => true,
        (TypeKind::Record(_), _) => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_seeded_pair_is_distinct() {
        let catalog = TypeCatalog::new();
        for (tag, pair) in seeded_pairs() {
            assert!(
                !pair.red.equals(&pair.black, &catalog),
                "seeded pair for {tag} is degenerate"
            );
            assert!(pair.red.equals(&pair.red_copy, &catalog), "{tag}");
        }
    }

    #[test]
    fn map_pair_uses_key_and_value_pairs() {
        let pair = container_pair(
            ContainerKind::Map,
            &[scalar_pair(ScalarKind::Char), scalar_pair(ScalarKind::I32)],
        );
        assert_eq!(
            pair.red,
            Value::Map(vec![(Value::Char('a'), Value::I32(1))])
        );
        assert_eq!(
            pair.black,
            Value::Map(vec![(Value::Char('b'), Value::I32(2))])
        );
    }

    #[test]
    fn single_constant_enum_pairs_with_null() {
        let def = TypeDef::enumeration("Unit", &["ONLY"]);
        let pair = enum_pair(&TypeTag::of("Unit"), &def).unwrap();
        assert_eq!(pair.red, Value::constant("Unit", 0));
        assert_eq!(pair.black, Value::Null);

        let empty = TypeDef::enumeration("Never", &[]);
        assert!(matches!(
            enum_pair(&TypeTag::of("Never"), &empty),
            Err(EngineError::EmptyEnum { .. })
        ));
    }

    #[test]
    fn scalar_pairs_are_distinct_and_non_zero() {
        for kind in ScalarKind::ALL {
            let pair = scalar_pair(kind);
            assert_ne!(pair.red, pair.black, "{kind:?}");
            assert_ne!(pair.red, kind.zero(), "{kind:?}");
            assert_eq!(pair.red.type_name(), kind.zero().type_name());
        }
    }
}
