//! [`TypeTag`]: a raw type plus its resolved generic arguments.
//!
//! Tags are the keys of the value registry and the entries of the cycle
//! guard, so equality and hashing are structural: `List<Point>` and
//! `List<String>` are different tags, `List<Point>` built twice is the same.
//!
//! Resolution substitutes the enclosing tag's arguments for the type
//! variables a field mentions. Anything that cannot be matched degrades to
//! the variable's bound, or to `Object`, instead of failing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::TypeCatalog;
use crate::name::TypeName;
use crate::types::{DeclaredType, ScalarKind};

/// An immutable descriptor of a type and its generic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeTag {
    raw: TypeName,
    generics: Vec<TypeTag>,
}

impl TypeTag {
    /// Catalog name of the top type, also used as the unresolved marker.
    pub const OBJECT: &'static str = "Object";
    /// Catalog name of the nested-array type.
    pub const ARRAY: &'static str = "array";
    /// Catalog name of the text type.
    pub const TEXT: &'static str = "String";

    /// A tag with no generic arguments.
    pub fn of(raw: impl Into<TypeName>) -> Self {
        TypeTag {
            raw: raw.into(),
            generics: Vec::new(),
        }
    }

    pub fn generic(raw: impl Into<TypeName>, generics: impl IntoIterator<Item = TypeTag>) -> Self {
        TypeTag {
            raw: raw.into(),
            generics: generics.into_iter().collect(),
        }
    }

    pub fn scalar(kind: ScalarKind) -> Self {
        TypeTag::of(kind.name())
    }

    /// The marker a type variable degrades to when it cannot be resolved.
    pub fn object() -> Self {
        TypeTag::of(Self::OBJECT)
    }

    pub fn array_of(component: TypeTag) -> Self {
        TypeTag::generic(Self::ARRAY, [component])
    }

    pub fn raw(&self) -> &TypeName {
        &self.raw
    }

    pub fn generics(&self) -> &[TypeTag] {
        &self.generics
    }

    /// The `index`th generic argument, or `Object` when absent.
    pub fn generic_or_object(&self, index: usize) -> TypeTag {
        self.generics.get(index).cloned().unwrap_or_else(TypeTag::object)
    }

    /// How deeply generic arguments nest: 0 for a plain type, 1 for
    /// `List<String>`, 2 for `List<List<String>>`.
    pub fn nesting(&self) -> usize {
        self.generics
            .iter()
            .map(|arg| arg.nesting() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn is_unresolved(&self) -> bool {
        self.raw.as_str() == Self::OBJECT && self.generics.is_empty()
    }

    /// Resolves a declared type inside the generic context of `enclosing`.
    ///
    /// Arrays in this position become `array<Component>` tags. Field-level
    /// arrays are unwrapped by the caller before getting here; see
    /// [`FieldDescriptor`](crate::field::FieldDescriptor).
    pub fn resolve(declared: &DeclaredType, enclosing: &TypeTag, catalog: &TypeCatalog) -> TypeTag {
        resolve_inner(declared, enclosing, catalog, false)
    }
}

fn resolve_inner(
    declared: &DeclaredType,
    enclosing: &TypeTag,
    catalog: &TypeCatalog,
    short_circuit: bool,
) -> TypeTag {
    match declared {
        DeclaredType::Named { name, args } => TypeTag {
            raw: name.clone(),
            generics: args
                .iter()
                .map(|arg| resolve_inner(arg, enclosing, catalog, short_circuit))
                .collect(),
        },
        DeclaredType::Array(component) => {
            TypeTag::array_of(resolve_inner(component, enclosing, catalog, short_circuit))
        }
        DeclaredType::Wildcard { bound } => match bound {
            Some(bound) => resolve_inner(bound, enclosing, catalog, short_circuit),
            None => TypeTag::object(),
        },
        DeclaredType::Var(var) => resolve_var(var, enclosing, catalog, short_circuit),
    }
}

fn resolve_var(
    var: &str,
    enclosing: &TypeTag,
    catalog: &TypeCatalog,
    short_circuit: bool,
) -> TypeTag {
    let Some(def) = catalog.get(enclosing.raw()) else {
        return TypeTag::object();
    };
    let Some(position) = def.generic_params.iter().position(|p| p.name == var) else {
        return TypeTag::object();
    };
    if let Some(bound) = enclosing.generics.get(position) {
        return bound.clone();
    }
    // Unmatched: fall back to the declared bound. A bound that mentions
    // type variables again (`T extends Comparable<T>`) resolves those to
    // Object rather than recursing.
    match &def.generic_params[position].bound {
        Some(bound) if !short_circuit => resolve_inner(bound, enclosing, catalog, true),
        _ => TypeTag::object(),
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)?;
        if let Some((first, rest)) = self.generics.split_first() {
            write!(f, "<{first}")?;
            for tag in rest {
                write!(f, ", {tag}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}
