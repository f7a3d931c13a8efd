//! Dynamic value representation for instances under test.
//!
//! [`Value`] is the runtime counterpart of the [`TypeCatalog`]'s static
//! descriptors. Record instances are shared, interior-mutable
//! [`ObjectRef`]s: cloning one copies the reference, not the object, which
//! is what field-level copying and identity checks rely on.
//!
//! Two notions of equality exist:
//! - `==` ([`PartialEq`]) is raw: scalars by value, floats by bit pattern,
//!   objects by identity.
//! - [`Value::equals`] is the equality under test: objects are compared by
//!   their type's [`EqualityContract`](crate::equality::EqualityContract).

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::catalog::TypeCatalog;
use crate::name::{FieldKey, TypeName};
use crate::tag::TypeTag;

/// A runtime value held by a field, a registry entry or a fixture.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Text(Rc<str>),
    /// An enum constant, by declaration index.
    Enum { ty: TypeName, index: u32 },
    Array(Vec<Value>),
    List(Vec<Value>),
    /// Insertion-ordered; compared without regard to order.
    Set(Vec<Value>),
    /// Insertion-ordered entries; compared by key lookup.
    Map(Vec<(Value, Value)>),
    Optional(Option<Box<Value>>),
    Object(ObjectRef),
}

impl Value {
    pub fn text(s: impl AsRef<str>) -> Value {
        Value::Text(Rc::from(s.as_ref()))
    }

    pub fn constant(ty: impl Into<TypeName>, index: u32) -> Value {
        Value::Enum {
            ty: ty.into(),
            index,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Human-readable name of the value's variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::I8(_) => "I8",
            Value::I16(_) => "I16",
            Value::I32(_) => "I32",
            Value::I64(_) => "I64",
            Value::U8(_) => "U8",
            Value::U16(_) => "U16",
            Value::U32(_) => "U32",
            Value::U64(_) => "U64",
            Value::F32(_) => "F32",
            Value::F64(_) => "F64",
            Value::Char(_) => "Char",
            Value::Text(_) => "Text",
            Value::Enum { .. } => "Enum",
            Value::Array(_) => "Array",
            Value::List(_) => "List",
            Value::Set(_) => "Set",
            Value::Map(_) => "Map",
            Value::Optional(_) => "Optional",
            Value::Object(_) => "Object",
        }
    }

    /// Equality under test. Objects defer to their type's contract, or to
    /// identity when the type declares none. Arrays compare deeply.
    pub fn equals(&self, other: &Value, catalog: &TypeCatalog) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) | (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y, catalog))
            }
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.equals(y, catalog)))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter()
                            .find(|(other_key, _)| key.equals(other_key, catalog))
                            .is_some_and(|(_, other_value)| value.equals(other_value, catalog))
                    })
            }
            (Value::Optional(a), Value::Optional(b)) => match (a, b) {
                (Some(x), Some(y)) => x.equals(y, catalog),
                (None, None) => true,
                _ => false,
            },
            (Value::Object(a), Value::Object(b)) => a.equals(b, catalog),
            _ => self == other,
        }
    }

    /// Hash consistent with [`Value::equals`].
    pub fn hash_code(&self, catalog: &TypeCatalog) -> u64 {
        match self {
            Value::Null => 0,
            Value::Bool(true) => 1231,
            Value::Bool(false) => 1237,
            Value::I8(v) => *v as u64,
            Value::I16(v) => *v as u64,
            Value::I32(v) => *v as u64,
            Value::I64(v) => *v as u64,
            Value::U8(v) => *v as u64,
            Value::U16(v) => *v as u64,
            Value::U32(v) => *v as u64,
            Value::U64(v) => *v,
            Value::F32(v) => v.to_bits() as u64,
            Value::F64(v) => v.to_bits(),
            Value::Char(c) => *c as u64,
            Value::Text(s) => s.chars().fold(0u64, |h, c| combine(h, c as u64)),
            Value::Enum { ty, index } => {
                let h = ty.as_str().chars().fold(0u64, |h, c| combine(h, c as u64));
                combine(h, *index as u64)
            }
            Value::Array(items) | Value::List(items) => items
                .iter()
                .fold(1u64, |h, item| combine(h, item.hash_code(catalog))),
            Value::Set(items) => items
                .iter()
                .fold(0u64, |h, item| h.wrapping_add(item.hash_code(catalog))),
            Value::Map(entries) => entries.iter().fold(0u64, |h, (key, value)| {
                h.wrapping_add(key.hash_code(catalog) ^ value.hash_code(catalog))
            }),
            Value::Optional(inner) => inner.as_ref().map_or(0, |v| v.hash_code(catalog)),
            Value::Object(object) => object.hash_code(catalog),
        }
    }
}

/// `31 * h + x`, wrapping.
pub fn combine(h: u64, x: u64) -> u64 {
    h.wrapping_mul(31).wrapping_add(x)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Enum { ty: t1, index: i1 }, Value::Enum { ty: t2, index: i2 }) => {
                t1 == t2 && i1 == i2
            }
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Optional(a), Value::Optional(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn seq(
            f: &mut fmt::Formatter<'_>,
            open: &str,
            items: &[Value],
            close: &str,
        ) -> fmt::Result {
            f.write_str(open)?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str(close)
        }

        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Char(c) => write!(f, "{c:?}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Enum { ty, index } => write!(f, "{ty}#{index}"),
            Value::Array(items) | Value::List(items) => seq(f, "[", items, "]"),
            Value::Set(items) => seq(f, "{", items, "}"),
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
            Value::Optional(None) => f.write_str("Optional.empty"),
            Value::Optional(Some(inner)) => write!(f, "Optional[{inner}]"),
            Value::Object(object) => write!(f, "{object}"),
        }
    }
}

/// A record instance: its tag and one slot per instance field.
#[derive(Debug, Clone)]
pub struct Instance {
    pub tag: TypeTag,
    pub fields: IndexMap<FieldKey, Value>,
}

impl Instance {
    pub fn new(tag: TypeTag) -> Self {
        Instance {
            tag,
            fields: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &FieldKey) -> Option<&Value> {
        self.fields.get(key)
    }

    /// First field with the given name, in enumeration order.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(key, _)| &*key.name == name)
            .map(|(_, value)| value)
    }
}

/// Shared, mutable handle to an [`Instance`]. Equality via `==` is identity.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Instance>>);

impl ObjectRef {
    pub fn new(instance: Instance) -> Self {
        ObjectRef(Rc::new(RefCell::new(instance)))
    }

    pub fn borrow(&self) -> Ref<'_, Instance> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Instance> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn tag(&self) -> TypeTag {
        self.0.borrow().tag.clone()
    }

    /// Equality under test; see [`Value::equals`].
    pub fn equals(&self, other: &ObjectRef, catalog: &TypeCatalog) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let this = self.borrow();
        match catalog.equality_of(this.tag.raw()) {
            Some(contract) => contract.equals(catalog, &this, &other.borrow()),
            None => false,
        }
    }

    pub fn hash_code(&self, catalog: &TypeCatalog) -> u64 {
        let this = self.borrow();
        match catalog.equality_of(this.tag.raw()) {
            Some(contract) => contract.hash_code(catalog, &this),
            None => Rc::as_ptr(&self.0) as usize as u64,
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(instance) => f
                .debug_struct("ObjectRef")
                .field("tag", &instance.tag)
                .field("fields", &instance.fields)
                .finish(),
            Err(_) => f.write_str("ObjectRef(<borrowed>)"),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instance = self.borrow();
        write!(f, "{}{{", instance.tag)?;
        for (i, (key, value)) in instance.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key.name, value)?;
        }
        f.write_str("}")
    }
}
