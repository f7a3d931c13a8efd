//! Type descriptors: what the engine knows about a type without ever
//! seeing the type's Rust definition.
//!
//! A [`TypeDef`] describes one nominal type: its kind (scalar, enum, record,
//! container, ...), its generic parameters, and optionally the
//! [`EqualityContract`] under test. Records carry insertion-ordered
//! [`FieldDef`]s whose declared types may mention the record's generic
//! parameters.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::equality::EqualityContract;
use crate::name::TypeName;
use crate::value::Value;

/// Fixed-width scalar kinds. Each has a seeded red/black pair, so
/// mutation alternates between two known values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 12] = [
        ScalarKind::Bool,
        ScalarKind::I8,
        ScalarKind::I16,
        ScalarKind::I32,
        ScalarKind::I64,
        ScalarKind::U8,
        ScalarKind::U16,
        ScalarKind::U32,
        ScalarKind::U64,
        ScalarKind::F32,
        ScalarKind::F64,
        ScalarKind::Char,
    ];

    /// The catalog name of this scalar (`"i32"`, `"bool"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
        }
    }

    /// The zero value a raw-instantiated field of this kind holds.
    pub fn zero(self) -> Value {
        match self {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::I8 => Value::I8(0),
            ScalarKind::I16 => Value::I16(0),
            ScalarKind::I32 => Value::I32(0),
            ScalarKind::I64 => Value::I64(0),
            ScalarKind::U8 => Value::U8(0),
            ScalarKind::U16 => Value::U16(0),
            ScalarKind::U32 => Value::U32(0),
            ScalarKind::U64 => Value::U64(0),
            ScalarKind::F32 => Value::F32(0.0),
            ScalarKind::F64 => Value::F64(0.0),
            ScalarKind::Char => Value::Char('\0'),
        }
    }
}

/// Built-in generic containers. Their element types come from the tag's
/// generic arguments; a missing argument means `Object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    List,
    Set,
    /// Two arguments: key, value.
    Map,
    Optional,
}

impl ContainerKind {
    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::List => "List",
            ContainerKind::Set => "Set",
            ContainerKind::Map => "Map",
            ContainerKind::Optional => "Optional",
        }
    }

    /// Number of generic arguments the container expects.
    pub fn arity(self) -> usize {
        match self {
            ContainerKind::Map => 2,
            _ => 1,
        }
    }
}

/// A type as written at a field declaration, before any generic
/// substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclaredType {
    /// A nominal type with (possibly empty) type arguments: `List<T>`, `i32`.
    Named {
        name: TypeName,
        args: Vec<DeclaredType>,
    },
    /// A type variable of the enclosing type: `T`.
    Var(String),
    /// An array of the component type: `T[]`.
    Array(Box<DeclaredType>),
    /// A wildcard argument: `?` or `? extends Bound`.
    Wildcard { bound: Option<Box<DeclaredType>> },
}

impl DeclaredType {
    /// A non-generic named type.
    pub fn named(name: impl Into<TypeName>) -> Self {
        DeclaredType::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A named type applied to type arguments.
    pub fn generic(name: impl Into<TypeName>, args: Vec<DeclaredType>) -> Self {
        DeclaredType::Named {
            name: name.into(),
            args,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        DeclaredType::Var(name.into())
    }

    pub fn array(component: DeclaredType) -> Self {
        DeclaredType::Array(Box::new(component))
    }

    pub fn scalar(kind: ScalarKind) -> Self {
        DeclaredType::named(kind.name())
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Named { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            DeclaredType::Var(name) => f.write_str(name),
            DeclaredType::Array(component) => write!(f, "{component}[]"),
            DeclaredType::Wildcard { bound: None } => f.write_str("?"),
            DeclaredType::Wildcard { bound: Some(b) } => write!(f, "? extends {b}"),
        }
    }
}

/// A generic parameter of a type, with an optional upper bound used when
/// the parameter cannot be matched against the enclosing tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericParam {
    pub name: String,
    pub bound: Option<DeclaredType>,
}

impl GenericParam {
    pub fn new(name: impl Into<String>) -> Self {
        GenericParam {
            name: name.into(),
            bound: None,
        }
    }

    pub fn bounded(name: impl Into<String>, bound: DeclaredType) -> Self {
        GenericParam {
            name: name.into(),
            bound: Some(bound),
        }
    }
}

/// One declared field of a record.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub declared: DeclaredType,
    pub is_static: bool,
    pub is_final: bool,
    pub is_transient: bool,
    /// Compiler-generated; never enumerated.
    pub is_synthetic: bool,
    /// Initial value of a static field. Ignored for instance fields.
    pub initial: Option<Value>,
}

impl FieldDef {
    /// A plain mutable instance field.
    pub fn new(name: impl Into<String>, declared: DeclaredType) -> Self {
        FieldDef {
            name: name.into(),
            declared,
            is_static: false,
            is_final: false,
            is_transient: false,
            is_synthetic: false,
            initial: None,
        }
    }

    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn transient(mut self) -> Self {
        self.is_transient = true;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.is_synthetic = true;
        self
    }

    /// Marks the field static, with the value it holds before any run.
    pub fn static_with(mut self, initial: Value) -> Self {
        self.is_static = true;
        self.initial = Some(initial);
        self
    }

    /// Static and final: a constant. Excluded from graph traversal.
    pub fn is_constant(&self) -> bool {
        self.is_static && self.is_final
    }
}

/// Structural definition of a record (class/struct) type.
#[derive(Debug, Clone, Default)]
pub struct RecordDef {
    pub superclass: Option<DeclaredType>,
    pub fields: Vec<FieldDef>,
    pub is_abstract: bool,
    /// Concrete record used to instantiate this type when it is abstract.
    pub stand_in: Option<TypeName>,
}

/// The kind of a type, driving how the engine constructs and mutates it.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Scalar(ScalarKind),
    /// Immutable text value type with a seeded pair.
    Text,
    /// Top type. Also what unresolved type variables resolve to.
    Object,
    /// Array in a nested generic position; element is generic argument 0.
    Array,
    Container(ContainerKind),
    /// Enum constants in declaration order.
    Enum(Vec<String>),
    Record(RecordDef),
    /// A type with no safe construction path.
    Opaque,
}

/// A complete type definition as registered in the catalog.
#[derive(Clone)]
pub struct TypeDef {
    pub name: TypeName,
    pub kind: TypeKind,
    pub generic_params: Vec<GenericParam>,
    /// The equality under test. `None` means identity equality.
    pub equality: Option<Rc<dyn EqualityContract>>,
}

impl TypeDef {
    pub fn new(name: impl Into<TypeName>, kind: TypeKind) -> Self {
        TypeDef {
            name: name.into(),
            kind,
            generic_params: Vec::new(),
            equality: None,
        }
    }

    /// A concrete record with the given fields.
    pub fn record(name: impl Into<TypeName>, fields: Vec<FieldDef>) -> Self {
        TypeDef::new(
            name,
            TypeKind::Record(RecordDef {
                fields,
                ..RecordDef::default()
            }),
        )
    }

    pub fn enumeration(name: impl Into<TypeName>, constants: &[&str]) -> Self {
        TypeDef::new(
            name,
            TypeKind::Enum(constants.iter().map(|c| c.to_string()).collect()),
        )
    }

    pub fn with_params(mut self, params: Vec<GenericParam>) -> Self {
        self.generic_params = params;
        self
    }

    pub fn with_equality(mut self, equality: Rc<dyn EqualityContract>) -> Self {
        self.equality = Some(equality);
        self
    }

    /// Sets the superclass of a record. No effect on other kinds.
    pub fn extending(mut self, superclass: DeclaredType) -> Self {
        if let TypeKind::Record(record) = &mut self.kind {
            record.superclass = Some(superclass);
        }
        self
    }

    /// Marks a record abstract, instantiated through `stand_in`.
    pub fn abstract_with(mut self, stand_in: Option<TypeName>) -> Self {
        if let TypeKind::Record(record) = &mut self.kind {
            record.is_abstract = true;
            record.stand_in = stand_in;
        }
        self
    }

    pub fn as_record(&self) -> Option<&RecordDef> {
        match &self.kind {
            TypeKind::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_))
    }

    pub fn constants(&self) -> &[String] {
        match &self.kind {
            TypeKind::Enum(constants) => constants,
            _ => &[],
        }
    }

    /// Types whose pairs are seeded up front and never built.
    pub fn is_seeded(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Scalar(_) | TypeKind::Text | TypeKind::Object
        )
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("generic_params", &self.generic_params)
            .field("has_equality", &self.equality.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_names_are_unique() {
        let mut names: Vec<&str> = ScalarKind::ALL.iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ScalarKind::ALL.len());
    }

    #[test]
    fn scalar_zero_matches_kind() {
        assert_eq!(ScalarKind::Bool.zero(), Value::Bool(false));
        assert_eq!(ScalarKind::I32.zero(), Value::I32(0));
        assert_eq!(ScalarKind::Char.zero(), Value::Char('\0'));
    }

    #[test]
    fn declared_type_display() {
        let ty = DeclaredType::generic(
            "Map",
            vec![
                DeclaredType::named("String"),
                DeclaredType::array(DeclaredType::var("T")),
            ],
        );
        assert_eq!(ty.to_string(), "Map<String, T[]>");

        let wildcard = DeclaredType::Wildcard {
            bound: Some(Box::new(DeclaredType::named("Number"))),
        };
        assert_eq!(wildcard.to_string(), "? extends Number");
    }

    #[test]
    fn field_builders_set_modifiers() {
        let field = FieldDef::new("INSTANCE", DeclaredType::named("Singleton"))
            .static_with(Value::Null)
            .final_();
        assert!(field.is_constant());
        assert!(!FieldDef::new("x", DeclaredType::scalar(ScalarKind::I32)).is_constant());
    }

    #[test]
    fn abstract_with_only_affects_records() {
        let def = TypeDef::enumeration("Color", &["Red"]).abstract_with(None);
        assert!(def.as_record().is_none());

        let def = TypeDef::record("Shape", vec![]).abstract_with(Some("Square".into()));
        let record = def.as_record().unwrap();
        assert!(record.is_abstract);
        assert_eq!(record.stand_in, Some(TypeName::new("Square")));
    }

    #[test]
    fn declared_type_serde_roundtrip() {
        let ty = DeclaredType::generic("List", vec![DeclaredType::var("T")]);
        let json = serde_json::to_string(&ty).unwrap();
        let back: DeclaredType = serde_json::from_str(&json).unwrap();
        assert_eq!(ty, back);
    }
}
