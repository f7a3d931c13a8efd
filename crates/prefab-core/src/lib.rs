pub mod name;
pub mod types;
pub mod tag;
pub mod field;
pub mod catalog;
pub mod value;
pub mod equality;
pub mod error;

// Re-export commonly used types
pub use name::{FieldKey, TypeName};
pub use types::{
    ContainerKind, DeclaredType, FieldDef, GenericParam, RecordDef, ScalarKind, TypeDef, TypeKind,
};
pub use tag::TypeTag;
pub use field::FieldDescriptor;
pub use catalog::TypeCatalog;
pub use value::{Instance, ObjectRef, Value};
pub use equality::{EqualityContract, FieldwiseEquality, SelectedFieldsEquality};
pub use error::CoreError;
