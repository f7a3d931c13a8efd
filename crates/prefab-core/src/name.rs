//! Interned type and field names.
//!
//! [`TypeName`] is the nominal identity of a type in the
//! [`TypeCatalog`](crate::catalog::TypeCatalog).
//! It wraps an `Arc<str>` so that tags, field keys and registry entries can
//! share a name without reallocating.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Nominal identity of a type. Cloning is a reference-count bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeName(Arc<str>);

impl TypeName {
    pub fn new(name: impl AsRef<str>) -> Self {
        TypeName(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        TypeName::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        TypeName(Arc::from(name))
    }
}

/// Identity of one field slot in an instance: the declaring type plus the
/// field name. Two fields with the same name declared on a type and on its
/// superclass are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    pub owner: TypeName,
    pub name: Arc<str>,
}

impl FieldKey {
    pub fn new(owner: impl Into<TypeName>, name: impl AsRef<str>) -> Self {
        FieldKey {
            owner: owner.into(),
            name: Arc::from(name.as_ref()),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}
