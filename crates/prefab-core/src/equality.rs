//! The equality/hash pair under test.
//!
//! A type's [`EqualityContract`] is what fixtures are built to probe. Two
//! implementations cover the common shapes: [`FieldwiseEquality`] (every
//! significant field) and [`SelectedFieldsEquality`] (a named subset).

use crate::catalog::TypeCatalog;
use crate::name::FieldKey;
use crate::value::{combine, Instance, Value};

/// A user-supplied equality and hash function pair for one record type.
pub trait EqualityContract {
    fn equals(&self, catalog: &TypeCatalog, left: &Instance, right: &Instance) -> bool;

    fn hash_code(&self, catalog: &TypeCatalog, instance: &Instance) -> u64;
}

/// Compares same-typed instances on every non-static, non-transient field.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldwiseEquality;

impl FieldwiseEquality {
    fn significant_keys(catalog: &TypeCatalog, instance: &Instance) -> Vec<FieldKey> {
        match catalog.fields_of(&instance.tag) {
            Ok(fields) => fields
                .into_iter()
                .filter(|f| !f.is_static && !f.is_transient)
                .map(|f| f.key)
                .collect(),
            Err(_) => instance.fields.keys().cloned().collect(),
        }
    }
}

impl EqualityContract for FieldwiseEquality {
    fn equals(&self, catalog: &TypeCatalog, left: &Instance, right: &Instance) -> bool {
        if left.tag.raw() != right.tag.raw() {
            return false;
        }
        Self::significant_keys(catalog, left).iter().all(|key| {
            let l = left.get(key).unwrap_or(&Value::Null);
            let r = right.get(key).unwrap_or(&Value::Null);
            l.equals(r, catalog)
        })
    }

    fn hash_code(&self, catalog: &TypeCatalog, instance: &Instance) -> u64 {
        Self::significant_keys(catalog, instance)
            .iter()
            .fold(17u64, |h, key| {
                let v = instance.get(key).unwrap_or(&Value::Null);
                combine(h, v.hash_code(catalog))
            })
    }
}

/// Compares same-typed instances on the named fields only.
#[derive(Debug, Clone, Default)]
pub struct SelectedFieldsEquality {
    pub fields: Vec<String>,
}

impl SelectedFieldsEquality {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SelectedFieldsEquality {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl EqualityContract for SelectedFieldsEquality {
    fn equals(&self, catalog: &TypeCatalog, left: &Instance, right: &Instance) -> bool {
        left.tag.raw() == right.tag.raw()
            && self.fields.iter().all(|name| {
                let l = left.get_named(name).unwrap_or(&Value::Null);
                let r = right.get_named(name).unwrap_or(&Value::Null);
                l.equals(r, catalog)
            })
    }

    fn hash_code(&self, catalog: &TypeCatalog, instance: &Instance) -> u64 {
        self.fields.iter().fold(17u64, |h, name| {
            let v = instance.get_named(name).unwrap_or(&Value::Null);
            combine(h, v.hash_code(catalog))
        })
    }
}
