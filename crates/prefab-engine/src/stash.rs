//! Snapshot and restore of static field state.

use std::collections::HashMap;

use prefab_core::{FieldKey, TypeCatalog, TypeName, Value};

/// Remembers the values static fields held before the engine touched them.
///
/// Owners are backed up the first time the engine builds or mutates one of
/// their fields; later backups of the same owner are no-ops, so the stash
/// always holds the original state. [`StaticStash::release`] writes it back.
/// A stash dropped without being released restores as well.
#[derive(Debug)]
pub struct StaticStash<'c> {
    catalog: &'c TypeCatalog,
    saved: HashMap<FieldKey, Value>,
    backed_up: Vec<TypeName>,
    restore: bool,
}

impl<'c> StaticStash<'c> {
    /// Starts tracking static state in `catalog`. With `restore` false,
    /// release forgets the snapshot instead of writing it back.
    pub fn acquire(catalog: &'c TypeCatalog, restore: bool) -> Self {
        StaticStash {
            catalog,
            saved: HashMap::new(),
            backed_up: Vec::new(),
            restore,
        }
    }

    /// Snapshots `owner`'s static fields unless already done.
    pub fn backup(&mut self, owner: &TypeName) {
        if self.backed_up.contains(owner) {
            return;
        }
        self.backed_up.push(owner.clone());
        for (key, value) in self.catalog.statics_of(owner) {
            self.saved.insert(key, value);
        }
    }

    pub fn is_backed_up(&self, owner: &TypeName) -> bool {
        self.backed_up.contains(owner)
    }

    /// Restores every snapshotted static field and clears the stash.
    pub fn release(mut self) {
        self.restore_all();
    }

    fn restore_all(&mut self) {
        let saved = std::mem::take(&mut self.saved);
        self.backed_up.clear();
        if !self.restore {
            return;
        }
        for (key, value) in saved {
            if let Err(err) = self.catalog.set_static_value(&key, value) {
                tracing::warn!(field = %key, error = %err, "could not restore static field");
            }
        }
    }
}

impl Drop for StaticStash<'_> {
    fn drop(&mut self) {
        self.restore_all();
    }
}

#[cfg(test)]
mod tests {
    use prefab_core::{DeclaredType, FieldDef, ScalarKind, TypeDef};

    use super::*;

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(TypeDef::record(
                "Config",
                vec![FieldDef::new("level", DeclaredType::scalar(ScalarKind::I32))
                    .static_with(Value::I32(3))],
            ))
            .unwrap();
        catalog
    }

    #[test]
    fn release_restores_original_values() {
        let catalog = catalog();
        let key = FieldKey::new("Config", "level");
        let mut stash = StaticStash::acquire(&catalog, true);
        assert!(!stash.is_backed_up(&TypeName::new("Config")));
        stash.backup(&TypeName::new("Config"));
        assert!(stash.is_backed_up(&TypeName::new("Config")));
        catalog.set_static_value(&key, Value::I32(4)).unwrap();
        // A second backup must not capture the modified value.
        stash.backup(&TypeName::new("Config"));
        catalog.set_static_value(&key, Value::I32(5)).unwrap();
        stash.release();
        assert_eq!(catalog.static_value(&key), Some(Value::I32(3)));
    }

    #[test]
    fn drop_restores_too() {
        let catalog = catalog();
        let key = FieldKey::new("Config", "level");
        {
            let mut stash = StaticStash::acquire(&catalog, true);
            stash.backup(&TypeName::new("Config"));
            catalog.set_static_value(&key, Value::I32(9)).unwrap();
        }
        assert_eq!(catalog.static_value(&key), Some(Value::I32(3)));
    }

    #[test]
    fn restore_disabled_keeps_changes() {
        let catalog = catalog();
        let key = FieldKey::new("Config", "level");
        let mut stash = StaticStash::acquire(&catalog, false);
        stash.backup(&TypeName::new("Config"));
        catalog.set_static_value(&key, Value::I32(9)).unwrap();
        stash.release();
        assert_eq!(catalog.static_value(&key), Some(Value::I32(9)));
    }
}
