//! Recursion detection for type graph traversal.

use indexmap::IndexSet;
use prefab_core::TypeTag;

use crate::error::EngineError;

/// The stack of record types currently under construction.
///
/// Push order is preserved so a detected cycle can report the path that
/// closed it. One guard is threaded through a whole top-level request;
/// nested requests made during field mutation reuse it.
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    stack: IndexSet<TypeTag>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.stack.contains(tag)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Pushes `tag`, or reports the cycle it would close.
    ///
    /// A raw type that comes back with deeper generic arguments than it had
    /// lower on the stack counts as a cycle too: the same fields will wrap
    /// the arguments again on every level, so the walk never repeats a tag
    /// exactly.
    pub fn push(&mut self, tag: &TypeTag) -> Result<(), EngineError> {
        if let Some(start) = self.cycle_start(tag) {
            return Err(EngineError::Recursion {
                path: self.stack.iter().skip(start).cloned().collect(),
            });
        }
        self.stack.insert(tag.clone());
        Ok(())
    }

    fn cycle_start(&self, tag: &TypeTag) -> Option<usize> {
        self.stack.get_index_of(tag).or_else(|| {
            self.stack
                .iter()
                .position(|seen| seen.raw() == tag.raw() && seen.nesting() < tag.nesting())
        })
    }

    /// Pops the innermost tag. Pops must mirror pushes.
    pub fn pop(&mut self, tag: &TypeTag) {
        let popped = self.stack.pop();
        debug_assert_eq!(popped.as_ref(), Some(tag), "unbalanced cycle guard");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_balances() {
        let mut guard = CycleGuard::new();
        let x = TypeTag::of("X");
        guard.push(&x).unwrap();
        assert!(guard.contains(&x));
        assert_eq!(guard.depth(), 1);
        guard.pop(&x);
        assert!(guard.is_empty());
    }

    #[test]
    fn revisiting_reports_path_from_first_occurrence() {
        let mut guard = CycleGuard::new();
        let (root, x, y) = (TypeTag::of("Root"), TypeTag::of("X"), TypeTag::of("Y"));
        guard.push(&root).unwrap();
        guard.push(&x).unwrap();
        guard.push(&y).unwrap();
        match guard.push(&x) {
            Err(EngineError::Recursion { path }) => assert_eq!(path, vec![x.clone(), y.clone()]),
            other => panic!("expected recursion, got {other:?}"),
        }
        // A failed push leaves the stack untouched.
        assert_eq!(guard.depth(), 3);
    }

    #[test]
    fn generic_instantiations_are_distinct_entries() {
        let mut guard = CycleGuard::new();
        guard
            .push(&TypeTag::generic("Box", [TypeTag::of("String")]))
            .unwrap();
        assert!(guard
            .push(&TypeTag::generic("Box", [TypeTag::of("Point")]))
            .is_ok());
    }

    #[test]
    fn growing_generic_arguments_close_a_cycle() {
        let mut guard = CycleGuard::new();
        let text = TypeTag::of("String");
        let node = TypeTag::generic("Node", [text.clone()]);
        let leaf = TypeTag::of("Leaf");
        guard.push(&node).unwrap();
        guard.push(&leaf).unwrap();

        let deeper = TypeTag::generic("Node", [TypeTag::generic("List", [text.clone()])]);
        match guard.push(&deeper) {
            Err(EngineError::Recursion { path }) => assert_eq!(path, vec![node, leaf]),
            other => panic!("expected recursion, got {other:?}"),
        }

        // Shallower arguments are a different instantiation, not a cycle.
        let mut guard = CycleGuard::new();
        guard.push(&deeper).unwrap();
        assert!(guard.push(&TypeTag::generic("Node", [text])).is_ok());
    }
}
