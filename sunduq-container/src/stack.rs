//! Resolution stack used for cycle detection.
//!
//! While a `resolve()` call tree is active, the stack holds the services
//! currently under construction, outermost first. Entering a service that is
//! already on the stack is a cycle.
//!
//! Entries are pushed through [`StackGuard`], which pops on drop. A factory
//! that fails or panics therefore never leaves a stale entry behind.

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{CircularDependencyError, Result, SunduqError};
use crate::key::ServiceId;

/// Ordered set of services under construction.
#[derive(Debug, Default)]
pub(crate) struct ResolutionStack {
    entries: Vec<ServiceId>,
}

impl ResolutionStack {
    /// Pushes `id`, or returns the cycle it would close.
    fn enter(&mut self, id: &ServiceId) -> std::result::Result<(), CircularDependencyError> {
        if let Some(start) = self.entries.iter().position(|entry| entry == id) {
            let mut chain = self.entries[start..].to_vec();
            chain.push(id.clone());
            return Err(CircularDependencyError { chain });
        }

        self.entries.push(id.clone());
        Ok(())
    }

    fn leave(&mut self, id: &ServiceId) {
        // Guards drop in reverse order, so `id` is normally the top entry.
        if let Some(position) = self.entries.iter().rposition(|entry| entry == id) {
            debug_assert_eq!(position + 1, self.entries.len(), "stack popped out of order");
            self.entries.remove(position);
        }
    }

    /// The innermost service under construction.
    pub fn current(&self) -> Option<&ServiceId> {
        self.entries.last()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}

/// RAII entry on a [`ResolutionStack`].
pub(crate) struct StackGuard<'a> {
    stack: &'a Mutex<ResolutionStack>,
    id: ServiceId,
}

impl<'a> StackGuard<'a> {
    /// Pushes `id` onto the stack for the lifetime of the guard.
    ///
    /// # Errors
    /// [`SunduqError::CircularDependency`] if `id` is already being built.
    pub fn enter(stack: &'a Mutex<ResolutionStack>, id: &ServiceId) -> Result<Self> {
        if let Err(cycle) = stack.lock().enter(id) {
            warn!(cycle = %cycle, "Circular dependency detected!");
            return Err(SunduqError::CircularDependency(cycle));
        }

        Ok(Self {
            stack,
            id: id.clone(),
        })
    }
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.stack.lock().leave(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &'static str) -> ServiceId {
        ServiceId::named(name)
    }

    #[test]
    fn guard_pops_on_drop() {
        let stack = Mutex::new(ResolutionStack::default());
        {
            let _a = StackGuard::enter(&stack, &id("a")).unwrap();
            let _b = StackGuard::enter(&stack, &id("b")).unwrap();
            assert_eq!(stack.lock().depth(), 2);
            assert_eq!(stack.lock().current(), Some(&id("b")));
        }
        assert_eq!(stack.lock().depth(), 0);
    }

    #[test]
    fn repeat_is_a_cycle_with_full_chain() {
        let stack = Mutex::new(ResolutionStack::default());
        let _root = StackGuard::enter(&stack, &id("root")).unwrap();
        let _a = StackGuard::enter(&stack, &id("A")).unwrap();
        let _b = StackGuard::enter(&stack, &id("B")).unwrap();
        let _c = StackGuard::enter(&stack, &id("C")).unwrap();

        match StackGuard::enter(&stack, &id("A")) {
            Err(SunduqError::CircularDependency(err)) => {
                assert_eq!(err.chain, vec![id("A"), id("B"), id("C"), id("A")]);
                assert_eq!(err.to_string(), "Circular dependency detected: A -> B -> C -> A");
            }
            Err(other) => panic!("Expected CircularDependency, got: {other:?}"),
            Ok(_) => panic!("Expected CircularDependency"),
        }

        // failed enter leaves the stack untouched
        assert_eq!(stack.lock().depth(), 4);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let stack = Mutex::new(ResolutionStack::default());
        let _a = StackGuard::enter(&stack, &id("A")).unwrap();
        assert!(StackGuard::enter(&stack, &id("A")).is_err());
    }

    #[test]
    fn guard_pops_during_unwind() {
        let stack = Mutex::new(ResolutionStack::default());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = StackGuard::enter(&stack, &id("exploding")).unwrap();
            panic!("factory blew up");
        }));

        assert!(result.is_err());
        assert_eq!(stack.lock().depth(), 0);
    }
}
