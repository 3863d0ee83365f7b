use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("host has no `{0}` entry point")]
    Missing(&'static str),
}

/// A named, replaceable entry point on a host surface.
///
/// Patching swaps the current callable for `factory(original)` and pushes
/// the original on a restore stack; unpatching pops it back. Patching an
/// absent entry point is a logged no-op surfaced as `PatchError::Missing`,
/// and installers skip that surface instead of failing the SDK.
pub struct Slot<F: ?Sized> {
    name: &'static str,
    current: RefCell<Option<Rc<F>>>,
    saved: RefCell<Vec<Rc<F>>>,
}

impl<F: ?Sized> Slot<F> {
    pub fn filled(name: &'static str, native: Rc<F>) -> Self {
        Self {
            name,
            current: RefCell::new(Some(native)),
            saved: RefCell::new(Vec::new()),
        }
    }

    pub fn absent(name: &'static str) -> Self {
        Self {
            name,
            current: RefCell::new(None),
            saved: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self) -> Option<Rc<F>> {
        self.current.borrow().clone()
    }

    pub fn is_patched(&self) -> bool {
        !self.saved.borrow().is_empty()
    }

    pub fn patch(&self, factory: impl FnOnce(Rc<F>) -> Rc<F>) -> Result<(), PatchError> {
        let original = match self.current.borrow().clone() {
            Some(f) => f,
            None => {
                debug!(slot = self.name, "entry point absent, patch skipped");
                return Err(PatchError::Missing(self.name));
            }
        };
        self.saved.borrow_mut().push(original.clone());
        *self.current.borrow_mut() = Some(factory(original));
        debug!(slot = self.name, "entry point patched");
        Ok(())
    }

    /// Restore the most recently captured original. No-op when unpatched.
    pub fn unpatch(&self) {
        if let Some(original) = self.saved.borrow_mut().pop() {
            *self.current.borrow_mut() = Some(original);
            debug!(slot = self.name, "entry point restored");
        }
    }
}
