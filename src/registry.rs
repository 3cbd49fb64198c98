//! Binding registry - dotted path → ordered binding actions.
//!
//! The index that drives re-evaluation: each dotted view-model path maps to
//! the list of binding actions that must re-run when that path changes.
//! Insertion order is re-evaluation order. An explicit object passed by
//! reference through the orchestration pass, never ambient state.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::store::ViewModel;

/// One unit of re-runnable work: re-evaluates its captured expression and
/// pushes the result at its captured element target.
pub type BindingAction = Rc<dyn Fn(&ViewModel)>;

/// Path-indexed registry of binding actions.
#[derive(Default)]
pub struct BindingRegistry {
    bindings: RefCell<HashMap<String, Vec<BindingAction>>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `action` under `path`, creating the entry on first use.
    /// No entry exists for a path until the first register call names it.
    pub fn register(&self, path: &str, action: BindingAction) {
        self.bindings
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push(action);
    }

    /// Run every action registered for exactly `path`, in registration
    /// order, passing the current view-model. A no-op for unregistered
    /// paths.
    ///
    /// Re-entrant notification is allowed: an action that writes another
    /// tracked field synchronously re-enters here before the outer pass
    /// returns. The action list is cloned out of the cell first so
    /// re-entrant register/notify calls never alias a live borrow.
    pub fn notify(&self, path: &str, vm: &ViewModel) {
        let actions: Option<Vec<BindingAction>> = self.bindings.borrow().get(path).cloned();
        if let Some(actions) = actions {
            for action in actions {
                action(vm);
            }
        }
    }

    /// Number of actions registered under `path`.
    pub fn action_count(&self, path: &str) -> usize {
        self.bindings.borrow().get(path).map_or(0, Vec::len)
    }

    /// True if no path has any registered action.
    pub fn is_empty(&self) -> bool {
        self.bindings.borrow().is_empty()
    }
}
