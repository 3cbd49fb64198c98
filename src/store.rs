//! Reactive store - the wrapper standing in for the raw view-model.
//!
//! An explicit path-indexed store over the nested value tree. Every write
//! goes through [`ViewModel::set`], which intercepts the mutation: compare
//! against the stored value, store on difference, then notify the binding
//! registry with the fully-qualified dotted path - synchronously, before the
//! write returns. Equal writes (strict comparison) notify nothing.
//!
//! Collections are not supported at any nesting level; validation happens up
//! front, before any binding is wired. Direct mutation of the pre-wrap value
//! (a copy the caller kept) bypasses reactivity entirely and is explicitly
//! unsupported.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::BindError;
use crate::registry::BindingRegistry;
use crate::value::Value;

/// The reactive view-model. Cheap to clone (shared inner), single-threaded.
#[derive(Clone)]
pub struct ViewModel {
    root: Rc<RefCell<Value>>,
    registry: Rc<BindingRegistry>,
}

impl fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ViewModel").field(&*self.root.borrow()).finish()
    }
}

impl ViewModel {
    /// Wrap `root` reactively against `registry`.
    ///
    /// Rejects a non-object root and a `List` at any nesting depth with
    /// [`BindError::UnsupportedStructure`], before anything is wired.
    pub fn new(root: Value, registry: Rc<BindingRegistry>) -> Result<Self, BindError> {
        match &root {
            Value::List(_) => {
                return Err(BindError::UnsupportedStructure(
                    "list is not supported as a view-model".to_string(),
                ));
            }
            Value::Object(_) => {}
            other => {
                return Err(BindError::UnsupportedStructure(format!(
                    "view-model root must be an object, got {}",
                    other.type_name()
                )));
            }
        }
        if root.contains_list() {
            return Err(BindError::UnsupportedStructure(
                "list is not supported inside a view-model".to_string(),
            ));
        }
        Ok(Self { root: Rc::new(RefCell::new(root)), registry: registry.clone() })
    }

    /// Read the value at a dotted `path`. `None` when the path does not
    /// resolve to a field.
    pub fn get(&self, path: &str) -> Option<Value> {
        let root = self.root.borrow();
        let mut current: &Value = &root;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }

    /// Write `value` at a dotted `path`.
    ///
    /// The intercepted write path: if `value` differs (strict comparison)
    /// from the stored value, store it, then notify the registry under
    /// `path` before returning. Writing an equal value does nothing.
    /// Notification is synchronous and depth-first: an action that itself
    /// writes another tracked field re-enters here before this call returns.
    pub fn set(&self, path: &str, value: Value) -> Result<(), BindError> {
        if value.contains_list() {
            return Err(BindError::UnsupportedStructure(format!(
                "cannot write a list at `{path}`: collection reactivity is not supported",
            )));
        }

        let changed = {
            let mut root = self.root.borrow_mut();
            let mut current: &mut Value = &mut root;
            let mut segments = path.split('.').peekable();
            loop {
                let segment = segments.next().ok_or_else(|| {
                    BindError::evaluation(path, "empty path")
                })?;
                let type_name = current.type_name();
                let Value::Object(fields) = &mut *current else {
                    return Err(BindError::evaluation(
                        path,
                        format!("cannot write field `{segment}` of {type_name}"),
                    ));
                };
                if segments.peek().is_none() {
                    let slot = fields.entry(segment.to_string()).or_insert(Value::Null);
                    if *slot == value {
                        break false;
                    }
                    *slot = value;
                    break true;
                }
                current = fields.get_mut(segment).ok_or_else(|| {
                    BindError::evaluation(
                        path,
                        format!("cannot write through undefined field `{segment}`"),
                    )
                })?;
            }
            // Borrow dropped here so notified actions can read and write.
        };

        if changed {
            self.registry.notify(path, self);
        }
        Ok(())
    }

    /// A point-in-time copy of the whole value tree.
    pub fn snapshot(&self) -> Value {
        self.root.borrow().clone()
    }

    /// The registry this store notifies.
    pub fn registry(&self) -> &Rc<BindingRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn user_vm() -> (ViewModel, Rc<BindingRegistry>) {
        let registry = Rc::new(BindingRegistry::new());
        let vm = ViewModel::new(
            Value::from([(
                "user",
                Value::from([("name", Value::from("Ann")), ("age", Value::Number(30.0))]),
            )]),
            Rc::clone(&registry),
        )
        .unwrap();
        (vm, registry)
    }

    #[test]
    fn test_list_root_rejected() {
        let registry = Rc::new(BindingRegistry::new());
        let err = ViewModel::new(Value::List(vec![]), registry).unwrap_err();
        assert!(matches!(err, BindError::UnsupportedStructure(_)));
    }

    #[test]
    fn test_nested_list_rejected() {
        let registry = Rc::new(BindingRegistry::new());
        let root = Value::from([("tags", Value::List(vec![Value::from("a")]))]);
        assert!(ViewModel::new(root, registry).is_err());
    }

    #[test]
    fn test_scalar_root_rejected() {
        let registry = Rc::new(BindingRegistry::new());
        assert!(ViewModel::new(Value::Number(1.0), registry).is_err());
    }

    #[test]
    fn test_differing_write_notifies_once() {
        let (vm, registry) = user_vm();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        registry.register("user.name", Rc::new(move |_| hits_clone.set(hits_clone.get() + 1)));

        vm.set("user.name", Value::from("Bea")).unwrap();
        assert_eq!(hits.get(), 1);
        assert_eq!(vm.get("user.name"), Some(Value::from("Bea")));
    }

    #[test]
    fn test_equal_write_does_not_notify() {
        let (vm, registry) = user_vm();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        registry.register("user.name", Rc::new(move |_| hits_clone.set(hits_clone.get() + 1)));

        vm.set("user.name", Value::from("Ann")).unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_notification_before_set_returns() {
        let (vm, registry) = user_vm();
        let seen = Rc::new(Cell::new(None));
        let seen_clone = Rc::clone(&seen);
        registry.register(
            "user.age",
            Rc::new(move |vm| seen_clone.set(vm.get("user.age"))),
        );

        vm.set("user.age", Value::Number(31.0)).unwrap();
        // The action observed the new value during the set call.
        assert_eq!(seen.take(), Some(Value::Number(31.0)));
    }

    #[test]
    fn test_new_leaf_field_notifies() {
        let (vm, registry) = user_vm();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        registry.register("user.email", Rc::new(move |_| hits_clone.set(hits_clone.get() + 1)));

        vm.set("user.email", Value::from("ann@example.com")).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_write_into_scalar_names_its_type() {
        let (vm, _) = user_vm();
        let err = vm.set("user.name.length", Value::Number(3.0)).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("string"));
    }

    #[test]
    fn test_debug_shows_value_tree() {
        let (vm, _) = user_vm();
        let rendered = format!("{vm:?}");
        assert!(rendered.starts_with("ViewModel"));
        assert!(rendered.contains("Ann"));
    }

    #[test]
    fn test_write_through_missing_parent_is_recoverable() {
        let (vm, _) = user_vm();
        let err = vm.set("missing.field", Value::Null).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_list_write_rejected() {
        let (vm, _) = user_vm();
        let err = vm.set("user.tags", Value::List(vec![])).unwrap_err();
        assert!(matches!(err, BindError::UnsupportedStructure(_)));
    }

    #[test]
    fn test_reentrant_write_is_depth_first() {
        let (vm, registry) = user_vm();
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_log = Rc::clone(&log);
        registry.register("user.age", Rc::new(move |_| inner_log.borrow_mut().push("age")));

        let outer_log = Rc::clone(&log);
        registry.register(
            "user.name",
            Rc::new(move |vm| {
                outer_log.borrow_mut().push("name-start");
                vm.set("user.age", Value::Number(99.0)).unwrap();
                outer_log.borrow_mut().push("name-end");
            }),
        );

        vm.set("user.name", Value::from("Bea")).unwrap();
        assert_eq!(*log.borrow(), vec!["name-start", "age", "name-end"]);
    }
}
