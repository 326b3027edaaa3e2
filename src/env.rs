// ABOUTME: Environment module for managing variable bindings and parent chaining

use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// An ordered `(name, value)` binding list with an optional parent.
///
/// Bindings are kept in insertion order (not a `HashMap`) because
/// `values` reports them in that order, matching the original
/// interpreter's append-only binding array. The parent pointer is a
/// non-owning reference to whatever environment is currently the caller:
/// a Lambda's own environment has it cleared at creation and reassigned
/// immediately before each call (see `set_parent`), so no environment
/// persists a stale parent between invocations.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<Vec<(String, Value)>>,
    parent: RefCell<Option<Rc<Environment>>>,
}

impl Environment {
    /// Creates a new root environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(Vec::new()),
            parent: RefCell::new(None),
        })
    }

    /// Creates a new child environment with the given parent.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(Vec::new()),
            parent: RefCell::new(Some(parent)),
        })
    }

    /// Searches this environment, then its parent chain. Returns an
    /// independent deep copy of the stored value.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some((_, value)) = self.bindings.borrow().iter().find(|(n, _)| n == name) {
            return Some(value.clone());
        }

        if let Some(parent) = self.parent.borrow().as_ref() {
            return parent.get(name);
        }

        None
    }

    /// Writes into *this* environment only. Replaces an existing binding
    /// in place, or appends a new one. The stored copy is independent of
    /// the caller's value.
    pub fn put(&self, name: String, value: Value) {
        let mut bindings = self.bindings.borrow_mut();
        if let Some(slot) = bindings.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            bindings.push((name, value));
        }
    }

    /// Alias for [`Environment::put`], used when a binding is known to be
    /// fresh (startup registration, lambda argument binding).
    pub fn define(&self, name: String, value: Value) {
        self.put(name, value);
    }

    /// Traverses to the root environment, then writes there.
    pub fn def(self: &Rc<Self>, name: String, value: Value) {
        self.root().put(name, value);
    }

    /// Walks the parent chain to the topmost environment.
    pub fn root(self: &Rc<Self>) -> Rc<Environment> {
        match self.parent.borrow().as_ref() {
            Some(parent) => parent.root(),
            None => self.clone(),
        }
    }

    /// Reassigns this environment's parent. Used at call time to chain a
    /// Lambda's private environment to its caller for exactly the
    /// duration of that call.
    pub fn set_parent(&self, parent: Rc<Environment>) {
        *self.parent.borrow_mut() = Some(parent);
    }

    /// Names bound directly in this environment, in binding order
    /// (parent bindings are not included).
    pub fn own_names(&self) -> Vec<String> {
        self.bindings
            .borrow()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Deep-copies the name list and all values; the parent pointer is
    /// shared (an `Rc::clone`), not deep-copied, matching `copy()`'s
    /// ownership contract.
    pub fn deep_clone(&self) -> Rc<Environment> {
        let bindings = self
            .bindings
            .borrow()
            .iter()
            .map(|(n, v)| (n.clone(), v.clone()))
            .collect();
        let parent = self.parent.borrow().clone();
        Rc::new(Environment {
            bindings: RefCell::new(bindings),
            parent: RefCell::new(parent),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Number(42.0));

        match env.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("Expected Number(42.0)"),
        }
    }

    #[test]
    fn undefined_symbol() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
    }

    #[test]
    fn shadowing_within_child() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(42.0));

        let child = Environment::with_parent(parent);
        child.define("x".to_string(), Value::Number(100.0));

        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 100.0),
            _ => panic!("Expected Number(100.0)"),
        }
    }

    #[test]
    fn parent_lookup() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(42.0));

        let child = Environment::with_parent(parent);

        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("Expected Number(42.0)"),
        }
    }

    #[test]
    fn def_writes_to_root_from_nested_child() {
        let root = Environment::new();
        let mid = Environment::with_parent(root.clone());
        let leaf = Environment::with_parent(mid);

        leaf.def("x".to_string(), Value::Number(7.0));

        assert_eq!(root.get("x"), Some(Value::Number(7.0)));
    }

    #[test]
    fn get_returns_independent_copy() {
        let env = Environment::new();
        env.define("xs".to_string(), Value::QExpr(vec![Value::Number(1.0)]));

        let mut copy = env.get("xs").unwrap();
        if let Value::QExpr(items) = &mut copy {
            items.push(Value::Number(2.0));
        }

        assert_eq!(
            env.get("xs"),
            Some(Value::QExpr(vec![Value::Number(1.0)]))
        );
    }

    #[test]
    fn deep_clone_is_independent_but_shares_parent() {
        let parent = Environment::new();
        parent.define("p".to_string(), Value::Number(1.0));

        let env = Environment::with_parent(parent.clone());
        env.define("x".to_string(), Value::Number(1.0));

        let cloned = env.deep_clone();
        cloned.define("x".to_string(), Value::Number(99.0));

        assert_eq!(env.get("x"), Some(Value::Number(1.0)));
        assert_eq!(cloned.get("x"), Some(Value::Number(99.0)));
        // Parent chain is shared, not duplicated.
        assert_eq!(cloned.get("p"), Some(Value::Number(1.0)));
    }

    #[test]
    fn own_names_excludes_parent_chain() {
        let parent = Environment::new();
        parent.define("a".to_string(), Value::Number(1.0));

        let child = Environment::with_parent(parent);
        child.define("b".to_string(), Value::Number(2.0));

        assert_eq!(child.own_names(), vec!["b".to_string()]);
    }

    #[test]
    fn set_parent_rebinds_lookup_chain() {
        let env = Environment::new();
        let caller = Environment::new();
        caller.define("y".to_string(), Value::Number(5.0));

        assert!(env.get("y").is_none());
        env.set_parent(caller);
        assert_eq!(env.get("y"), Some(Value::Number(5.0)));
    }
}
