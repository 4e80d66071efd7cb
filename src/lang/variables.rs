use std::collections::BTreeMap;

use crate::lang::eval::value::Value;

/// Lexically scoped variable store
///
/// Scopes are stacked innermost-last. The global scope is created up front
/// and never popped; one store lives for the whole interactive session.
pub struct Variables {
    inner: Vec<BTreeMap<String, Value>>,
}

impl Variables {
    pub fn new() -> Self {
        Variables {
            inner: vec![BTreeMap::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.inner.push(BTreeMap::default());
    }

    pub fn pop_scope(&mut self) {
        assert!(self.inner.len() > 1);
        self.inner.pop();
    }

    /// Look up `name`, innermost scope first
    pub fn get(&self, name: &str) -> Option<&Value> {
        for scope in self.inner.iter().rev() {
            if let Some(val) = scope.get(name) {
                return Some(val);
            }
        }

        None
    }

    /// Assign `val` to `name`
    ///
    /// If `name` is already bound, the existing binding is overwritten in
    /// place in its own scope, so inner scopes mutate outer variables rather
    /// than shadowing them. Otherwise a fresh binding is created in the
    /// innermost scope; first assignment doubles as declaration.
    pub fn assign(&mut self, name: &str, val: Value) {
        for scope in self.inner.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = val;
                return;
            }
        }

        assert!(!self.inner.is_empty());
        self.inner.last_mut().unwrap().insert(name.to_string(), val);
    }
}

#[test]
fn test_assign_mutates_outer_binding() {
    let mut vars = Variables::new();
    vars.assign("x", Value::Number(1.0));
    vars.push_scope();
    vars.assign("x", Value::Number(2.0));
    assert_eq!(vars.get("x"), Some(&Value::Number(2.0)));
    vars.pop_scope();
    assert_eq!(vars.get("x"), Some(&Value::Number(2.0)));
}

#[test]
fn test_fresh_binding_in_innermost_scope() {
    let mut vars = Variables::new();
    vars.push_scope();
    vars.assign("y", Value::Boolean(true));
    assert_eq!(vars.get("y"), Some(&Value::Boolean(true)));
    vars.pop_scope();
    assert_eq!(vars.get("y"), None);
}

#[test]
fn test_get_searches_all_scopes() {
    let mut vars = Variables::new();
    vars.assign("x", Value::Number(1.0));
    vars.push_scope();
    vars.push_scope();
    assert_eq!(vars.get("x"), Some(&Value::Number(1.0)));
    assert_eq!(vars.get("nope"), None);
}
