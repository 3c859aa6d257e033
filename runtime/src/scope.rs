use crate::strings::FinchString;
use crate::value::Value;
use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

/// A lexical variable scope.
///
/// A scope is a set of name bindings plus an optional reference to the
/// enclosing scope. The global scope, each call frame's local scope, and
/// every object's member scope are all instances of this one type.
///
/// Scopes are handles: cloning one yields another reference to the same
/// bindings. A closure holds its defining scope alive this way.
#[derive(Clone, Default)]
pub struct Scope {
    inner: Rc<Inner>,
}

#[derive(Default)]
struct Inner {
    bindings: RefCell<BTreeMap<FinchString, Value>>,
    parent: Option<Scope>,
}

impl Scope {
    /// Create a new scope with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new scope nested inside this one.
    pub fn child(&self) -> Self {
        Self {
            inner: Rc::new(Inner {
                bindings: Default::default(),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Get the enclosing scope, if any.
    pub fn parent(&self) -> Option<&Scope> {
        self.inner.parent.as_ref()
    }

    /// Bind a name in this scope, shadowing any binding in a parent.
    pub fn define(&self, name: impl Into<FinchString>, value: Value) {
        self.inner.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Assign to the nearest existing binding of a name, walking the parent
    /// chain. Returns `false`, changing nothing, when no scope in the chain
    /// binds the name.
    pub fn set(&self, name: &str, value: Value) -> bool {
        let mut current = self.clone();

        loop {
            if let Some(slot) = current.inner.bindings.borrow_mut().get_mut(name) {
                *slot = value;
                return true;
            }

            match current.parent().cloned() {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Remove the nearest binding of a name, walking the parent chain.
    /// Returns the removed value, if there was one.
    pub fn undefine(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();

        loop {
            let removed = current.inner.bindings.borrow_mut().remove(name);
            if removed.is_some() {
                return removed;
            }

            match current.parent().cloned() {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Look up a name, walking the parent chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();

        loop {
            let found = current.inner.bindings.borrow().get(name).cloned();
            if found.is_some() {
                return found;
            }

            match current.parent().cloned() {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Look up a name in this scope only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.inner.bindings.borrow().get(name).cloned()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<scope@{:p}>", Rc::as_ptr(&self.inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;

    #[test]
    fn define_then_lookup() {
        let env = Environment::new();
        let scope = Scope::new();

        scope.define("x", Value::number(&env, 1.0));
        assert_eq!(scope.lookup("x").unwrap().as_number(), Some(1.0));
        assert!(scope.lookup("y").is_none());
    }

    #[test]
    fn undefine_removes_nearest_binding() {
        let env = Environment::new();
        let outer = Scope::new();
        let inner = outer.child();

        outer.define("x", Value::number(&env, 1.0));
        inner.define("x", Value::number(&env, 2.0));

        assert_eq!(inner.lookup("x").unwrap().as_number(), Some(2.0));
        inner.undefine("x");
        assert_eq!(inner.lookup("x").unwrap().as_number(), Some(1.0));
        inner.undefine("x");
        assert!(inner.lookup("x").is_none());
    }

    #[test]
    fn set_walks_to_the_nearest_binding() {
        let env = Environment::new();
        let outer = Scope::new();
        let inner = outer.child();

        outer.define("count", Value::number(&env, 0.0));

        assert!(inner.set("count", Value::number(&env, 1.0)));
        assert_eq!(outer.lookup("count").unwrap().as_number(), Some(1.0));

        // An unknown name changes nothing.
        assert!(!inner.set("missing", Value::number(&env, 9.0)));
        assert!(outer.lookup("missing").is_none());
    }

    #[test]
    fn child_shadows_parent() {
        let env = Environment::new();
        let outer = Scope::new();
        let inner = outer.child();

        outer.define("x", Value::number(&env, 1.0));
        inner.define("x", Value::number(&env, 2.0));

        assert_eq!(outer.lookup("x").unwrap().as_number(), Some(1.0));
        assert_eq!(inner.lookup("x").unwrap().as_number(), Some(2.0));
    }
}
