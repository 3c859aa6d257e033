//! Process-wide interpreter state.

use crate::primitives;
use crate::scope::Scope;
use crate::table::{BlockTable, StringTable};
use crate::value::Value;
use std::rc::Rc;

/// Process-wide interpreter state: the global scope, the interned root
/// prototypes and singletons, and the string and block tables shared by
/// every fiber.
///
/// An `Environment` is a cheap handle; clones refer to the same state. It is
/// shared across fibers but only ever mutated by the one currently running,
/// which the cooperative scheduler guarantees.
#[derive(Clone)]
pub struct Environment {
    inner: Rc<Inner>,
}

struct Inner {
    globals: Scope,
    strings: StringTable,
    blocks: BlockTable,

    object: Value,
    number: Value,
    string: Value,
    array: Value,
    block: Value,
    fiber: Value,
    environment: Value,

    nil: Value,
    truth: Value,
    falsity: Value,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Build the global scope: the root `Object`, the prototypes delegating
    /// to it, the Nil/True/False singletons, and every primitive method.
    pub fn new() -> Self {
        let globals = Scope::new();

        let object = Value::object(None, Some("Object".into()));
        let number = Value::object(Some(object.clone()), Some("Number".into()));
        let string = Value::object(Some(object.clone()), Some("String".into()));
        let array = Value::object(Some(object.clone()), Some("Array".into()));
        let block = Value::object(Some(object.clone()), Some("Block".into()));
        let fiber = Value::object(Some(object.clone()), Some("Fiber".into()));
        let environment = Value::object(Some(object.clone()), Some("Environment".into()));

        let nil = Value::object(Some(object.clone()), Some("Nil".into()));
        let truth = Value::object(Some(object.clone()), Some("True".into()));
        let falsity = Value::object(Some(object.clone()), Some("False".into()));

        globals.define("Object", object.clone());
        globals.define("Number", number.clone());
        globals.define("String", string.clone());
        globals.define("Array", array.clone());
        globals.define("Block", block.clone());
        globals.define("Fiber", fiber.clone());
        globals.define("Environment", environment.clone());
        globals.define("Nil", nil.clone());
        globals.define("True", truth.clone());
        globals.define("False", falsity.clone());

        let handle = Self {
            inner: Rc::new(Inner {
                globals,
                strings: StringTable::default(),
                blocks: BlockTable::default(),
                object,
                number,
                string,
                array,
                block,
                fiber,
                environment,
                nil,
                truth,
                falsity,
            }),
        };

        primitives::install(&handle);

        log::debug!("environment created");

        handle
    }

    /// Get the global scope.
    pub fn globals(&self) -> &Scope {
        &self.inner.globals
    }

    /// Get the string intern table.
    pub fn strings(&self) -> &StringTable {
        &self.inner.strings
    }

    /// Get the compiled block table.
    pub fn blocks(&self) -> &BlockTable {
        &self.inner.blocks
    }

    /// Get the Nil singleton.
    pub fn nil(&self) -> Value {
        self.inner.nil.clone()
    }

    /// Get the True or False singleton.
    pub fn boolean(&self, value: bool) -> Value {
        if value {
            self.inner.truth.clone()
        } else {
            self.inner.falsity.clone()
        }
    }

    /// Whether a value is the True singleton. Everything else, including
    /// every non-boolean value, is not true.
    pub fn is_true(&self, value: &Value) -> bool {
        Value::ptr_eq(value, &self.inner.truth)
    }

    /// Whether a value is the Nil singleton.
    pub fn is_nil(&self, value: &Value) -> bool {
        Value::ptr_eq(value, &self.inner.nil)
    }

    pub fn object_prototype(&self) -> &Value {
        &self.inner.object
    }

    pub fn number_prototype(&self) -> &Value {
        &self.inner.number
    }

    pub fn string_prototype(&self) -> &Value {
        &self.inner.string
    }

    pub fn array_prototype(&self) -> &Value {
        &self.inner.array
    }

    pub fn block_prototype(&self) -> &Value {
        &self.inner.block
    }

    pub fn fiber_prototype(&self) -> &Value {
        &self.inner.fiber
    }

    /// Get the environment object that receiverless keyword messages are
    /// sent to.
    pub fn environment_prototype(&self) -> &Value {
        &self.inner.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prototypes_are_bound_as_globals() {
        let env = Environment::new();

        for name in [
            "Object",
            "Number",
            "String",
            "Array",
            "Block",
            "Fiber",
            "Environment",
            "Nil",
            "True",
            "False",
        ] {
            assert!(env.globals().lookup(name).is_some(), "missing {}", name);
        }

        assert!(Value::ptr_eq(
            &env.globals().lookup("Nil").unwrap(),
            &env.nil()
        ));
    }

    #[test]
    fn prototypes_delegate_to_the_root() {
        let env = Environment::new();

        assert!(Value::ptr_eq(
            env.number_prototype().parent().unwrap(),
            env.object_prototype()
        ));
        assert!(env.object_prototype().parent().is_none());
    }
}
