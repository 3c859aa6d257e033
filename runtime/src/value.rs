//! Structures and implementations of the built-in data types.

use crate::bytecode::CodeBlock;
use crate::environment::Environment;
use crate::exceptions::Exception;
use crate::fiber::Fiber;
use crate::scope::Scope;
use crate::strings::FinchString;
use std::{
    cell::{Ref, RefCell, RefMut},
    collections::BTreeMap,
    fmt,
    rc::{Rc, Weak},
};

/// The signature shared by every primitive method.
///
/// A primitive leaves its result on the fiber's operand stack itself, either
/// by pushing a value or by pushing a call frame whose completion produces
/// one. That is what lets control-flow primitives invoke their block
/// arguments as ordinary calls.
pub type PrimitiveFn = fn(Value, &mut Fiber, &str, &[Value]) -> Result<(), Exception>;

/// A Finch value: a shared reference to an object.
///
/// Every value delegates to a prototype parent; only the root `Object` has
/// none. Cloning a value is cheap.
#[derive(Clone)]
pub struct Value(Rc<Object>);

struct Object {
    /// The prototype this object delegates to. Absent only on the root.
    parent: Option<Value>,
    kind: ObjectKind,
}

enum ObjectKind {
    Dynamic(DynamicObject),
    Number(f64),
    String(FinchString),
    Array(RefCell<Vec<Value>>),
    Block(BlockValue),
    Fiber(RefCell<Fiber>),
}

/// A prototype-delegated object with user-defined fields and methods and an
/// optional table of host primitives.
///
/// Fields and methods are the same kind of binding; a block member acts as a
/// method when the object receives its name as a message.
pub struct DynamicObject {
    /// A display name; set on the interned prototypes and singletons.
    name: Option<FinchString>,

    /// Fields and methods.
    members: Scope,

    /// Host-registered primitive methods. These fire for every descendant
    /// of this object that does not shadow them.
    primitives: RefCell<BTreeMap<FinchString, PrimitiveFn>>,
}

impl DynamicObject {
    /// Get the object's member scope.
    pub fn members(&self) -> &Scope {
        &self.members
    }

    /// Register a primitive method under a message name.
    pub fn register_primitive(&self, name: impl Into<FinchString>, primitive: PrimitiveFn) {
        self.primitives.borrow_mut().insert(name.into(), primitive);
    }

    fn primitive(&self, name: &str) -> Option<PrimitiveFn> {
        self.primitives.borrow().get(name).copied()
    }
}

/// A first-class closure: compiled code, the lexical scope captured when the
/// block literal was evaluated, and the receiver in effect at that moment.
pub struct BlockValue {
    code: Rc<CodeBlock>,
    closure: Scope,

    /// The captured self. Weak on purpose: a method must not keep its owner
    /// alive, or an object binding its own methods would never be freed.
    receiver: Weak<Object>,
}

impl BlockValue {
    pub fn code(&self) -> &Rc<CodeBlock> {
        &self.code
    }

    pub fn closure(&self) -> &Scope {
        &self.closure
    }

    /// The self captured at creation time, if its object is still alive.
    pub fn captured_self(&self) -> Option<Value> {
        self.receiver.upgrade().map(Value)
    }
}

impl Value {
    /// Create a dynamic object with the given prototype. Only the root
    /// `Object` is created without one.
    pub fn object(parent: Option<Value>, name: Option<FinchString>) -> Value {
        Value(Rc::new(Object {
            parent,
            kind: ObjectKind::Dynamic(DynamicObject {
                name,
                members: Scope::new(),
                primitives: RefCell::new(BTreeMap::new()),
            }),
        }))
    }

    pub fn number(environment: &Environment, value: f64) -> Value {
        Value(Rc::new(Object {
            parent: Some(environment.number_prototype().clone()),
            kind: ObjectKind::Number(value),
        }))
    }

    pub fn string(environment: &Environment, value: impl Into<FinchString>) -> Value {
        Value(Rc::new(Object {
            parent: Some(environment.string_prototype().clone()),
            kind: ObjectKind::String(value.into()),
        }))
    }

    pub fn array(environment: &Environment, elements: Vec<Value>) -> Value {
        Value(Rc::new(Object {
            parent: Some(environment.array_prototype().clone()),
            kind: ObjectKind::Array(RefCell::new(elements)),
        }))
    }

    /// Create a block value capturing the given closure scope and receiver.
    pub fn block(
        environment: &Environment,
        code: Rc<CodeBlock>,
        closure: Scope,
        receiver: &Value,
    ) -> Value {
        Value(Rc::new(Object {
            parent: Some(environment.block_prototype().clone()),
            kind: ObjectKind::Block(BlockValue {
                code,
                closure,
                receiver: Rc::downgrade(&receiver.0),
            }),
        }))
    }

    pub fn fiber(environment: &Environment, fiber: Fiber) -> Value {
        Value(Rc::new(Object {
            parent: Some(environment.fiber_prototype().clone()),
            kind: ObjectKind::Fiber(RefCell::new(fiber)),
        }))
    }

    /// Get the prototype this value delegates to.
    pub fn parent(&self) -> Option<&Value> {
        self.0.parent.as_ref()
    }

    /// Get the type of value, rendered as a string.
    pub fn type_name(&self) -> &'static str {
        match &self.0.kind {
            ObjectKind::Dynamic(_) => "object",
            ObjectKind::Number(_) => "number",
            ObjectKind::String(_) => "string",
            ObjectKind::Array(_) => "array",
            ObjectKind::Block(_) => "block",
            ObjectKind::Fiber(_) => "fiber",
        }
    }

    pub fn as_dynamic(&self) -> Option<&DynamicObject> {
        match &self.0.kind {
            ObjectKind::Dynamic(dynamic) => Some(dynamic),
            _ => None,
        }
    }

    /// If this value is a number, get its numeric value.
    pub fn as_number(&self) -> Option<f64> {
        match &self.0.kind {
            ObjectKind::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// If this value is a string, get its string value.
    pub fn as_string(&self) -> Option<&FinchString> {
        match &self.0.kind {
            ObjectKind::String(string) => Some(string),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&BlockValue> {
        match &self.0.kind {
            ObjectKind::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self.0.kind, ObjectKind::Block(_))
    }

    /// If this value is an array, borrow its elements.
    pub fn elements(&self) -> Option<Ref<'_, Vec<Value>>> {
        match &self.0.kind {
            ObjectKind::Array(elements) => Some(elements.borrow()),
            _ => None,
        }
    }

    /// If this value is an array, borrow its elements mutably.
    pub fn elements_mut(&self) -> Option<RefMut<'_, Vec<Value>>> {
        match &self.0.kind {
            ObjectKind::Array(elements) => Some(elements.borrow_mut()),
            _ => None,
        }
    }

    pub(crate) fn fiber_state(&self) -> Option<&RefCell<Fiber>> {
        match &self.0.kind {
            ObjectKind::Fiber(fiber) => Some(fiber),
            _ => None,
        }
    }

    /// Compare two values by identity. The uniqueness of the Nil, True and
    /// False singletons rests on this.
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Deliver a message to this value.
    ///
    /// Dispatch walks the prototype chain starting at the receiver. At each
    /// dynamic object along the way the primitive table is consulted first,
    /// then the member scope: a block member is called as a method with this
    /// value as self, while a data member is answered directly. When the
    /// chain is exhausted the error is reported through the host and Nil is
    /// answered.
    pub fn receive(
        &self,
        fiber: &mut Fiber,
        message: &str,
        args: &[Value],
    ) -> Result<(), Exception> {
        let mut target = self.clone();

        loop {
            enum Found {
                Primitive(PrimitiveFn),
                Member(Value),
                Miss,
            }

            let found = match &target.0.kind {
                ObjectKind::Dynamic(dynamic) => {
                    if let Some(primitive) = dynamic.primitive(message) {
                        Found::Primitive(primitive)
                    } else if let Some(member) = dynamic.members.get_local(message) {
                        Found::Member(member)
                    } else {
                        Found::Miss
                    }
                }
                _ => Found::Miss,
            };

            match found {
                Found::Primitive(primitive) => return primitive(self.clone(), fiber, message, args),
                Found::Member(member) => {
                    if member.is_block() {
                        fiber.call_method(self.clone(), &member, args);
                    } else {
                        fiber.push(member);
                    }
                    return Ok(());
                }
                Found::Miss => match target.parent().cloned() {
                    Some(parent) => target = parent,
                    None => break,
                },
            }
        }

        fiber.error(format!("{:?} does not understand '{}'", self, message));
        fiber.push_nil();
        Ok(())
    }
}

impl PartialEq for Value {
    fn eq(&self, rhs: &Value) -> bool {
        match (&self.0.kind, &rhs.0.kind) {
            (ObjectKind::Number(lhs), ObjectKind::Number(rhs)) => lhs == rhs,
            (ObjectKind::String(lhs), ObjectKind::String(rhs)) => lhs == rhs,
            // Everything else compares by identity.
            _ => Rc::ptr_eq(&self.0, &rhs.0),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0.kind {
            ObjectKind::Number(number) => write!(f, "{}", number),
            ObjectKind::String(string) => write!(f, "\"{}\"", string),
            ObjectKind::Dynamic(dynamic) => match &dynamic.name {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "<{}>", self.type_name()),
            },
            _ => write!(f, "<{}>", self.type_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0.kind {
            ObjectKind::Number(number) => write!(f, "{}", number),
            ObjectKind::String(string) => write!(f, "{}", string),
            ObjectKind::Dynamic(dynamic) => match &dynamic.name {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "<object>"),
            },
            ObjectKind::Array(elements) => {
                write!(f, "[")?;

                let elements = elements.borrow();
                let mut first = true;

                for element in elements.iter() {
                    if first {
                        write!(f, "{}", element)?;
                        first = false;
                    } else {
                        write!(f, ", {}", element)?;
                    }
                }

                write!(f, "]")
            }
            ObjectKind::Block(_) => write!(f, "<block>"),
            ObjectKind::Fiber(_) => write!(f, "<fiber>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_are_unique() {
        let env = Environment::new();

        assert!(Value::ptr_eq(&env.nil(), &env.nil()));
        assert!(Value::ptr_eq(&env.boolean(true), &env.boolean(true)));
        assert!(!Value::ptr_eq(&env.boolean(true), &env.boolean(false)));
        assert!(!Value::ptr_eq(&env.nil(), &env.boolean(false)));
    }

    #[test]
    fn prototype_chains_reach_the_root() {
        let env = Environment::new();

        let number = Value::number(&env, 1.0);
        let mut depth = 0;
        let mut current = number;

        while let Some(parent) = current.parent().cloned() {
            depth += 1;
            current = parent;
            assert!(depth < 16, "prototype chain is unexpectedly deep");
        }

        assert!(Value::ptr_eq(&current, env.object_prototype()));
    }

    #[test]
    fn display_forms() {
        let env = Environment::new();

        assert_eq!(Value::number(&env, 7.0).to_string(), "7");
        assert_eq!(Value::number(&env, 1.5).to_string(), "1.5");
        assert_eq!(Value::string(&env, "hi").to_string(), "hi");
        assert_eq!(env.nil().to_string(), "Nil");

        let array = Value::array(
            &env,
            vec![Value::number(&env, 1.0), Value::string(&env, "two")],
        );
        assert_eq!(array.to_string(), "[1, two]");
    }

    #[test]
    fn captured_self_is_weak() {
        let env = Environment::new();
        let code = Rc::new(crate::bytecode::CodeBlock::new(Vec::new()));

        let owner = Value::object(Some(env.object_prototype().clone()), None);
        let block = Value::block(&env, code, Scope::new(), &owner);

        assert!(block.as_block().unwrap().captured_self().is_some());
        drop(owner);
        assert!(block.as_block().unwrap().captured_self().is_none());
    }
}
