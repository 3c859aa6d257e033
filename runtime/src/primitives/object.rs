//! Primitives on the root `Object` prototype.

use super::registry;
use crate::environment::Environment;
use crate::exceptions::Exception;
use crate::fiber::Fiber;
use crate::value::Value;

pub(super) fn install(env: &Environment) {
    let object = registry(env.object_prototype());

    object.register_primitive("copy", copy);
    object.register_primitive("add-field:value:", add_member);
    object.register_primitive("add-method:body:", add_method);
    object.register_primitive("=", identical);
    object.register_primitive("!=", not_identical);
}

/// Answer a new object whose prototype is the receiver and whose member
/// scope is empty.
fn copy(receiver: Value, fiber: &mut Fiber, _message: &str, _args: &[Value]) -> Result<(), Exception> {
    let copy = Value::object(Some(receiver), None);
    fiber.push(copy);
    Ok(())
}

/// Bind a named member on the receiver. Used for both fields and methods;
/// the two differ only in intent.
fn add_member(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    let name = match args.first().and_then(Value::as_string) {
        Some(name) => name.clone(),
        None => {
            fiber.error(format!("'{}' requires a string name", message));
            fiber.push_nil();
            return Ok(());
        }
    };

    let value = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| fiber.environment().nil());

    match receiver.as_dynamic() {
        Some(dynamic) => dynamic.members().define(name, value),
        None => {
            fiber.error(format!("'{}' requires an object receiver", message));
            fiber.push_nil();
            return Ok(());
        }
    }

    fiber.push(receiver);
    Ok(())
}

/// Like `add-field:value:`, but insists the bound value is a block.
fn add_method(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    match args.get(1) {
        Some(body) if body.is_block() => add_member(receiver, fiber, message, args),
        _ => {
            fiber.error(format!("'{}' requires a block body", message));
            fiber.push_nil();
            Ok(())
        }
    }
}

fn identical(receiver: Value, fiber: &mut Fiber, _message: &str, args: &[Value]) -> Result<(), Exception> {
    let equal = args
        .first()
        .map(|arg| Value::ptr_eq(&receiver, arg))
        .unwrap_or(false);
    fiber.push_bool(equal);
    Ok(())
}

fn not_identical(receiver: Value, fiber: &mut Fiber, _message: &str, args: &[Value]) -> Result<(), Exception> {
    let equal = args
        .first()
        .map(|arg| Value::ptr_eq(&receiver, arg))
        .unwrap_or(false);
    fiber.push_bool(!equal);
    Ok(())
}
