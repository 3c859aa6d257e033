//! Primitives on the `String` prototype.

use super::registry;
use crate::environment::Environment;
use crate::exceptions::Exception;
use crate::fiber::Fiber;
use crate::value::Value;

pub(super) fn install(env: &Environment) {
    let string = registry(env.string_prototype());

    string.register_primitive("+", concatenate);
    string.register_primitive("length", length);
    string.register_primitive("=", equals);
    string.register_primitive("!=", not_equals);
    string.register_primitive("at:", at);
}

/// Concatenation accepts any argument and uses its display form.
fn concatenate(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    let lhs = match receiver.as_string() {
        Some(string) => string.clone(),
        None => {
            fiber.error(format!("'{}' expects a string receiver", message));
            fiber.push_nil();
            return Ok(());
        }
    };

    let rhs = args.first().map(|arg| arg.to_string()).unwrap_or_default();

    fiber.push_string(format!("{}{}", lhs, rhs));
    Ok(())
}

/// The number of characters in the string.
fn length(receiver: Value, fiber: &mut Fiber, message: &str, _args: &[Value]) -> Result<(), Exception> {
    match receiver.as_string() {
        Some(string) => {
            let count = string.as_str().chars().count();
            fiber.push_number(count as f64);
        }
        None => {
            fiber.error(format!("'{}' expects a string receiver", message));
            fiber.push_nil();
        }
    }
    Ok(())
}

fn equals(receiver: Value, fiber: &mut Fiber, _message: &str, args: &[Value]) -> Result<(), Exception> {
    let equal = match (receiver.as_string(), args.first().and_then(Value::as_string)) {
        (Some(lhs), Some(rhs)) => lhs == rhs,
        _ => false,
    };
    fiber.push_bool(equal);
    Ok(())
}

fn not_equals(receiver: Value, fiber: &mut Fiber, _message: &str, args: &[Value]) -> Result<(), Exception> {
    let equal = match (receiver.as_string(), args.first().and_then(Value::as_string)) {
        (Some(lhs), Some(rhs)) => lhs == rhs,
        _ => false,
    };
    fiber.push_bool(!equal);
    Ok(())
}

/// The character at a zero-based index, answered as a one-character string.
fn at(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    let string = match receiver.as_string() {
        Some(string) => string.clone(),
        None => {
            fiber.error(format!("'{}' expects a string receiver", message));
            fiber.push_nil();
            return Ok(());
        }
    };

    let index = match args.first().and_then(Value::as_number) {
        Some(index) if index >= 0.0 => index as usize,
        _ => {
            fiber.error(format!("'{}' expects a non-negative index", message));
            fiber.push_nil();
            return Ok(());
        }
    };

    match string.as_str().chars().nth(index) {
        Some(c) => fiber.push_string(c.to_string()),
        None => {
            fiber.error(format!("index {} is out of bounds", index));
            fiber.push_nil();
        }
    }

    Ok(())
}
