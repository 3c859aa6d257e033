//! Primitives on the `Number` prototype.

use super::registry;
use crate::environment::Environment;
use crate::exceptions::Exception;
use crate::fiber::Fiber;
use crate::value::Value;

pub(super) fn install(env: &Environment) {
    let number = registry(env.number_prototype());

    number.register_primitive("+", add);
    number.register_primitive("-", subtract);
    number.register_primitive("*", multiply);
    number.register_primitive("/", divide);
    number.register_primitive("=", equals);
    number.register_primitive("!=", not_equals);
    number.register_primitive("<", less_than);
    number.register_primitive(">", greater_than);
    number.register_primitive("<=", less_than_or_equal);
    number.register_primitive(">=", greater_than_or_equal);
    number.register_primitive("abs", abs);
    number.register_primitive("neg", neg);
}

/// Read the receiver and sole argument as numbers, reporting a type
/// mismatch otherwise.
fn operands(receiver: &Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Option<(f64, f64)> {
    match (receiver.as_number(), args.first().and_then(Value::as_number)) {
        (Some(lhs), Some(rhs)) => Some((lhs, rhs)),
        _ => {
            fiber.error(format!(
                "'{}' expects a number receiver and a number argument",
                message
            ));
            None
        }
    }
}

fn add(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    match operands(&receiver, fiber, message, args) {
        Some((lhs, rhs)) => fiber.push_number(lhs + rhs),
        None => fiber.push_nil(),
    }
    Ok(())
}

fn subtract(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    match operands(&receiver, fiber, message, args) {
        Some((lhs, rhs)) => fiber.push_number(lhs - rhs),
        None => fiber.push_nil(),
    }
    Ok(())
}

fn multiply(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    match operands(&receiver, fiber, message, args) {
        Some((lhs, rhs)) => fiber.push_number(lhs * rhs),
        None => fiber.push_nil(),
    }
    Ok(())
}

fn divide(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    match operands(&receiver, fiber, message, args) {
        Some((lhs, rhs)) => fiber.push_number(lhs / rhs),
        None => fiber.push_nil(),
    }
    Ok(())
}

/// Numbers compare equal by value; any other argument is simply not equal,
/// which is not an error.
fn equals(receiver: Value, fiber: &mut Fiber, _message: &str, args: &[Value]) -> Result<(), Exception> {
    let equal = match (receiver.as_number(), args.first().and_then(Value::as_number)) {
        (Some(lhs), Some(rhs)) => lhs == rhs,
        _ => false,
    };
    fiber.push_bool(equal);
    Ok(())
}

fn not_equals(receiver: Value, fiber: &mut Fiber, _message: &str, args: &[Value]) -> Result<(), Exception> {
    let equal = match (receiver.as_number(), args.first().and_then(Value::as_number)) {
        (Some(lhs), Some(rhs)) => lhs == rhs,
        _ => false,
    };
    fiber.push_bool(!equal);
    Ok(())
}

fn less_than(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    match operands(&receiver, fiber, message, args) {
        Some((lhs, rhs)) => fiber.push_bool(lhs < rhs),
        None => fiber.push_nil(),
    }
    Ok(())
}

fn greater_than(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    match operands(&receiver, fiber, message, args) {
        Some((lhs, rhs)) => fiber.push_bool(lhs > rhs),
        None => fiber.push_nil(),
    }
    Ok(())
}

fn less_than_or_equal(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    match operands(&receiver, fiber, message, args) {
        Some((lhs, rhs)) => fiber.push_bool(lhs <= rhs),
        None => fiber.push_nil(),
    }
    Ok(())
}

fn greater_than_or_equal(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    match operands(&receiver, fiber, message, args) {
        Some((lhs, rhs)) => fiber.push_bool(lhs >= rhs),
        None => fiber.push_nil(),
    }
    Ok(())
}

fn abs(receiver: Value, fiber: &mut Fiber, message: &str, _args: &[Value]) -> Result<(), Exception> {
    match receiver.as_number() {
        Some(value) => fiber.push_number(value.abs()),
        None => {
            fiber.error(format!("'{}' expects a number receiver", message));
            fiber.push_nil();
        }
    }
    Ok(())
}

fn neg(receiver: Value, fiber: &mut Fiber, message: &str, _args: &[Value]) -> Result<(), Exception> {
    match receiver.as_number() {
        Some(value) => fiber.push_number(-value),
        None => {
            fiber.error(format!("'{}' expects a number receiver", message));
            fiber.push_nil();
        }
    }
    Ok(())
}
