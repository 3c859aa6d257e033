//! Primitives on the `Array` prototype.

use super::registry;
use crate::environment::Environment;
use crate::exceptions::Exception;
use crate::fiber::Fiber;
use crate::value::Value;

pub(super) fn install(env: &Environment) {
    let array = registry(env.array_prototype());

    array.register_primitive("count", count);
    array.register_primitive("add:", add);
    array.register_primitive("at:", at);
    array.register_primitive("at:put:", at_put);
}

fn count(receiver: Value, fiber: &mut Fiber, message: &str, _args: &[Value]) -> Result<(), Exception> {
    let length = match receiver.elements() {
        Some(elements) => elements.len(),
        None => {
            fiber.error(format!("'{}' expects an array receiver", message));
            fiber.push_nil();
            return Ok(());
        }
    };

    fiber.push_number(length as f64);
    Ok(())
}

/// Append an element and answer the receiver.
fn add(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    let element = args
        .first()
        .cloned()
        .unwrap_or_else(|| fiber.environment().nil());

    match receiver.elements_mut() {
        Some(mut elements) => elements.push(element),
        None => {
            fiber.error(format!("'{}' expects an array receiver", message));
            fiber.push_nil();
            return Ok(());
        }
    }

    fiber.push(receiver);
    Ok(())
}

/// Read an index argument, reporting errors against the given length.
fn index_arg(fiber: &mut Fiber, message: &str, args: &[Value], length: usize) -> Option<usize> {
    match args.first().and_then(Value::as_number) {
        Some(index) if index >= 0.0 && (index as usize) < length => Some(index as usize),
        Some(index) => {
            fiber.error(format!("index {} is out of bounds", index));
            None
        }
        None => {
            fiber.error(format!("'{}' expects a number index", message));
            None
        }
    }
}

fn at(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    let element = match receiver.elements() {
        Some(elements) => {
            let length = elements.len();
            index_arg(fiber, message, args, length).map(|index| elements[index].clone())
        }
        None => {
            fiber.error(format!("'{}' expects an array receiver", message));
            None
        }
    };

    match element {
        Some(element) => fiber.push(element),
        None => fiber.push_nil(),
    }
    Ok(())
}

fn at_put(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    let value = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| fiber.environment().nil());

    let stored = match receiver.elements_mut() {
        Some(mut elements) => {
            let length = elements.len();
            match index_arg(fiber, message, args, length) {
                Some(index) => {
                    elements[index] = value;
                    true
                }
                None => false,
            }
        }
        None => {
            fiber.error(format!("'{}' expects an array receiver", message));
            false
        }
    };

    if stored {
        fiber.push(receiver);
    } else {
        fiber.push_nil();
    }
    Ok(())
}
