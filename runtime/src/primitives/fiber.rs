//! Primitives on the `Fiber` prototype.

use super::registry;
use crate::environment::Environment;
use crate::exceptions::Exception;
use crate::fiber::Fiber;
use crate::value::Value;

pub(super) fn install(env: &Environment) {
    let fiber = registry(env.fiber_prototype());

    fiber.register_primitive("spawn:", spawn);
    fiber.register_primitive("yield", yield_current);
    fiber.register_primitive("is-done", is_done);
}

/// Create a new fiber that will run the given block and hand it to the
/// scheduler. Answers the new fiber.
fn spawn(_receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    let block = match args.first() {
        Some(block) if block.is_block() => block.clone(),
        _ => {
            fiber.error(format!("'{}' requires a block argument", message));
            fiber.push_nil();
            return Ok(());
        }
    };

    let spawned = Fiber::new(fiber.environment().clone(), fiber.host().clone(), &block)?;
    let value = Value::fiber(fiber.environment(), spawned);

    fiber.schedule(value.clone());
    fiber.push(value);
    Ok(())
}

/// Pause the current fiber, letting the scheduler run the next one. The
/// pause takes effect once the instruction in progress completes.
fn yield_current(_receiver: Value, fiber: &mut Fiber, _message: &str, _args: &[Value]) -> Result<(), Exception> {
    fiber.pause();
    fiber.push_nil();
    Ok(())
}

/// Whether a fiber's call stack has drained. The currently running fiber is
/// never done.
fn is_done(receiver: Value, fiber: &mut Fiber, message: &str, _args: &[Value]) -> Result<(), Exception> {
    let done = match receiver.fiber_state() {
        // A fiber that cannot be borrowed is the one running right now.
        Some(state) => state.try_borrow().map(|f| f.is_done()).unwrap_or(false),
        None => {
            fiber.error(format!("'{}' requires a fiber receiver", message));
            fiber.push_nil();
            return Ok(());
        }
    };

    fiber.push_bool(done);
    Ok(())
}
