//! Primitives on the `Block` prototype.

use super::registry;
use crate::environment::Environment;
use crate::exceptions::Exception;
use crate::fiber::Fiber;
use crate::value::Value;

pub(super) fn install(env: &Environment) {
    let block = registry(env.block_prototype());

    // `value`, `value:`, `value:value:`, ... up to the ten arguments a
    // message send can carry.
    block.register_primitive("value", value);

    let mut selector = String::new();
    for _ in 0..10 {
        selector.push_str("value:");
        block.register_primitive(selector.as_str(), value);
    }
}

/// Invoke the receiving block with the supplied arguments. The block's
/// captured self becomes the receiver inside the block.
fn value(receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    if receiver.is_block() {
        fiber.call_block(&receiver, args);
    } else {
        fiber.error(format!("'{}' requires a block receiver", message));
        fiber.push_nil();
    }

    Ok(())
}
