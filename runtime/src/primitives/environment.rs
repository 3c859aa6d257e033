//! Primitives on the `Environment` prototype.
//!
//! Control flow in Finch is not built into the language; `if:then:` and
//! `while:do:` are ordinary messages that invoke their block arguments
//! through the fiber's block-call entry points.

use super::registry;
use crate::environment::Environment;
use crate::exceptions::Exception;
use crate::fiber::Fiber;
use crate::value::Value;
use finch_syntax::source::SourceFile;

pub(super) fn install(env: &Environment) {
    let environment = registry(env.environment_prototype());

    environment.register_primitive("if:then:", if_then);
    environment.register_primitive("if:then:else:", if_then_else);
    environment.register_primitive("while:do:", while_do);
    environment.register_primitive("write:", write);
    environment.register_primitive("write-line:", write_line);
    environment.register_primitive("load:", load);
}

/// Call a branch block; its result becomes the result of the conditional.
fn invoke_branch(fiber: &mut Fiber, branch: &Value) {
    if branch.is_block() {
        fiber.call_block(branch, &[]);
    } else {
        fiber.error("a conditional branch must be a block");
        fiber.push_nil();
    }
}

/// Evaluate the `then:` block only when the condition is the True
/// singleton; otherwise answer Nil.
fn if_then(_receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    match (args.first(), args.get(1)) {
        (Some(condition), Some(then)) => {
            if fiber.environment().is_true(condition) {
                invoke_branch(fiber, then);
            } else {
                fiber.push_nil();
            }
        }
        _ => {
            fiber.error(format!("'{}' requires a condition and a block", message));
            fiber.push_nil();
        }
    }
    Ok(())
}

fn if_then_else(_receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    match (args.first(), args.get(1), args.get(2)) {
        (Some(condition), Some(then), Some(otherwise)) => {
            if fiber.environment().is_true(condition) {
                invoke_branch(fiber, then);
            } else {
                invoke_branch(fiber, otherwise);
            }
        }
        _ => {
            fiber.error(format!("'{}' requires a condition and two blocks", message));
            fiber.push_nil();
        }
    }
    Ok(())
}

/// Repeatedly evaluate the condition block; while its result is True,
/// evaluate the body block. Answers Nil.
fn while_do(_receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    let (condition, body) = match (args.first(), args.get(1)) {
        (Some(condition), Some(body)) if condition.is_block() && body.is_block() => {
            (condition.clone(), body.clone())
        }
        _ => {
            fiber.error(format!("'{}' requires two block arguments", message));
            fiber.push_nil();
            return Ok(());
        }
    };

    loop {
        let result = fiber.run_block(&condition, &[])?;

        if !fiber.environment().is_true(&result) {
            break;
        }

        fiber.run_block(&body, &[])?;
    }

    fiber.push_nil();
    Ok(())
}

/// Display the argument's string form.
fn write(_receiver: Value, fiber: &mut Fiber, _message: &str, args: &[Value]) -> Result<(), Exception> {
    let text = args.first().map(|arg| arg.to_string()).unwrap_or_default();
    fiber.output(&text);
    fiber.push_nil();
    Ok(())
}

/// Display the argument's string form followed by a newline.
fn write_line(_receiver: Value, fiber: &mut Fiber, _message: &str, args: &[Value]) -> Result<(), Exception> {
    let text = args.first().map(|arg| arg.to_string()).unwrap_or_default();
    fiber.output(&format!("{}\n", text));
    fiber.push_nil();
    Ok(())
}

/// Ask the host for a source file, compile it, and run it in the current
/// fiber. The loaded program's result becomes the message result.
fn load(_receiver: Value, fiber: &mut Fiber, message: &str, args: &[Value]) -> Result<(), Exception> {
    let path = match args.first().and_then(Value::as_string) {
        Some(path) => path.clone(),
        None => {
            fiber.error(format!("'{}' requires a string path", message));
            fiber.push_nil();
            return Ok(());
        }
    };

    let loaded = fiber.host().borrow_mut().load_module(path.as_str());
    let source = match loaded {
        Ok(source) => source,
        Err(e) => {
            fiber.error(format!("cannot load '{}': {}", path, e));
            fiber.push_nil();
            return Ok(());
        }
    };

    let program = match finch_syntax::parse(SourceFile::named(path.to_string(), source)) {
        Ok(program) => program,
        Err(e) => {
            fiber.error(format!("error parsing {}: {}", path, e));
            fiber.push_nil();
            return Ok(());
        }
    };

    log::debug!("loading module '{}'", path);

    let env = fiber.environment().clone();
    let id = env.blocks().add(Vec::new(), &program.body, &env);
    let code = match env.blocks().find(id) {
        Some(code) => code,
        None => {
            fiber.error(format!("module block {} missing from the block table", id));
            fiber.push_nil();
            return Ok(());
        }
    };

    // Loaded code runs at the top level: closed over the global scope with
    // Nil as self.
    let nil = env.nil();
    let block = Value::block(&env, code, env.globals().clone(), &nil);
    fiber.call_method(nil, &block, &[]);

    Ok(())
}
