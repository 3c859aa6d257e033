//! The bytecode virtual machine.

use crate::bytecode::{CodeBlock, Instruction, Opcode};
use crate::environment::Environment;
use crate::exceptions::Exception;
use crate::host::SharedHost;
use crate::scope::Scope;
use crate::strings::FinchString;
use crate::throw;
use crate::value::Value;
use std::rc::Rc;

/// One call in progress: the code being executed, the next instruction
/// address, and the scope the block runs in. The frame keeps its code block
/// alive for as long as the call is on the stack.
struct CallFrame {
    code: Rc<CodeBlock>,
    address: usize,
    scope: Scope,
}

/// A fiber is a single cooperative execution context: an operand stack, a
/// call stack, and a receiver ("self") stack, plus a running flag that the
/// scheduler and the fiber primitives cooperate through.
///
/// Fibers are scheduled co-operatively on a single thread; a fiber runs
/// until its call stack drains or until it clears its own running flag.
pub struct Fiber {
    environment: Environment,
    host: SharedHost,

    /// Intermediate values produced by instructions.
    operands: Vec<Value>,

    /// Calls in progress, innermost last.
    frames: Vec<CallFrame>,

    /// The receiver per call frame.
    receivers: Vec<Value>,

    running: bool,

    /// Fibers spawned since the scheduler last looked.
    spawned: Vec<Value>,
}

impl Fiber {
    /// Create a fiber that will execute the given block.
    pub fn new(environment: Environment, host: SharedHost, block: &Value) -> Result<Fiber, Exception> {
        if block.as_block().is_none() {
            throw!("a fiber requires a block to run");
        }

        let mut fiber = Fiber {
            environment,
            host,
            operands: Vec::new(),
            frames: Vec::new(),
            receivers: Vec::new(),
            running: false,
            spawned: Vec::new(),
        };

        // Push the starting block; outside of any method, self is Nil.
        let nil = fiber.environment.nil();
        fiber.push_call(nil, block, &[]);

        Ok(fiber)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub(crate) fn host(&self) -> &SharedHost {
        &self.host
    }

    /// Whether the fiber's call stack has drained.
    pub fn is_done(&self) -> bool {
        self.frames.is_empty()
    }

    /// The current call stack depth.
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// Clear the running flag. The fiber pauses once the instruction in
    /// progress completes, and the scheduler rotates it to the back of the
    /// ready queue.
    pub fn pause(&mut self) {
        log::trace!("fiber pausing");
        self.running = false;
    }

    /// Hand a freshly spawned fiber to the scheduler.
    pub(crate) fn schedule(&mut self, fiber: Value) {
        self.spawned.push(fiber);
    }

    pub(crate) fn take_spawned(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.spawned)
    }

    /// Drive the fiber until it completes or pauses.
    ///
    /// Returns the fiber's result when the call stack has drained, or `None`
    /// when the fiber paused to let another one run. A returned error is a
    /// fatal fault; the fiber must be discarded.
    pub fn execute(&mut self) -> Result<Option<Value>, Exception> {
        self.running = true;

        while self.running && !self.frames.is_empty() {
            let instruction = self.fetch()?;
            self.dispatch(instruction)?;
        }

        if self.is_done() {
            // The last operation performed leaves its result on the operand
            // stack; that is the result of executing the fiber's block.
            return self.pop_operand().map(Some);
        }

        Ok(None)
    }

    /// Read the instruction at the current frame's address and advance past
    /// it before execution.
    fn fetch(&mut self) -> Result<Instruction, Exception> {
        let frame = match self.frames.last_mut() {
            Some(frame) => frame,
            None => throw!("fetch on an empty call stack"),
        };

        let instruction = match frame.code.code().get(frame.address) {
            Some(&instruction) => instruction,
            None => throw!("instruction address {} out of range", frame.address),
        };

        frame.address += 1;

        Ok(instruction)
    }

    fn dispatch(&mut self, instruction: Instruction) -> Result<(), Exception> {
        // Message sends are a family of opcodes, one per argument count.
        if let Some(arity) = instruction.op.message_arity() {
            return self.dispatch_message(instruction, arity);
        }

        match instruction.op {
            Opcode::Nothing => {}

            Opcode::NumberLiteral => {
                let number = instruction.number()?;
                self.push_number(number);
            }

            Opcode::StringLiteral => {
                let string = self.find_string(instruction.id()?)?;
                self.push_string(string);
            }

            Opcode::BlockLiteral => {
                // Capture the current scope and receiver.
                let id = instruction.id()?;
                let code = match self.environment.blocks().find(id) {
                    Some(code) => code,
                    None => throw!("unknown block id {}", id),
                };

                let closure = self.current_scope();
                let receiver = self.self_value();
                let block = Value::block(&self.environment, code, closure, &receiver);

                self.push(block);
            }

            Opcode::CreateArray => {
                let count = instruction.id()? as usize;

                // Pop the elements, then reverse: they were pushed in source
                // order and popping reverses them.
                let mut elements = Vec::with_capacity(count);
                for _ in 0..count {
                    elements.push(self.pop_operand()?);
                }
                elements.reverse();

                let array = Value::array(&self.environment, elements);
                self.push(array);
            }

            Opcode::Pop => {
                self.pop_operand()?;
            }

            Opcode::Dup => {
                let top = self.peek_operand()?;
                self.push(top);
            }

            Opcode::DefGlobal => {
                // def answers the defined value, so peek rather than pop.
                let value = self.peek_operand()?;
                let name = self.find_string(instruction.id()?)?;
                self.environment.globals().define(name, value);
            }

            Opcode::DefObject => {
                let value = self.peek_operand()?;
                let name = self.find_string(instruction.id()?)?;
                let receiver = self.self_value();

                if self.environment.is_nil(&receiver) {
                    self.error(format!("cannot define '{}' outside of a method", name));
                } else {
                    match receiver.as_dynamic() {
                        Some(dynamic) => dynamic.members().define(name, value),
                        None => {
                            self.error(format!("'{}' cannot be defined on a {}", name, receiver.type_name()))
                        }
                    }
                }
            }

            Opcode::DefLocal => {
                let value = self.peek_operand()?;
                let name = self.find_string(instruction.id()?)?;
                self.current_scope().define(name, value);
            }

            Opcode::UndefGlobal => {
                let name = self.find_string(instruction.id()?)?;
                self.environment.globals().undefine(name.as_str());
                self.push_nil();
            }

            Opcode::UndefObject => {
                let name = self.find_string(instruction.id()?)?;
                let receiver = self.self_value();

                if !self.environment.is_nil(&receiver) {
                    if let Some(dynamic) = receiver.as_dynamic() {
                        dynamic.members().undefine(name.as_str());
                    }
                }

                self.push_nil();
            }

            Opcode::UndefLocal => {
                let name = self.find_string(instruction.id()?)?;
                self.current_scope().undefine(name.as_str());
                self.push_nil();
            }

            Opcode::SetLocal => {
                // set answers the assigned value, so peek rather than pop.
                let value = self.peek_operand()?;
                let name = self.find_string(instruction.id()?)?;

                if !self.current_scope().set(name.as_str(), value) {
                    self.error(format!("cannot assign to undefined name '{}'", name));
                }
            }

            Opcode::LoadGlobal => {
                let name = self.find_string(instruction.id()?)?;
                let value = self
                    .environment
                    .globals()
                    .lookup(name.as_str())
                    .unwrap_or_else(|| self.environment.nil());
                self.push(value);
            }

            Opcode::LoadObject => {
                let name = self.find_string(instruction.id()?)?;
                let receiver = self.self_value();
                let value = receiver
                    .as_dynamic()
                    .and_then(|dynamic| dynamic.members().get_local(name.as_str()))
                    .unwrap_or_else(|| self.environment.nil());
                self.push(value);
            }

            Opcode::LoadLocal => {
                let name = self.find_string(instruction.id()?)?;
                let value = self
                    .current_scope()
                    .lookup(name.as_str())
                    .unwrap_or_else(|| self.environment.nil());
                self.push(value);
            }

            Opcode::LoadSelf => {
                let receiver = self.self_value();
                self.push(receiver);
            }

            Opcode::EndBlock => {
                self.frames.pop();
                self.receivers.pop();
            }

            // Message opcodes were handled above.
            _ => throw!("unknown opcode {:?}", instruction.op),
        }

        Ok(())
    }

    fn dispatch_message(&mut self, instruction: Instruction, arity: usize) -> Result<(), Exception> {
        // Pop the arguments, then reverse: they are on the stack first to
        // last so that they were evaluated left to right.
        let mut args = Vec::with_capacity(arity);
        for _ in 0..arity {
            args.push(self.pop_operand()?);
        }
        args.reverse();

        let receiver = self.pop_operand()?;
        let name = self.find_string(instruction.id()?)?;

        receiver.receive(self, name.as_str(), &args)
    }

    // ---- calls ----

    /// Invoke a block as a method of `receiver`.
    ///
    /// Performs tail call optimization: the current frame's address has
    /// already advanced past the send, so if its next instruction would end
    /// the block, the frame is discarded now instead of waiting for the new
    /// frame to return to it. Final-position sends therefore run in constant
    /// call-stack depth.
    pub fn call_method(&mut self, receiver: Value, block: &Value, args: &[Value]) {
        let fold = self
            .frames
            .last()
            .and_then(|frame| frame.code.code().get(frame.address))
            .map(|instruction| instruction.op == Opcode::EndBlock)
            .unwrap_or(false);

        if fold {
            self.frames.pop();
            self.receivers.pop();
        }

        self.push_call(receiver, block, args);
    }

    /// Invoke a block with the self it captured at creation time.
    pub fn call_block(&mut self, block: &Value, args: &[Value]) {
        let receiver = block
            .as_block()
            .and_then(|b| b.captured_self())
            .unwrap_or_else(|| self.environment.nil());

        self.call_method(receiver, block, args);
    }

    /// Call a block from inside a primitive and run it to completion,
    /// returning its result.
    ///
    /// This is the entry point primitives like `while:do:` use when they
    /// need to observe a block's result mid-instruction. The pushed frame is
    /// exempt from the tail-call fold, since the primitive still needs the
    /// current frame when the block returns.
    pub fn run_block(&mut self, block: &Value, args: &[Value]) -> Result<Value, Exception> {
        let depth = self.frames.len();

        let receiver = block
            .as_block()
            .and_then(|b| b.captured_self())
            .unwrap_or_else(|| self.environment.nil());
        self.push_call(receiver, block, args);

        while self.frames.len() > depth {
            let instruction = self.fetch()?;
            self.dispatch(instruction)?;
        }

        self.pop_operand()
    }

    /// Push a call frame for a block with a fresh scope on the block's
    /// closure. Missing arguments are bound as Nil and extra arguments are
    /// discarded.
    fn push_call(&mut self, receiver: Value, block: &Value, args: &[Value]) {
        let b = match block.as_block() {
            Some(b) => b,
            None => {
                self.error(format!("cannot call a {} as a block", block.type_name()));
                self.push_nil();
                return;
            }
        };

        let scope = b.closure().child();

        for (index, param) in b.code().params().iter().enumerate() {
            let arg = args
                .get(index)
                .cloned()
                .unwrap_or_else(|| self.environment.nil());
            scope.define(param.clone(), arg);
        }

        self.frames.push(CallFrame {
            code: b.code().clone(),
            address: 0,
            scope,
        });
        self.receivers.push(receiver);
    }

    // ---- operand stack ----

    pub fn push(&mut self, value: Value) {
        self.operands.push(value);
    }

    pub fn push_nil(&mut self) {
        let nil = self.environment.nil();
        self.push(nil);
    }

    pub fn push_bool(&mut self, value: bool) {
        let boolean = self.environment.boolean(value);
        self.push(boolean);
    }

    pub fn push_number(&mut self, value: f64) {
        let number = Value::number(&self.environment, value);
        self.push(number);
    }

    pub fn push_string(&mut self, value: impl Into<FinchString>) {
        let string = Value::string(&self.environment, value);
        self.push(string);
    }

    fn pop_operand(&mut self) -> Result<Value, Exception> {
        match self.operands.pop() {
            Some(value) => Ok(value),
            None => throw!("operand stack underflow"),
        }
    }

    fn peek_operand(&self) -> Result<Value, Exception> {
        match self.operands.last() {
            Some(value) => Ok(value.clone()),
            None => throw!("operand stack underflow"),
        }
    }

    // ---- receivers and scopes ----

    /// The current receiver.
    pub fn self_value(&self) -> Value {
        self.receivers
            .last()
            .cloned()
            .unwrap_or_else(|| self.environment.nil())
    }

    fn current_scope(&self) -> Scope {
        self.frames
            .last()
            .map(|frame| frame.scope.clone())
            .unwrap_or_default()
    }

    // ---- host plumbing ----

    /// Report a recoverable runtime error through the host.
    pub fn error(&self, message: impl AsRef<str>) {
        self.host.borrow_mut().error(message.as_ref());
    }

    /// Display text through the host.
    pub fn output(&self, text: &str) {
        self.host.borrow_mut().output(text);
    }

    fn find_string(&self, id: u32) -> Result<FinchString, Exception> {
        match self.environment.strings().find(id) {
            Some(string) => Ok(string),
            None => throw!("unknown string id {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InterpreterHost;
    use std::cell::RefCell;
    use std::io;

    struct QuietHost;

    impl InterpreterHost for QuietHost {
        fn output(&mut self, _text: &str) {}
        fn error(&mut self, _message: &str) {}
        fn load_module(&mut self, _path: &str) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no modules"))
        }
    }

    fn quiet_host() -> SharedHost {
        Rc::new(RefCell::new(QuietHost))
    }

    fn compile_block(env: &Environment, source: &str) -> Value {
        let program = finch_syntax::parse(source).unwrap();
        let id = env.blocks().add(Vec::new(), &program.body, env);
        let code = env.blocks().find(id).unwrap();
        Value::block(env, code, env.globals().clone(), &env.nil())
    }

    fn run(source: &str) -> Value {
        let env = Environment::new();
        let block = compile_block(&env, source);
        let mut fiber = Fiber::new(env, quiet_host(), &block).unwrap();
        fiber.execute().unwrap().expect("fiber did not complete")
    }

    #[test]
    fn a_completed_fiber_leaves_one_result() {
        assert_eq!(run("42").as_number(), Some(42.0));
        assert_eq!(run("1. 2. 3").as_number(), Some(3.0));
    }

    #[test]
    fn definitions_answer_their_value() {
        assert_eq!(run("x <- 5").as_number(), Some(5.0));
        assert_eq!(run("x <- 5. x + 1").as_number(), Some(6.0));
    }

    #[test]
    fn assignment_to_undefined_names_changes_nothing() {
        let value = run("ghost <-- 1. 2");
        assert_eq!(value.as_number(), Some(2.0));
    }

    #[test]
    fn tail_sends_fold_the_calling_frame() {
        let env = Environment::new();

        // A block whose only instruction after the pending address is
        // EndBlock; a send from here must not grow the call stack.
        let outer = compile_block(&env, "1");
        let callee = compile_block(&env, "2");

        let mut fiber = Fiber::new(env.clone(), quiet_host(), &outer).unwrap();

        // The frame is at address 0; its NumberLiteral is followed by
        // EndBlock, so after fetching once the next instruction ends the
        // block.
        let instruction = fiber.fetch().unwrap();
        fiber.dispatch(instruction).unwrap();

        assert_eq!(fiber.call_depth(), 1);
        fiber.call_method(env.nil(), &callee, &[]);
        assert_eq!(fiber.call_depth(), 1, "tail call must replace the frame");
    }

    #[test]
    fn non_tail_sends_push_a_frame() {
        let env = Environment::new();

        let outer = compile_block(&env, "1. 2");
        let callee = compile_block(&env, "3");

        let mut fiber = Fiber::new(env.clone(), quiet_host(), &outer).unwrap();

        let instruction = fiber.fetch().unwrap();
        fiber.dispatch(instruction).unwrap();

        // The next instruction is Pop, not EndBlock, so the frame stays.
        assert_eq!(fiber.call_depth(), 1);
        fiber.call_method(env.nil(), &callee, &[]);
        assert_eq!(fiber.call_depth(), 2);
    }

    #[test]
    fn run_block_returns_the_block_result() {
        let env = Environment::new();

        let outer = compile_block(&env, "1");
        let callee = compile_block(&env, "41 + 1");

        let mut fiber = Fiber::new(env, quiet_host(), &outer).unwrap();
        let result = fiber.run_block(&callee, &[]).unwrap();

        assert_eq!(result.as_number(), Some(42.0));
        assert_eq!(fiber.call_depth(), 1, "the outer frame is untouched");
    }

    #[test]
    fn missing_arguments_become_nil() {
        let env = Environment::new();

        let program = finch_syntax::parse("b <- { |x y| x }. b value: 9").unwrap();
        let id = env.blocks().add(Vec::new(), &program.body, &env);
        let code = env.blocks().find(id).unwrap();
        let block = Value::block(&env, code, env.globals().clone(), &env.nil());

        let mut fiber = Fiber::new(env.clone(), quiet_host(), &block).unwrap();
        let result = fiber.execute().unwrap().unwrap();
        assert_eq!(result.as_number(), Some(9.0));

        let program = finch_syntax::parse("b <- { |x y| y }. b value: 9").unwrap();
        let id = env.blocks().add(Vec::new(), &program.body, &env);
        let code = env.blocks().find(id).unwrap();
        let block = Value::block(&env, code, env.globals().clone(), &env.nil());

        let mut fiber = Fiber::new(env.clone(), quiet_host(), &block).unwrap();
        let result = fiber.execute().unwrap().unwrap();
        assert!(env.is_nil(&result));
    }
}
