//! The top of the runtime: compilation driver and fiber scheduler.

use crate::environment::Environment;
use crate::exceptions::Exception;
use crate::fiber::Fiber;
use crate::host::{InterpreterHost, SharedHost};
use crate::throw;
use crate::value::Value;
use finch_syntax::source::SourceFile;
use std::{cell::RefCell, collections::VecDeque, rc::Rc};

/// Owns the environment, the host callbacks, and a FIFO of runnable fibers
/// that are driven round-robin.
///
/// At most one fiber executes at a time and there is no preemption: a fiber
/// runs until it completes or explicitly pauses itself through a fiber
/// primitive, at which point it rotates to the back of the queue.
pub struct Interpreter {
    environment: Environment,
    host: SharedHost,
    ready: VecDeque<Value>,
}

impl Interpreter {
    pub fn new(host: impl InterpreterHost + 'static) -> Self {
        Self {
            environment: Environment::new(),
            host: Rc::new(RefCell::new(host)),
            ready: VecDeque::new(),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Compile a source file into a block value closed over the global
    /// scope, with Nil as its captured self.
    pub fn compile(&self, file: impl Into<SourceFile>) -> Result<Value, Exception> {
        let file = file.into();
        let name = file.name().to_string();

        let program = match finch_syntax::parse(file) {
            Ok(program) => program,
            Err(e) => throw!("error parsing {}: {}", name, e),
        };

        let id = self
            .environment
            .blocks()
            .add(Vec::new(), &program.body, &self.environment);

        let code = match self.environment.blocks().find(id) {
            Some(code) => code,
            None => throw!("top-level block {} missing from the block table", id),
        };

        let nil = self.environment.nil();
        Ok(Value::block(
            &self.environment,
            code,
            self.environment.globals().clone(),
            &nil,
        ))
    }

    /// Compile a program, wrap it in a fresh fiber, and drive the ready
    /// queue until every fiber has finished. Returns the program's result.
    pub fn interpret(&mut self, file: impl Into<SourceFile>) -> Result<Value, Exception> {
        let block = self.compile(file)?;
        let fiber = Fiber::new(self.environment.clone(), self.host.clone(), &block)?;
        let main = Value::fiber(&self.environment, fiber);

        self.ready.push_back(main.clone());
        self.run(&main)
    }

    /// Round-robin over the ready queue until it drains.
    fn run(&mut self, main: &Value) -> Result<Value, Exception> {
        let mut result = self.environment.nil();
        let mut failure = None;

        while let Some(fiber_value) = self.ready.pop_front() {
            let outcome = match fiber_value.fiber_state() {
                Some(state) => state.borrow_mut().execute(),
                None => continue,
            };

            // Hand newly spawned fibers to the queue in spawn order.
            if let Some(state) = fiber_value.fiber_state() {
                for spawned in state.borrow_mut().take_spawned() {
                    log::debug!("fiber spawned");
                    self.ready.push_back(spawned);
                }
            }

            match outcome {
                // Completed fibers are discarded.
                Ok(Some(value)) => {
                    log::debug!("fiber completed");
                    if Value::ptr_eq(&fiber_value, main) {
                        result = value;
                    }
                }

                // Paused fibers rotate to the back of the queue.
                Ok(None) => {
                    log::trace!("fiber yielded");
                    self.ready.push_back(fiber_value);
                }

                // A fatal fault aborts this fiber only; other fibers keep
                // running. The main fiber's fault is handed to the caller,
                // any other is reported here.
                Err(exception) => {
                    if Value::ptr_eq(&fiber_value, main) {
                        failure = Some(exception);
                    } else {
                        self.host.borrow_mut().error(&exception.to_string());
                    }
                }
            }
        }

        match failure {
            Some(exception) => Err(exception),
            None => Ok(result),
        }
    }
}
