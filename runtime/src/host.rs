//! The callback surface the runtime needs from its embedder.

use std::{cell::RefCell, io, rc::Rc};

/// The host supplies the I/O the runtime itself does not have: displaying
/// text, reporting runtime errors, and reading module sources.
///
/// Errors reported here are recoverable; the fiber that raised one continues
/// with Nil where a value was expected.
pub trait InterpreterHost {
    /// Display text verbatim.
    fn output(&mut self, text: &str);

    /// Report a runtime error.
    fn error(&mut self, message: &str);

    /// Read the source of a named module.
    fn load_module(&mut self, path: &str) -> io::Result<String>;
}

/// A shared handle to the host, held by the interpreter and by every fiber.
pub type SharedHost = Rc<RefCell<dyn InterpreterHost>>;
