use std::{fmt, io};

/// A fatal runtime fault.
///
/// Recoverable error conditions (an unknown message, a primitive type
/// mismatch, and so on) are reported through the interpreter host and
/// execution continues with Nil where a value was expected. An `Exception`
/// is reserved for the faults a fiber cannot continue from: a malformed
/// instruction, operand-stack underflow, or a failed compilation.
#[derive(Clone)]
pub struct Exception {
    /// The exception message.
    message: String,

    /// The cause of this exception, if any.
    cause: Option<Box<Exception>>,
}

impl Exception {
    /// Create a new exception with a message.
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Create a new exception with a message and another exception that
    /// caused this one. Causes chain, which gives a poor man's trace of how
    /// a fault propagated.
    pub fn with_cause<M: Into<String>>(message: M, cause: Exception) -> Self {
        Self {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Get the exception message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the cause of the exception, if present.
    #[inline]
    pub fn cause(&self) -> Option<&Exception> {
        self.cause.as_deref()
    }
}

impl From<&'static str> for Exception {
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Exception {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<io::Error> for Exception {
    fn from(error: io::Error) -> Self {
        Self::new(error.to_string())
    }
}

impl From<finch_syntax::error::ParseError> for Exception {
    fn from(error: finch_syntax::error::ParseError) -> Self {
        Self::new(error.to_string())
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)?;

        let mut cause = self.cause.as_ref();
        while let Some(c) = cause {
            write!(f, "\ncaused by: {}", c.message)?;
            cause = c.cause.as_ref();
        }

        Ok(())
    }
}
