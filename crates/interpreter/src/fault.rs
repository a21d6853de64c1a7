use thiserror::Error;

/// Why execution stopped abnormally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// Raised by the runtime, e.g. on integer overflow.
    ///
    /// `trace` lists the functions that were active when the panic was
    /// raised, innermost first.
    #[error("panic: {message}")]
    Panic { message: String, trace: Vec<String> },

    #[error("integer divide by zero")]
    DivideByZero,

    #[error("reached unreachable code")]
    Unreachable,

    #[error("no handler is registered for external function `%{0}`")]
    UnresolvedExternal(String),

    /// A branch condition was undefined.
    #[error("branch on an undefined condition")]
    FallThrough,

    /// The program isn't executable, e.g. a block doesn't end with a
    /// terminator or a function is called with the wrong number of arguments.
    #[error("undefined behavior: {0}")]
    Undefined(String),
}

impl Fault {
    /// A panic with `message`. The trace is filled in by the machine.
    pub fn panic(message: impl Into<String>) -> Self {
        Self::Panic {
            message: message.into(),
            trace: Vec::new(),
        }
    }
}
