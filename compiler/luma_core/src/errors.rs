//! Runtime error types.
//!
//! Every failure inside the runtime core is synchronous and surfaces to the
//! immediate caller as a [`RuntimeError`]. Script-raised errors (`error()`)
//! travel through the same channel, which is what lets `pcall` catch them.

use thiserror::Error;

/// Result of a runtime operation.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised by the value stack, tables, environment and base library.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Pop or peek with no values above the stack floor.
    #[error("stack underflow: no values above floor {bottom}")]
    StackUnderflow { bottom: usize },

    /// `Stack::lock` was asked to raise the floor past the top.
    #[error("cannot lock stack at {at}: top is {top}")]
    LockAboveTop { at: usize, top: usize },

    /// A native function received an argument of the wrong type.
    #[error("bad argument #{position} to '{function}' ({expected} expected, got {found})")]
    TypeMismatch {
        function: &'static str,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// A native function was called with too few arguments.
    #[error("bad argument #{position} to '{function}' (value expected)")]
    MissingArgument {
        function: &'static str,
        position: usize,
    },

    /// Error raised by script code through `error` or a failed `assert`.
    #[error("{message}")]
    Raised { message: String },

    /// An `__index` delegation chain exceeded the configured depth.
    #[error("'__index' chain is deeper than {limit} tables")]
    IndexDepthExceeded { limit: usize },

    /// Attempt to call a value that is not a function.
    #[error("attempt to call a {type_name} value")]
    NotCallable { type_name: &'static str },

    /// Attempt to index a value that is not a table.
    #[error("attempt to index a {type_name} value")]
    NotIndexable { type_name: &'static str },

    /// A closure was called but no evaluator is installed.
    #[error("no evaluator installed to run closure '{name}'")]
    NoEvaluator { name: String },

    /// A value that cannot be used as a table key.
    #[error("table index is {reason}")]
    InvalidKey { reason: &'static str },

    /// `next` was given a key that is not present in the table.
    #[error("invalid key to 'next'")]
    InvalidNextKey,

    /// `PopFrame` without a matching `NewFrame`.
    #[error("no scope frame to pop")]
    UnbalancedFrames,

    /// A `__tostring` metamethod returned something other than a string.
    #[error("'__tostring' must return a string")]
    InvalidToStringResult,

    /// A native function reported more results than it pushed.
    #[error("'{function}' reported {count} results but pushed {pushed}")]
    ResultCountMismatch {
        function: &'static str,
        count: usize,
        pushed: usize,
    },
}

impl RuntimeError {
    /// Create a script-raised error carrying `message`.
    #[cold]
    pub fn raised(message: impl Into<String>) -> Self {
        RuntimeError::Raised {
            message: message.into(),
        }
    }

    /// Create a type mismatch error for argument `position` of `function`.
    #[cold]
    pub fn type_mismatch(
        function: &'static str,
        position: usize,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        RuntimeError::TypeMismatch {
            function,
            position,
            expected,
            found,
        }
    }

    /// Whether this error was raised by script code rather than the runtime.
    pub fn is_raised(&self) -> bool {
        matches!(self, RuntimeError::Raised { .. })
    }
}
