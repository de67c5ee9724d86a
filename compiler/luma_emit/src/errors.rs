//! Emission and build errors.

use std::fmt;

use thiserror::Error;

/// Result of a writer operation.
pub type EmitResult<T> = Result<T, EmitError>;

/// Result of a builder operation.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised while writing source text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EmitError {
    /// A name that is not a legal bare identifier (or is a keyword).
    #[error("'{name}' is not a legal identifier")]
    IllegalIdentifier { name: String },

    /// A block closer (`end`, `until`, `else`, `elseif`) with no matching opener.
    #[error("'{keyword}' does not close an open block")]
    UnbalancedBlock { keyword: &'static str },

    /// The chunk was finished with blocks still open.
    #[error("{open} block(s) still open at end of chunk")]
    UnclosedBlocks { open: usize },

    /// A table key that has no source representation (NaN).
    #[error("table key {key} cannot be written")]
    InvalidKey { key: String },

    /// The verification pass rejected the generated text.
    #[error("generated code failed verification at line {line}: {message}")]
    Verification { line: usize, message: String },
}

/// Errors raised while converting host data into source.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum BuildError {
    /// A value with no script representation.
    #[error("cannot convert {type_name}: {reason}")]
    Unconvertible { type_name: String, reason: String },

    /// A map key that cannot key a script table.
    #[error("{kind} values cannot be used as table keys")]
    UnsupportedKey { kind: &'static str },

    /// A registered converter refused the run-time type it was handed.
    #[error("converter for '{type_name}' cannot convert '{concrete}'")]
    ConverterDeclined { type_name: String, concrete: String },

    /// A runtime table that (transitively) contains itself.
    #[error("table {identity:#x} contains itself")]
    CyclicTable { identity: usize },

    #[error(transparent)]
    Emit(#[from] EmitError),

    /// Raised by a `Serialize` implementation.
    #[error("{0}")]
    Custom(String),
}

impl BuildError {
    #[cold]
    pub fn unconvertible(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        BuildError::Unconvertible {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

impl serde::ser::Error for BuildError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        BuildError::Custom(msg.to_string())
    }
}
