//! Luma Core
//!
//! Value model and native-call plumbing for the Luma embedded script runtime.
//!
//! # Architecture
//!
//! - [`Value`]: closed set of dynamically-typed script values
//! - [`Table`]: hybrid array/hash container with metatable delegation
//! - [`Stack`]: lockable value stack, the only channel between the evaluator
//!   and native functions
//! - [`Environment`]: lexical scope frames with global fallback
//! - [`Runtime`]: globals, environment, print handler and the calling
//!   convention (`call`, `index`, `tostring`, `protected_call`)
//! - [`baselib`]: `print`, `error`, iteration, metatable and protected-call
//!   primitives, registered into the globals of every runtime
//!
//! Parsing and executing script source is not part of this crate. An
//! evaluator plugs in through the [`Evaluator`] trait.

pub mod baselib;
mod environment;
pub mod errors;
mod print_handler;
mod runtime;
mod stack;
mod table;
mod value;

pub use environment::{Environment, Lookup};
pub use errors::{RuntimeError, RuntimeResult};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandler, SharedPrintHandler,
};
pub use runtime::{Evaluator, Runtime, RuntimeConfig, DEFAULT_MAX_INDEX_DEPTH};
pub use stack::{Stack, STACK_INCREMENT};
pub use table::{Key, Table, INDEX_EVENT, TOSTRING_EVENT};
pub use value::{
    format_number, parse_integer_radix, parse_number, Closure, Function, NativeFn,
    NativeFunction, Value, ValueType,
};
