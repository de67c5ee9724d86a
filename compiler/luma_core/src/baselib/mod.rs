//! Base library: the native functions every runtime starts with.
//!
//! Each function follows the native ABI: its arguments are the values above
//! the stack floor, it pushes its results and returns how many it pushed.
//! Registration is explicit; [`register`] binds the table below into a
//! globals table and is called once by [`crate::Runtime::with_config`].

mod conversion;
mod iteration;
mod metatable;
mod protected;

use tracing::debug;

use crate::errors::{RuntimeError, RuntimeResult};
use crate::stack::Stack;
use crate::table::Table;
use crate::value::{format_number, Function, NativeFn, Value};

/// Global name and entry point of every base library function.
pub const BASE_LIBRARY: &[(&str, NativeFn)] = &[
    ("print", conversion::print),
    ("type", conversion::type_of),
    ("tostring", conversion::tostring),
    ("tonumber", conversion::tonumber),
    ("error", protected::error),
    ("assert", protected::assert),
    ("pcall", protected::pcall),
    ("xpcall", protected::xpcall),
    ("next", iteration::next),
    ("pairs", iteration::pairs),
    ("ipairs", iteration::ipairs),
    ("setmetatable", metatable::setmetatable),
    ("getmetatable", metatable::getmetatable),
    ("rawget", metatable::rawget),
    ("rawset", metatable::rawset),
    ("rawequal", metatable::rawequal),
    ("rawlen", metatable::rawlen),
];

/// Bind every base library function into `globals`.
pub fn register(globals: &Table) {
    for &(name, func) in BASE_LIBRARY {
        globals.set_field(name, Value::Function(Function::native(name, func)));
    }
    debug!(count = BASE_LIBRARY.len(), "registered base library");
}

/// Arguments of one native call, taken off the stack in push order.
struct Args {
    function: &'static str,
    values: Vec<Value>,
}

impl Args {
    fn take(function: &'static str, stack: &mut Stack) -> Self {
        Args {
            function,
            values: stack.drain_frame(),
        }
    }

    /// Argument `i` (0-based), `nil` when absent.
    fn get(&self, i: usize) -> Value {
        self.values.get(i).cloned().unwrap_or_default()
    }

    /// Argument `i`, which must have been passed (even if `nil`).
    fn required(&self, i: usize) -> RuntimeResult<Value> {
        self.values
            .get(i)
            .cloned()
            .ok_or(RuntimeError::MissingArgument {
                function: self.function,
                position: i + 1,
            })
    }

    /// Argument `i`, which must be a table.
    fn table(&self, i: usize) -> RuntimeResult<Table> {
        match self.required(i)? {
            Value::Table(table) => Ok(table),
            other => Err(self.mismatch(i, "table", &other)),
        }
    }

    /// Arguments from `i` onward.
    fn rest(&self, i: usize) -> Vec<Value> {
        self.values.get(i..).map(<[Value]>::to_vec).unwrap_or_default()
    }

    fn into_values(self) -> Vec<Value> {
        self.values
    }

    #[cold]
    fn mismatch(&self, i: usize, expected: &'static str, found: &Value) -> RuntimeError {
        RuntimeError::type_mismatch(self.function, i + 1, expected, found.type_name())
    }
}

/// Push `values` in order, returning how many were pushed.
fn push_all(stack: &mut Stack, values: Vec<Value>) -> usize {
    let count = values.len();
    for value in values {
        stack.push(value);
    }
    count
}

/// Message carried by an error raised with `value`.
fn error_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        Value::Number(n) => format_number(*n),
        other => format!("error object is a {} value", other.type_name()),
    }
}
