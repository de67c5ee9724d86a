//! Raising and catching errors: `error`, `assert`, `pcall` and `xpcall`.
//!
//! Script errors are ordinary `Err` values. `pcall` and `xpcall` turn them
//! back into results through [`Runtime::protected_call`], which also unwinds
//! the stack and scope frames to where they were at entry.

use tracing::debug;

use super::{error_message, push_all, Args};
use crate::errors::{RuntimeError, RuntimeResult};
use crate::runtime::Runtime;
use crate::stack::Stack;
use crate::value::Value;

/// Message reported to script code for a caught error.
fn caught_message(error: &RuntimeError) -> Value {
    match error {
        RuntimeError::Raised { message } => Value::from(message.as_str()),
        other => Value::from(other.to_string()),
    }
}

/// `error(v)`: raise an error carrying `v`'s string form.
pub(super) fn error(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("error", stack);
    Err(RuntimeError::raised(error_message(&args.get(0))))
}

/// `assert(v [, message, ...])`: return every argument if `v` is truthy, otherwise raise.
pub(super) fn assert(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("assert", stack);
    if args.required(0)?.is_truthy() {
        return Ok(push_all(stack, args.into_values()));
    }
    let message = args.get(1);
    if message.is_nil() {
        return Err(RuntimeError::raised("assertion failed!"));
    }
    Err(RuntimeError::raised(error_message(&message)))
}

/// `pcall(f, ...)`: `true` followed by `f`'s results, or `false` and the error message.
pub(super) fn pcall(rt: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("pcall", stack);
    let function = args.required(0)?;
    match rt.protected_call(stack, &function, args.rest(1)) {
        Ok(results) => {
            stack.push(Value::Boolean(true));
            Ok(1 + push_all(stack, results))
        }
        Err(error) => {
            stack.push(Value::Boolean(false));
            stack.push(caught_message(&error));
            Ok(2)
        }
    }
}

/// `xpcall(f, handler, ...)`: like `pcall`, but a failure is passed to
/// `handler` and its results follow `false`.
///
/// If the handler itself fails, its error message follows `false` instead.
pub(super) fn xpcall(rt: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("xpcall", stack);
    let function = args.required(0)?;
    let handler = args.required(1)?;
    match rt.protected_call(stack, &function, args.rest(2)) {
        Ok(results) => {
            stack.push(Value::Boolean(true));
            Ok(1 + push_all(stack, results))
        }
        Err(error) => {
            let handled = rt.protected_call(stack, &handler, vec![caught_message(&error)]);
            stack.push(Value::Boolean(false));
            match handled {
                Ok(results) => Ok(1 + push_all(stack, results)),
                Err(handler_error) => {
                    debug!(%handler_error, "xpcall handler failed");
                    stack.push(caught_message(&handler_error));
                    Ok(2)
                }
            }
        }
    }
}
