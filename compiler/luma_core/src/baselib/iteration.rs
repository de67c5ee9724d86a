//! The iteration protocol: `next`, `pairs` and `ipairs`.
//!
//! A generic `for` loop repeatedly calls `iterator(state, control)` and stops
//! when the first result is `nil`. Iterators push the key and then the
//! value, so a caller popping results sees the value first.

use super::Args;
use crate::errors::RuntimeResult;
use crate::runtime::Runtime;
use crate::stack::Stack;
use crate::table::Key;
use crate::value::{Function, Value};

/// `next(t [, k])`: the entry after `k` in `t`, or a single `nil` at the end.
pub(super) fn next(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("next", stack);
    let table = args.table(0)?;
    match table.next(&args.get(1))? {
        Some((key, value)) => {
            stack.push(key.to_value());
            stack.push(value);
            Ok(2)
        }
        None => {
            stack.push(Value::Nil);
            Ok(1)
        }
    }
}

/// `pairs(t)`: `next, t, nil`.
pub(super) fn pairs(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("pairs", stack);
    let table = args.table(0)?;
    stack.push(Value::Function(Function::native("next", next)));
    stack.push(Value::Table(table));
    stack.push(Value::Nil);
    Ok(3)
}

/// `ipairs(t)`: `step, t, 0`, visiting `t[1]`, `t[2]`, ... up to the first `nil`.
pub(super) fn ipairs(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("ipairs", stack);
    let table = args.table(0)?;
    stack.push(Value::Function(Function::native("ipairs_step", ipairs_step)));
    stack.push(Value::Table(table));
    stack.push(Value::from(0));
    Ok(3)
}

fn ipairs_step(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("ipairs_step", stack);
    let table = args.table(0)?;
    let control = args.get(1);
    let Some(index) = control.as_number() else {
        return Err(args.mismatch(1, "number", &control));
    };

    let next_index = index + 1.0;
    let value = Key::number(next_index).map_or(Value::Nil, |key| table.get(&key));
    if value.is_nil() {
        stack.push(Value::Nil);
        return Ok(1);
    }
    stack.push(Value::Number(next_index));
    stack.push(value);
    Ok(2)
}
