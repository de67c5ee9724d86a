//! Metatable accessors and the raw (metatable-bypassing) primitives.

use super::Args;
use crate::errors::RuntimeResult;
use crate::runtime::Runtime;
use crate::stack::Stack;
use crate::value::Value;

/// `setmetatable(t, mt)`: attach `mt` (a table, or `nil` to detach) and return `t`.
pub(super) fn setmetatable(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("setmetatable", stack);
    let table = args.table(0)?;
    let metatable = match args.get(1) {
        Value::Table(mt) => Some(mt),
        Value::Nil => None,
        other => return Err(args.mismatch(1, "nil or table", &other)),
    };
    table.set_metatable(metatable);
    stack.push(Value::Table(table));
    Ok(1)
}

/// `getmetatable(v)`: the metatable of `v`, or `nil`.
pub(super) fn getmetatable(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("getmetatable", stack);
    let metatable = match args.required(0)? {
        Value::Table(table) => table.metatable(),
        _ => None,
    };
    stack.push(metatable.map_or(Value::Nil, Value::Table));
    Ok(1)
}

/// `rawget(t, k)`: own lookup only.
pub(super) fn rawget(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("rawget", stack);
    let table = args.table(0)?;
    let key = args.required(1)?;
    stack.push(table.get_value(&key));
    Ok(1)
}

/// `rawset(t, k, v)`: store without consulting the metatable; returns `t`.
pub(super) fn rawset(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("rawset", stack);
    let table = args.table(0)?;
    let key = args.required(1)?;
    let value = args.required(2)?;
    table.set_value(&key, value)?;
    stack.push(Value::Table(table));
    Ok(1)
}

/// `rawequal(a, b)`: primitive equality.
pub(super) fn rawequal(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("rawequal", stack);
    let a = args.required(0)?;
    let b = args.required(1)?;
    stack.push(Value::Boolean(a == b));
    Ok(1)
}

/// `rawlen(v)`: border of a table or byte length of a string.
pub(super) fn rawlen(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("rawlen", stack);
    let len = match args.required(0)? {
        Value::Table(table) => table.len(),
        Value::String(s) => s.len(),
        other => return Err(args.mismatch(0, "table or string", &other)),
    };
    #[expect(clippy::cast_precision_loss, reason = "lengths are far below 2^53")]
    let len = len as f64;
    stack.push(Value::Number(len));
    Ok(1)
}
