//! `print`, `type`, `tostring` and `tonumber`.

use super::Args;
use crate::errors::{RuntimeError, RuntimeResult};
use crate::runtime::Runtime;
use crate::stack::Stack;
use crate::value::{format_number, parse_integer_radix, parse_number, Value};

/// `print(...)`: write the arguments, converted with `tostring` and
/// separated by single spaces, as one line.
pub(super) fn print(rt: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("print", stack).into_values();
    let mut parts = Vec::with_capacity(args.len());
    for arg in &args {
        parts.push(rt.tostring(stack, arg)?);
    }
    rt.print_handler().write_line(&parts.join(" "));
    Ok(0)
}

/// `type(v)`: the type name of `v`.
pub(super) fn type_of(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("type", stack);
    let value = args.required(0)?;
    stack.push(Value::from(value.type_name()));
    Ok(1)
}

/// `tostring(v)`: `v` as text, honouring `__tostring`.
pub(super) fn tostring(rt: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("tostring", stack);
    let value = args.required(0)?;
    let text = rt.tostring(stack, &value)?;
    stack.push(Value::from(text));
    Ok(1)
}

/// `tonumber(v [, base])`: `v` as a number, or `nil` if it cannot be converted.
///
/// With a base, a number argument is read through its decimal string form,
/// so `tonumber(10, 16)` is 16.
pub(super) fn tonumber(_: &mut Runtime, stack: &mut Stack) -> RuntimeResult<usize> {
    let args = Args::take("tonumber", stack);
    let value = args.required(0)?;
    let base = args.get(1);

    let converted = if base.is_nil() {
        match &value {
            Value::Number(n) => Some(*n),
            Value::String(s) => parse_number(s),
            _ => None,
        }
    } else {
        let radix = match base.as_number() {
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "integral and range-checked in the guard"
            )]
            Some(b) if b.fract() == 0.0 && (2.0..=36.0).contains(&b) => b as u32,
            Some(_) => {
                return Err(RuntimeError::raised(
                    "bad argument #2 to 'tonumber' (base out of range)",
                ))
            }
            None => return Err(args.mismatch(1, "number", &base)),
        };
        match &value {
            Value::String(text) => parse_in_radix(text, radix),
            Value::Number(n) => parse_in_radix(&format_number(*n), radix),
            _ => return Err(args.mismatch(0, "string", &value)),
        }
    };

    stack.push(converted.map_or(Value::Nil, Value::Number));
    Ok(1)
}

fn parse_in_radix(text: &str, radix: u32) -> Option<f64> {
    let trimmed = text.trim();
    match trimmed.strip_prefix('-') {
        Some(digits) => parse_integer_radix(digits, radix).map(|n| -n),
        None => parse_integer_radix(trimmed, radix),
    }
}
