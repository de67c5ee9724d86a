//! Hashable table keys.

use std::fmt;
use std::rc::Rc;

use crate::errors::RuntimeError;
use crate::value::{format_number, Value};

/// A table key.
///
/// Only strings, numbers and booleans may key a table. Numbers with an
/// integral value normalise to [`Key::Integer`], so `t[2]` and `t[2.0]`
/// address the same slot; other numbers are stored by bit pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Integer(i64),
    Float(u64),
    Boolean(bool),
    String(Rc<str>),
}

/// Integral floats inside this range normalise to integer keys.
const INTEGER_KEY_LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63

impl Key {
    /// Key for a number, or `None` for NaN.
    pub fn number(n: f64) -> Option<Key> {
        if n.is_nan() {
            return None;
        }
        if n.fract() == 0.0 && n >= -INTEGER_KEY_LIMIT && n < INTEGER_KEY_LIMIT {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "integral and range-checked above"
            )]
            let int = n as i64;
            return Some(Key::Integer(int));
        }
        Some(Key::Float(n.to_bits()))
    }

    /// Key for a 1-based array index.
    pub fn index(i: usize) -> Key {
        Key::Integer(i64::try_from(i).unwrap_or(i64::MAX))
    }

    /// The 1-based array position this key names, if it is a positive integer.
    pub fn array_index(&self) -> Option<usize> {
        match self {
            Key::Integer(i) if *i >= 1 => usize::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert back into a script value.
    pub fn to_value(&self) -> Value {
        match self {
            #[expect(clippy::cast_precision_loss, reason = "script numbers are f64")]
            Key::Integer(i) => Value::Number(*i as f64),
            Key::Float(bits) => Value::Number(f64::from_bits(*bits)),
            Key::Boolean(b) => Value::Boolean(*b),
            Key::String(s) => Value::String(Rc::clone(s)),
        }
    }
}

impl TryFrom<&Value> for Key {
    type Error = RuntimeError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Nil => Err(RuntimeError::InvalidKey { reason: "nil" }),
            Value::Boolean(b) => Ok(Key::Boolean(*b)),
            Value::Number(n) => Key::number(*n).ok_or(RuntimeError::InvalidKey { reason: "NaN" }),
            Value::String(s) => Ok(Key::String(Rc::clone(s))),
            Value::Table(_) => Err(RuntimeError::InvalidKey {
                reason: "a table value",
            }),
            Value::Function(_) => Err(RuntimeError::InvalidKey {
                reason: "a function value",
            }),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(Rc::from(s))
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Integer(i)
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Boolean(b)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(i) => write!(f, "{i}"),
            Key::Float(bits) => f.write_str(&format_number(f64::from_bits(*bits))),
            Key::Boolean(b) => write!(f, "{b}"),
            Key::String(s) => f.write_str(s),
        }
    }
}
