//! Host Value Capture
//!
//! Turns any `serde::Serialize` value into a [`HostValue`] tree, the
//! builder's view of host data. Serde is the reflection mechanism: struct
//! and enum names become converter lookup keys, `#[serde(skip)]` drops a
//! field and `#[serde(rename = ..)]` renames it.
//!
//! # Numbers
//!
//! Script numbers are `f64`. Integers whose magnitude exceeds 2^53 cannot be
//! represented exactly and are rejected rather than silently rounded.
//!
//! # Mapping
//!
//! | Serde data model          | `HostValue`                         |
//! |---------------------------|-------------------------------------|
//! | `()`, `None`              | `Nil`                               |
//! | bool, numbers             | `Boolean`, `Number`                 |
//! | char, str                 | `String`                            |
//! | bytes, seq, tuple         | `Sequence`                          |
//! | map                       | `Map` (entry order as produced)     |
//! | struct, unit struct       | `Object`                            |
//! | newtype / tuple struct    | `Named`                             |
//! | enum variants             | `Variant`                           |

use serde::ser::{self, Serialize};

use crate::errors::{BuildError, BuildResult};
use crate::stack::ensure_sufficient_stack;

/// Largest integer magnitude a script number represents exactly.
pub const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Captured host data.
#[derive(Clone, Debug, PartialEq)]
pub enum HostValue {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
    Sequence(Vec<HostValue>),
    Map(Vec<(HostValue, HostValue)>),
    /// A struct, fields in declaration order.
    Object {
        type_name: &'static str,
        fields: Vec<(&'static str, HostValue)>,
    },
    /// A newtype or tuple struct wrapping `inner`.
    Named {
        type_name: &'static str,
        inner: Box<HostValue>,
    },
    Variant {
        type_name: &'static str,
        variant: &'static str,
        index: u32,
        payload: VariantPayload,
    },
}

/// Data carried by an enum variant.
#[derive(Clone, Debug, PartialEq)]
pub enum VariantPayload {
    Unit,
    Newtype(Box<HostValue>),
    Tuple(Vec<HostValue>),
    Struct(Vec<(&'static str, HostValue)>),
}

impl HostValue {
    /// Short description used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            HostValue::Nil => "nil",
            HostValue::Boolean(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::String(_) => "string",
            HostValue::Sequence(_) => "sequence",
            HostValue::Map(_) => "map",
            HostValue::Object { .. } => "object",
            HostValue::Named { .. } => "named value",
            HostValue::Variant { .. } => "enum variant",
        }
    }

    /// Declared type name of objects, named values and variants.
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            HostValue::Object { type_name, .. }
            | HostValue::Named { type_name, .. }
            | HostValue::Variant { type_name, .. } => Some(*type_name),
            _ => None,
        }
    }

    /// Run-time type name: `Type::Variant` for variants, otherwise the type name.
    pub fn concrete_name(&self) -> String {
        match self {
            HostValue::Variant {
                type_name, variant, ..
            } => format!("{type_name}::{variant}"),
            other => other.type_name().unwrap_or_else(|| other.kind()).to_owned(),
        }
    }

    /// A named field of an object or struct variant.
    pub fn field(&self, name: &str) -> Option<&HostValue> {
        let fields = match self {
            HostValue::Object { fields, .. }
            | HostValue::Variant {
                payload: VariantPayload::Struct(fields),
                ..
            } => fields,
            _ => return None,
        };
        fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Capture `value` as a [`HostValue`].
pub fn capture<T: ?Sized + Serialize>(value: &T) -> BuildResult<HostValue> {
    ensure_sufficient_stack(|| value.serialize(Capture))
}

fn exact_unsigned(type_name: &str, n: u64) -> BuildResult<HostValue> {
    if n > MAX_EXACT_INTEGER {
        return Err(BuildError::unconvertible(
            type_name,
            format!("{n} cannot be represented exactly"),
        ));
    }
    #[expect(clippy::cast_precision_loss, reason = "magnitude checked against 2^53")]
    let n = n as f64;
    Ok(HostValue::Number(n))
}

fn exact_signed(type_name: &str, n: i64) -> BuildResult<HostValue> {
    let value = exact_unsigned(type_name, n.unsigned_abs())?;
    Ok(match value {
        HostValue::Number(m) if n < 0 => HostValue::Number(-m),
        other => other,
    })
}

/// The serializer behind [`capture`].
struct Capture;

impl ser::Serializer for Capture {
    type Ok = HostValue;
    type Error = BuildError;

    type SerializeSeq = SeqCapture;
    type SerializeTuple = SeqCapture;
    type SerializeTupleStruct = SeqCapture;
    type SerializeTupleVariant = TupleVariantCapture;
    type SerializeMap = MapCapture;
    type SerializeStruct = StructCapture;
    type SerializeStructVariant = StructVariantCapture;

    fn serialize_bool(self, v: bool) -> BuildResult<HostValue> {
        Ok(HostValue::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> BuildResult<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> BuildResult<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> BuildResult<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> BuildResult<HostValue> {
        exact_signed("i64", v)
    }

    fn serialize_i128(self, v: i128) -> BuildResult<HostValue> {
        match i64::try_from(v) {
            Ok(v) => exact_signed("i128", v),
            Err(_) => Err(BuildError::unconvertible(
                "i128",
                format!("{v} cannot be represented exactly"),
            )),
        }
    }

    fn serialize_u8(self, v: u8) -> BuildResult<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> BuildResult<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> BuildResult<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> BuildResult<HostValue> {
        exact_unsigned("u64", v)
    }

    fn serialize_u128(self, v: u128) -> BuildResult<HostValue> {
        match u64::try_from(v) {
            Ok(v) => exact_unsigned("u128", v),
            Err(_) => Err(BuildError::unconvertible(
                "u128",
                format!("{v} cannot be represented exactly"),
            )),
        }
    }

    fn serialize_f32(self, v: f32) -> BuildResult<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> BuildResult<HostValue> {
        Ok(HostValue::Number(v))
    }

    fn serialize_char(self, v: char) -> BuildResult<HostValue> {
        Ok(HostValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> BuildResult<HostValue> {
        Ok(HostValue::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> BuildResult<HostValue> {
        Ok(HostValue::Sequence(
            v.iter().map(|&b| HostValue::Number(f64::from(b))).collect(),
        ))
    }

    fn serialize_none(self) -> BuildResult<HostValue> {
        Ok(HostValue::Nil)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> BuildResult<HostValue> {
        capture(value)
    }

    fn serialize_unit(self) -> BuildResult<HostValue> {
        Ok(HostValue::Nil)
    }

    fn serialize_unit_struct(self, name: &'static str) -> BuildResult<HostValue> {
        Ok(HostValue::Object {
            type_name: name,
            fields: Vec::new(),
        })
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> BuildResult<HostValue> {
        Ok(HostValue::Variant {
            type_name: name,
            variant,
            index: variant_index,
            payload: VariantPayload::Unit,
        })
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> BuildResult<HostValue> {
        Ok(HostValue::Named {
            type_name: name,
            inner: Box::new(capture(value)?),
        })
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> BuildResult<HostValue> {
        Ok(HostValue::Variant {
            type_name: name,
            variant,
            index: variant_index,
            payload: VariantPayload::Newtype(Box::new(capture(value)?)),
        })
    }

    fn serialize_seq(self, len: Option<usize>) -> BuildResult<SeqCapture> {
        Ok(SeqCapture::new(None, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> BuildResult<SeqCapture> {
        Ok(SeqCapture::new(None, len))
    }

    fn serialize_tuple_struct(self, name: &'static str, len: usize) -> BuildResult<SeqCapture> {
        Ok(SeqCapture::new(Some(name), len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> BuildResult<TupleVariantCapture> {
        Ok(TupleVariantCapture {
            type_name: name,
            variant,
            index: variant_index,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> BuildResult<MapCapture> {
        Ok(MapCapture {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> BuildResult<StructCapture> {
        Ok(StructCapture {
            type_name: name,
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> BuildResult<StructVariantCapture> {
        Ok(StructVariantCapture {
            type_name: name,
            variant,
            index: variant_index,
            fields: Vec::with_capacity(len),
        })
    }
}

/// Sequences, tuples and tuple structs.
struct SeqCapture {
    name: Option<&'static str>,
    items: Vec<HostValue>,
}

impl SeqCapture {
    fn new(name: Option<&'static str>, len: usize) -> Self {
        SeqCapture {
            name,
            items: Vec::with_capacity(len),
        }
    }

    fn finish(self) -> HostValue {
        let sequence = HostValue::Sequence(self.items);
        match self.name {
            Some(type_name) => HostValue::Named {
                type_name,
                inner: Box::new(sequence),
            },
            None => sequence,
        }
    }
}

impl ser::SerializeSeq for SeqCapture {
    type Ok = HostValue;
    type Error = BuildError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> BuildResult<()> {
        self.items.push(capture(value)?);
        Ok(())
    }

    fn end(self) -> BuildResult<HostValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqCapture {
    type Ok = HostValue;
    type Error = BuildError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> BuildResult<()> {
        self.items.push(capture(value)?);
        Ok(())
    }

    fn end(self) -> BuildResult<HostValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqCapture {
    type Ok = HostValue;
    type Error = BuildError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> BuildResult<()> {
        self.items.push(capture(value)?);
        Ok(())
    }

    fn end(self) -> BuildResult<HostValue> {
        Ok(self.finish())
    }
}

struct TupleVariantCapture {
    type_name: &'static str,
    variant: &'static str,
    index: u32,
    items: Vec<HostValue>,
}

impl ser::SerializeTupleVariant for TupleVariantCapture {
    type Ok = HostValue;
    type Error = BuildError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> BuildResult<()> {
        self.items.push(capture(value)?);
        Ok(())
    }

    fn end(self) -> BuildResult<HostValue> {
        Ok(HostValue::Variant {
            type_name: self.type_name,
            variant: self.variant,
            index: self.index,
            payload: VariantPayload::Tuple(self.items),
        })
    }
}

struct MapCapture {
    entries: Vec<(HostValue, HostValue)>,
    key: Option<HostValue>,
}

impl ser::SerializeMap for MapCapture {
    type Ok = HostValue;
    type Error = BuildError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> BuildResult<()> {
        self.key = Some(capture(key)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> BuildResult<()> {
        let Some(key) = self.key.take() else {
            return Err(BuildError::Custom(
                "map value serialized without a key".to_owned(),
            ));
        };
        self.entries.push((key, capture(value)?));
        Ok(())
    }

    fn end(self) -> BuildResult<HostValue> {
        Ok(HostValue::Map(self.entries))
    }
}

struct StructCapture {
    type_name: &'static str,
    fields: Vec<(&'static str, HostValue)>,
}

impl ser::SerializeStruct for StructCapture {
    type Ok = HostValue;
    type Error = BuildError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> BuildResult<()> {
        self.fields.push((key, capture(value)?));
        Ok(())
    }

    fn end(self) -> BuildResult<HostValue> {
        Ok(HostValue::Object {
            type_name: self.type_name,
            fields: self.fields,
        })
    }
}

struct StructVariantCapture {
    type_name: &'static str,
    variant: &'static str,
    index: u32,
    fields: Vec<(&'static str, HostValue)>,
}

impl ser::SerializeStructVariant for StructVariantCapture {
    type Ok = HostValue;
    type Error = BuildError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> BuildResult<()> {
        self.fields.push((key, capture(value)?));
        Ok(())
    }

    fn end(self) -> BuildResult<HostValue> {
        Ok(HostValue::Variant {
            type_name: self.type_name,
            variant: self.variant,
            index: self.index,
            payload: VariantPayload::Struct(self.fields),
        })
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
