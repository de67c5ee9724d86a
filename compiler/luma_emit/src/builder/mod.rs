//! Object Builder
//!
//! Walks host data into [`Literal`] trees and hands them to the [`Writer`].
//!
//! # Conversion Rules
//!
//! - primitives map directly; strings are quoted by the writer
//! - sequences become array tables, `nil` items kept in place
//! - maps become field or bracket tables, keys sorted (numbers, then
//!   strings, then booleans) so hash-ordered maps still emit identically
//! - structs become field tables in declaration order
//! - unit enum variants follow their [`EnumStyle`]; data-carrying variants
//!   become `{ Variant = payload }`
//! - `nil` entries are omitted unless `explicit_nil` is set
//!
//! A registered [`Converter`] takes over completely for its type name. The
//! [`CONTEXT_KEY`] field is never emitted; its value is the ambient context
//! converters see while the other entries of the same table are built.

mod script;

pub use script::Script;

use std::cmp::Ordering;

use luma_core::{Key, Table, Value};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::EmitConfig;
use crate::errors::{BuildError, BuildResult};
use crate::host::{capture, HostValue, VariantPayload};
use crate::lexical::is_identifier;
use crate::literal::{Literal, LiteralKey, TableLiteral};
use crate::stack::ensure_sufficient_stack;
use crate::writer::Writer;

/// Reserved entry name carrying the ambient context for converters.
pub const CONTEXT_KEY: &str = "__context";

/// How a unit enum variant is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnumStyle {
    /// The variant index: `2`
    Number,
    /// The variant name as a string: `"Blue"`
    String,
    /// A symbolic reference: `Color.Blue`
    Symbol,
}

/// Custom conversion for one host type.
pub trait Converter {
    /// Whether this converter handles the run-time type `concrete`
    /// (`Type` or `Type::Variant`).
    fn can_convert(&self, _concrete: &str) -> bool {
        true
    }

    fn convert(&self, value: &HostValue, cx: &mut ConvertContext<'_>) -> BuildResult<Literal>;
}

/// What a [`Converter`] can see while it runs.
pub struct ConvertContext<'b> {
    builder: &'b Builder,
    contexts: &'b mut Vec<HostValue>,
}

impl ConvertContext<'_> {
    /// The innermost ambient context, if any table on the path carried one.
    pub fn context(&self) -> Option<&HostValue> {
        self.contexts.last()
    }

    /// Convert a nested value with the default rules and registered converters.
    pub fn build(&mut self, value: &HostValue) -> BuildResult<Literal> {
        self.builder.convert(value, self.contexts)
    }

    pub fn config(&self) -> &EmitConfig {
        &self.builder.config
    }
}

/// Host data to source converter.
#[derive(Default)]
pub struct Builder {
    config: EmitConfig,
    converters: FxHashMap<String, Box<dyn Converter>>,
    enum_styles: FxHashMap<String, EnumStyle>,
}

impl Builder {
    pub fn new(config: EmitConfig) -> Self {
        Builder {
            config,
            ..Builder::default()
        }
    }

    pub fn config(&self) -> &EmitConfig {
        &self.config
    }

    /// Route every value of `type_name` through `converter`.
    pub fn register_converter(
        &mut self,
        type_name: impl Into<String>,
        converter: impl Converter + 'static,
    ) {
        self.converters
            .insert(type_name.into(), Box::new(converter));
    }

    /// Override how unit variants of `type_name` are written.
    pub fn set_enum_style(&mut self, type_name: impl Into<String>, style: EnumStyle) {
        self.enum_styles.insert(type_name.into(), style);
    }

    /// Convert a host value into a literal.
    pub fn literal<T: ?Sized + Serialize>(&self, value: &T) -> BuildResult<Literal> {
        let host = capture(value)?;
        self.convert(&host, &mut Vec::new())
    }

    /// Convert a host value into source text for one expression.
    pub fn build<T: ?Sized + Serialize>(&self, value: &T) -> BuildResult<String> {
        let literal = self.literal(value)?;
        self.to_source(&literal)
    }

    /// Build a table from key/value pairs, keeping their order.
    pub fn build_pairs<K: Serialize, V: Serialize>(&self, pairs: &[(K, V)]) -> BuildResult<String> {
        let mut entries = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            entries.push((capture(key)?, capture(value)?));
        }
        let literal = self.map(&entries, false, &mut Vec::new())?;
        self.to_source(&literal)
    }

    /// Convert a runtime value. Functions and self-containing tables are rejected.
    pub fn from_value(&self, value: &Value) -> BuildResult<Literal> {
        self.runtime_value(value, &mut Vec::new())
    }

    /// Source text for a runtime value.
    pub fn value_source(&self, value: &Value) -> BuildResult<String> {
        let literal = self.from_value(value)?;
        self.to_source(&literal)
    }

    /// Write one literal as a complete chunk.
    pub fn to_source(&self, literal: &Literal) -> BuildResult<String> {
        let mut writer = Writer::new(self.config);
        writer.literal(literal)?;
        let source = writer.finish()?;
        debug!(bytes = source.len(), "built expression");
        Ok(source)
    }

    /// Start a multi-statement chunk.
    pub fn script(&self) -> Script<'_> {
        Script::new(self)
    }

    fn convert(&self, host: &HostValue, contexts: &mut Vec<HostValue>) -> BuildResult<Literal> {
        ensure_sufficient_stack(|| self.convert_inner(host, contexts))
    }

    fn convert_inner(&self, host: &HostValue, contexts: &mut Vec<HostValue>) -> BuildResult<Literal> {
        if let Some(type_name) = host.type_name() {
            if let Some(converter) = self.converters.get(type_name) {
                let concrete = host.concrete_name();
                if !converter.can_convert(&concrete) {
                    return Err(BuildError::ConverterDeclined {
                        type_name: type_name.to_owned(),
                        concrete,
                    });
                }
                trace!(type_name, %concrete, "custom converter");
                let mut cx = ConvertContext {
                    builder: self,
                    contexts,
                };
                return converter.convert(host, &mut cx);
            }
        }

        match host {
            HostValue::Nil => Ok(Literal::Nil),
            HostValue::Boolean(b) => Ok(Literal::Boolean(*b)),
            HostValue::Number(n) => Ok(Literal::Number(*n)),
            HostValue::String(s) => Ok(Literal::String(s.clone())),
            HostValue::Sequence(items) => self.sequence(items, contexts),
            HostValue::Map(entries) => self.map(entries, true, contexts),
            HostValue::Object { fields, .. } => self.fields(fields, contexts),
            HostValue::Named { inner, .. } => self.convert(inner, contexts),
            HostValue::Variant {
                type_name,
                variant,
                index,
                payload,
            } => {
                let payload = match payload {
                    VariantPayload::Unit => return self.unit_variant(type_name, variant, *index),
                    VariantPayload::Newtype(inner) => self.convert(inner, contexts)?,
                    VariantPayload::Tuple(items) => self.sequence(items, contexts)?,
                    VariantPayload::Struct(fields) => self.fields(fields, contexts)?,
                };
                Ok(TableLiteral::new().with_field(variant, payload).into())
            }
        }
    }

    fn sequence(&self, items: &[HostValue], contexts: &mut Vec<HostValue>) -> BuildResult<Literal> {
        let mut table = TableLiteral::new();
        for item in items {
            table.push(self.convert(item, contexts)?);
        }
        Ok(table.into())
    }

    fn fields(
        &self,
        fields: &[(&'static str, HostValue)],
        contexts: &mut Vec<HostValue>,
    ) -> BuildResult<Literal> {
        let context = fields
            .iter()
            .find(|(name, _)| *name == CONTEXT_KEY)
            .map(|(_, value)| value);
        with_context(contexts, context, |contexts| {
            let mut table = TableLiteral::new();
            for (name, value) in fields {
                if *name == CONTEXT_KEY {
                    continue;
                }
                let literal = self.convert(value, contexts)?;
                if literal.is_nil() && !self.config.explicit_nil {
                    continue;
                }
                table.insert(LiteralKey::from(*name), literal);
            }
            Ok(table.into())
        })
    }

    fn map(
        &self,
        entries: &[(HostValue, HostValue)],
        sorted: bool,
        contexts: &mut Vec<HostValue>,
    ) -> BuildResult<Literal> {
        let context = entries
            .iter()
            .find(|(key, _)| key.as_str() == Some(CONTEXT_KEY))
            .map(|(_, value)| value);
        with_context(contexts, context, |contexts| {
            let mut keyed = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                if key.as_str() == Some(CONTEXT_KEY) {
                    continue;
                }
                let key = self.map_key(key)?;
                let literal = self.convert(value, contexts)?;
                if literal.is_nil() && !self.config.explicit_nil {
                    continue;
                }
                keyed.push((key, literal));
            }
            if sorted {
                keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b));
            }
            let mut table = TableLiteral::new();
            for (key, literal) in keyed {
                table.insert(key, literal);
            }
            Ok(table.into())
        })
    }

    fn map_key(&self, key: &HostValue) -> BuildResult<LiteralKey> {
        match key {
            HostValue::String(s) => Ok(LiteralKey::String(s.clone())),
            HostValue::Number(n) if n.is_nan() => Err(BuildError::UnsupportedKey { kind: "NaN" }),
            HostValue::Number(n) => Ok(LiteralKey::Number(*n)),
            HostValue::Boolean(b) => Ok(LiteralKey::Boolean(*b)),
            HostValue::Named { inner, .. } => self.map_key(inner),
            HostValue::Variant {
                type_name,
                variant,
                index,
                payload: VariantPayload::Unit,
            } => Ok(match self.enum_style(type_name) {
                EnumStyle::Number => LiteralKey::Number(f64::from(*index)),
                EnumStyle::String | EnumStyle::Symbol => LiteralKey::String((*variant).to_owned()),
            }),
            other => Err(BuildError::UnsupportedKey { kind: other.kind() }),
        }
    }

    fn enum_style(&self, type_name: &str) -> EnumStyle {
        match self.enum_styles.get(type_name) {
            Some(style) => *style,
            None if self.config.enums_as_numbers => EnumStyle::Number,
            None => EnumStyle::Symbol,
        }
    }

    fn unit_variant(&self, type_name: &str, variant: &str, index: u32) -> BuildResult<Literal> {
        Ok(match self.enum_style(type_name) {
            EnumStyle::Number => Literal::Number(f64::from(index)),
            EnumStyle::String => Literal::String(variant.to_owned()),
            EnumStyle::Symbol => {
                if !is_identifier(type_name) || !is_identifier(variant) {
                    return Err(BuildError::unconvertible(
                        type_name,
                        format!("'{type_name}.{variant}' is not a valid symbolic name"),
                    ));
                }
                Literal::raw(format!("{type_name}.{variant}"))
            }
        })
    }

    fn runtime_value(&self, value: &Value, path: &mut Vec<usize>) -> BuildResult<Literal> {
        match value {
            Value::Nil => Ok(Literal::Nil),
            Value::Boolean(b) => Ok(Literal::Boolean(*b)),
            Value::Number(n) => Ok(Literal::Number(*n)),
            Value::String(s) => Ok(Literal::String(s.to_string())),
            Value::Function(_) => Err(BuildError::unconvertible(
                "function",
                "functions have no literal form",
            )),
            Value::Table(table) => {
                let identity = table.identity();
                if path.contains(&identity) {
                    return Err(BuildError::CyclicTable { identity });
                }
                path.push(identity);
                let result = ensure_sufficient_stack(|| self.runtime_table(table, path));
                path.pop();
                result
            }
        }
    }

    fn runtime_table(&self, table: &Table, path: &mut Vec<usize>) -> BuildResult<Literal> {
        let mut literal = TableLiteral::new();
        for (key, value) in table.entries() {
            let key = match key {
                Key::String(s) => LiteralKey::String(s.to_string()),
                Key::Boolean(b) => LiteralKey::Boolean(b),
                number => match number.to_value() {
                    Value::Number(n) => LiteralKey::Number(n),
                    other => {
                        return Err(BuildError::UnsupportedKey {
                            kind: other.type_name(),
                        })
                    }
                },
            };
            literal.insert(key, self.runtime_value(&value, path)?);
        }
        Ok(literal.into())
    }
}

/// Run `f` with `context` pushed as the innermost context, popping it afterwards.
fn with_context<R>(
    contexts: &mut Vec<HostValue>,
    context: Option<&HostValue>,
    f: impl FnOnce(&mut Vec<HostValue>) -> BuildResult<R>,
) -> BuildResult<R> {
    let Some(context) = context else {
        return f(contexts);
    };
    contexts.push(context.clone());
    let result = f(contexts);
    contexts.pop();
    result
}

/// Numbers first (numerically), then strings, then booleans.
fn compare_keys(a: &LiteralKey, b: &LiteralKey) -> Ordering {
    fn rank(key: &LiteralKey) -> u8 {
        match key {
            LiteralKey::Number(_) => 0,
            LiteralKey::String(_) => 1,
            LiteralKey::Boolean(_) => 2,
        }
    }
    match (a, b) {
        (LiteralKey::Number(x), LiteralKey::Number(y)) => x.total_cmp(y),
        (LiteralKey::String(x), LiteralKey::String(y)) => x.cmp(y),
        (LiteralKey::Boolean(x), LiteralKey::Boolean(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
