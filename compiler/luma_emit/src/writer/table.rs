//! Table constructor layout.
//!
//! A table is written on one line when its size estimate fits the configured
//! threshold, otherwise one entry per line at one extra tab of indentation.
//!
//! The estimate counts, per entry, the key text (nothing for positional
//! items, `name = ` or `[key] = ` otherwise), the value text, and two units
//! for the separating `, `. A nested table adds four units for its braces
//! and padding, an empty one counts as `{}`. The outer braces of the table
//! being measured are not counted.

use crate::config::EmitConfig;
use crate::emitter::Emitter;
use crate::errors::{EmitError, EmitResult};
use crate::lexical::{number_literal, quote_string};
use crate::literal::{Literal, LiteralKey, TableLiteral, TableShape};
use crate::stack::ensure_sufficient_stack;

/// Units charged per entry for its separator.
pub const ENTRY_OVERHEAD: usize = 2;

/// Units a nested non-empty table adds around its entries (`{ ` and ` }`).
const BRACE_OVERHEAD: usize = 4;

/// Width of `{}`.
const EMPTY_TABLE_WIDTH: usize = 2;

/// One entry ready for writing: its key prefix and value.
struct Entry<'a> {
    prefix: String,
    value: &'a Literal,
}

/// Size estimate of `table`'s entries.
///
/// Stops adding once the running total passes `limit`; the returned value is
/// then only known to exceed it.
pub fn estimate(table: &TableLiteral, limit: usize) -> EmitResult<usize> {
    entries_width(&entries(table)?, limit)
}

/// Write `literal` to `out`, with nested lines indented relative to `indent`.
pub fn render<E: Emitter>(
    out: &mut E,
    literal: &Literal,
    indent: usize,
    config: &EmitConfig,
) -> EmitResult<()> {
    match literal {
        Literal::Nil => out.emit("nil"),
        Literal::Boolean(b) => out.emit(if *b { "true" } else { "false" }),
        Literal::Number(n) => out.emit(&number_literal(*n)),
        Literal::String(s) => out.emit(&quote_string(s)),
        Literal::Raw(text) => out.emit(text),
        Literal::Table(table) => {
            return ensure_sufficient_stack(|| render_table(out, table, indent, config));
        }
    }
    Ok(())
}

fn render_table<E: Emitter>(
    out: &mut E,
    table: &TableLiteral,
    indent: usize,
    config: &EmitConfig,
) -> EmitResult<()> {
    if table.is_empty() {
        out.emit("{}");
        return Ok(());
    }

    let entries = entries(table)?;
    let limit = config.single_line_threshold;

    if entries_width(&entries, limit)? <= limit {
        out.emit("{");
        out.emit_space();
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                out.emit(",");
                out.emit_space();
            }
            out.emit(&entry.prefix);
            render(out, entry.value, indent, config)?;
        }
        out.emit_space();
        out.emit("}");
        return Ok(());
    }

    out.emit("{");
    out.emit_newline();
    let last = entries.len() - 1;
    for (i, entry) in entries.iter().enumerate() {
        out.emit_indent(indent + 1);
        out.emit(&entry.prefix);
        render(out, entry.value, indent + 1, config)?;
        if i < last || config.add_trailing_comma(true) {
            out.emit(",");
        }
        out.emit_newline();
    }
    out.emit_indent(indent);
    out.emit("}");
    Ok(())
}

fn entries(table: &TableLiteral) -> EmitResult<Vec<Entry<'_>>> {
    let shape = table.shape();
    let mut entries = Vec::with_capacity(table.len());

    for (i, value) in table.items().iter().enumerate() {
        let prefix = if shape == TableShape::Bracketed {
            format!("[{}] = ", i + 1)
        } else {
            String::new()
        };
        entries.push(Entry { prefix, value });
    }

    for (key, value) in table.fields() {
        let prefix = match (shape, key) {
            (TableShape::Fields, LiteralKey::String(name)) => format!("{name} = "),
            _ => format!("[{}] = ", bracket_key(key)?),
        };
        entries.push(Entry { prefix, value });
    }

    Ok(entries)
}

fn bracket_key(key: &LiteralKey) -> EmitResult<String> {
    match key {
        LiteralKey::String(s) => Ok(quote_string(s)),
        LiteralKey::Number(n) if n.is_nan() => Err(EmitError::InvalidKey {
            key: "NaN".to_owned(),
        }),
        LiteralKey::Number(n) => Ok(number_literal(*n)),
        LiteralKey::Boolean(b) => Ok(b.to_string()),
    }
}

fn entries_width(entries: &[Entry<'_>], limit: usize) -> EmitResult<usize> {
    let mut total = 0usize;
    for entry in entries {
        let value = literal_width(entry.value, limit)?;
        total = total
            .saturating_add(entry.prefix.chars().count())
            .saturating_add(value)
            .saturating_add(ENTRY_OVERHEAD);
        if total > limit {
            break;
        }
    }
    Ok(total)
}

fn literal_width(literal: &Literal, limit: usize) -> EmitResult<usize> {
    Ok(match literal {
        Literal::Nil => 3,
        Literal::Boolean(true) => 4,
        Literal::Boolean(false) => 5,
        Literal::Number(n) => number_literal(*n).len(),
        Literal::String(s) => quote_string(s).chars().count(),
        Literal::Raw(text) => text.chars().count(),
        Literal::Table(table) if table.is_empty() => EMPTY_TABLE_WIDTH,
        Literal::Table(table) => {
            ensure_sufficient_stack(|| estimate(table, limit))?.saturating_add(BRACE_OVERHEAD)
        }
    })
}
