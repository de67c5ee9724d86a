//! Intermediate literal form handed from the builder to the writer.
//!
//! A [`Literal`] is a fully-resolved tree: host data has already been
//! converted, so writing it never consults converters or configuration
//! beyond layout options.

use crate::lexical::is_identifier;

/// A value expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
    Table(TableLiteral),
    /// Trusted expression text, written verbatim (for example a constructor call).
    Raw(String),
}

impl Literal {
    /// Trusted expression text.
    pub fn raw(text: impl Into<String>) -> Self {
        Literal::Raw(text.into())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Literal::Nil)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Boolean(b)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Number(f64::from(n))
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_owned())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<TableLiteral> for Literal {
    fn from(t: TableLiteral) -> Self {
        Literal::Table(t)
    }
}

/// A table key.
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralKey {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl From<&str> for LiteralKey {
    fn from(s: &str) -> Self {
        LiteralKey::String(s.to_owned())
    }
}

/// How a table's keys are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableShape {
    /// `{}`
    Empty,
    /// Positional items only: `{ 1, 2, 3 }`
    Array,
    /// Identifier keys only: `{ a = 1, b = 2 }`
    Fields,
    /// Anything else: every entry gets a bracket key, `{ ["a b"] = 1, [2] = true }`
    Bracketed,
}

/// A table constructor: positional items followed by keyed fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableLiteral {
    items: Vec<Literal>,
    fields: Vec<(LiteralKey, Literal)>,
}

impl TableLiteral {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional item (key `len + 1`).
    pub fn push(&mut self, value: Literal) {
        self.items.push(value);
    }

    /// Add a keyed entry.
    ///
    /// A numeric key continuing the positional items is stored as an item.
    pub fn insert(&mut self, key: LiteralKey, value: Literal) {
        if let LiteralKey::Number(n) = key {
            let next = self.items.len() + 1;
            #[expect(clippy::cast_precision_loss, reason = "item counts are far below 2^53")]
            let next = next as f64;
            #[expect(clippy::float_cmp, reason = "exact integral key match")]
            let continues = n == next;
            if continues {
                self.items.push(value);
                return;
            }
        }
        self.fields.push((key, value));
    }

    /// Builder-style [`TableLiteral::insert`] for a string key.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Literal>) -> Self {
        self.insert(LiteralKey::from(name), value.into());
        self
    }

    /// Builder-style [`TableLiteral::push`].
    #[must_use]
    pub fn with_item(mut self, value: impl Into<Literal>) -> Self {
        self.push(value.into());
        self
    }

    pub fn items(&self) -> &[Literal] {
        &self.items
    }

    pub fn fields(&self) -> &[(LiteralKey, Literal)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.items.len() + self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.fields.is_empty()
    }

    pub fn shape(&self) -> TableShape {
        if self.is_empty() {
            TableShape::Empty
        } else if self.fields.is_empty() {
            TableShape::Array
        } else if self.items.is_empty()
            && self
                .fields
                .iter()
                .all(|(key, _)| matches!(key, LiteralKey::String(s) if is_identifier(s)))
        {
            TableShape::Fields
        } else {
            TableShape::Bracketed
        }
    }
}

impl<T: Into<Literal>> FromIterator<T> for TableLiteral {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        TableLiteral {
            items: iter.into_iter().map(Into::into).collect(),
            fields: Vec::new(),
        }
    }
}
