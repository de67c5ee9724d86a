//! Lexical rules of the target language: keywords, identifiers and literal text.

use luma_core::format_number;

/// Reserved words; none of these may be used as a bare identifier.
pub const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Whether `name` can be written as a bare identifier (`[A-Za-z_][A-Za-z0-9_]*`, not a keyword).
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_keyword(name)
}

/// Quote `text` as a double-quoted string literal.
///
/// `\\`, `"`, newline, carriage return and tab use their short escapes; any
/// other control character becomes a three-digit decimal escape. Everything
/// else, including non-ASCII text, is written as-is.
pub fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_ascii_control() => {
                quoted.push_str(&format!("\\{:03}", u32::from(c)));
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Source text for a number.
///
/// Finite values use the runtime's invariant format. NaN and infinities have
/// no literal form and are written as expressions.
pub fn number_literal(n: f64) -> String {
    if n.is_nan() {
        "(0/0)".to_owned()
    } else if n.is_infinite() {
        if n > 0.0 { "math.huge" } else { "-math.huge" }.to_owned()
    } else {
        format_number(n)
    }
}
