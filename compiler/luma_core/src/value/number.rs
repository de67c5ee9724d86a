//! Invariant number formatting and parsing.
//!
//! Numbers are rendered the same way regardless of host locale: a `.`
//! decimal separator, no grouping, and the shortest text that parses back
//! to the same `f64`.

/// Integral values below this magnitude print without a fraction or exponent.
const INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53

/// Decimal exponents outside `[MIN_PLAIN_EXPONENT, MAX_PLAIN_EXPONENT)` use scientific notation.
const MIN_PLAIN_EXPONENT: f64 = -4.0;
const MAX_PLAIN_EXPONENT: f64 = 15.0;

/// Format a number using the invariant, lossless textual form.
///
/// `42.0` becomes `42`, `0.5` stays `0.5`, `1e300` becomes `1e300`.
/// Non-finite values render as `nan`, `inf` and `-inf`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    if n.fract() == 0.0 && n.abs() < INTEGER_LIMIT {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "magnitude checked against 2^53 above"
        )]
        let int = n as i64;
        return int.to_string();
    }
    let exponent = n.abs().log10().floor();
    if (MIN_PLAIN_EXPONENT..MAX_PLAIN_EXPONENT).contains(&exponent) {
        format!("{n}")
    } else {
        format!("{n:e}")
    }
}

/// Parse script text as a number.
///
/// Accepts optional surrounding whitespace, an optional sign, decimal
/// literals with fraction and exponent, and `0x` hexadecimal integers.
/// Words such as `inf` or `nan` are rejected.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if body.is_empty() {
        return None;
    }

    if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        let value = parse_integer_radix(hex, 16)?;
        return Some(if negative { -value } else { value });
    }

    let well_formed = body.as_bytes()[0] != b'+'
        && body.as_bytes()[0] != b'-'
        && body
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !well_formed {
        return None;
    }
    let value: f64 = body.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Parse an unsigned integer in `radix` (2 to 36) as a number.
///
/// Returns `None` for empty input, digits outside the radix, or overflow.
pub fn parse_integer_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty()
        || !(2..=36).contains(&radix)
        || !digits.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return None;
    }
    let value = u64::from_str_radix(digits, radix).ok()?;
    #[expect(
        clippy::cast_precision_loss,
        reason = "script numbers are f64; large literals round like any other"
    )]
    let number = value as f64;
    Some(number)
}
