//! Centralised coercion and comparison rules.
//!
//! Every operator and builtin goes through these helpers so that booleans,
//! blanks, numeric text, and error-coded text behave the same everywhere.

use std::cmp::Ordering;

use sheetcalc_common::{ErrorKind, FormulaValue, format_number};

/// Parse text the way a numeric context reads it: surrounding whitespace,
/// an optional sign, decimal/exponent forms, and a trailing `%`.
/// `"inf"`, `"NaN"` and friends are rejected.
pub fn parse_number_text(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    let (body, scale) = match t.strip_suffix('%') {
        Some(b) => (b.trim_end(), 0.01),
        None => (t, 1.0),
    };
    if !body
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
        || !body.bytes().any(|b| b.is_ascii_digit())
    {
        return None;
    }
    body.parse::<f64>().ok().map(|n| n * scale)
}

/// NaN and infinities become `#NUM!`.
pub fn sanitize(n: f64) -> Result<f64, ErrorKind> {
    if n.is_finite() { Ok(n) } else { Err(ErrorKind::Num) }
}

/// Numeric coercion for a scalar in a "treat blank as zero" context.
///
/// Text spelling an error code (`"#DIV/0!"`) yields that error; other
/// non-numeric text is `#VALUE!`. Arrays use their top-left element.
pub fn to_number(value: &FormulaValue) -> Result<f64, ErrorKind> {
    match value {
        FormulaValue::Number(n) => Ok(*n),
        FormulaValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        FormulaValue::Null => Ok(0.0),
        FormulaValue::Error(e) => Err(*e),
        FormulaValue::Text(s) => text_to_number(s),
        FormulaValue::Array(_) => to_number(value.first()),
    }
}

pub fn text_to_number(s: &str) -> Result<f64, ErrorKind> {
    if let Some(n) = parse_number_text(s) {
        return Ok(n);
    }
    Err(ErrorKind::parse(s).unwrap_or(ErrorKind::Value))
}

/// Like [`to_number`] but blank yields `None` (excluded), for
/// AVERAGE-style denominators.
pub fn to_number_opt(value: &FormulaValue) -> Result<Option<f64>, ErrorKind> {
    match value {
        FormulaValue::Null => Ok(None),
        other => to_number(other).map(Some),
    }
}

/// Integer argument, truncated toward zero.
pub fn to_int(value: &FormulaValue) -> Result<i64, ErrorKind> {
    let n = to_number(value)?;
    if n.abs() > 9.0e15 {
        return Err(ErrorKind::Num);
    }
    Ok(n.trunc() as i64)
}

/// Text coercion. Numbers use the default display format.
pub fn to_text(value: &FormulaValue) -> Result<String, ErrorKind> {
    match value {
        FormulaValue::Text(s) => Ok(s.clone()),
        FormulaValue::Number(n) => Ok(format_number(*n)),
        FormulaValue::Boolean(true) => Ok("TRUE".to_string()),
        FormulaValue::Boolean(false) => Ok("FALSE".to_string()),
        FormulaValue::Null => Ok(String::new()),
        FormulaValue::Error(e) => Err(*e),
        FormulaValue::Array(_) => to_text(value.first()),
    }
}

/// Logical coercion: numbers are true when non-zero, `"TRUE"`/`"FALSE"`
/// text is accepted, blank is false.
pub fn to_bool(value: &FormulaValue) -> Result<bool, ErrorKind> {
    match value {
        FormulaValue::Boolean(b) => Ok(*b),
        FormulaValue::Number(n) => Ok(*n != 0.0),
        FormulaValue::Null => Ok(false),
        FormulaValue::Error(e) => Err(*e),
        FormulaValue::Text(s) => {
            if s.eq_ignore_ascii_case("TRUE") {
                Ok(true)
            } else if s.eq_ignore_ascii_case("FALSE") {
                Ok(false)
            } else {
                Err(ErrorKind::parse(s).unwrap_or(ErrorKind::Value))
            }
        }
        FormulaValue::Array(_) => to_bool(value.first()),
    }
}

/// Errors propagate, everything else passes through.
pub fn check(value: FormulaValue) -> Result<FormulaValue, ErrorKind> {
    match value {
        FormulaValue::Error(e) => Err(e),
        other => Ok(other),
    }
}

/// The first error found anywhere in the value, row-major.
pub fn first_error(value: &FormulaValue) -> Option<ErrorKind> {
    match value {
        FormulaValue::Error(e) => Some(*e),
        FormulaValue::Array(rows) => rows.iter().flatten().find_map(first_error),
        _ => None,
    }
}

fn type_rank(value: &FormulaValue) -> u8 {
    match value {
        FormulaValue::Null | FormulaValue::Number(_) => 0,
        FormulaValue::Text(_) => 1,
        FormulaValue::Boolean(_) => 2,
        FormulaValue::Error(_) => 3,
        FormulaValue::Array(_) => 4,
    }
}

/// Total order used by comparison operators, sorting, and lookups:
/// numbers < text < booleans, text compared case-insensitively, and blank
/// equal to `0`, `""`, or `FALSE` depending on the other side.
pub fn compare_values(a: &FormulaValue, b: &FormulaValue) -> Ordering {
    use FormulaValue::*;
    match (a, b) {
        (Array(_), _) => compare_values(a.first(), b),
        (_, Array(_)) => compare_values(a, b.first()),
        (Null, Null) => Ordering::Equal,
        (Null, Number(n)) => 0.0f64.partial_cmp(n).unwrap_or(Ordering::Equal),
        (Number(n), Null) => n.partial_cmp(&0.0).unwrap_or(Ordering::Equal),
        (Null, Text(s)) => compare_text("", s),
        (Text(s), Null) => compare_text(s, ""),
        (Null, Boolean(x)) => false.cmp(x),
        (Boolean(x), Null) => x.cmp(&false),
        (Number(x), Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Text(x), Text(y)) => compare_text(x, y),
        (Boolean(x), Boolean(y)) => x.cmp(y),
        (Error(x), Error(y)) => x.type_code().cmp(&y.type_code()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Case-insensitive equality with the blank rules of [`compare_values`].
pub fn values_equal(a: &FormulaValue, b: &FormulaValue) -> bool {
    compare_values(a, b) == Ordering::Equal
}
