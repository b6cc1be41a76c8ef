use sheetcalc_common::{ErrorKind, FormulaValue};

use crate::coercion;

/// Small epsilon used to detect near-zero denominators.
pub const EPSILON_NEAR_ZERO: f64 = 1e-12;

/// Top-left element: arguments written as a cell reference arrive as 1×1
/// arrays.
pub fn scalar(v: &FormulaValue) -> &FormulaValue {
    v.first()
}

pub fn num(v: &FormulaValue) -> Result<f64, ErrorKind> {
    coercion::to_number(v)
}

pub fn int(v: &FormulaValue) -> Result<i64, ErrorKind> {
    coercion::to_int(v)
}

pub fn text(v: &FormulaValue) -> Result<String, ErrorKind> {
    coercion::to_text(v)
}

pub fn boolean(v: &FormulaValue) -> Result<bool, ErrorKind> {
    coercion::to_bool(v)
}

/// Optional numeric argument; omitted or blank takes `default`.
pub fn opt_num(args: &[FormulaValue], idx: usize, default: f64) -> Result<f64, ErrorKind> {
    match args.get(idx).map(scalar) {
        None | Some(FormulaValue::Null) => Ok(default),
        Some(v) => num(v),
    }
}

pub fn opt_int(args: &[FormulaValue], idx: usize, default: i64) -> Result<i64, ErrorKind> {
    match args.get(idx).map(scalar) {
        None | Some(FormulaValue::Null) => Ok(default),
        Some(v) => int(v),
    }
}

pub fn opt_bool(args: &[FormulaValue], idx: usize, default: bool) -> Result<bool, ErrorKind> {
    match args.get(idx).map(scalar) {
        None | Some(FormulaValue::Null) => Ok(default),
        Some(v) => boolean(v),
    }
}

/// Numbers taking part in a SUM-style aggregate.
///
/// A scalar argument is coerced: booleans count, numeric text parses, and
/// text spelling an error code is that error. Inside arrays and ranges only
/// numbers count; text, booleans, and blanks are skipped. Errors anywhere
/// propagate.
pub fn collect_numbers(args: &[FormulaValue]) -> Result<Vec<f64>, ErrorKind> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Array(_) => {
                for v in arg.flatten() {
                    match v {
                        FormulaValue::Number(n) => out.push(*n),
                        FormulaValue::Error(e) => return Err(*e),
                        _ => {}
                    }
                }
            }
            FormulaValue::Null => {}
            FormulaValue::Error(e) => return Err(*e),
            other => out.push(num(other)?),
        }
    }
    Ok(out)
}

/// The `A`-suffixed variant: inside arrays text counts as 0 and booleans as
/// 1/0; blanks are still skipped.
pub fn collect_numbers_a(args: &[FormulaValue]) -> Result<Vec<f64>, ErrorKind> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Array(_) => {
                for v in arg.flatten() {
                    match v {
                        FormulaValue::Number(n) => out.push(*n),
                        FormulaValue::Boolean(b) => out.push(if *b { 1.0 } else { 0.0 }),
                        FormulaValue::Text(_) => out.push(0.0),
                        FormulaValue::Error(e) => return Err(*e),
                        _ => {}
                    }
                }
            }
            FormulaValue::Null => {}
            FormulaValue::Error(e) => return Err(*e),
            other => out.push(num(other)?),
        }
    }
    Ok(out)
}

/// Flatten every argument into one row-major list of scalars.
pub fn flatten_args(args: &[FormulaValue]) -> Vec<&FormulaValue> {
    args.iter().flat_map(FormulaValue::flatten).collect()
}

/// Numbers of a single block argument, position preserved (non-numbers
/// become `None`). Errors propagate.
pub fn numeric_cells(v: &FormulaValue) -> Result<Vec<Option<f64>>, ErrorKind> {
    v.flatten()
        .into_iter()
        .map(|c| match c {
            FormulaValue::Number(n) => Ok(Some(*n)),
            FormulaValue::Error(e) => Err(*e),
            _ => Ok(None),
        })
        .collect()
}

/// Rows of a block argument as an owned grid; scalars become 1×1.
pub fn grid(v: &FormulaValue) -> Vec<Vec<FormulaValue>> {
    v.clone().into_rows()
}

pub fn number(n: f64) -> Result<FormulaValue, ErrorKind> {
    coercion::sanitize(n).map(FormulaValue::Number)
}

/// Round half away from zero at `digits` decimal places (negative digits
/// round to the left of the point).
pub fn round_to(n: f64, digits: i64) -> f64 {
    round_with(n, digits, f64::round)
}

/// Scale to `digits` places, apply `f`, scale back. The scaled value is
/// first trimmed to 15 significant digits so `2.675` rounds like the
/// decimal it displays as.
pub fn round_with(n: f64, digits: i64, f: fn(f64) -> f64) -> f64 {
    let digits = digits.clamp(-308, 308) as i32;
    let factor = 10f64.powi(digits.abs());
    let scaled = significant15(if digits >= 0 { n * factor } else { n / factor });
    let rounded = f(scaled);
    if digits >= 0 {
        rounded / factor
    } else {
        rounded * factor
    }
}

pub fn significant15(x: f64) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return x;
    }
    format!("{x:.14e}").parse().unwrap_or(x)
}
