use std::fmt::{self, Display};

use crate::ErrorKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The runtime value produced by evaluating a formula.
///
/// Arrays are row-major and rectangular; they arise from range expansion,
/// array literals, and array-returning functions.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormulaValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    #[default]
    Null,
    Error(ErrorKind),
    Array(Vec<Vec<FormulaValue>>),
}

impl FormulaValue {
    pub fn text<S: Into<String>>(s: S) -> Self {
        FormulaValue::Text(s.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FormulaValue::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, FormulaValue::Array(_))
    }

    pub fn error(&self) -> Option<ErrorKind> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormulaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// `(rows, cols)`; scalars are 1×1.
    pub fn dims(&self) -> (usize, usize) {
        match self {
            FormulaValue::Array(rows) => (rows.len(), rows.first().map_or(0, Vec::len)),
            _ => (1, 1),
        }
    }

    /// Degrade a 1×1 array to its single element and an empty array to `Null`.
    /// Larger arrays and scalars are returned unchanged.
    pub fn into_scalar(self) -> FormulaValue {
        match self {
            FormulaValue::Array(mut rows) => {
                if rows.len() == 1 && rows[0].len() == 1 {
                    rows.pop()
                        .and_then(|mut r| r.pop())
                        .unwrap_or(FormulaValue::Null)
                } else if rows.is_empty() || rows[0].is_empty() {
                    FormulaValue::Null
                } else {
                    FormulaValue::Array(rows)
                }
            }
            other => other,
        }
    }

    /// Top-left element for arrays, the value itself otherwise.
    pub fn first(&self) -> &FormulaValue {
        match self {
            FormulaValue::Array(rows) => rows
                .first()
                .and_then(|r| r.first())
                .unwrap_or(&FormulaValue::Null),
            other => other,
        }
    }

    /// Row-major walk over every scalar, descending into nested arrays.
    pub fn flatten(&self) -> Vec<&FormulaValue> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into<'a>(&'a self, out: &mut Vec<&'a FormulaValue>) {
        match self {
            FormulaValue::Array(rows) => {
                for row in rows {
                    for cell in row {
                        cell.flatten_into(out);
                    }
                }
            }
            other => out.push(other),
        }
    }

    /// Owned rows of an array; a scalar becomes a 1×1 grid.
    pub fn into_rows(self) -> Vec<Vec<FormulaValue>> {
        match self {
            FormulaValue::Array(rows) => rows,
            other => vec![vec![other]],
        }
    }

    /// Name used by `TYPE()`-like introspection and diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            FormulaValue::Number(_) => "number",
            FormulaValue::Text(_) => "text",
            FormulaValue::Boolean(_) => "boolean",
            FormulaValue::Null => "blank",
            FormulaValue::Error(_) => "error",
            FormulaValue::Array(_) => "array",
        }
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<i64> for FormulaValue {
    fn from(n: i64) -> Self {
        FormulaValue::Number(n as f64)
    }
}

impl From<bool> for FormulaValue {
    fn from(b: bool) -> Self {
        FormulaValue::Boolean(b)
    }
}

impl From<&str> for FormulaValue {
    fn from(s: &str) -> Self {
        FormulaValue::Text(s.to_string())
    }
}

impl From<String> for FormulaValue {
    fn from(s: String) -> Self {
        FormulaValue::Text(s)
    }
}

impl From<ErrorKind> for FormulaValue {
    fn from(e: ErrorKind) -> Self {
        FormulaValue::Error(e)
    }
}

impl Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Number(n) => f.write_str(&format_number(*n)),
            FormulaValue::Text(s) => f.write_str(s),
            FormulaValue::Boolean(true) => f.write_str("TRUE"),
            FormulaValue::Boolean(false) => f.write_str("FALSE"),
            FormulaValue::Null => Ok(()),
            FormulaValue::Error(e) => write!(f, "{e}"),
            FormulaValue::Array(rows) => {
                f.write_str("{")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    for (j, cell) in row.iter().enumerate() {
                        if j > 0 {
                            f.write_str(",")?;
                        }
                        match cell {
                            FormulaValue::Text(s) => write!(f, "\"{s}\"")?,
                            other => write!(f, "{other}")?,
                        }
                    }
                }
                f.write_str("}")
            }
        }
    }
}

/// Render a number the way a cell displays it by default: integers without
/// a fraction, everything else rounded to 15 significant digits.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return ErrorKind::Num.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let rounded: f64 = format!("{n:.14e}").parse().unwrap_or(n);
    let abs = rounded.abs();
    if (1e-9..1e15).contains(&abs) {
        return format!("{rounded}");
    }
    let sci = format!("{rounded:E}");
    match sci.split_once('E') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}E+{exp}"),
        _ => sci,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-42.0), "-42");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(1e20), "1E+20");
        assert_eq!(format_number(f64::NAN), "#NUM!");
    }

    #[test]
    fn one_by_one_array_degrades() {
        let v = FormulaValue::Array(vec![vec![FormulaValue::Number(7.0)]]);
        assert_eq!(v.into_scalar(), FormulaValue::Number(7.0));

        let empty = FormulaValue::Array(vec![]);
        assert_eq!(empty.into_scalar(), FormulaValue::Null);

        let wide = FormulaValue::Array(vec![vec![1.0.into(), 2.0.into()]]);
        assert!(wide.clone().into_scalar().is_array());
        assert_eq!(wide.dims(), (1, 2));
    }

    #[test]
    fn flatten_descends_into_nested_arrays() {
        let v = FormulaValue::Array(vec![
            vec![1.0.into(), FormulaValue::Array(vec![vec![2.0.into(), 3.0.into()]])],
            vec!["x".into(), FormulaValue::Null],
        ]);
        let flat = v.flatten();
        assert_eq!(flat.len(), 5);
        assert_eq!(flat[2], &FormulaValue::Number(3.0));
    }

    #[test]
    fn array_display_uses_literal_syntax() {
        let v = FormulaValue::Array(vec![
            vec![1.0.into(), "a".into()],
            vec![true.into(), ErrorKind::Na.into()],
        ]);
        assert_eq!(v.to_string(), "{1,\"a\";TRUE,#N/A}");
    }
}
