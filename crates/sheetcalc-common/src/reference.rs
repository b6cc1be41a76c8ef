//! A1-style reference codec.
//!
//! Columns and rows are **0-based** everywhere in the engine; the text form
//! uses column letters and 1-based row numbers (`A1` is `(row 0, col 0)`).

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use once_cell::sync::Lazy;

/// Longest column label accepted (`ZZZ`).
pub const MAX_COLUMN_LETTERS: usize = 3;
/// Number of addressable columns (`A`..=`ZZZ`).
pub const MAX_COLS: u32 = 18_278;
/// Number of addressable rows.
pub const MAX_ROWS: u32 = 1_048_576;

// A..ZZ covers nearly every real-world column.
static COLUMN_LOOKUP: Lazy<Vec<String>> = Lazy::new(|| {
    let mut cols = Vec::with_capacity(702);
    for c in b'A'..=b'Z' {
        cols.push(String::from(c as char));
    }
    for c1 in b'A'..=b'Z' {
        for c2 in b'A'..=b'Z' {
            cols.push(format!("{}{}", c1 as char, c2 as char));
        }
    }
    cols
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    InvalidColumn(String),
    InvalidRow(String),
    InvalidAddress(String),
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceError::InvalidColumn(s) => write!(f, "Invalid column: {s}"),
            ReferenceError::InvalidRow(s) => write!(f, "Invalid row: {s}"),
            ReferenceError::InvalidAddress(s) => write!(f, "Invalid cell reference: {s}"),
        }
    }
}

impl Error for ReferenceError {}

/// `"A"` → 0, `"Z"` → 25, `"AA"` → 26. Case-insensitive.
pub fn column_to_index(letters: &str) -> Result<u32, ReferenceError> {
    let bytes = letters.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_COLUMN_LETTERS {
        return Err(ReferenceError::InvalidColumn(letters.to_string()));
    }

    let mut result = 0u32;
    for &b in bytes {
        if !b.is_ascii_alphabetic() {
            return Err(ReferenceError::InvalidColumn(letters.to_string()));
        }
        result = result
            .checked_mul(26)
            .and_then(|r| r.checked_add((b.to_ascii_uppercase() - b'A' + 1) as u32))
            .ok_or_else(|| ReferenceError::InvalidColumn(letters.to_string()))?;
    }
    Ok(result - 1)
}

/// 0 → `"A"`, 26 → `"AA"`.
pub fn index_to_column(index: u32) -> String {
    if let Some(s) = COLUMN_LOOKUP.get(index as usize) {
        return s.clone();
    }
    let mut num = index + 1;
    let mut result = String::with_capacity(MAX_COLUMN_LETTERS);
    while num > 0 {
        num -= 1;
        result.insert(0, ((num % 26) as u8 + b'A') as char);
        num /= 26;
    }
    result
}

/// A decoded `[$]COL[$]ROW` reference body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct A1 {
    pub row: u32,
    pub col: u32,
    pub abs_row: bool,
    pub abs_col: bool,
}

impl A1 {
    pub fn relative(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            abs_row: false,
            abs_col: false,
        }
    }
}

impl fmt::Display for A1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.abs_col {
            f.write_str("$")?;
        }
        f.write_str(&index_to_column(self.col))?;
        if self.abs_row {
            f.write_str("$")?;
        }
        write!(f, "{}", self.row + 1)
    }
}

/// Decode `A1`, `$A1`, `A$1`, or `$A$1` (no sheet prefix).
pub fn parse_a1(text: &str) -> Result<A1, ReferenceError> {
    let bytes = text.as_bytes();
    let mut i = 0;

    let abs_col = bytes.first() == Some(&b'$');
    if abs_col {
        i += 1;
    }

    let col_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == col_start {
        return Err(ReferenceError::InvalidAddress(text.to_string()));
    }
    let col = column_to_index(&text[col_start..i])?;

    let abs_row = bytes.get(i) == Some(&b'$');
    if abs_row {
        i += 1;
    }

    let row_text = &text[i..];
    if row_text.is_empty() || !row_text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReferenceError::InvalidAddress(text.to_string()));
    }
    let row: u32 = row_text
        .parse()
        .map_err(|_| ReferenceError::InvalidRow(row_text.to_string()))?;
    if row == 0 || row > MAX_ROWS {
        return Err(ReferenceError::InvalidRow(row_text.to_string()));
    }

    Ok(A1 {
        row: row - 1,
        col,
        abs_row,
        abs_col,
    })
}

/// Whether a sheet name must be wrapped in single quotes inside a formula.
pub fn sheet_needs_quotes(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        None => true,
        Some(c) if c.is_ascii_digit() => true,
        Some(c) => {
            !(c.is_ascii_alphabetic() || c == '_')
                || chars.any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        }
    }
}

/// `My Sheet` → `'My Sheet'`, `O'Brien` → `'O''Brien'`, `Data` → `Data`.
pub fn quote_sheet_name(name: &str) -> Cow<'_, str> {
    if sheet_needs_quotes(name) {
        Cow::Owned(format!("'{}'", name.replace('\'', "''")))
    } else {
        Cow::Borrowed(name)
    }
}

/// Render `(sheet?, row, col)` as formula text, e.g. `'Q1 Data'!B3`.
pub fn format_address(sheet: Option<&str>, row: u32, col: u32) -> String {
    let body = A1::relative(row, col).to_string();
    match sheet {
        Some(s) => format!("{}!{body}", quote_sheet_name(s)),
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_to_index("A"), Ok(0));
        assert_eq!(column_to_index("z"), Ok(25));
        assert_eq!(column_to_index("AA"), Ok(26));
        assert_eq!(column_to_index("ZZZ"), Ok(MAX_COLS - 1));
        assert!(column_to_index("AAAA").is_err());
        assert!(column_to_index("").is_err());
        assert!(column_to_index("A1").is_err());

        for idx in [0, 25, 26, 701, 702, 16_383, MAX_COLS - 1] {
            assert_eq!(column_to_index(&index_to_column(idx)), Ok(idx));
        }
        assert_eq!(index_to_column(702), "AAA");
    }

    #[test]
    fn absolute_markers() {
        let a = parse_a1("$A$1").unwrap();
        assert_eq!((a.row, a.col, a.abs_row, a.abs_col), (0, 0, true, true));

        let mixed = parse_a1("B$7").unwrap();
        assert_eq!((mixed.row, mixed.col, mixed.abs_row, mixed.abs_col), (6, 1, true, false));
        assert_eq!(mixed.to_string(), "B$7");

        let aa = parse_a1("aa1").unwrap();
        assert_eq!(aa.col, 26);
    }

    #[test]
    fn malformed_addresses() {
        assert!(parse_a1("A0").is_err());
        assert!(parse_a1("1A").is_err());
        assert!(parse_a1("A").is_err());
        assert!(parse_a1("$$A1").is_err());
        assert!(parse_a1("A1B").is_err());
    }

    #[test]
    fn sheet_quoting() {
        assert_eq!(quote_sheet_name("Data"), "Data");
        assert_eq!(quote_sheet_name("My Sheet"), "'My Sheet'");
        assert_eq!(quote_sheet_name("O'Brien"), "'O''Brien'");
        assert_eq!(quote_sheet_name("2024"), "'2024'");
        assert_eq!(format_address(Some("Sheet2"), 2, 1), "Sheet2!B3");
        assert_eq!(format_address(None, 0, 27), "AB1");
    }
}
