//! Spreadsheet error codes.
//!
//! Once a formula has parsed, every failure is a *value*: an `ErrorKind`
//! wrapped in [`FormulaValue::Error`](crate::FormulaValue::Error) that flows
//! through operators and functions like any other operand.
//!
//! **Note:** variant names are CamelCase while `Display` renders them the
//! way a spreadsheet shows them (`#DIV/0!`, `#N/A`, …).

use std::{error::Error, fmt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All recognised error codes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `#NULL!` – only reachable as a literal.
    Null,
    /// `#DIV/0!` – division or statistical denominator of zero.
    Div,
    /// `#VALUE!` – wrong type, wrong arity, or nesting too deep.
    Value,
    /// `#REF!` – reference or index outside its source.
    Ref,
    /// `#NAME?` – unknown function or identifier.
    Name,
    /// `#NUM!` – numeric domain error or non-convergent solve.
    Num,
    /// `#N/A` – lookup miss or explicit `NA()`.
    Na,
    /// `#CIRC!` – cell participates in a dependency cycle.
    Circ,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::Null,
        ErrorKind::Div,
        ErrorKind::Value,
        ErrorKind::Ref,
        ErrorKind::Name,
        ErrorKind::Num,
        ErrorKind::Na,
        ErrorKind::Circ,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "#NULL!",
            Self::Div => "#DIV/0!",
            Self::Value => "#VALUE!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Num => "#NUM!",
            Self::Na => "#N/A",
            Self::Circ => "#CIRC!",
        }
    }

    /// Case-insensitive lookup of an error code such as `"#div/0!"`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
    }

    /// Numeric code reported by `ERROR.TYPE`.
    pub const fn type_code(self) -> u8 {
        match self {
            Self::Null => 1,
            Self::Div => 2,
            Self::Value => 3,
            Self::Ref => 4,
            Self::Name => 5,
            Self::Num => 6,
            Self::Na => 7,
            Self::Circ => 8,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error for ErrorKind {}

impl PartialEq<str> for ErrorKind {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ErrorKind {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
