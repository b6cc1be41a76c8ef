use std::fmt;

use crate::reference::{format_address, index_to_column, quote_sheet_name};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fully-qualified cell identity: `(sheet, row, col)`, 0-based.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub sheet: String,
    pub row: u32,
    pub col: u32,
}

impl CellKey {
    pub fn new(sheet: impl Into<String>, row: u32, col: u32) -> Self {
        Self {
            sheet: sheet.into(),
            row,
            col,
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_address(Some(&self.sheet), self.row, self.col))
    }
}

/// Rectangular block on one sheet, inclusive on both ends and normalised so
/// that `start <= end` on each axis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RangeKey {
    pub sheet: String,
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl RangeKey {
    pub fn new(sheet: impl Into<String>, r1: u32, c1: u32, r2: u32, c2: u32) -> Self {
        Self {
            sheet: sheet.into(),
            start_row: r1.min(r2),
            start_col: c1.min(c2),
            end_row: r1.max(r2),
            end_col: c1.max(c2),
        }
    }

    pub fn height(&self) -> u32 {
        self.end_row - self.start_row + 1
    }

    pub fn width(&self) -> u32 {
        self.end_col - self.start_col + 1
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.height()) * u64::from(self.width())
    }

    pub fn contains(&self, key: &CellKey) -> bool {
        key.sheet == self.sheet
            && (self.start_row..=self.end_row).contains(&key.row)
            && (self.start_col..=self.end_col).contains(&key.col)
    }

    /// Row-major iteration over every cell in the block.
    pub fn cells(&self) -> impl Iterator<Item = CellKey> + '_ {
        (self.start_row..=self.end_row).flat_map(move |r| {
            (self.start_col..=self.end_col).map(move |c| CellKey::new(self.sheet.clone(), r, c))
        })
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}{}:{}{}",
            quote_sheet_name(&self.sheet),
            index_to_column(self.start_col),
            self.start_row + 1,
            index_to_column(self.end_col),
            self.end_row + 1
        )
    }
}
