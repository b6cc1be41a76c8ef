//! sheetcalc-eval – core traits (object-safe)

use chrono::NaiveDateTime;
use sheetcalc_common::FormulaValue;

use crate::engine::EvalConfig;

/* ─────────────────────── EvaluationContext ─────────────────────── */

/// Read access to cell values during evaluation.
///
/// `sheet` is `None` for references local to a formula evaluated without
/// a current sheet; the interpreter otherwise passes the effective sheet.
pub trait EvaluationContext {
    fn read_cell(&self, sheet: Option<&str>, row: u32, col: u32) -> FormulaValue;

    /// Inclusive, normalised block. The default reads cell by cell.
    fn read_range(
        &self,
        sheet: Option<&str>,
        r1: u32,
        c1: u32,
        r2: u32,
        c2: u32,
    ) -> Vec<Vec<FormulaValue>> {
        (r1..=r2)
            .map(|r| (c1..=c2).map(|c| self.read_cell(sheet, r, c)).collect())
            .collect()
    }

    /// Value of a bare identifier such as a named constant.
    fn resolve_name(&self, _name: &str) -> Option<FormulaValue> {
        None
    }

    /// Wall-clock time for `TODAY()`/`NOW()`. `None` makes them `#VALUE!`.
    fn now(&self) -> Option<NaiveDateTime> {
        system_now()
    }
}

/// The host's local wall-clock time, or `None` without the `system-clock`
/// feature.
pub fn system_now() -> Option<NaiveDateTime> {
    #[cfg(feature = "system-clock")]
    {
        Some(chrono::Local::now().naive_local())
    }
    #[cfg(not(feature = "system-clock"))]
    {
        None
    }
}

/* ─────────────────────── FunctionContext ─────────────────────── */

/// The narrow view of the evaluation a builtin may observe.
pub trait FunctionContext {
    /// `(row, col)` of the cell being evaluated, 0-based.
    fn current_cell(&self) -> Option<(u32, u32)>;

    fn now(&self) -> Option<NaiveDateTime>;

    /// Uniform sample in `[0, 1)`.
    fn random(&self) -> f64;

    fn config(&self) -> &EvalConfig;
}
