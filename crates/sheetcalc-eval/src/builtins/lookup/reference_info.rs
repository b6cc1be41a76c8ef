use sheetcalc_common::{ErrorKind, FormulaValue};
use sheetcalc_parse::Reference;

use super::lookups::table;
use crate::args::ArgumentHandle;
use crate::coercion::to_int;
use crate::function::{FnCaps, FnResult, Function};
use crate::traits::FunctionContext;

/// `(top, left, bottom, right)` of a reference argument.
fn extent(reference: &Reference) -> (u32, u32, u32, u32) {
    match reference {
        Reference::Cell(c) => (c.row, c.col, c.row, c.col),
        Reference::Range(r) => r.bounds(),
    }
}

/* ─────────────────────────── INDEX() ─────────────────────────── */

/// `INDEX(array, row, [col])`, 1-based. With one index a vector is
/// indexed along its length and a 2-D block yields the whole row.
/// Indices below 1 or past the block are `#REF!`.
#[derive(Debug)]
pub struct IndexFn;

impl Function for IndexFn {
    fn name(&self) -> &'static str {
        "INDEX"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::LOOKUP
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        let rows = table(&args[0])?;
        let row = to_int(&args[1].scalar())?;
        let col = match args.get(2) {
            Some(a) if !a.is_omitted() => Some(to_int(&a.scalar())?),
            _ => None,
        };
        let height = rows.len() as i64;
        let width = rows.first().map_or(0, Vec::len) as i64;

        let (row, col) = match col {
            Some(c) => (row, c),
            None if height == 1 => (1, row),
            None if width == 1 => (row, 1),
            None => {
                if row < 1 || row > height {
                    return Err(ErrorKind::Ref);
                }
                return Ok(FormulaValue::Array(vec![rows[row as usize - 1].clone()]));
            }
        };
        if row < 1 || col < 1 || row > height || col > width {
            return Err(ErrorKind::Ref);
        }
        Ok(rows[row as usize - 1]
            .get(col as usize - 1)
            .cloned()
            .unwrap_or(FormulaValue::Null))
    }
}

/* ─────────────────────────── CHOOSE() ─────────────────────────── */

/// `CHOOSE(n, v1, v2, ...)`; only the chosen value is evaluated.
#[derive(Debug)]
pub struct ChooseFn;

impl Function for ChooseFn {
    fn name(&self) -> &'static str {
        "CHOOSE"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::SHORT_CIRCUIT
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        let n = to_int(&args[0].scalar())?;
        if n < 1 || n as usize >= args.len() {
            return Err(ErrorKind::Value);
        }
        Ok(args[n as usize].value())
    }
}

/* ─────────────────────────── ROW() / COLUMN() ─────────────────────────── */

/// Row number of a reference (its top row), or of the current cell.
#[derive(Debug)]
pub struct RowFn;

impl Function for RowFn {
    fn name(&self) -> &'static str {
        "ROW"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], ctx: &dyn FunctionContext) -> FnResult {
        let row = match args.first().filter(|a| !a.is_omitted()) {
            None => ctx.current_cell().ok_or(ErrorKind::Value)?.0,
            Some(a) => extent(&a.reference().ok_or(ErrorKind::Value)?).0,
        };
        Ok(FormulaValue::Number(f64::from(row) + 1.0))
    }
}

#[derive(Debug)]
pub struct ColumnFn;

impl Function for ColumnFn {
    fn name(&self) -> &'static str {
        "COLUMN"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], ctx: &dyn FunctionContext) -> FnResult {
        let col = match args.first().filter(|a| !a.is_omitted()) {
            None => ctx.current_cell().ok_or(ErrorKind::Value)?.1,
            Some(a) => extent(&a.reference().ok_or(ErrorKind::Value)?).1,
        };
        Ok(FormulaValue::Number(f64::from(col) + 1.0))
    }
}

/* ─────────────────────────── ROWS() / COLUMNS() ─────────────────────────── */

/// `(height, width)` of an argument; references are measured without
/// reading their cells.
fn shape(arg: &ArgumentHandle<'_, '_>) -> Result<(usize, usize), ErrorKind> {
    if let Some(r) = arg.reference() {
        let (top, left, bottom, right) = extent(&r);
        return Ok(((bottom - top + 1) as usize, (right - left + 1) as usize));
    }
    match arg.value() {
        FormulaValue::Error(e) => Err(e),
        v => Ok(v.dims()),
    }
}

#[derive(Debug)]
pub struct RowsFn;

impl Function for RowsFn {
    fn name(&self) -> &'static str {
        "ROWS"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        Ok(FormulaValue::Number(shape(&args[0])?.0 as f64))
    }
}

#[derive(Debug)]
pub struct ColumnsFn;

impl Function for ColumnsFn {
    fn name(&self) -> &'static str {
        "COLUMNS"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        Ok(FormulaValue::Number(shape(&args[0])?.1 as f64))
    }
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::{ErrorKind, FormulaValue};

    use crate::test_workbook::TestWorkbook;

    fn grid() -> TestWorkbook {
        TestWorkbook::new()
            .with_cell("A1", 1.0)
            .with_cell("B1", 2.0)
            .with_cell("A2", 3.0)
            .with_cell("B2", 4.0)
    }

    #[test]
    fn index_is_one_based() {
        let wb = grid();
        assert_eq!(wb.eval("INDEX(A1:B2,2,1)"), 3.0.into());
        assert_eq!(wb.eval("INDEX(A1:B2,1,2)"), 2.0.into());
        assert_eq!(wb.eval("INDEX(A1:B2,0,1)"), ErrorKind::Ref.into());
        assert_eq!(wb.eval("INDEX(A1:B2,3,1)"), ErrorKind::Ref.into());
        assert_eq!(wb.eval("INDEX(A1:A2,2)"), 3.0.into());
        assert_eq!(wb.eval("INDEX(A1:B1,2)"), 2.0.into());
        assert_eq!(
            wb.eval("INDEX(A1:B2,2)"),
            FormulaValue::Array(vec![vec![3.0.into(), 4.0.into()]])
        );
    }

    #[test]
    fn choose_evaluates_only_the_pick() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("CHOOSE(2,1/0,\"two\",1/0)"), "two".into());
        assert_eq!(wb.eval("CHOOSE(4,1,2,3)"), ErrorKind::Value.into());
        assert_eq!(wb.eval("CHOOSE(0,1,2,3)"), ErrorKind::Value.into());
    }

    #[test]
    fn row_and_column() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("ROW(C5)"), 5.0.into());
        assert_eq!(wb.eval("COLUMN(C5:E9)"), 3.0.into());
        assert_eq!(wb.eval("ROW(1+1)"), ErrorKind::Value.into());
        assert_eq!(wb.eval_at("D7", "ROW()"), 7.0.into());
        assert_eq!(wb.eval_at("D7", "COLUMN()"), 4.0.into());
        assert_eq!(wb.eval("ROW()"), ErrorKind::Value.into());
    }

    #[test]
    fn rows_and_columns() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("ROWS(A1:C10)"), 10.0.into());
        assert_eq!(wb.eval("COLUMNS(A1:C10)"), 3.0.into());
        assert_eq!(wb.eval("COLUMNS({1,2,3;4,5,6})"), 3.0.into());
        assert_eq!(wb.eval("ROWS(7)"), 1.0.into());
    }
}
