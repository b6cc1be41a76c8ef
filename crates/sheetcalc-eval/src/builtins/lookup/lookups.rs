use std::cmp::Ordering;

use sheetcalc_common::{ErrorKind, FormulaValue};

use super::{approximate_match, exact_match};
use crate::args::ArgumentHandle;
use crate::coercion::{to_bool, to_int};
use crate::function::{FnCaps, FnResult, Function};
use crate::traits::FunctionContext;

fn needle(arg: &ArgumentHandle<'_, '_>) -> Result<FormulaValue, ErrorKind> {
    match arg.scalar() {
        FormulaValue::Error(e) => Err(e),
        v => Ok(v),
    }
}

pub(crate) fn table(arg: &ArgumentHandle<'_, '_>) -> Result<Vec<Vec<FormulaValue>>, ErrorKind> {
    match arg.value() {
        FormulaValue::Error(e) => Err(e),
        v => Ok(v.into_rows()),
    }
}

/// 1-based index argument; below 1 is `#VALUE!`.
fn position(arg: &ArgumentHandle<'_, '_>) -> Result<usize, ErrorKind> {
    let n = to_int(&arg.scalar())?;
    if n < 1 {
        return Err(ErrorKind::Value);
    }
    Ok(n as usize)
}

/// Optional `range_lookup` flag; defaults to approximate.
fn approximate(args: &[ArgumentHandle<'_, '_>], idx: usize) -> Result<bool, ErrorKind> {
    match args.get(idx) {
        Some(a) => to_bool(&a.scalar()),
        None => Ok(true),
    }
}

fn find(keys: &[&FormulaValue], needle: &FormulaValue, approx: bool) -> Result<usize, ErrorKind> {
    let hit = if approx {
        approximate_match(keys, needle, Ordering::Less)
    } else {
        exact_match(keys, needle)
    };
    hit.ok_or(ErrorKind::Na)
}

/* ─────────────────────────── VLOOKUP() ─────────────────────────── */

/// `VLOOKUP(needle, table, col, [approximate=TRUE])` searches the first
/// column and returns column `col` of the matching row.
#[derive(Debug)]
pub struct VLookupFn;

impl Function for VLookupFn {
    fn name(&self) -> &'static str {
        "VLOOKUP"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(4)
    }

    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::LOOKUP
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        let needle = needle(&args[0])?;
        let rows = table(&args[1])?;
        let col = position(&args[2])?;
        let approx = approximate(args, 3)?;
        if col > rows.first().map_or(0, Vec::len) {
            return Err(ErrorKind::Ref);
        }
        let keys: Vec<&FormulaValue> = rows
            .iter()
            .map(|r| r.first().unwrap_or(&FormulaValue::Null))
            .collect();
        let row = find(&keys, &needle, approx)?;
        Ok(rows[row].get(col - 1).cloned().unwrap_or(FormulaValue::Null))
    }
}

/* ─────────────────────────── HLOOKUP() ─────────────────────────── */

/// Row-wise twin of [`VLookupFn`]: searches the first row.
#[derive(Debug)]
pub struct HLookupFn;

impl Function for HLookupFn {
    fn name(&self) -> &'static str {
        "HLOOKUP"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(4)
    }

    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::LOOKUP
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        let needle = needle(&args[0])?;
        let rows = table(&args[1])?;
        let row = position(&args[2])?;
        let approx = approximate(args, 3)?;
        if row > rows.len() {
            return Err(ErrorKind::Ref);
        }
        let keys: Vec<&FormulaValue> = rows[0].iter().collect();
        let col = find(&keys, &needle, approx)?;
        Ok(rows[row - 1].get(col).cloned().unwrap_or(FormulaValue::Null))
    }
}

/* ─────────────────────────── MATCH() ─────────────────────────── */

/// `MATCH(needle, vector, [type=1])`: 1-based position. Type 1 expects
/// ascending data, -1 descending, 0 is an exact match.
#[derive(Debug)]
pub struct MatchFn;

impl Function for MatchFn {
    fn name(&self) -> &'static str {
        "MATCH"
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
        let needle = needle(&args[0])?;
        let vector = args[1].value();
        if let FormulaValue::Error(e) = vector {
            return Err(e);
        }
        let (h, w) = vector.dims();
        if h > 1 && w > 1 {
            return Err(ErrorKind::Na);
        }
        let kind = match args.get(2) {
            Some(a) => to_int(&a.scalar())?,
            None => 1,
        };
        let keys = vector.flatten();
        let hit = match kind.signum() {
            0 => exact_match(&keys, &needle),
            1 => approximate_match(&keys, &needle, Ordering::Less),
            _ => approximate_match(&keys, &needle, Ordering::Greater),
        };
        hit.map(|i| FormulaValue::Number((i + 1) as f64))
            .ok_or(ErrorKind::Na)
    }
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::{ErrorKind, FormulaValue};

    use crate::test_workbook::TestWorkbook;

    fn price_list() -> TestWorkbook {
        TestWorkbook::new()
            .with_cell("A1", 10.0)
            .with_cell("B1", "ten")
            .with_cell("A2", 20.0)
            .with_cell("B2", "twenty")
            .with_cell("A3", 30.0)
            .with_cell("B3", "thirty")
    }

    #[test]
    fn vlookup_exact_on_array_literal() {
        let wb = TestWorkbook::new();
        assert_eq!(
            wb.eval("VLOOKUP(3,{1,\"a\";2,\"b\";3,\"c\"},2,FALSE)"),
            "c".into()
        );
        assert_eq!(
            wb.eval("VLOOKUP(4,{1,\"a\";2,\"b\";3,\"c\"},2,FALSE)"),
            ErrorKind::Na.into()
        );
    }

    #[test]
    fn vlookup_modes() {
        let wb = price_list();
        assert_eq!(wb.eval("VLOOKUP(25,A1:B3,2)"), "twenty".into());
        assert_eq!(wb.eval("VLOOKUP(25,A1:B3,2,TRUE)"), "twenty".into());
        assert_eq!(wb.eval("VLOOKUP(5,A1:B3,2,TRUE)"), ErrorKind::Na.into());
        assert_eq!(wb.eval("VLOOKUP(30,A1:B3,2,FALSE)"), "thirty".into());
        assert_eq!(wb.eval("VLOOKUP(30,A1:B3,3,FALSE)"), ErrorKind::Ref.into());
        assert_eq!(wb.eval("VLOOKUP(30,A1:B3,0,FALSE)"), ErrorKind::Value.into());
        assert_eq!(wb.eval("VLOOKUP(1/0,A1:B3,2)"), ErrorKind::Div.into());
    }

    #[test]
    fn hlookup_searches_first_row() {
        let wb = TestWorkbook::new();
        assert_eq!(
            wb.eval("HLOOKUP(\"B*\",{\"alpha\",\"beta\";1,2},2,FALSE)"),
            2.0.into()
        );
        assert_eq!(
            wb.eval("HLOOKUP(\"b\",{\"a\",\"b\";1,2},3,FALSE)"),
            ErrorKind::Ref.into()
        );
    }

    #[test]
    fn match_types() {
        let wb = price_list();
        assert_eq!(wb.eval("MATCH(20,A1:A3,0)"), 2.0.into());
        assert_eq!(wb.eval("MATCH(29,A1:A3)"), 2.0.into());
        assert_eq!(wb.eval("MATCH(\"THIRTY\",B1:B3,0)"), 3.0.into());
        assert_eq!(wb.eval("MATCH(25,{30,20,10},-1)"), 1.0.into());
        assert_eq!(wb.eval("MATCH(1,A1:B3,0)"), ErrorKind::Na.into());
        assert_eq!(
            wb.eval("MATCH(99,A1:A3,0)"),
            FormulaValue::Error(ErrorKind::Na)
        );
    }
}
