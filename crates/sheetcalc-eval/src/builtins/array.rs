//! Array-returning functions: results keep their shape; a 1×1 result
//! degrades to a scalar at the call site.

use std::mem::discriminant;

use sheetcalc_common::{ErrorKind, FormulaValue};

use super::utils::{boolean, int, opt_bool, opt_int, opt_num};
use crate::coercion::{compare_values, values_equal};
use crate::function::{Builtin, FnCaps, FnResult};
use crate::function_registry::FunctionRegistryBuilder;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;
type Grid = Vec<Vec<FormulaValue>>;

fn block(v: &FormulaValue) -> Result<Grid, ErrorKind> {
    match v {
        FormulaValue::Error(e) => Err(*e),
        other => Ok(other.clone().into_rows()),
    }
}

fn transpose_grid(rows: Grid) -> Grid {
    let width = rows.first().map_or(0, Vec::len);
    let mut cols: Grid = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();
    for row in rows {
        for (c, cell) in row.into_iter().enumerate() {
            if let Some(col) = cols.get_mut(c) {
                col.push(cell);
            }
        }
    }
    cols
}

/* ─────────────────────────── SORT() ─────────────────────────── */

/// `SORT(array, [index=1], [order=1], [by_col=FALSE])`. Stable; order -1 is
/// descending.
fn sort(args: &[FormulaValue], _: Ctx) -> FnResult {
    let rows = block(&args[0])?;
    let index = opt_int(args, 1, 1)?;
    let descending = match opt_int(args, 2, 1)? {
        1 => false,
        -1 => true,
        _ => return Err(ErrorKind::Value),
    };
    let by_col = opt_bool(args, 3, false)?;

    let mut lines = if by_col { transpose_grid(rows) } else { rows };
    let width = lines.first().map_or(0, Vec::len);
    if index < 1 || index as usize > width {
        return Err(ErrorKind::Value);
    }
    let key = index as usize - 1;
    lines.sort_by(|a, b| {
        let ord = compare_values(&a[key], &b[key]);
        if descending { ord.reverse() } else { ord }
    });
    Ok(FormulaValue::Array(if by_col {
        transpose_grid(lines)
    } else {
        lines
    }))
}

/* ─────────────────────────── FILTER() ─────────────────────────── */

/// `FILTER(array, include, [if_empty])`. `include` is a column matching the
/// array's height (keeps rows) or a row matching its width (keeps
/// columns). Nothing kept and no fallback is `#N/A`.
fn filter(args: &[FormulaValue], _: Ctx) -> FnResult {
    let rows = block(&args[0])?;
    let include = &args[1];
    let (h, w) = (rows.len(), rows.first().map_or(0, Vec::len));
    let (ih, iw) = include.dims();

    let flags: Vec<bool> = include
        .flatten()
        .into_iter()
        .map(boolean)
        .collect::<Result<_, _>>()?;

    let kept: Grid = if iw == 1 && ih == h {
        rows.into_iter()
            .zip(&flags)
            .filter_map(|(row, keep)| keep.then_some(row))
            .collect()
    } else if ih == 1 && iw == w {
        let cols: Grid = transpose_grid(rows)
            .into_iter()
            .zip(&flags)
            .filter_map(|(col, keep)| keep.then_some(col))
            .collect();
        if cols.is_empty() { Vec::new() } else { transpose_grid(cols) }
    } else {
        return Err(ErrorKind::Value);
    };

    if kept.is_empty() {
        return match args.get(2) {
            Some(fallback) => Ok(fallback.clone()),
            None => Err(ErrorKind::Na),
        };
    }
    Ok(FormulaValue::Array(kept))
}

/* ─────────────────────────── UNIQUE() ─────────────────────────── */

fn same_line(a: &[FormulaValue], b: &[FormulaValue]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| discriminant(x) == discriminant(y) && values_equal(x, y))
}

/// `UNIQUE(array, [by_col=FALSE], [exactly_once=FALSE])`, first-seen order,
/// text compared case-insensitively.
fn unique(args: &[FormulaValue], _: Ctx) -> FnResult {
    let rows = block(&args[0])?;
    let by_col = opt_bool(args, 1, false)?;
    let exactly_once = opt_bool(args, 2, false)?;
    let lines = if by_col { transpose_grid(rows) } else { rows };

    let mut seen: Vec<(Vec<FormulaValue>, usize)> = Vec::new();
    for line in lines {
        match seen.iter_mut().find(|(l, _)| same_line(l, &line)) {
            Some((_, count)) => *count += 1,
            None => seen.push((line, 1)),
        }
    }
    let out: Grid = seen
        .into_iter()
        .filter(|(_, count)| !exactly_once || *count == 1)
        .map(|(line, _)| line)
        .collect();
    if out.is_empty() {
        return Err(ErrorKind::Na);
    }
    Ok(FormulaValue::Array(if by_col { transpose_grid(out) } else { out }))
}

/* ─────────────────────────── TRANSPOSE() / SEQUENCE() ─────────────────────────── */

fn transpose(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Array(transpose_grid(block(&args[0])?)))
}

/// `SEQUENCE(rows, [cols=1], [start=1], [step=1])`, filled row by row.
fn sequence(args: &[FormulaValue], ctx: Ctx) -> FnResult {
    let rows = int(&args[0])?;
    let cols = opt_int(args, 1, 1)?;
    let start = opt_num(args, 2, 1.0)?;
    let step = opt_num(args, 3, 1.0)?;
    if rows < 1 || cols < 1 {
        return Err(ErrorKind::Value);
    }
    if rows.saturating_mul(cols) as u64 > ctx.config().max_range_cells as u64 {
        return Err(ErrorKind::Num);
    }
    let (rows, cols) = (rows as usize, cols as usize);
    Ok(FormulaValue::Array(
        (0..rows)
            .map(|r| {
                (0..cols)
                    .map(|c| FormulaValue::Number(start + step * (r * cols + c) as f64))
                    .collect()
            })
            .collect(),
    ))
}

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register_all(&[
        Builtin::new("SORT", sort).range(1, 4).caps(FnCaps::ARRAY_RESULT),
        Builtin::new("FILTER", filter).range(2, 3).caps(FnCaps::ARRAY_RESULT),
        Builtin::new("UNIQUE", unique).range(1, 3).caps(FnCaps::ARRAY_RESULT),
        Builtin::new("TRANSPOSE", transpose).args(1).caps(FnCaps::ARRAY_RESULT),
        Builtin::new("SEQUENCE", sequence).range(1, 4).caps(FnCaps::ARRAY_RESULT),
    ]);
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::{ErrorKind, FormulaValue};

    use crate::test_workbook::TestWorkbook;

    fn col(vals: Vec<FormulaValue>) -> FormulaValue {
        FormulaValue::Array(vals.into_iter().map(|v| vec![v]).collect())
    }

    fn people() -> TestWorkbook {
        TestWorkbook::new()
            .with_cell("A1", "cara")
            .with_cell("B1", 31.0)
            .with_cell("A2", "abe")
            .with_cell("B2", 45.0)
            .with_cell("A3", "bo")
            .with_cell("B3", 22.0)
    }

    #[test]
    fn sort_rows_by_key() {
        let wb = people();
        assert_eq!(
            wb.eval("SORT(A1:A3)"),
            col(vec!["abe".into(), "bo".into(), "cara".into()])
        );
        assert_eq!(
            wb.eval("SORT(A1:B3,2,-1)"),
            FormulaValue::Array(vec![
                vec!["abe".into(), 45.0.into()],
                vec!["cara".into(), 31.0.into()],
                vec!["bo".into(), 22.0.into()],
            ])
        );
        assert_eq!(
            wb.eval("SORT({3,1,2},1,1,TRUE)"),
            FormulaValue::Array(vec![vec![1.0.into(), 2.0.into(), 3.0.into()]])
        );
        assert_eq!(wb.eval("SORT(A1:B3,3)"), ErrorKind::Value.into());
        assert_eq!(wb.eval("SORT(A1:B3,1,0)"), ErrorKind::Value.into());
    }

    #[test]
    fn filter_rows_and_fallback() {
        let wb = people();
        assert_eq!(
            wb.eval("FILTER(A1:A3,B1:B3>30)"),
            col(vec!["cara".into(), "abe".into()])
        );
        assert_eq!(wb.eval("FILTER(A1:A3,B1:B3>99,\"none\")"), "none".into());
        assert_eq!(wb.eval("FILTER(A1:A3,B1:B3>99)"), ErrorKind::Na.into());
        assert_eq!(wb.eval("FILTER(A1:A3,B1:B2>0)"), ErrorKind::Value.into());
        assert_eq!(
            wb.eval("FILTER({1,2,3},{TRUE,FALSE,TRUE})"),
            FormulaValue::Array(vec![vec![1.0.into(), 3.0.into()]])
        );
    }

    #[test]
    fn unique_keeps_first_seen() {
        let wb = TestWorkbook::new();
        assert_eq!(
            wb.eval("UNIQUE({1;2;1;\"a\";\"A\"})"),
            col(vec![1.0.into(), 2.0.into(), "a".into()])
        );
        assert_eq!(
            wb.eval("UNIQUE({1;2;1;3},FALSE,TRUE)"),
            col(vec![2.0.into(), 3.0.into()])
        );
    }

    #[test]
    fn transpose_and_sequence() {
        let wb = TestWorkbook::new();
        assert_eq!(
            wb.eval("TRANSPOSE({1,2,3})"),
            col(vec![1.0.into(), 2.0.into(), 3.0.into()])
        );
        assert_eq!(
            wb.eval("SEQUENCE(2,3)"),
            FormulaValue::Array(vec![
                vec![1.0.into(), 2.0.into(), 3.0.into()],
                vec![4.0.into(), 5.0.into(), 6.0.into()],
            ])
        );
        assert_eq!(
            wb.eval("SEQUENCE(3,1,10,-2)"),
            col(vec![10.0.into(), 8.0.into(), 6.0.into()])
        );
        assert_eq!(wb.eval("SEQUENCE(0)"), ErrorKind::Value.into());
    }
}
