use sheetcalc_common::{ErrorKind, FormulaValue};
use smallvec::SmallVec;

use super::super::criteria::Criterion;
use super::super::utils::number;
use crate::args::ArgumentHandle;
use crate::function::{FnCaps, FnResult, Function};
use crate::traits::FunctionContext;

/*
Criteria-driven aggregation functions:
  - SUMIF(range, criteria, [sum_range])
  - SUMIFS(sum_range, criteria_range1, criteria1, ...)
  - COUNTIF(range, criteria)
  - COUNTIFS(criteria_range1, criteria1, ...)
  - AVERAGEIF(range, criteria, [average_range])
  - AVERAGEIFS(average_range, criteria_range1, criteria1, ...)
  - MAXIFS / MINIFS(range, criteria_range1, criteria1, ...)

Multi-criteria forms require every range to share the target's shape
(#VALUE! otherwise). The single-criterion forms read the target block at
the criteria block's positions, like the `sum_range` resizing rule.
*/

type Grid = Vec<Vec<FormulaValue>>;

fn values(args: &[ArgumentHandle<'_, '_>]) -> SmallVec<[FormulaValue; 4]> {
    args.iter().map(|a| a.value()).collect()
}

fn grid(v: FormulaValue) -> Grid {
    v.into_rows()
}

fn dims(g: &Grid) -> (usize, usize) {
    (g.len(), g.first().map_or(0, Vec::len))
}

/// Cells of `target` at every position where `criteria_block` satisfies
/// `criterion`.
fn select_single<'g>(
    criteria_block: &Grid,
    criterion: &Criterion,
    target: &'g Grid,
) -> Vec<&'g FormulaValue> {
    let mut out = Vec::new();
    for (i, row) in criteria_block.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            if criterion.matches(cell) {
                if let Some(v) = target.get(i).and_then(|r| r.get(j)) {
                    out.push(v);
                }
            }
        }
    }
    out
}

/// Cells of `target` where every `(range, criterion)` pair matches.
fn select_multi<'g>(
    target: &'g Grid,
    pairs: &[(Grid, Criterion)],
) -> Result<Vec<&'g FormulaValue>, ErrorKind> {
    let shape = dims(target);
    if pairs.iter().any(|(g, _)| dims(g) != shape) {
        return Err(ErrorKind::Value);
    }
    let mut out = Vec::new();
    for (i, row) in target.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            if pairs.iter().all(|(g, c)| c.matches(&g[i][j])) {
                out.push(cell);
            }
        }
    }
    Ok(out)
}

fn criteria_pairs(values: &[FormulaValue]) -> Result<Vec<(Grid, Criterion)>, ErrorKind> {
    if values.is_empty() || values.len() % 2 != 0 {
        return Err(ErrorKind::Value);
    }
    Ok(values
        .chunks(2)
        .map(|pair| (grid(pair[0].clone()), Criterion::parse(&pair[1])))
        .collect())
}

/// Numbers among the selected cells; errors in selected cells propagate.
fn selected_numbers(cells: &[&FormulaValue]) -> Result<Vec<f64>, ErrorKind> {
    let mut out = Vec::with_capacity(cells.len());
    for cell in cells {
        match cell {
            FormulaValue::Number(n) => out.push(*n),
            FormulaValue::Error(e) => return Err(*e),
            _ => {}
        }
    }
    Ok(out)
}

fn mean(nums: &[f64]) -> FnResult {
    if nums.is_empty() {
        return Err(ErrorKind::Div);
    }
    number(nums.iter().sum::<f64>() / nums.len() as f64)
}

/* ─────────────────────────── SUMIF() ──────────────────────────── */

#[derive(Debug)]
pub struct SumIfFn;

impl Function for SumIfFn {
    fn name(&self) -> &'static str {
        "SUMIF"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        let v = values(args);
        let range = grid(v[0].clone());
        let criterion = Criterion::parse(&v[1]);
        let target = v.get(2).cloned().map(grid).unwrap_or_else(|| range.clone());
        let nums = selected_numbers(&select_single(&range, &criterion, &target))?;
        number(nums.iter().sum())
    }
}

/* ─────────────────────────── SUMIFS() ─────────────────────────── */

#[derive(Debug)]
pub struct SumIfsFn;

impl Function for SumIfsFn {
    fn name(&self) -> &'static str {
        "SUMIFS"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("SUMIFS").entered();
        let v = values(args);
        let target = grid(v[0].clone());
        let pairs = criteria_pairs(&v[1..])?;
        let nums = selected_numbers(&select_multi(&target, &pairs)?)?;
        number(nums.iter().sum())
    }
}

/* ─────────────────────────── COUNTIF() ─────────────────────────── */

#[derive(Debug)]
pub struct CountIfFn;

impl Function for CountIfFn {
    fn name(&self) -> &'static str {
        "COUNTIF"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        let v = values(args);
        let range = grid(v[0].clone());
        let criterion = Criterion::parse(&v[1]);
        let count = range.iter().flatten().filter(|c| criterion.matches(c)).count();
        Ok(FormulaValue::Number(count as f64))
    }
}

/* ─────────────────────────── COUNTIFS() ─────────────────────────── */

#[derive(Debug)]
pub struct CountIfsFn;

impl Function for CountIfsFn {
    fn name(&self) -> &'static str {
        "COUNTIFS"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        let v = values(args);
        let pairs = criteria_pairs(&v)?;
        let target = pairs[0].0.clone();
        let count = select_multi(&target, &pairs)?.len();
        Ok(FormulaValue::Number(count as f64))
    }
}

/* ─────────────────────────── AVERAGEIF() ─────────────────────────── */

#[derive(Debug)]
pub struct AverageIfFn;

impl Function for AverageIfFn {
    fn name(&self) -> &'static str {
        "AVERAGEIF"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        let v = values(args);
        let range = grid(v[0].clone());
        let criterion = Criterion::parse(&v[1]);
        let target = v.get(2).cloned().map(grid).unwrap_or_else(|| range.clone());
        mean(&selected_numbers(&select_single(&range, &criterion, &target))?)
    }
}

/* ─────────────────────────── AVERAGEIFS() ─────────────────────────── */

#[derive(Debug)]
pub struct AverageIfsFn;

impl Function for AverageIfsFn {
    fn name(&self) -> &'static str {
        "AVERAGEIFS"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        let v = values(args);
        let target = grid(v[0].clone());
        let pairs = criteria_pairs(&v[1..])?;
        mean(&selected_numbers(&select_multi(&target, &pairs)?)?)
    }
}

/* ─────────────────────────── MAXIFS() / MINIFS() ─────────────────────────── */

fn extreme_ifs(args: &[ArgumentHandle<'_, '_>], pick: fn(f64, f64) -> f64) -> FnResult {
    let v = values(args);
    let target = grid(v[0].clone());
    let pairs = criteria_pairs(&v[1..])?;
    let nums = selected_numbers(&select_multi(&target, &pairs)?)?;
    Ok(FormulaValue::Number(
        nums.into_iter().reduce(pick).unwrap_or(0.0),
    ))
}

#[derive(Debug)]
pub struct MaxIfsFn;

impl Function for MaxIfsFn {
    fn name(&self) -> &'static str {
        "MAXIFS"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        extreme_ifs(args, f64::max)
    }
}

#[derive(Debug)]
pub struct MinIfsFn;

impl Function for MinIfsFn {
    fn name(&self) -> &'static str {
        "MINIFS"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        extreme_ifs(args, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::{ErrorKind, FormulaValue};

    use crate::test_workbook::TestWorkbook;

    fn fruit() -> TestWorkbook {
        TestWorkbook::new()
            .with_cell("A1", "apple")
            .with_cell("A2", "banana")
            .with_cell("A3", "Apple")
            .with_cell("A4", "cherry")
            .with_cell("B1", 3.0)
            .with_cell("B2", 5.0)
            .with_cell("B3", 4.0)
            .with_cell("B4", 10.0)
            .with_cell("C1", "x")
            .with_cell("C2", "y")
            .with_cell("C3", "y")
            .with_cell("C4", "x")
    }

    #[test]
    fn sumif_case_insensitive_text() {
        let wb = fruit();
        assert_eq!(wb.eval("SUMIF(A1:A4,\"apple\",B1:B4)"), 7.0.into());
        assert_eq!(wb.eval("SUMIF(B1:B4,\">4\")"), 15.0.into());
        assert_eq!(wb.eval("SUMIF(A1:A4,\"*an*\",B1:B4)"), 5.0.into());
    }

    #[test]
    fn counting() {
        let wb = fruit();
        assert_eq!(wb.eval("COUNTIF(A1:A4,\"a*\")"), 2.0.into());
        assert_eq!(wb.eval("COUNTIF(B1:B4,\"<>5\")"), 3.0.into());
        assert_eq!(wb.eval("COUNTIFS(A1:A4,\"apple\",C1:C4,\"y\")"), 1.0.into());
        assert_eq!(
            wb.eval("COUNTIFS(A1:A4,\"apple\",C1:C3,\"y\")"),
            ErrorKind::Value.into()
        );
    }

    #[test]
    fn multi_criteria_aggregates() {
        let wb = fruit();
        assert_eq!(wb.eval("SUMIFS(B1:B4,C1:C4,\"x\",B1:B4,\">5\")"), 10.0.into());
        assert_eq!(wb.eval("AVERAGEIFS(B1:B4,C1:C4,\"y\")"), 4.5.into());
        assert_eq!(wb.eval("MAXIFS(B1:B4,C1:C4,\"x\")"), 10.0.into());
        assert_eq!(wb.eval("MINIFS(B1:B4,C1:C4,\"x\")"), 3.0.into());
        assert_eq!(wb.eval("MINIFS(B1:B4,C1:C4,\"z\")"), 0.0.into());
    }

    #[test]
    fn averageif_without_matches_divides_by_zero() {
        let wb = fruit();
        assert_eq!(wb.eval("AVERAGEIF(A1:A4,\"kiwi\",B1:B4)"), ErrorKind::Div.into());
        assert_eq!(wb.eval("AVERAGEIF(A1:A4,\"apple\",B1:B4)"), 3.5.into());
    }

    #[test]
    fn errors_in_selected_cells_propagate() {
        let wb = fruit().with_cell("B3", FormulaValue::Error(ErrorKind::Na));
        assert_eq!(wb.eval("SUMIF(A1:A4,\"apple\",B1:B4)"), ErrorKind::Na.into());
        assert_eq!(wb.eval("SUMIF(A1:A4,\"banana\",B1:B4)"), 5.0.into());
    }
}
