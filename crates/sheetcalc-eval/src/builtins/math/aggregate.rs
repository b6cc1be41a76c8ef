use sheetcalc_common::{ErrorKind, FormulaValue};

use super::super::utils::{collect_numbers, number};
use crate::function::FnResult;
use crate::traits::FunctionContext;

/* ─────────────────────────── SUM() ──────────────────────────── */

/// Adds numbers across scalars and ranges. Text and logicals inside ranges
/// are ignored; typed text is coerced.
pub fn sum(args: &[FormulaValue], _: &dyn FunctionContext) -> FnResult {
    number(collect_numbers(args)?.iter().sum())
}

/* ───────────────────────── PRODUCT() ────────────────────────── */

/// Product of the collected numbers; no numbers at all gives 0.
pub fn product(args: &[FormulaValue], _: &dyn FunctionContext) -> FnResult {
    let nums = collect_numbers(args)?;
    if nums.is_empty() {
        return Ok(FormulaValue::Number(0.0));
    }
    number(nums.iter().product())
}

/* ────────────────────────── SUMSQ() ─────────────────────────── */

pub fn sumsq(args: &[FormulaValue], _: &dyn FunctionContext) -> FnResult {
    number(collect_numbers(args)?.iter().map(|n| n * n).sum())
}

/* ─────────────────────── SUMPRODUCT() ───────────────────────── */

/// Element-wise product of equally shaped blocks, summed. Non-numeric
/// entries count as 0; errors propagate.
pub fn sumproduct(args: &[FormulaValue], _: &dyn FunctionContext) -> FnResult {
    let dims = args[0].dims();
    if args.iter().any(|a| a.dims() != dims) {
        return Err(ErrorKind::Value);
    }
    let flat: Vec<Vec<&FormulaValue>> = args.iter().map(FormulaValue::flatten).collect();
    let mut total = 0.0;
    for i in 0..flat[0].len() {
        let mut p = 1.0;
        for column in &flat {
            p *= match column[i] {
                FormulaValue::Number(n) => *n,
                FormulaValue::Error(e) => return Err(*e),
                _ => 0.0,
            };
        }
        total += p;
    }
    number(total)
}
