//! Statistical functions: central tendency, dispersion, ranking, and
//! counting.

use sheetcalc_common::{ErrorKind, FormulaValue};

use super::utils::{collect_numbers, collect_numbers_a, num, numeric_cells, number, opt_int};
use crate::coercion::parse_number_text;
use crate::function::{Builtin, FnCaps, FnResult};
use crate::function_registry::FunctionRegistryBuilder;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

fn mean(nums: &[f64]) -> Result<f64, ErrorKind> {
    if nums.is_empty() {
        return Err(ErrorKind::Div);
    }
    Ok(nums.iter().sum::<f64>() / nums.len() as f64)
}

/// Sum of squared deviations over `n - ddof`.
fn variance(nums: &[f64], ddof: usize) -> Result<f64, ErrorKind> {
    if nums.len() <= ddof {
        return Err(ErrorKind::Div);
    }
    let m = mean(nums)?;
    let ss: f64 = nums.iter().map(|x| (x - m) * (x - m)).sum();
    Ok(ss / (nums.len() - ddof) as f64)
}

fn sorted(mut nums: Vec<f64>) -> Vec<f64> {
    nums.sort_by(f64::total_cmp);
    nums
}

/// Inclusive linear interpolation; `k` in `[0, 1]`.
fn percentile_inc(nums: &[f64], k: f64) -> Result<f64, ErrorKind> {
    if nums.is_empty() || !(0.0..=1.0).contains(&k) {
        return Err(ErrorKind::Num);
    }
    let rank = k * (nums.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Ok(nums[lo] + (rank - lo as f64) * (nums[hi] - nums[lo]))
}

/* ─────────────────────────── averages ─────────────────────────── */

fn average(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(mean(&collect_numbers(args)?)?)
}

fn averagea(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(mean(&collect_numbers_a(args)?)?)
}

fn median(args: &[FormulaValue], _: Ctx) -> FnResult {
    let nums = sorted(collect_numbers(args)?);
    if nums.is_empty() {
        return Err(ErrorKind::Num);
    }
    let mid = nums.len() / 2;
    if nums.len() % 2 == 0 {
        number((nums[mid - 1] + nums[mid]) / 2.0)
    } else {
        number(nums[mid])
    }
}

/// Most frequent value; ties go to the value seen first. No repeats is
/// `#N/A`.
fn mode(args: &[FormulaValue], _: Ctx) -> FnResult {
    let nums = collect_numbers(args)?;
    let mut best: Option<(f64, usize)> = None;
    for (i, x) in nums.iter().enumerate() {
        if nums[..i].contains(x) {
            continue;
        }
        let count = nums[i..].iter().filter(|y| *y == x).count();
        if count > 1 && best.is_none_or(|(_, c)| count > c) {
            best = Some((*x, count));
        }
    }
    best.map(|(x, _)| FormulaValue::Number(x)).ok_or(ErrorKind::Na)
}

/* ─────────────────────────── counting ─────────────────────────── */

/// Counts numbers. Errors are skipped, not propagated.
fn count(args: &[FormulaValue], _: Ctx) -> FnResult {
    let mut n = 0usize;
    for arg in args {
        match arg {
            FormulaValue::Array(_) => {
                n += arg
                    .flatten()
                    .iter()
                    .filter(|v| matches!(v, FormulaValue::Number(_)))
                    .count();
            }
            FormulaValue::Number(_) | FormulaValue::Boolean(_) => n += 1,
            FormulaValue::Text(s) if parse_number_text(s).is_some() => n += 1,
            _ => {}
        }
    }
    Ok(FormulaValue::Number(n as f64))
}

/// Counts non-blank values, errors included.
fn counta(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = args
        .iter()
        .flat_map(FormulaValue::flatten)
        .filter(|v| !v.is_null())
        .count();
    Ok(FormulaValue::Number(n as f64))
}

/// Blank cells and empty text.
fn countblank(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = args
        .iter()
        .flat_map(FormulaValue::flatten)
        .filter(|v| match v {
            FormulaValue::Null => true,
            FormulaValue::Text(s) => s.is_empty(),
            _ => false,
        })
        .count();
    Ok(FormulaValue::Number(n as f64))
}

/* ─────────────────────────── extremes ─────────────────────────── */

fn min(args: &[FormulaValue], _: Ctx) -> FnResult {
    let nums = collect_numbers(args)?;
    Ok(FormulaValue::Number(nums.into_iter().reduce(f64::min).unwrap_or(0.0)))
}

fn max(args: &[FormulaValue], _: Ctx) -> FnResult {
    let nums = collect_numbers(args)?;
    Ok(FormulaValue::Number(nums.into_iter().reduce(f64::max).unwrap_or(0.0)))
}

fn kth(args: &[FormulaValue], largest: bool) -> FnResult {
    let mut nums = sorted(collect_numbers(&args[..1])?);
    if largest {
        nums.reverse();
    }
    let k = num(&args[1])?.ceil();
    if k < 1.0 || k > nums.len() as f64 {
        return Err(ErrorKind::Num);
    }
    Ok(FormulaValue::Number(nums[k as usize - 1]))
}

fn large(args: &[FormulaValue], _: Ctx) -> FnResult {
    kth(args, true)
}

fn small(args: &[FormulaValue], _: Ctx) -> FnResult {
    kth(args, false)
}

/// `RANK(number, ref, [order=0])`: 0 ranks descending, non-zero ascending.
/// Ties share the best rank.
fn rank(args: &[FormulaValue], _: Ctx) -> FnResult {
    let x = num(&args[0])?;
    let nums = collect_numbers(&args[1..2])?;
    let ascending = opt_int(args, 2, 0)? != 0;
    if !nums.contains(&x) {
        return Err(ErrorKind::Na);
    }
    let ahead = nums
        .iter()
        .filter(|&&y| if ascending { y < x } else { y > x })
        .count();
    Ok(FormulaValue::Number((ahead + 1) as f64))
}

fn percentile(args: &[FormulaValue], _: Ctx) -> FnResult {
    let nums = sorted(collect_numbers(&args[..1])?);
    number(percentile_inc(&nums, num(&args[1])?)?)
}

fn quartile(args: &[FormulaValue], _: Ctx) -> FnResult {
    let nums = sorted(collect_numbers(&args[..1])?);
    let q = num(&args[1])?.trunc();
    if !(0.0..=4.0).contains(&q) {
        return Err(ErrorKind::Num);
    }
    number(percentile_inc(&nums, q / 4.0)?)
}

/* ─────────────────────────── dispersion ─────────────────────────── */

fn stdev(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(variance(&collect_numbers(args)?, 1)?.sqrt())
}

fn stdevp(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(variance(&collect_numbers(args)?, 0)?.sqrt())
}

fn var(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(variance(&collect_numbers(args)?, 1)?)
}

fn varp(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(variance(&collect_numbers(args)?, 0)?)
}

/// Pearson correlation over positions where both blocks hold numbers.
fn correl(args: &[FormulaValue], _: Ctx) -> FnResult {
    let xs = numeric_cells(&args[0])?;
    let ys = numeric_cells(&args[1])?;
    if xs.len() != ys.len() {
        return Err(ErrorKind::Na);
    }
    let pairs: Vec<(f64, f64)> = xs
        .into_iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect();
    if pairs.len() < 2 {
        return Err(ErrorKind::Div);
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
        syy += (y - my) * (y - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return Err(ErrorKind::Div);
    }
    number(sxy / (sxx * syy).sqrt())
}

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register_all(&[
        Builtin::new("AVERAGE", average).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("AVERAGEA", averagea).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("COUNT", count).caps(FnCaps::REDUCTION),
        Builtin::new("COUNTA", counta).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("COUNTBLANK", countblank).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("MIN", min).caps(FnCaps::REDUCTION),
        Builtin::new("MAX", max).caps(FnCaps::REDUCTION),
        Builtin::new("MEDIAN", median).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("MODE", mode).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("STDEV", stdev).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("STDEVP", stdevp).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("VAR", var).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("VARP", varp).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("LARGE", large).args(2),
        Builtin::new("SMALL", small).args(2),
        Builtin::new("RANK", rank).range(2, 3),
        Builtin::new("PERCENTILE", percentile).args(2),
        Builtin::new("QUARTILE", quartile).args(2),
        Builtin::new("CORREL", correl).args(2),
    ]);
}
