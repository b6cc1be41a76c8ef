use sheetcalc_common::{ErrorKind, FormulaValue};

use super::super::utils::{collect_numbers, num, number, opt_int, opt_num, round_with, significant15};
use crate::function::FnResult;
use crate::interpreter::power as checked_power;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

/* ───────────────────────── sign / magnitude ───────────────────────── */

pub fn abs(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(num(&args[0])?.abs())
}

pub fn sign(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = num(&args[0])?;
    Ok(FormulaValue::Number(if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    }))
}

/* ──────────────────────────── rounding ──────────────────────────── */

fn away_from_zero(x: f64) -> f64 {
    if x >= 0.0 { x.ceil() } else { x.floor() }
}

pub fn round(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(round_with(num(&args[0])?, opt_int(args, 1, 0)?, f64::round))
}

pub fn roundup(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(round_with(num(&args[0])?, opt_int(args, 1, 0)?, away_from_zero))
}

pub fn rounddown(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(round_with(num(&args[0])?, opt_int(args, 1, 0)?, f64::trunc))
}

pub fn int(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(num(&args[0])?.floor())
}

pub fn trunc(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(round_with(num(&args[0])?, opt_int(args, 1, 0)?, f64::trunc))
}

/// `CEILING(n, [significance=1])`: up to the next multiple.
pub fn ceiling(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = num(&args[0])?;
    let sig = opt_num(args, 1, 1.0)?;
    if sig == 0.0 {
        return Ok(FormulaValue::Number(0.0));
    }
    if n > 0.0 && sig < 0.0 {
        return Err(ErrorKind::Num);
    }
    number(significant15(n / sig).ceil() * sig)
}

/// `FLOOR(n, [significance=1])`: down to the previous multiple.
pub fn floor(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = num(&args[0])?;
    let sig = opt_num(args, 1, 1.0)?;
    if sig == 0.0 {
        return Err(ErrorKind::Div);
    }
    if n > 0.0 && sig < 0.0 {
        return Err(ErrorKind::Num);
    }
    number(significant15(n / sig).floor() * sig)
}

pub fn even(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = num(&args[0])?;
    let m = (n.abs() / 2.0).ceil() * 2.0;
    number(if n < 0.0 { -m } else { m })
}

pub fn odd(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = num(&args[0])?;
    let mut m = n.abs().ceil();
    if m % 2.0 == 0.0 {
        m += 1.0;
    }
    number(if n < 0.0 { -m } else { m })
}

/* ──────────────────────────── division ──────────────────────────── */

/// Result takes the sign of the divisor.
pub fn r#mod(args: &[FormulaValue], _: Ctx) -> FnResult {
    let (a, b) = (num(&args[0])?, num(&args[1])?);
    if b == 0.0 {
        return Err(ErrorKind::Div);
    }
    number(a - b * (a / b).floor())
}

pub fn quotient(args: &[FormulaValue], _: Ctx) -> FnResult {
    let (a, b) = (num(&args[0])?, num(&args[1])?);
    if b == 0.0 {
        return Err(ErrorKind::Div);
    }
    number((a / b).trunc())
}

/* ─────────────────────── powers and logarithms ─────────────────────── */

pub fn power(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(checked_power(num(&args[0])?, num(&args[1])?)?)
}

pub fn sqrt(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = num(&args[0])?;
    if n < 0.0 {
        return Err(ErrorKind::Num);
    }
    number(n.sqrt())
}

pub fn exp(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(num(&args[0])?.exp())
}

pub fn ln(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = num(&args[0])?;
    if n <= 0.0 {
        return Err(ErrorKind::Num);
    }
    number(n.ln())
}

/// `LOG(n, [base=10])`.
pub fn log(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = num(&args[0])?;
    let base = opt_num(args, 1, 10.0)?;
    if n <= 0.0 || base <= 0.0 {
        return Err(ErrorKind::Num);
    }
    if base == 1.0 {
        return Err(ErrorKind::Div);
    }
    number(significant15(n.ln() / base.ln()))
}

pub fn log10(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = num(&args[0])?;
    if n <= 0.0 {
        return Err(ErrorKind::Num);
    }
    number(n.log10())
}

pub fn pi(_: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Number(std::f64::consts::PI))
}

/* ─────────────────────────── integers ─────────────────────────── */

pub fn fact(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = num(&args[0])?.trunc();
    if !(0.0..=170.0).contains(&n) {
        return Err(ErrorKind::Num);
    }
    number((1..=n as u32).map(f64::from).product())
}

fn non_negative_ints(args: &[FormulaValue]) -> Result<Vec<u64>, ErrorKind> {
    collect_numbers(args)?
        .into_iter()
        .map(|n| {
            if n < 0.0 || n >= 2f64.powi(53) {
                Err(ErrorKind::Num)
            } else {
                Ok(n.trunc() as u64)
            }
        })
        .collect()
}

fn gcd_pair(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

pub fn gcd(args: &[FormulaValue], _: Ctx) -> FnResult {
    let g = non_negative_ints(args)?.into_iter().fold(0, gcd_pair);
    Ok(FormulaValue::Number(g as f64))
}

pub fn lcm(args: &[FormulaValue], _: Ctx) -> FnResult {
    let mut acc: f64 = 1.0;
    for n in non_negative_ints(args)? {
        if n == 0 {
            return Ok(FormulaValue::Number(0.0));
        }
        let a = acc as u64;
        acc = (a / gcd_pair(a, n)) as f64 * n as f64;
        if acc >= 2f64.powi(53) {
            return Err(ErrorKind::Num);
        }
    }
    Ok(FormulaValue::Number(acc))
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::{ErrorKind, FormulaValue};

    use crate::test_workbook::TestWorkbook;

    fn n(v: f64) -> FormulaValue {
        FormulaValue::Number(v)
    }

    #[test]
    fn rounding_family() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("ROUND(2.5,0)"), n(3.0));
        assert_eq!(wb.eval("ROUND(-1.234,1)"), n(-1.2));
        assert_eq!(wb.eval("ROUNDUP(3.2,0)"), n(4.0));
        assert_eq!(wb.eval("ROUNDUP(-3.2,0)"), n(-4.0));
        assert_eq!(wb.eval("ROUNDDOWN(3.99,1)"), n(3.9));
        assert_eq!(wb.eval("INT(-2.5)"), n(-3.0));
        assert_eq!(wb.eval("TRUNC(-2.5)"), n(-2.0));
        assert_eq!(wb.eval("CEILING(4.3,2)"), n(6.0));
        assert_eq!(wb.eval("FLOOR(4.3,2)"), n(4.0));
        assert_eq!(wb.eval("FLOOR(4,0)"), ErrorKind::Div.into());
        assert_eq!(wb.eval("EVEN(3)"), n(4.0));
        assert_eq!(wb.eval("ODD(2)"), n(3.0));
        assert_eq!(wb.eval("ODD(-2)"), n(-3.0));
    }

    #[test]
    fn division_and_domains() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("MOD(-3,2)"), n(1.0));
        assert_eq!(wb.eval("MOD(3,-2)"), n(-1.0));
        assert_eq!(wb.eval("MOD(1,0)"), ErrorKind::Div.into());
        assert_eq!(wb.eval("QUOTIENT(-7,2)"), n(-3.0));
        assert_eq!(wb.eval("SQRT(-1)"), ErrorKind::Num.into());
        assert_eq!(wb.eval("LN(0)"), ErrorKind::Num.into());
        assert_eq!(wb.eval("LOG(8,2)"), n(3.0));
        assert_eq!(wb.eval("LOG(8,1)"), ErrorKind::Div.into());
        assert_eq!(wb.eval("POWER(-8,0.5)"), ErrorKind::Num.into());
        assert_eq!(wb.eval("FACT(5)"), n(120.0));
        assert_eq!(wb.eval("FACT(-1)"), ErrorKind::Num.into());
    }

    #[test]
    fn gcd_and_lcm() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("GCD(12,18,24)"), n(6.0));
        assert_eq!(wb.eval("LCM(4,6)"), n(12.0));
        assert_eq!(wb.eval("LCM(4,0)"), n(0.0));
        assert_eq!(wb.eval("GCD(-4,2)"), ErrorKind::Num.into());
    }
}
