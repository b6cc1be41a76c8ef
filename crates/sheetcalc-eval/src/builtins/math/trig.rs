use sheetcalc_common::{ErrorKind, FormulaValue};

use super::super::utils::{EPSILON_NEAR_ZERO, num, number};
use crate::function::FnResult;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

pub fn sin(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(num(&args[0])?.sin())
}

pub fn cos(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(num(&args[0])?.cos())
}

/// Poles (`cos x ≈ 0`) are `#DIV/0!`.
pub fn tan(args: &[FormulaValue], _: Ctx) -> FnResult {
    let x = num(&args[0])?;
    if x.cos().abs() < EPSILON_NEAR_ZERO {
        return Err(ErrorKind::Div);
    }
    number(x.tan())
}

pub fn asin(args: &[FormulaValue], _: Ctx) -> FnResult {
    let x = num(&args[0])?;
    if !(-1.0..=1.0).contains(&x) {
        return Err(ErrorKind::Num);
    }
    number(x.asin())
}

pub fn acos(args: &[FormulaValue], _: Ctx) -> FnResult {
    let x = num(&args[0])?;
    if !(-1.0..=1.0).contains(&x) {
        return Err(ErrorKind::Num);
    }
    number(x.acos())
}

pub fn atan(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(num(&args[0])?.atan())
}

/// `ATAN2(x, y)`: note the spreadsheet argument order.
pub fn atan2(args: &[FormulaValue], _: Ctx) -> FnResult {
    let (x, y) = (num(&args[0])?, num(&args[1])?);
    if x == 0.0 && y == 0.0 {
        return Err(ErrorKind::Div);
    }
    number(y.atan2(x))
}

pub fn degrees(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(num(&args[0])?.to_degrees())
}

pub fn radians(args: &[FormulaValue], _: Ctx) -> FnResult {
    number(num(&args[0])?.to_radians())
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::{ErrorKind, FormulaValue};

    use crate::test_workbook::TestWorkbook;

    fn approx(v: FormulaValue, expected: f64) {
        match v {
            FormulaValue::Number(n) => assert!((n - expected).abs() < 1e-12, "{n} != {expected}"),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn trig_basics() {
        let wb = TestWorkbook::new();
        approx(wb.eval("SIN(PI()/2)"), 1.0);
        approx(wb.eval("COS(0)"), 1.0);
        approx(wb.eval("DEGREES(PI())"), 180.0);
        approx(wb.eval("RADIANS(180)"), std::f64::consts::PI);
        approx(wb.eval("ATAN2(1,1)"), std::f64::consts::FRAC_PI_4);
        assert_eq!(wb.eval("ATAN2(0,0)"), ErrorKind::Div.into());
        assert_eq!(wb.eval("ASIN(2)"), ErrorKind::Num.into());
    }
}
