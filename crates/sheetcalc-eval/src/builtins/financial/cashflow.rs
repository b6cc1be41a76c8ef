use sheetcalc_common::{ErrorKind, FormulaValue};

use super::newton;
use super::super::utils::{collect_numbers, num, number, opt_num};
use crate::function::FnResult;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

/// `NPV(rate, v1, ...)`: the first value is discounted one full period.
pub fn npv(args: &[FormulaValue], _: Ctx) -> FnResult {
    let rate = num(&args[0])?;
    if rate == -1.0 {
        return Err(ErrorKind::Div);
    }
    let flows = collect_numbers(&args[1..])?;
    number(
        flows
            .iter()
            .enumerate()
            .map(|(i, v)| v / (1.0 + rate).powi(i as i32 + 1))
            .sum(),
    )
}

/// `IRR(values, [guess=0.1])`. Needs at least one inflow and one outflow.
pub fn irr(args: &[FormulaValue], _: Ctx) -> FnResult {
    let flows = collect_numbers(&args[..1])?;
    let guess = opt_num(args, 1, 0.1)?;
    if !flows.iter().any(|v| *v > 0.0) || !flows.iter().any(|v| *v < 0.0) {
        return Err(ErrorKind::Num);
    }
    let rate = newton(guess, |r| {
        let mut value = 0.0;
        let mut slope = 0.0;
        for (i, v) in flows.iter().enumerate() {
            let i = i as i32;
            value += v / (1.0 + r).powi(i);
            slope -= f64::from(i) * v / (1.0 + r).powi(i + 1);
        }
        (value, slope)
    })?;
    Ok(FormulaValue::Number(rate))
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::ErrorKind;

    use super::super::test_support::assert_close;
    use crate::test_workbook::TestWorkbook;

    fn flows() -> TestWorkbook {
        TestWorkbook::new()
            .with_cell("A1", -70_000.0)
            .with_cell("A2", 12_000.0)
            .with_cell("A3", 15_000.0)
            .with_cell("A4", 18_000.0)
            .with_cell("A5", 21_000.0)
            .with_cell("A6", 26_000.0)
    }

    #[test]
    fn net_present_value() {
        let wb = TestWorkbook::new();
        assert_close(wb.eval("NPV(0.1,-10000,3000,4200,6800)"), 1188.44, 0.01);
        assert_eq!(wb.eval("NPV(-1,100)"), ErrorKind::Div.into());
    }

    #[test]
    fn internal_rate_of_return() {
        let wb = flows();
        assert_close(wb.eval("IRR(A1:A6)"), 0.086631, 1e-6);
        assert_close(wb.eval("IRR(A1:A5)"), -0.021245, 1e-6);
        assert_eq!(wb.eval("IRR(A2:A6)"), ErrorKind::Num.into());
    }
}
