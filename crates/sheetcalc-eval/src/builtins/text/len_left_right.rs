use sheetcalc_common::{ErrorKind, FormulaValue};

use super::super::utils::{opt_int, text};
use crate::function::FnResult;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

/// Character count (not bytes).
pub fn len(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Number(text(&args[0])?.chars().count() as f64))
}

fn count_arg(args: &[FormulaValue]) -> Result<usize, ErrorKind> {
    let n = opt_int(args, 1, 1)?;
    if n < 0 {
        return Err(ErrorKind::Value);
    }
    Ok(n as usize)
}

/// `LEFT(text, [n=1])`; `n = 0` is the empty string.
pub fn left(args: &[FormulaValue], _: Ctx) -> FnResult {
    let s = text(&args[0])?;
    let n = count_arg(args)?;
    Ok(FormulaValue::Text(s.chars().take(n).collect()))
}

pub fn right(args: &[FormulaValue], _: Ctx) -> FnResult {
    let s = text(&args[0])?;
    let n = count_arg(args)?;
    let total = s.chars().count();
    Ok(FormulaValue::Text(s.chars().skip(total.saturating_sub(n)).collect()))
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::ErrorKind;

    use crate::test_workbook::TestWorkbook;

    #[test]
    fn left_right_len() {
        let wb = TestWorkbook::new().with_cell("A1", "hello");
        assert_eq!(wb.eval("LEFT(\"hello\",0)"), "".into());
        assert_eq!(wb.eval("LEFT(A1)"), "h".into());
        assert_eq!(wb.eval("LEFT(A1,99)"), "hello".into());
        assert_eq!(wb.eval("RIGHT(A1,3)"), "llo".into());
        assert_eq!(wb.eval("LEFT(A1,-1)"), ErrorKind::Value.into());
        assert_eq!(wb.eval("LEN(A1)"), 5.0.into());
        assert_eq!(wb.eval("LEN(\"héllo\")"), 5.0.into());
        assert_eq!(wb.eval("LEN(12.5)"), 4.0.into());
        assert_eq!(wb.eval("LEN(B9)"), 0.0.into());
    }
}
