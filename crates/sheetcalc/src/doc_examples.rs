use crate::{FormulaValue, Workbook, WorkbookError};

/// Evaluate a formula against an empty workbook and return the scalar result.
///
/// Meant for documentation examples that would otherwise repeat the setup.
///
/// ```rust
/// # use sheetcalc::doc_examples::eval_scalar;
/// let value = eval_scalar("=SUM(1,2,3)")?;
/// assert_eq!(value, sheetcalc::FormulaValue::Number(6.0));
/// # Ok::<(), sheetcalc::WorkbookError>(())
/// ```
pub fn eval_scalar(formula: &str) -> Result<FormulaValue, WorkbookError> {
    Workbook::new().evaluate("Sheet1", formula)
}
