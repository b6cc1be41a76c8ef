use sheetcalc_common::{ErrorKind, FormulaValue};

use super::super::utils::{opt_bool, text};
use crate::coercion::parse_number_text;
use crate::function::FnResult;
use crate::traits::FunctionContext;

/// `SPLIT(text, delimiter, [split_by_each=TRUE], [remove_empty=TRUE])` as a
/// single row. Numeric pieces become numbers.
pub fn split(args: &[FormulaValue], _: &dyn FunctionContext) -> FnResult {
    let s = text(&args[0])?;
    let delim = text(&args[1])?;
    if s.is_empty() || delim.is_empty() {
        return Err(ErrorKind::Value);
    }
    let by_each = opt_bool(args, 2, true)?;
    let remove_empty = opt_bool(args, 3, true)?;

    let pieces: Vec<&str> = if by_each {
        s.split(|c| delim.contains(c)).collect()
    } else {
        s.split(delim.as_str()).collect()
    };
    let row: Vec<FormulaValue> = pieces
        .into_iter()
        .filter(|p| !(remove_empty && p.is_empty()))
        .map(|p| match parse_number_text(p) {
            Some(n) => FormulaValue::Number(n),
            None => FormulaValue::text(p),
        })
        .collect();
    if row.is_empty() {
        return Err(ErrorKind::Value);
    }
    Ok(FormulaValue::Array(vec![row]))
}
