//! `REGEX*` text functions over the `regex` crate's syntax.

use regex::Regex;
use sheetcalc_common::{ErrorKind, FormulaValue};

use super::utils::text;
use crate::function::{Builtin, FnResult};
use crate::function_registry::FunctionRegistryBuilder;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

fn pattern(v: &FormulaValue) -> Result<Regex, ErrorKind> {
    Regex::new(&text(v)?).map_err(|_| ErrorKind::Value)
}

fn regexmatch(args: &[FormulaValue], _: Ctx) -> FnResult {
    let s = text(&args[0])?;
    Ok(FormulaValue::Boolean(pattern(&args[1])?.is_match(&s)))
}

/// First match. With one capture group that group is returned; with
/// several, the groups fill a single row. No match is `#N/A`.
fn regexextract(args: &[FormulaValue], _: Ctx) -> FnResult {
    let s = text(&args[0])?;
    let re = pattern(&args[1])?;
    let caps = re.captures(&s).ok_or(ErrorKind::Na)?;
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    Ok(match caps.len() {
        1 => FormulaValue::text(group(0)),
        2 => FormulaValue::text(group(1)),
        n => FormulaValue::Array(vec![(1..n).map(|i| FormulaValue::text(group(i))).collect()]),
    })
}

/// Replace every match; `$1`/`${name}` refer to capture groups.
fn regexreplace(args: &[FormulaValue], _: Ctx) -> FnResult {
    let s = text(&args[0])?;
    let re = pattern(&args[1])?;
    let replacement = text(&args[2])?;
    Ok(FormulaValue::Text(
        re.replace_all(&s, replacement.as_str()).into_owned(),
    ))
}

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register_all(&[
        Builtin::new("REGEXMATCH", regexmatch).args(2),
        Builtin::new("REGEXEXTRACT", regexextract).args(2),
        Builtin::new("REGEXREPLACE", regexreplace).args(3),
    ]);
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::{ErrorKind, FormulaValue};

    use crate::test_workbook::TestWorkbook;

    #[test]
    fn match_extract_replace() {
        let wb = TestWorkbook::new().with_cell("A1", "order-1234 shipped");
        assert_eq!(wb.eval("REGEXMATCH(A1,\"\\d{4}\")"), true.into());
        assert_eq!(wb.eval("REGEXMATCH(A1,\"^\\d\")"), false.into());
        assert_eq!(wb.eval("REGEXEXTRACT(A1,\"\\d+\")"), "1234".into());
        assert_eq!(wb.eval("REGEXEXTRACT(A1,\"order-(\\d+)\")"), "1234".into());
        assert_eq!(
            wb.eval("REGEXEXTRACT(A1,\"(\\w+)-(\\d+)\")"),
            FormulaValue::Array(vec![vec!["order".into(), "1234".into()]])
        );
        assert_eq!(wb.eval("REGEXEXTRACT(A1,\"zzz\")"), ErrorKind::Na.into());
        assert_eq!(
            wb.eval("REGEXREPLACE(A1,\"(\\d+)\",\"#$1\")"),
            "order-#1234 shipped".into()
        );
    }

    #[test]
    fn invalid_pattern_is_value_error() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("REGEXMATCH(\"a\",\"(\")"), ErrorKind::Value.into());
        assert_eq!(wb.eval("REGEXREPLACE(\"a\",\"[\",\"b\")"), ErrorKind::Value.into());
    }
}
