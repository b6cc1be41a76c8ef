use sheetcalc_common::{ErrorKind, FormulaValue};

use super::utils::boolean;
use crate::args::ArgumentHandle;
use crate::coercion::{to_bool, values_equal};
use crate::function::{Builtin, FnResult};
use crate::function_registry::FunctionRegistryBuilder;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

fn condition(arg: &ArgumentHandle<'_, '_>) -> Result<bool, ErrorKind> {
    to_bool(arg.value().first())
}

/* ─────────────────────────── IF family (lazy) ─────────────────────────── */

/// `IF(cond, [then], [else])`. Only the chosen branch is evaluated; a
/// missing else-branch yields `FALSE`.
fn r#if(args: &[ArgumentHandle<'_, '_>], _: Ctx) -> FnResult {
    if condition(&args[0])? {
        Ok(args[1].value())
    } else {
        match args.get(2) {
            Some(arg) => Ok(arg.value()),
            None => Ok(FormulaValue::Boolean(false)),
        }
    }
}

/// First value whose condition holds; none is `#N/A`.
fn ifs(args: &[ArgumentHandle<'_, '_>], _: Ctx) -> FnResult {
    if args.len() % 2 != 0 {
        return Err(ErrorKind::Value);
    }
    for pair in args.chunks(2) {
        if condition(&pair[0])? {
            return Ok(pair[1].value());
        }
    }
    Err(ErrorKind::Na)
}

fn replace_errors(
    args: &[ArgumentHandle<'_, '_>],
    catches: impl Fn(ErrorKind) -> bool,
) -> FnResult {
    let v = args[0].value().into_scalar();
    match v {
        FormulaValue::Error(e) if catches(e) => Ok(args[1].value()),
        FormulaValue::Array(rows) => {
            if !rows.iter().flatten().any(|c| c.error().is_some_and(&catches)) {
                return Ok(FormulaValue::Array(rows));
            }
            let fallback = args[1].scalar();
            Ok(FormulaValue::Array(
                rows.into_iter()
                    .map(|row| {
                        row.into_iter()
                            .map(|c| match c.error() {
                                Some(e) if catches(e) => fallback.clone(),
                                _ => c,
                            })
                            .collect()
                    })
                    .collect(),
            ))
        }
        other => Ok(other),
    }
}

fn iferror(args: &[ArgumentHandle<'_, '_>], _: Ctx) -> FnResult {
    replace_errors(args, |_| true)
}

fn ifna(args: &[ArgumentHandle<'_, '_>], _: Ctx) -> FnResult {
    replace_errors(args, |e| e == ErrorKind::Na)
}

/// `SWITCH(expr, value1, result1, ..., [default])`.
fn switch(args: &[ArgumentHandle<'_, '_>], _: Ctx) -> FnResult {
    let subject = args[0].scalar();
    if let FormulaValue::Error(e) = subject {
        return Err(e);
    }
    let cases = &args[1..];
    for pair in cases.chunks_exact(2) {
        let candidate = pair[0].scalar();
        if let FormulaValue::Error(e) = candidate {
            return Err(e);
        }
        if values_equal(&subject, &candidate) {
            return Ok(pair[1].value());
        }
    }
    match cases.chunks_exact(2).remainder() {
        [default] => Ok(default.value()),
        _ => Err(ErrorKind::Na),
    }
}

/* ─────────────────────────── boolean algebra ─────────────────────────── */

/// Truth values of every argument. Inside arrays only booleans and numbers
/// take part; typed text must spell TRUE/FALSE. No values at all is
/// `#VALUE!`.
fn truth_values(args: &[FormulaValue]) -> Result<Vec<bool>, ErrorKind> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Array(_) => {
                for v in arg.flatten() {
                    match v {
                        FormulaValue::Boolean(b) => out.push(*b),
                        FormulaValue::Number(n) => out.push(*n != 0.0),
                        FormulaValue::Error(e) => return Err(*e),
                        _ => {}
                    }
                }
            }
            FormulaValue::Null => {}
            other => out.push(boolean(other)?),
        }
    }
    if out.is_empty() {
        return Err(ErrorKind::Value);
    }
    Ok(out)
}

fn and(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Boolean(truth_values(args)?.into_iter().all(|b| b)))
}

fn or(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Boolean(truth_values(args)?.into_iter().any(|b| b)))
}

/// True when an odd number of arguments are true.
fn xor(args: &[FormulaValue], _: Ctx) -> FnResult {
    let trues = truth_values(args)?.into_iter().filter(|b| *b).count();
    Ok(FormulaValue::Boolean(trues % 2 == 1))
}

fn not(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Boolean(!boolean(&args[0])?))
}

fn r#true(_: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Boolean(true))
}

fn r#false(_: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Boolean(false))
}

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register_all(&[
        Builtin::lazy("IF", r#if).range(2, 3),
        Builtin::lazy("IFS", ifs).min(2),
        Builtin::lazy("IFERROR", iferror).args(2),
        Builtin::lazy("IFNA", ifna).args(2),
        Builtin::lazy("SWITCH", switch).min(3),
        Builtin::new("AND", and).min(1),
        Builtin::new("OR", or).min(1),
        Builtin::new("XOR", xor).min(1),
        Builtin::new("NOT", not).args(1),
        Builtin::new("TRUE", r#true).args(0),
        Builtin::new("FALSE", r#false).args(0),
    ]);
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::{ErrorKind, FormulaValue};

    use crate::test_workbook::TestWorkbook;

    #[test]
    fn if_evaluates_only_the_chosen_branch() {
        let wb = TestWorkbook::new().with_cell("A1", 5.0);
        assert_eq!(wb.eval("IF(A1>3,\"big\",1/0)"), "big".into());
        assert_eq!(wb.eval("IF(A1>9,1/0,\"small\")"), "small".into());
        assert_eq!(wb.eval("IF(A1>9,1)"), false.into());
        assert_eq!(wb.eval("IF(1/0,1,2)"), ErrorKind::Div.into());
        assert_eq!(wb.eval("IF(A1,,2)"), FormulaValue::Null);
    }

    #[test]
    fn ifs_and_switch() {
        let wb = TestWorkbook::new().with_cell("A1", 75.0);
        assert_eq!(wb.eval("IFS(A1>=90,\"A\",A1>=70,\"C\",TRUE,\"F\")"), "C".into());
        assert_eq!(wb.eval("IFS(A1>100,1)"), ErrorKind::Na.into());
        assert_eq!(wb.eval("SWITCH(2,1,\"one\",2,\"two\")"), "two".into());
        assert_eq!(wb.eval("SWITCH(\"B\",\"a\",1,\"b\",2)"), 2.0.into());
        assert_eq!(wb.eval("SWITCH(9,1,\"one\",\"other\")"), "other".into());
        assert_eq!(wb.eval("SWITCH(9,1,\"one\")"), ErrorKind::Na.into());
    }

    #[test]
    fn error_catchers() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("IFERROR(1/0,\"oops\")"), "oops".into());
        assert_eq!(wb.eval("IFERROR(4,\"oops\")"), 4.0.into());
        assert_eq!(wb.eval("IFNA(NA(),0)"), 0.0.into());
        assert_eq!(wb.eval("IFNA(1/0,0)"), ErrorKind::Div.into());
    }

    #[test]
    fn boolean_algebra() {
        let wb = TestWorkbook::new()
            .with_cell("A1", true)
            .with_cell("A2", "ignored")
            .with_cell("A3", 0.0);
        assert_eq!(wb.eval("AND(A1:A2)"), true.into());
        assert_eq!(wb.eval("AND(A1:A3)"), false.into());
        assert_eq!(wb.eval("OR(A3,FALSE)"), false.into());
        assert_eq!(wb.eval("XOR(TRUE,TRUE,TRUE)"), true.into());
        assert_eq!(wb.eval("NOT(0)"), true.into());
        assert_eq!(wb.eval("AND(\"maybe\")"), ErrorKind::Value.into());
        assert_eq!(wb.eval("AND(A2)"), ErrorKind::Value.into());
        assert_eq!(wb.eval("TRUE()"), true.into());
    }
}
