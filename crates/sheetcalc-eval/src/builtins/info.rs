//! `IS*` predicates and value introspection. These inspect errors rather
//! than forwarding them.

use sheetcalc_common::{ErrorKind, FormulaValue};

use super::utils::{num, scalar};
use crate::function::{Builtin, FnResult};
use crate::function_registry::FunctionRegistryBuilder;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

fn predicate(args: &[FormulaValue], test: impl Fn(&FormulaValue) -> bool) -> FnResult {
    Ok(FormulaValue::Boolean(test(scalar(&args[0]))))
}

fn isblank(args: &[FormulaValue], _: Ctx) -> FnResult {
    predicate(args, FormulaValue::is_null)
}

fn isnumber(args: &[FormulaValue], _: Ctx) -> FnResult {
    predicate(args, |v| matches!(v, FormulaValue::Number(_)))
}

fn istext(args: &[FormulaValue], _: Ctx) -> FnResult {
    predicate(args, |v| matches!(v, FormulaValue::Text(_)))
}

fn islogical(args: &[FormulaValue], _: Ctx) -> FnResult {
    predicate(args, |v| matches!(v, FormulaValue::Boolean(_)))
}

fn iserror(args: &[FormulaValue], _: Ctx) -> FnResult {
    predicate(args, FormulaValue::is_error)
}

/// Any error except `#N/A`.
fn iserr(args: &[FormulaValue], _: Ctx) -> FnResult {
    predicate(args, |v| v.error().is_some_and(|e| e != ErrorKind::Na))
}

fn isna(args: &[FormulaValue], _: Ctx) -> FnResult {
    predicate(args, |v| v.error() == Some(ErrorKind::Na))
}

fn parity(args: &[FormulaValue]) -> Result<i64, ErrorKind> {
    let v = scalar(&args[0]);
    if matches!(v, FormulaValue::Boolean(_)) {
        return Err(ErrorKind::Value);
    }
    Ok((num(v)?.trunc() as i64).rem_euclid(2))
}

fn iseven(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Boolean(parity(args)? == 0))
}

fn isodd(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Boolean(parity(args)? == 1))
}

fn na(_: &[FormulaValue], _: Ctx) -> FnResult {
    Err(ErrorKind::Na)
}

/// Numbers pass, booleans become 1/0, errors propagate, anything else is 0.
fn n(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Number(match scalar(&args[0]) {
        FormulaValue::Number(n) => *n,
        FormulaValue::Boolean(b) => f64::from(u8::from(*b)),
        FormulaValue::Error(e) => return Err(*e),
        _ => 0.0,
    }))
}

/// 1 number (and blank), 2 text, 4 boolean, 16 error, 64 array.
fn r#type(args: &[FormulaValue], _: Ctx) -> FnResult {
    let v = &args[0];
    let code = if v.is_array() && v.dims() != (1, 1) {
        64.0
    } else {
        match v.first() {
            FormulaValue::Number(_) | FormulaValue::Null => 1.0,
            FormulaValue::Text(_) => 2.0,
            FormulaValue::Boolean(_) => 4.0,
            FormulaValue::Error(_) => 16.0,
            FormulaValue::Array(_) => 64.0,
        }
    };
    Ok(FormulaValue::Number(code))
}

/// Numeric code of an error; non-errors are `#N/A`.
fn error_type(args: &[FormulaValue], _: Ctx) -> FnResult {
    match scalar(&args[0]).error() {
        Some(e) => Ok(FormulaValue::Number(f64::from(e.type_code()))),
        None => Err(ErrorKind::Na),
    }
}

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register_all(&[
        Builtin::new("ISBLANK", isblank).args(1),
        Builtin::new("ISNUMBER", isnumber).args(1),
        Builtin::new("ISTEXT", istext).args(1),
        Builtin::new("ISLOGICAL", islogical).args(1),
        Builtin::new("ISERROR", iserror).args(1),
        Builtin::new("ISERR", iserr).args(1),
        Builtin::new("ISNA", isna).args(1),
        Builtin::new("ISEVEN", iseven).args(1),
        Builtin::new("ISODD", isodd).args(1),
        Builtin::new("NA", na).args(0),
        Builtin::new("N", n).args(1),
        Builtin::new("TYPE", r#type).args(1),
        Builtin::new("ERROR.TYPE", error_type).args(1),
    ]);
}
