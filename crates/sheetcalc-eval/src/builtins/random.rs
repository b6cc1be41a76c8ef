use sheetcalc_common::{ErrorKind, FormulaValue};

use super::utils::num;
use crate::function::{Builtin, FnResult};
use crate::function_registry::FunctionRegistryBuilder;
use crate::traits::FunctionContext;

/// Uniform in `[0, 1)`, drawn from the evaluation's seeded generator.
fn rand(_: &[FormulaValue], ctx: &dyn FunctionContext) -> FnResult {
    Ok(FormulaValue::Number(ctx.random()))
}

/// Integer in `[ceil(lo), floor(hi)]`.
fn randbetween(args: &[FormulaValue], ctx: &dyn FunctionContext) -> FnResult {
    let lo = num(&args[0])?.ceil();
    let hi = num(&args[1])?.floor();
    if lo > hi {
        return Err(ErrorKind::Num);
    }
    let span = hi - lo + 1.0;
    Ok(FormulaValue::Number(lo + (ctx.random() * span).floor().min(span - 1.0)))
}

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register_all(&[
        Builtin::new("RAND", rand).args(0).volatile(),
        Builtin::new("RANDBETWEEN", randbetween).args(2).volatile(),
    ]);
}
