mod aggregate;
mod criteria_aggregates;
mod numeric;
mod trig;

pub use criteria_aggregates::{
    AverageIfFn, AverageIfsFn, CountIfFn, CountIfsFn, MaxIfsFn, MinIfsFn, SumIfFn, SumIfsFn,
};

use std::sync::Arc;

use crate::function::{Builtin, FnCaps};
use crate::function_registry::FunctionRegistryBuilder;

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register_all(&[
        Builtin::new("SUM", aggregate::sum).caps(FnCaps::REDUCTION),
        Builtin::new("PRODUCT", aggregate::product).caps(FnCaps::REDUCTION),
        Builtin::new("SUMSQ", aggregate::sumsq).caps(FnCaps::REDUCTION),
        Builtin::new("SUMPRODUCT", aggregate::sumproduct)
            .min(1)
            .caps(FnCaps::REDUCTION),
        Builtin::new("ABS", numeric::abs).args(1),
        Builtin::new("SIGN", numeric::sign).args(1),
        Builtin::new("ROUND", numeric::round).range(1, 2),
        Builtin::new("ROUNDUP", numeric::roundup).range(1, 2),
        Builtin::new("ROUNDDOWN", numeric::rounddown).range(1, 2),
        Builtin::new("INT", numeric::int).args(1),
        Builtin::new("TRUNC", numeric::trunc).range(1, 2),
        Builtin::new("MOD", numeric::r#mod).args(2),
        Builtin::new("QUOTIENT", numeric::quotient).args(2),
        Builtin::new("POWER", numeric::power).args(2),
        Builtin::new("SQRT", numeric::sqrt).args(1),
        Builtin::new("EXP", numeric::exp).args(1),
        Builtin::new("LN", numeric::ln).args(1),
        Builtin::new("LOG", numeric::log).range(1, 2),
        Builtin::new("LOG10", numeric::log10).args(1),
        Builtin::new("PI", numeric::pi).args(0),
        Builtin::new("CEILING", numeric::ceiling).range(1, 2),
        Builtin::new("FLOOR", numeric::floor).range(1, 2),
        Builtin::new("EVEN", numeric::even).args(1),
        Builtin::new("ODD", numeric::odd).args(1),
        Builtin::new("FACT", numeric::fact).args(1),
        Builtin::new("GCD", numeric::gcd).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("LCM", numeric::lcm).min(1).caps(FnCaps::REDUCTION),
        Builtin::new("SIN", trig::sin).args(1),
        Builtin::new("COS", trig::cos).args(1),
        Builtin::new("TAN", trig::tan).args(1),
        Builtin::new("ASIN", trig::asin).args(1),
        Builtin::new("ACOS", trig::acos).args(1),
        Builtin::new("ATAN", trig::atan).args(1),
        Builtin::new("ATAN2", trig::atan2).args(2),
        Builtin::new("DEGREES", trig::degrees).args(1),
        Builtin::new("RADIANS", trig::radians).args(1),
    ]);

    b.register(Arc::new(SumIfFn));
    b.register(Arc::new(SumIfsFn));
    b.register(Arc::new(CountIfFn));
    b.register(Arc::new(CountIfsFn));
    b.register(Arc::new(AverageIfFn));
    b.register(Arc::new(AverageIfsFn));
    b.register(Arc::new(MaxIfsFn));
    b.register(Arc::new(MinIfsFn));
}
