//! Time-value-of-money and cash-flow functions.

mod cashflow;
mod tvm;

use sheetcalc_common::ErrorKind;

use crate::coercion::sanitize;
use crate::function::Builtin;
use crate::function_registry::FunctionRegistryBuilder;

const MAX_ITER: usize = 100;
const TOLERANCE: f64 = 1e-10;

/// Newton-Raphson from `guess`. `f` returns the value and slope at a rate;
/// iterates are kept above -1. No convergence is `#NUM!`.
pub(crate) fn newton(guess: f64, f: impl Fn(f64) -> (f64, f64)) -> Result<f64, ErrorKind> {
    let mut rate = guess;
    for _ in 0..MAX_ITER {
        let (y, dy) = f(rate);
        if !y.is_finite() || !dy.is_finite() || dy.abs() < 1e-20 {
            return Err(ErrorKind::Num);
        }
        let mut next = rate - y / dy;
        if next <= -1.0 {
            next = (rate - 1.0) / 2.0;
        }
        if (next - rate).abs() < TOLERANCE {
            return sanitize(next);
        }
        rate = next;
    }
    Err(ErrorKind::Num)
}

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register_all(&[
        Builtin::new("PMT", tvm::pmt).range(3, 5),
        Builtin::new("PV", tvm::pv).range(3, 5),
        Builtin::new("FV", tvm::fv).range(3, 5),
        Builtin::new("NPER", tvm::nper).range(3, 5),
        Builtin::new("RATE", tvm::rate).range(3, 6),
        Builtin::new("NPV", cashflow::npv).min(2),
        Builtin::new("IRR", cashflow::irr).range(1, 2),
    ]);
}

#[cfg(test)]
pub(crate) mod test_support {
    use sheetcalc_common::FormulaValue;

    #[track_caller]
    pub fn assert_close(v: FormulaValue, expected: f64, tol: f64) {
        match v {
            FormulaValue::Number(n) => assert!(
                (n - expected).abs() <= tol,
                "expected {expected} ± {tol}, got {n}"
            ),
            other => panic!("expected a number, got {other:?}"),
        }
    }
}
