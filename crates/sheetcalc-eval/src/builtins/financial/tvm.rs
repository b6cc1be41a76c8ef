use sheetcalc_common::{ErrorKind, FormulaValue};

use super::newton;
use super::super::utils::{num, number, opt_num};
use crate::function::FnResult;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

/// Payments at the start of each period when non-zero.
fn due(args: &[FormulaValue], idx: usize) -> Result<f64, ErrorKind> {
    Ok(if opt_num(args, idx, 0.0)? != 0.0 { 1.0 } else { 0.0 })
}

/// `(1 + rate)^nper` and the annuity factor `((1+r)^n - 1) / r`, with the
/// zero-rate limit.
fn factors(rate: f64, nper: f64) -> (f64, f64) {
    if rate.abs() < 1e-10 {
        (1.0, nper)
    } else {
        let growth = (1.0 + rate).powf(nper);
        (growth, (growth - 1.0) / rate)
    }
}

/// `PMT(rate, nper, pv, [fv], [type])`.
pub fn pmt(args: &[FormulaValue], _: Ctx) -> FnResult {
    let rate = num(&args[0])?;
    let nper = num(&args[1])?;
    let pv = num(&args[2])?;
    let fv = opt_num(args, 3, 0.0)?;
    let t = due(args, 4)?;
    if nper == 0.0 {
        return Err(ErrorKind::Num);
    }
    let (growth, annuity) = factors(rate, nper);
    number(-(pv * growth + fv) / (annuity * (1.0 + rate * t)))
}

/// `PV(rate, nper, pmt, [fv], [type])`.
pub fn pv(args: &[FormulaValue], _: Ctx) -> FnResult {
    let rate = num(&args[0])?;
    let nper = num(&args[1])?;
    let pmt = num(&args[2])?;
    let fv = opt_num(args, 3, 0.0)?;
    let t = due(args, 4)?;
    let (growth, annuity) = factors(rate, nper);
    number(-(fv + pmt * (1.0 + rate * t) * annuity) / growth)
}

/// `FV(rate, nper, pmt, [pv], [type])`.
pub fn fv(args: &[FormulaValue], _: Ctx) -> FnResult {
    let rate = num(&args[0])?;
    let nper = num(&args[1])?;
    let pmt = num(&args[2])?;
    let pv = opt_num(args, 3, 0.0)?;
    let t = due(args, 4)?;
    let (growth, annuity) = factors(rate, nper);
    number(-(pv * growth + pmt * (1.0 + rate * t) * annuity))
}

/// `NPER(rate, pmt, pv, [fv], [type])`.
pub fn nper(args: &[FormulaValue], _: Ctx) -> FnResult {
    let rate = num(&args[0])?;
    let pmt = num(&args[1])?;
    let pv = num(&args[2])?;
    let fv = opt_num(args, 3, 0.0)?;
    let t = due(args, 4)?;
    if rate.abs() < 1e-10 {
        if pmt == 0.0 {
            return Err(ErrorKind::Num);
        }
        return number(-(pv + fv) / pmt);
    }
    let adjusted = pmt * (1.0 + rate * t);
    let ratio = (adjusted - fv * rate) / (pv * rate + adjusted);
    if ratio <= 0.0 || !ratio.is_finite() {
        return Err(ErrorKind::Num);
    }
    number(ratio.ln() / (1.0 + rate).ln())
}

/// `RATE(nper, pmt, pv, [fv], [type], [guess=0.1])`, solved by Newton
/// iteration on the annuity equation.
pub fn rate(args: &[FormulaValue], _: Ctx) -> FnResult {
    let nper = num(&args[0])?;
    let pmt = num(&args[1])?;
    let pv = num(&args[2])?;
    let fv = opt_num(args, 3, 0.0)?;
    let t = due(args, 4)?;
    let guess = opt_num(args, 5, 0.1)?;
    if nper <= 0.0 {
        return Err(ErrorKind::Num);
    }

    let balance = |r: f64| {
        let (growth, annuity) = factors(r, nper);
        pv * growth + pmt * (1.0 + r * t) * annuity + fv
    };
    // the annuity factor has a removable singularity at 0, so the slope
    // is taken numerically
    const H: f64 = 1e-7;
    let rate = newton(guess, |r| {
        (balance(r), (balance(r + H) - balance(r - H)) / (2.0 * H))
    })?;
    Ok(FormulaValue::Number(rate))
}
