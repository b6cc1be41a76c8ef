use chrono::{Datelike, NaiveDateTime, Timelike};
use sheetcalc_common::{ErrorKind, FormulaValue, date};

use super::super::utils::{int, num, scalar};
use super::{date_arg, parse_date_text, serial, serial_arg};
use crate::function::FnResult;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

/// `DATE(year, month, day)`. Years below 1900 are offsets from 1900;
/// out-of-range months and days roll over.
pub fn date(args: &[FormulaValue], _: Ctx) -> FnResult {
    let mut year = int(&args[0])?;
    let month = int(&args[1])?;
    let day = int(&args[2])?;
    if !(0..10_000).contains(&year) {
        return Err(ErrorKind::Num);
    }
    if year < 1900 {
        year += 1900;
    }
    let to_i32 = |n: i64| i32::try_from(n).map_err(|_| ErrorKind::Num);
    let d = date::date_from_parts(to_i32(year)?, to_i32(month)?, to_i32(day)?)
        .ok_or(ErrorKind::Num)?;
    serial(d)
}

/// `TIME(h, m, s)` as a fraction of a day, wrapping past midnight.
pub fn time(args: &[FormulaValue], _: Ctx) -> FnResult {
    let h = int(&args[0])? as f64;
    let m = int(&args[1])? as f64;
    let s = int(&args[2])? as f64;
    let frac = date::time_fraction(h, m, s);
    if frac < 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(FormulaValue::Number(frac.rem_euclid(1.0)))
}

fn clock(ctx: Ctx) -> Result<NaiveDateTime, ErrorKind> {
    ctx.now().ok_or(ErrorKind::Value)
}

pub fn today(_: &[FormulaValue], ctx: Ctx) -> FnResult {
    serial(clock(ctx)?.date())
}

pub fn now(_: &[FormulaValue], ctx: Ctx) -> FnResult {
    Ok(FormulaValue::Number(date::datetime_to_serial(&clock(ctx)?)))
}

pub fn year(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Number(date_arg(&args[0])?.year() as f64))
}

pub fn month(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Number(date_arg(&args[0])?.month() as f64))
}

pub fn day(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Number(date_arg(&args[0])?.day() as f64))
}

fn datetime_arg(v: &FormulaValue) -> Result<NaiveDateTime, ErrorKind> {
    date::serial_to_datetime(serial_arg(v)?).ok_or(ErrorKind::Num)
}

pub fn hour(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Number(datetime_arg(&args[0])?.hour() as f64))
}

pub fn minute(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Number(datetime_arg(&args[0])?.minute() as f64))
}

pub fn second(args: &[FormulaValue], _: Ctx) -> FnResult {
    Ok(FormulaValue::Number(datetime_arg(&args[0])?.second() as f64))
}

/// Whole-day serial of date text; the time part is dropped.
pub fn datevalue(args: &[FormulaValue], _: Ctx) -> FnResult {
    match scalar(&args[0]) {
        FormulaValue::Text(s) => parse_date_text(s)
            .map(|n| FormulaValue::Number(n.floor()))
            .ok_or(ErrorKind::Value),
        FormulaValue::Error(e) => Err(*e),
        other => {
            // a number is not date text
            num(other)?;
            Err(ErrorKind::Value)
        }
    }
}
