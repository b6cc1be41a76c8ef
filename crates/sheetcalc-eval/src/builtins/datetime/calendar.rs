use chrono::{Datelike, NaiveDate, Weekday};
use sheetcalc_common::{ErrorKind, FormulaValue, date};

use super::super::utils::{int, opt_int};
use super::{date_arg, serial, serial_arg};
use crate::args::ArgumentHandle;
use crate::function::{FnResult, Function};
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

/// `WEEKDAY(serial, [type=1])`. Type 1 counts Sunday=1, type 2 Monday=1,
/// type 3 Monday=0, types 11..=17 start the week on Monday..Sunday at 1.
pub fn weekday(args: &[FormulaValue], _: Ctx) -> FnResult {
    let d = date_arg(&args[0])?;
    let from_monday = i64::from(d.weekday().num_days_from_monday());
    let n = match opt_int(args, 1, 1)? {
        1 => i64::from(d.weekday().num_days_from_sunday()) + 1,
        2 => from_monday + 1,
        3 => from_monday,
        t @ 11..=17 => (from_monday - (t - 11)).rem_euclid(7) + 1,
        _ => return Err(ErrorKind::Num),
    };
    Ok(FormulaValue::Number(n as f64))
}

/// `DAYS(end, start)`.
pub fn days(args: &[FormulaValue], _: Ctx) -> FnResult {
    let end = serial_arg(&args[0])?.floor();
    let start = serial_arg(&args[1])?.floor();
    Ok(FormulaValue::Number(end - start))
}

fn months_arg(v: &FormulaValue) -> Result<i32, ErrorKind> {
    i32::try_from(int(v)?).map_err(|_| ErrorKind::Num)
}

/// Same day `months` away, clamped to the target month's end.
pub fn edate(args: &[FormulaValue], _: Ctx) -> FnResult {
    let d = date_arg(&args[0])?;
    serial(date::add_months(d, months_arg(&args[1])?).ok_or(ErrorKind::Num)?)
}

pub fn eomonth(args: &[FormulaValue], _: Ctx) -> FnResult {
    let d = date_arg(&args[0])?;
    serial(date::end_of_month(d, months_arg(&args[1])?).ok_or(ErrorKind::Num)?)
}

/* ─────────────────────────── DATEDIF() ─────────────────────────── */

/// `DATEDIF(start, end, unit)` with units `Y`, `M`, `D`, `MD`, `YM`, `YD`.
#[derive(Debug)]
pub struct DatedifFn;

impl DatedifFn {
    fn whole_months(start: NaiveDate, end: NaiveDate) -> i64 {
        let mut months = i64::from(end.year() - start.year()) * 12
            + (i64::from(end.month()) - i64::from(start.month()));
        if end.day() < start.day() {
            months -= 1;
        }
        months
    }

    fn between(start: NaiveDate, end: NaiveDate, unit: &str) -> Result<i64, ErrorKind> {
        Ok(match unit {
            "Y" => Self::whole_months(start, end).div_euclid(12),
            "M" => Self::whole_months(start, end),
            "D" => (end - start).num_days(),
            "MD" => {
                let mut days = i64::from(end.day()) - i64::from(start.day());
                if days < 0 {
                    let prev = date::end_of_month(end, -1).ok_or(ErrorKind::Num)?;
                    days += i64::from(prev.day());
                }
                days
            }
            "YM" => Self::whole_months(start, end).rem_euclid(12),
            "YD" => {
                let years = end.year() - start.year();
                let mut anniversary =
                    date::add_months(start, years * 12).ok_or(ErrorKind::Num)?;
                if anniversary > end {
                    anniversary =
                        date::add_months(start, (years - 1) * 12).ok_or(ErrorKind::Num)?;
                }
                (end - anniversary).num_days()
            }
            _ => return Err(ErrorKind::Num),
        })
    }
}

impl Function for DatedifFn {
    fn name(&self) -> &'static str {
        "DATEDIF"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: Ctx) -> FnResult {
        let start = date_arg(&args[0].value())?;
        let end = date_arg(&args[1].value())?;
        let unit = match args[2].scalar() {
            FormulaValue::Text(s) => s.trim().to_ascii_uppercase(),
            FormulaValue::Error(e) => return Err(e),
            _ => return Err(ErrorKind::Value),
        };
        if start > end {
            return Err(ErrorKind::Num);
        }
        Ok(FormulaValue::Number(Self::between(start, end, &unit)? as f64))
    }
}

/* ─────────────────────────── NETWORKDAYS() ─────────────────────────── */

/// Weekdays between two dates, inclusive, minus any holiday dates given in
/// the optional third argument. Negative when `start > end`.
#[derive(Debug)]
pub struct NetworkdaysFn;

fn is_weekend(d: NaiveDate) -> bool {
    matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
}

impl Function for NetworkdaysFn {
    fn name(&self) -> &'static str {
        "NETWORKDAYS"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: Ctx) -> FnResult {
        let start = date_arg(&args[0].value())?;
        let end = date_arg(&args[1].value())?;

        let mut holidays = Vec::new();
        if let Some(arg) = args.get(2) {
            let v = arg.value();
            for h in v.flatten() {
                match h {
                    FormulaValue::Null => {}
                    other => holidays.push(date_arg(other)?),
                }
            }
        }

        let (lo, hi, sign) = if start <= end {
            (start, end, 1)
        } else {
            (end, start, -1)
        };
        let count = lo
            .iter_days()
            .take_while(|d| *d <= hi)
            .filter(|d| !is_weekend(*d) && !holidays.contains(d))
            .count() as i64;
        Ok(FormulaValue::Number((count * sign) as f64))
    }
}
