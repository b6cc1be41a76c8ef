//! Date and time functions over day serials (epoch 1899-12-30).

mod calendar;
mod date_time;

pub use calendar::{DatedifFn, NetworkdaysFn};

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use sheetcalc_common::{ErrorKind, FormulaValue, date};

use super::utils::scalar;
use crate::coercion::{parse_number_text, to_number};
use crate::function::Builtin;
use crate::function_registry::FunctionRegistryBuilder;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", // 2024-01-15
    "%m/%d/%Y", // 01/15/2024
    "%d/%m/%Y", // 15/01/2024
    "%Y/%m/%d", // 2024/01/15
    "%B %d, %Y",
    "%b %d, %Y",
    "%d-%b-%Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

fn time_of_day(t: NaiveTime) -> f64 {
    f64::from(t.num_seconds_from_midnight()) / date::SECONDS_PER_DAY
}

/// Serial for date, date-time or time-of-day text in one of a fixed set of
/// layouts. Parsing is not locale-driven: `m/d/Y` wins over `d/m/Y`.
pub fn parse_date_text(s: &str) -> Option<f64> {
    let t = s.trim();
    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(t, f).ok())
    {
        return Some(date::date_to_serial(d));
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(t, f).ok())
    {
        return Some(date::datetime_to_serial(&dt));
    }
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(t, f).ok())
        .map(time_of_day)
}

/// A serial argument: numbers, numeric text, or date text. Negative
/// serials are `#NUM!`.
pub(crate) fn serial_arg(v: &FormulaValue) -> Result<f64, ErrorKind> {
    let n = match scalar(v) {
        FormulaValue::Text(s) => match parse_number_text(s).or_else(|| parse_date_text(s)) {
            Some(n) => n,
            None => return Err(ErrorKind::parse(s).unwrap_or(ErrorKind::Value)),
        },
        other => to_number(other)?,
    };
    if n < 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(n)
}

pub(crate) fn date_arg(v: &FormulaValue) -> Result<NaiveDate, ErrorKind> {
    date::serial_to_date(serial_arg(v)?).ok_or(ErrorKind::Num)
}

pub(crate) fn serial(d: NaiveDate) -> Result<FormulaValue, ErrorKind> {
    let n = date::date_to_serial(d);
    if n < 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(FormulaValue::Number(n))
}

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register_all(&[
        Builtin::new("DATE", date_time::date).args(3),
        Builtin::new("TIME", date_time::time).args(3),
        Builtin::new("TODAY", date_time::today).args(0).volatile(),
        Builtin::new("NOW", date_time::now).args(0).volatile(),
        Builtin::new("YEAR", date_time::year).args(1),
        Builtin::new("MONTH", date_time::month).args(1),
        Builtin::new("DAY", date_time::day).args(1),
        Builtin::new("HOUR", date_time::hour).args(1),
        Builtin::new("MINUTE", date_time::minute).args(1),
        Builtin::new("SECOND", date_time::second).args(1),
        Builtin::new("DATEVALUE", date_time::datevalue).args(1),
        Builtin::new("WEEKDAY", calendar::weekday).range(1, 2),
        Builtin::new("DAYS", calendar::days).args(2),
        Builtin::new("EDATE", calendar::edate).args(2),
        Builtin::new("EOMONTH", calendar::eomonth).args(2),
    ]);
    b.register(Arc::new(DatedifFn));
    b.register(Arc::new(NetworkdaysFn));
}
