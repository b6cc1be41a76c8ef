use chrono::{Datelike, NaiveDateTime, Timelike};
use sheetcalc_common::{ErrorKind, FormulaValue, date, format_number};

use super::super::datetime::parse_date_text;
use super::super::utils::{int, num, round_to, scalar, text};
use crate::coercion::parse_number_text;
use crate::function::FnResult;
use crate::traits::FunctionContext;

type Ctx<'a> = &'a dyn FunctionContext;

/// Text to number: numeric text, percentages, then date/time text.
pub fn value(args: &[FormulaValue], _: Ctx) -> FnResult {
    match scalar(&args[0]) {
        FormulaValue::Text(s) => parse_number_text(s)
            .or_else(|| parse_date_text(s))
            .map(FormulaValue::Number)
            .ok_or(ErrorKind::Value),
        FormulaValue::Boolean(_) => Err(ErrorKind::Value),
        other => num(other).map(FormulaValue::Number),
    }
}

/// `TEXT(value, format)`. Non-numeric text passes through unchanged.
pub fn text_fn(args: &[FormulaValue], _: Ctx) -> FnResult {
    let fmt = text(&args[1])?;
    let n = match scalar(&args[0]) {
        FormulaValue::Number(n) => *n,
        FormulaValue::Null => 0.0,
        FormulaValue::Error(e) => return Err(*e),
        FormulaValue::Boolean(b) => {
            return Ok(FormulaValue::text(if *b { "TRUE" } else { "FALSE" }));
        }
        FormulaValue::Text(s) => match parse_number_text(s) {
            Some(n) => n,
            None => return Ok(FormulaValue::Text(s.clone())),
        },
        FormulaValue::Array(_) => return Err(ErrorKind::Value),
    };
    format_with(n, &fmt).map(FormulaValue::Text)
}

pub fn char_fn(args: &[FormulaValue], _: Ctx) -> FnResult {
    let n = int(&args[0])?;
    if !(1..=255).contains(&n) {
        return Err(ErrorKind::Value);
    }
    // Latin-1 code points coincide with Unicode
    char::from_u32(n as u32)
        .map(|c| FormulaValue::Text(c.to_string()))
        .ok_or(ErrorKind::Value)
}

pub fn code(args: &[FormulaValue], _: Ctx) -> FnResult {
    text(&args[0])?
        .chars()
        .next()
        .map(|c| FormulaValue::Number(u32::from(c) as f64))
        .ok_or(ErrorKind::Value)
}

/* ─────────────────────────── format engine ─────────────────────────── */

/// Apply a number format. Sections are `positive;negative;zero`; with a
/// single section negatives get a leading minus.
fn format_with(n: f64, fmt: &str) -> Result<String, ErrorKind> {
    if fmt.is_empty() || fmt.eq_ignore_ascii_case("general") {
        return Ok(format_number(n));
    }
    let sections = split_sections(fmt);
    let (section, magnitude, minus) = if n < 0.0 && sections.len() >= 2 {
        (sections[1].as_str(), -n, false)
    } else if n == 0.0 && sections.len() >= 3 {
        (sections[2].as_str(), n, false)
    } else {
        (sections[0].as_str(), n.abs(), n < 0.0)
    };

    if is_date_section(section) {
        if n < 0.0 {
            return Err(ErrorKind::Value);
        }
        let dt = date::serial_to_datetime(n).ok_or(ErrorKind::Value)?;
        return Ok(render_date(&date_parts(section), &dt));
    }

    let body = render_number(magnitude, section);
    Ok(if minus { format!("-{body}") } else { body })
}

fn split_sections(fmt: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                cur.push(c);
            }
            '\\' if !quoted => {
                cur.push(c);
                if let Some(next) = chars.next() {
                    cur.push(next);
                }
            }
            ';' if !quoted => sections.push(std::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    sections.push(cur);
    sections
}

/// A section is a date/time format when it has date letters outside quotes
/// and no digit placeholders; letters in a numeric format are literals.
fn is_date_section(section: &str) -> bool {
    let mut quoted = false;
    let mut escaped = false;
    let mut date_letters = false;
    for c in section.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '"' => quoted = !quoted,
            '\\' if !quoted => escaped = true,
            _ if quoted => {}
            '0' | '#' | '?' => return false,
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => date_letters = true,
            _ => {}
        }
    }
    date_letters
}

/* ─── dates ─── */

#[derive(Debug, Clone, PartialEq)]
enum DatePart {
    Year4,
    Year2,
    MonthName,
    MonthAbbr,
    Month2,
    Month1,
    Minute2,
    Minute1,
    DayName,
    DayAbbr,
    Day2,
    Day1,
    Hour2,
    Hour1,
    Second2,
    Second1,
    AmPm,
    Literal(String),
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

fn push_literal(parts: &mut Vec<DatePart>, s: &str) {
    if let Some(DatePart::Literal(last)) = parts.last_mut() {
        last.push_str(s);
    } else {
        parts.push(DatePart::Literal(s.to_string()));
    }
}

fn date_parts(section: &str) -> Vec<DatePart> {
    let chars: Vec<char> = section.chars().collect();
    let mut parts = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&q| q == '"')
                    .map_or(chars.len(), |p| i + 1 + p);
                let lit: String = chars[i + 1..end].iter().collect();
                push_literal(&mut parts, &lit);
                i = end + 1;
            }
            '\\' => {
                if let Some(next) = chars.get(i + 1) {
                    push_literal(&mut parts, &next.to_string());
                }
                i += 2;
            }
            _ if chars[i..]
                .iter()
                .take(5)
                .collect::<String>()
                .eq_ignore_ascii_case("AM/PM") =>
            {
                parts.push(DatePart::AmPm);
                i += 5;
            }
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => {
                let lower = c.to_ascii_lowercase();
                let run = chars[i..]
                    .iter()
                    .take_while(|x| x.to_ascii_lowercase() == lower)
                    .count();
                parts.push(match (lower, run) {
                    ('y', 1..=2) => DatePart::Year2,
                    ('y', _) => DatePart::Year4,
                    ('m', 1) => DatePart::Month1,
                    ('m', 2) => DatePart::Month2,
                    ('m', 3) => DatePart::MonthAbbr,
                    ('m', _) => DatePart::MonthName,
                    ('d', 1) => DatePart::Day1,
                    ('d', 2) => DatePart::Day2,
                    ('d', 3) => DatePart::DayAbbr,
                    ('d', _) => DatePart::DayName,
                    ('h', 1) => DatePart::Hour1,
                    ('h', _) => DatePart::Hour2,
                    ('s', 1) => DatePart::Second1,
                    _ => DatePart::Second2,
                });
                i += run;
            }
            _ => {
                push_literal(&mut parts, &c.to_string());
                i += 1;
            }
        }
    }

    // `m`/`mm` right after an hour or right before a second is minutes
    for i in 0..parts.len() {
        if !matches!(parts[i], DatePart::Month1 | DatePart::Month2) {
            continue;
        }
        let after_hour = parts[..i]
            .iter()
            .rev()
            .find(|p| !matches!(p, DatePart::Literal(_)))
            .is_some_and(|p| matches!(p, DatePart::Hour1 | DatePart::Hour2));
        let before_second = parts[i + 1..]
            .iter()
            .find(|p| !matches!(p, DatePart::Literal(_)))
            .is_some_and(|p| matches!(p, DatePart::Second1 | DatePart::Second2));
        if after_hour || before_second {
            parts[i] = if parts[i] == DatePart::Month2 {
                DatePart::Minute2
            } else {
                DatePart::Minute1
            };
        }
    }
    parts
}

fn render_date(parts: &[DatePart], dt: &NaiveDateTime) -> String {
    let twelve_hour = parts.contains(&DatePart::AmPm);
    let hour = if twelve_hour {
        match dt.hour() % 12 {
            0 => 12,
            h => h,
        }
    } else {
        dt.hour()
    };
    let month = dt.month0() as usize;
    let weekday = dt.weekday().num_days_from_sunday() as usize;

    let mut out = String::new();
    for part in parts {
        match part {
            DatePart::Year4 => out.push_str(&format!("{:04}", dt.year())),
            DatePart::Year2 => out.push_str(&format!("{:02}", dt.year().rem_euclid(100))),
            DatePart::MonthName => out.push_str(MONTHS[month]),
            DatePart::MonthAbbr => out.push_str(&MONTHS[month][..3]),
            DatePart::Month2 => out.push_str(&format!("{:02}", dt.month())),
            DatePart::Month1 => out.push_str(&dt.month().to_string()),
            DatePart::Minute2 => out.push_str(&format!("{:02}", dt.minute())),
            DatePart::Minute1 => out.push_str(&dt.minute().to_string()),
            DatePart::DayName => out.push_str(WEEKDAYS[weekday]),
            DatePart::DayAbbr => out.push_str(&WEEKDAYS[weekday][..3]),
            DatePart::Day2 => out.push_str(&format!("{:02}", dt.day())),
            DatePart::Day1 => out.push_str(&dt.day().to_string()),
            DatePart::Hour2 => out.push_str(&format!("{hour:02}")),
            DatePart::Hour1 => out.push_str(&hour.to_string()),
            DatePart::Second2 => out.push_str(&format!("{:02}", dt.second())),
            DatePart::Second1 => out.push_str(&dt.second().to_string()),
            DatePart::AmPm => out.push_str(if dt.hour() < 12 { "AM" } else { "PM" }),
            DatePart::Literal(s) => out.push_str(s),
        }
    }
    out
}

/* ─── numbers ─── */

/// `n` is non-negative; the caller owns the sign.
fn render_number(n: f64, section: &str) -> String {
    let mut prefix = String::new();
    let mut pattern = String::new();
    let mut suffix = String::new();
    let mut percent = 0;

    let chars: Vec<char> = section.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let literal = match c {
            '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&q| q == '"')
                    .map_or(chars.len(), |p| i + 1 + p);
                let lit: String = chars[i + 1..end].iter().collect();
                i = end + 1;
                Some(lit)
            }
            '\\' => {
                let lit = chars.get(i + 1).map(char::to_string).unwrap_or_default();
                i += 2;
                Some(lit)
            }
            '0' | '#' | '?' | '.' | ',' => {
                pattern.push(c);
                i += 1;
                None
            }
            'E' | 'e'
                if !pattern.is_empty() && matches!(chars.get(i + 1), Some('+' | '-')) =>
            {
                pattern.push('E');
                pattern.push(chars[i + 1]);
                i += 2;
                None
            }
            '%' => {
                percent += 1;
                i += 1;
                Some("%".to_string())
            }
            _ => {
                i += 1;
                Some(c.to_string())
            }
        };
        if let Some(lit) = literal {
            if pattern.is_empty() {
                prefix.push_str(&lit);
            } else {
                suffix.push_str(&lit);
            }
        }
    }

    if pattern.is_empty() {
        return format!("{prefix}{suffix}");
    }
    let n = n * 100f64.powi(percent);

    let body = match pattern.split_once('E') {
        Some((mantissa, exponent)) => render_scientific(n, mantissa, exponent),
        None => {
            // each trailing comma scales by a thousand
            let trimmed = pattern.trim_end_matches(',');
            let scale = (pattern.len() - trimmed.len()) as i32;
            let (int_pat, frac_pat) = trimmed.split_once('.').unwrap_or((trimmed, ""));
            render_fixed(
                n / 1000f64.powi(scale),
                &Placeholders::new(int_pat, frac_pat, trimmed.contains('.')),
            )
        }
    };
    format!("{prefix}{body}{suffix}")
}

struct Placeholders {
    min_int: usize,
    min_frac: usize,
    max_frac: usize,
    grouping: bool,
    point: bool,
}

impl Placeholders {
    fn new(int_pat: &str, frac_pat: &str, point: bool) -> Self {
        Self {
            min_int: int_pat.chars().filter(|c| *c == '0').count(),
            min_frac: frac_pat.chars().filter(|c| *c == '0').count(),
            max_frac: frac_pat
                .chars()
                .filter(|c| matches!(c, '0' | '#' | '?'))
                .count(),
            grouping: int_pat.contains(','),
            point,
        }
    }
}

fn render_fixed(n: f64, p: &Placeholders) -> String {
    let rounded = round_to(n, p.max_frac as i64);
    let digits = format!("{rounded:.prec$}", prec = p.max_frac);
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((&digits, ""));

    let mut frac = frac_part.to_string();
    while frac.len() > p.min_frac && frac.ends_with('0') {
        frac.pop();
    }
    let mut int = if int_part == "0" && p.min_int == 0 {
        String::new()
    } else {
        int_part.to_string()
    };
    while int.len() < p.min_int {
        int.insert(0, '0');
    }
    if p.grouping {
        int = group_thousands(&int);
    }
    if p.point {
        format!("{int}.{frac}")
    } else {
        int
    }
}

fn render_scientific(n: f64, mantissa: &str, exponent: &str) -> String {
    let (int_pat, frac_pat) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let p = Placeholders::new(int_pat, frac_pat, mantissa.contains('.'));
    let mut exp = if n == 0.0 { 0 } else { n.log10().floor() as i32 };
    let mut m = n / 10f64.powi(exp);
    if round_to(m, p.max_frac as i64) >= 10.0 {
        m /= 10.0;
        exp += 1;
    }
    let width = exponent.chars().filter(|c| *c == '0').count().max(1);
    let sign = if exp < 0 {
        "-"
    } else if exponent.starts_with('+') {
        "+"
    } else {
        ""
    };
    let mantissa = render_fixed(m, &Placeholders { min_int: p.min_int.max(1), ..p });
    format!("{mantissa}E{sign}{:0width$}", exp.abs())
}

fn group_thousands(int: &str) -> String {
    let len = int.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::ErrorKind;

    use super::format_with;
    use crate::test_workbook::TestWorkbook;

    #[test]
    fn value_parses_numeric_text() {
        let wb = TestWorkbook::new().with_cell("A1", " 12.5 ");
        assert_eq!(wb.eval("VALUE(A1)"), 12.5.into());
        assert_eq!(wb.eval("VALUE(\"40%\")"), 0.4.into());
        assert_eq!(wb.eval("VALUE(\"2024-01-01\")"), 45292.0.into());
        assert_eq!(wb.eval("VALUE(\"abc\")"), ErrorKind::Value.into());
    }

    #[test]
    fn numeric_formats() {
        assert_eq!(format_with(1234.567, "#,##0.00").unwrap(), "1,234.57");
        assert_eq!(format_with(1234.5, "$#,##0").unwrap(), "$1,235");
        assert_eq!(format_with(0.25, "0%").unwrap(), "25%");
        assert_eq!(format_with(7.0, "000").unwrap(), "007");
        assert_eq!(format_with(0.5, "#.00").unwrap(), ".50");
        assert_eq!(format_with(-5.0, "0;(0)").unwrap(), "(5)");
        assert_eq!(format_with(-5.0, "0.0").unwrap(), "-5.0");
        assert_eq!(format_with(0.0, "0;-0;\"zero\"").unwrap(), "zero");
        assert_eq!(format_with(12345.678, "0.00E+00").unwrap(), "1.23E+04");
        assert_eq!(format_with(2.5, "General").unwrap(), "2.5");
        assert_eq!(format_with(1_500_000.0, "0.0,,\"M\"").unwrap(), "1.5M");
    }

    #[test]
    fn letters_beside_digit_placeholders_are_literal() {
        assert_eq!(format_with(5.0, "0 units").unwrap(), "5 units");
        assert_eq!(format_with(2.5, "0.0 hrs").unwrap(), "2.5 hrs");
        assert_eq!(format_with(12.0, "# days").unwrap(), "12 days");
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("TEXT(5,\"0 units\")"), "5 units".into());
        assert_eq!(wb.eval("TEXT(45292,\"yyyy\")"), "2024".into());
    }

    #[test]
    fn date_formats() {
        assert_eq!(format_with(45292.0, "yyyy-mm-dd").unwrap(), "2024-01-01");
        assert_eq!(format_with(45292.0, "dddd, mmmm d").unwrap(), "Monday, January 1");
        assert_eq!(format_with(45292.0, "d mmm yy").unwrap(), "1 Jan 24");
        assert_eq!(format_with(0.75, "h:mm AM/PM").unwrap(), "6:00 PM");
        assert_eq!(format_with(0.5 + 90.0 / 86_400.0, "hh:mm:ss").unwrap(), "12:01:30");
        assert_eq!(format_with(-1.0, "yyyy").unwrap_err(), ErrorKind::Value);
    }

    #[test]
    fn text_function_passthrough() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("TEXT(\"abc\",\"0.00\")"), "abc".into());
        assert_eq!(wb.eval("TEXT(\"3\",\"0.00\")"), "3.00".into());
        assert_eq!(wb.eval("TEXT(1/0,\"0\")"), ErrorKind::Div.into());
    }

    #[test]
    fn char_and_code() {
        let wb = TestWorkbook::new();
        assert_eq!(wb.eval("CHAR(65)"), "A".into());
        assert_eq!(wb.eval("CHAR(0)"), ErrorKind::Value.into());
        assert_eq!(wb.eval("CHAR(256)"), ErrorKind::Value.into());
        assert_eq!(wb.eval("CODE(\"abc\")"), 97.0.into());
        assert_eq!(wb.eval("CODE(\"\")"), ErrorKind::Value.into());
    }
}
