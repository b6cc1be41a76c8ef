/* ───────────────────────── Date-serial utilities ─────────────────────────
Dates are plain numbers: whole days since 1899-12-30, with the time of day
stored as the fractional part. Serial 1 = 1899-12-31, serial 2 = 1900-01-01.
There is no phantom 1900-02-29.
------------------------------------------------------------------------- */

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub const SERIAL_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1899, 12, 30) {
    Some(d) => d,
    None => panic!("invalid serial epoch"),
};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn date_to_serial(date: NaiveDate) -> f64 {
    (date - SERIAL_EPOCH).num_days() as f64
}

pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    date_to_serial(dt.date()) + dt.time().num_seconds_from_midnight() as f64 / SECONDS_PER_DAY
}

/// Whole-day part of a serial as a calendar date. `None` outside chrono's range.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    SERIAL_EPOCH.checked_add_signed(Duration::try_days(serial.floor() as i64)?)
}

pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let date = serial_to_date(serial)?;
    let secs = ((serial - serial.floor()) * SECONDS_PER_DAY).round() as u32;
    // 23:59:59.6 rounds up to the next midnight
    if secs >= 86_400 {
        let next = date.succ_opt()?;
        return next.and_hms_opt(0, 0, 0);
    }
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)?;
    Some(date.and_time(time))
}

/// Fraction of a day for a wall-clock time; components may overflow
/// (`time_fraction(0, 90, 0)` is 1.5 hours).
pub fn time_fraction(hour: f64, minute: f64, second: f64) -> f64 {
    (hour * 3600.0 + minute * 60.0 + second) / SECONDS_PER_DAY
}

/// Build a date from possibly out-of-range month/day components the way
/// `DATE()` does: months roll into years, days roll across months.
pub fn date_from_parts(year: i32, month: i32, day: i32) -> Option<NaiveDate> {
    let total_months = year.checked_mul(12)?.checked_add(month.checked_sub(1)?)?;
    let y = total_months.div_euclid(12);
    let m = total_months.rem_euclid(12) + 1;
    let first = NaiveDate::from_ymd_opt(y, m as u32, 1)?;
    first.checked_add_signed(Duration::try_days(i64::from(day) - 1)?)
}

/// Last day of the month `months` away from `date`.
pub fn end_of_month(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let month = (date.month() as i32 + 1).checked_add(months)?;
    let first_of_next = date_from_parts(date.year(), month, 1)?;
    first_of_next.pred_opt()
}

/// Same day-of-month `months` away, clamped to the end of the target month.
pub fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let eom = end_of_month(date, months)?;
    let day = date.day().min(eom.day());
    eom.with_day(day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_round_trip() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let s = date_to_serial(d);
        assert_eq!(s, 45366.0);
        assert_eq!(serial_to_date(s), Some(d));
        assert_eq!(date_to_serial(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()), 2.0);
    }

    #[test]
    fn time_part_survives() {
        let dt = serial_to_datetime(45366.75).unwrap();
        assert_eq!(dt.hour(), 18);
        assert_eq!(dt.minute(), 0);
    }

    #[test]
    fn date_parts_roll_over() {
        assert_eq!(
            date_from_parts(2023, 14, 1),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(
            date_from_parts(2024, 3, 0),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn month_arithmetic_clamps() {
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(add_months(jan31, 1), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(end_of_month(jan31, -1), NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[test]
    fn extreme_components_are_out_of_range() {
        assert_eq!(date_from_parts(2024, i32::MIN, 1), None);
        assert_eq!(date_from_parts(2024, i32::MAX, 1), None);
        assert_eq!(date_from_parts(i32::MAX, 1, 1), None);
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(end_of_month(d, i32::MAX), None);
        assert_eq!(end_of_month(d, i32::MIN), None);
        assert_eq!(add_months(d, i32::MAX), None);
    }
}
