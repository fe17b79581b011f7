//! Arithmetic on the feed's native `YYYYMMDD` date-int encoding.
//!
//! The tape carries dates as packed integers and times as minutes since
//! midnight; interval bucketing needs exact minute differences and
//! day-carry in both directions, which `chrono::NaiveDate` provides.

use chrono::{Datelike, Days, NaiveDate};

use crate::constants::time::MINUTES_PER_DAY;
use crate::errors::TapeError;

/// Decode a `YYYYMMDD` integer into a calendar date.
pub fn date_from_int(date: i32) -> Result<NaiveDate, TapeError> {
    let year = date / 10_000;
    let month = (date / 100 % 100).unsigned_abs();
    let day = (date % 100).unsigned_abs();
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| TapeError::InvalidPrint(format!("unparseable date {date}")))
}

/// Encode a calendar date back into the feed's `YYYYMMDD` form.
#[must_use]
pub fn date_to_int(date: NaiveDate) -> i32 {
    let month = i32::try_from(date.month()).unwrap_or(0);
    let day = i32::try_from(date.day()).unwrap_or(0);
    date.year() * 10_000 + month * 100 + day
}

/// Minutes elapsed from `(d1, t1)` to `(d0, t0)`; negative when the first
/// stamp is earlier.
pub fn minutes_between(d0: i32, t0: i32, d1: i32, t1: i32) -> Result<i64, TapeError> {
    if d0 == d1 {
        return Ok(i64::from(t0) - i64::from(t1));
    }
    let days = (date_from_int(d0)? - date_from_int(d1)?).num_days();
    Ok(days * MINUTES_PER_DAY + i64::from(t0) - i64::from(t1))
}

/// Shift a `(date, minute)` stamp by a signed number of minutes, carrying
/// across midnight in either direction.
pub fn add_minutes(date: i32, minute: i32, delta: i64) -> Result<(i32, i32), TapeError> {
    let total = i64::from(minute) + delta;
    let days = total.div_euclid(MINUTES_PER_DAY);
    let minute = total.rem_euclid(MINUTES_PER_DAY);

    let date = if days == 0 {
        date
    } else {
        let base = date_from_int(date)?;
        let shifted = if days >= 0 {
            base.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            base.checked_sub_days(Days::new(days.unsigned_abs()))
        }
        .ok_or_else(|| TapeError::InvalidPrint(format!("date {date} shifted out of range")))?;
        date_to_int(shifted)
    };

    // rem_euclid keeps the minute inside [0, MINUTES_PER_DAY)
    #[allow(clippy::cast_possible_truncation)]
    Ok((date, minute as i32))
}
