//! Time remaining until the next birthday.
//!
//! A February 29 birthday is celebrated on March 1 in common years, the same
//! day `age::compute_age` increments the year count.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::age::{SECONDS_PER_DAY, midnight_utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    fn from_seconds(total: i64) -> Self {
        let total = total.max(0);
        Self {
            days: total / SECONDS_PER_DAY,
            hours: (total % SECONDS_PER_DAY) / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }
}

/// The birthday as it falls in `year`.
pub fn anniversary_in(birthdate: NaiveDate, year: i32) -> Option<NaiveDate> {
    birthdate
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

/// The first anniversary strictly after `now`. On the birthday itself this
/// is next year's date.
pub fn next_anniversary(birthdate: NaiveDate, now: DateTime<Utc>) -> Option<NaiveDate> {
    let this_year = anniversary_in(birthdate, now.year())?;
    if midnight_utc(this_year) > now {
        Some(this_year)
    } else {
        anniversary_in(birthdate, now.year() + 1)
    }
}

/// Days, hours, minutes and seconds until the next anniversary. Stateless, so
/// calling it once per second always reflects the current `now`.
pub fn compute_countdown(birthdate: NaiveDate, now: DateTime<Utc>) -> Countdown {
    let Some(next) = next_anniversary(birthdate, now) else {
        return Countdown::default();
    };
    Countdown::from_seconds((midnight_utc(next) - now).num_seconds())
}

/// Whole days until the next anniversary, rounding any partial day up.
///
/// Equal to the calendar-day distance between `now`'s date and the
/// anniversary, i.e. `compute_countdown(..).days` plus one whenever a
/// remainder is left over.
pub fn countdown_days(birthdate: NaiveDate, now: DateTime<Utc>) -> i64 {
    next_anniversary(birthdate, now)
        .map(|next| (next - now.date_naive()).num_days())
        .unwrap_or(0)
}

/// Whether `now` falls on the birthday (March 1 for leap-day births in
/// common years).
pub fn is_birthday_today(birthdate: NaiveDate, now: DateTime<Utc>) -> bool {
    let today = now.date_naive();
    anniversary_in(birthdate, today.year()) == Some(today)
}
