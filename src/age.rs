//! age.rs
//!
//! Calendar-aware age calculation:
//!     years / months / days plus the total number of elapsed days.
//!
//! Chrono does not provide a built-in year/month/day diff (unlike Python's
//! relativedelta), so we implement the calendar-aware borrowing rules manually.
//!
//! This logic correctly handles:
//!   • month underflow (borrowing from years)
//!   • day underflow (borrowing from previous month)
//!   • leap years
//!   • varying month lengths
//!
//! Every instant is UTC; a birth date is anchored at UTC midnight.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Days in one hundred Julian years, the denominator of `century_progress`.
const DAYS_IN_CENTURY: f64 = 365.25 * 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeBreakdown {
    pub years: i32,
    pub months: i32,
    pub days: i32,
    pub total_days: i64,
}

/// Age of someone born on `birthdate` as observed at `now`.
///
/// A birth date after `now` is not rejected; the fields simply go negative.
pub fn compute_age(birthdate: NaiveDate, now: DateTime<Utc>) -> AgeBreakdown {
    let today = now.date_naive();

    let mut years = today.year() - birthdate.year();
    let mut months = today.month() as i32 - birthdate.month() as i32;
    let mut days = today.day() as i32 - birthdate.day() as i32;

    // Fix day underflow
    if days < 0 {
        months -= 1;

        // Determine the previous month relative to `today`.
        let (prev_year, prev_month) = if today.month() == 1 {
            (today.year() - 1, 12)
        } else {
            (today.year(), today.month() - 1)
        };

        // A 31st birth day borrowed against a shorter month counts from that
        // month's last day, so `days` never goes negative.
        let days_in_prev_month = days_in_month(prev_year, prev_month) as i32;
        let anchor = (birthdate.day() as i32).min(days_in_prev_month);
        days = today.day() as i32 + days_in_prev_month - anchor;
    }

    // Fix month underflow
    if months < 0 {
        years -= 1;
        months += 12;
    }

    let elapsed = now - midnight_utc(birthdate);

    AgeBreakdown {
        years,
        months,
        days,
        total_days: elapsed.num_seconds().div_euclid(SECONDS_PER_DAY),
    }
}

/// Whole years only: one less than the year difference until the
/// (month, day) of the birth date has been reached.
pub fn simple_age(birthdate: NaiveDate, now: DateTime<Utc>) -> i32 {
    let today = now.date_naive();
    let mut age = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        age -= 1;
    }
    age
}

/// Returns a human age as a string
pub fn age_string(age: &AgeBreakdown) -> String {
    format!(
        "{} year{}, {} month{}, {} day{}",
        age.years,
        plural(age.years),
        age.months,
        plural(age.months),
        age.days,
        plural(age.days)
    )
}

/// Percentage of a hundred years already lived, capped at 100.
pub fn century_progress(total_days: i64) -> f64 {
    (total_days as f64 / DAYS_IN_CENTURY * 100.0).min(100.0)
}

fn plural(n: i32) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Midnight UTC at the start of `date`.
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Returns number of days in a given year/month (handles leap years)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30, // should never occur but keeps function total
    }
}

/// Leap-year rule (Gregorian):
///   - divisible by 4 → leap year
///   - except divisible by 100 → not leap year
///   - except divisible by 400 → leap year
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_compute_age_basic() {
        let age = compute_age(date(1992, 6, 14), at(2025, 8, 20, 12, 0, 0));
        assert_eq!(age.years, 33);
        assert_eq!(age.months, 2);
        assert_eq!(age.days, 6);
    }

    #[test]
    fn test_compute_age_borrows_from_previous_month() {
        // March 10 -> previous month is February 2024 (29 days)
        let age = compute_age(date(2000, 1, 20), at(2024, 3, 10, 0, 0, 0));
        assert_eq!(age.years, 24);
        assert_eq!(age.months, 1);
        assert_eq!(age.days, 19);
    }

    #[test]
    fn test_compute_age_borrow_across_year_boundary() {
        let age = compute_age(date(1990, 12, 25), at(2024, 1, 5, 0, 0, 0));
        assert_eq!(age.years, 33);
        assert_eq!(age.months, 0);
        assert_eq!(age.days, 11);
    }

    #[test]
    fn test_compute_age_end_of_month_birthday_never_negative() {
        // Jan 31 observed on Mar 1 of a non-leap year borrows against February.
        let age = compute_age(date(2001, 1, 31), at(2023, 3, 1, 0, 0, 0));
        assert_eq!(age.years, 22);
        assert_eq!(age.months, 1);
        assert_eq!(age.days, 1);
    }

    #[test]
    fn test_leap_birthday_not_reached_in_common_year() {
        let now = at(2023, 2, 28, 0, 0, 0);
        let age = compute_age(date(2000, 2, 29), now);
        assert_eq!(age.years, 22);
        assert_eq!(simple_age(date(2000, 2, 29), now), 22);

        let next_day = at(2023, 3, 1, 0, 0, 0);
        assert_eq!(compute_age(date(2000, 2, 29), next_day).years, 23);
    }

    #[test]
    fn test_total_days_uses_whole_days() {
        let birth = date(2024, 1, 1);
        assert_eq!(compute_age(birth, at(2024, 1, 1, 23, 59, 59)).total_days, 0);
        assert_eq!(compute_age(birth, at(2024, 1, 2, 0, 0, 0)).total_days, 1);
        assert_eq!(compute_age(birth, at(2025, 1, 1, 0, 0, 0)).total_days, 366);
    }

    #[test]
    fn test_future_birthdate_goes_negative() {
        let age = compute_age(date(2030, 1, 1), at(2025, 1, 1, 12, 0, 0));
        assert_eq!(age.years, -5);
        assert!(age.total_days < 0);
        assert_eq!(age.total_days, -1826);
    }

    #[test]
    fn test_breakdown_fields_stay_in_range() {
        let births = [
            date(1988, 1, 31),
            date(1996, 2, 29),
            date(2001, 5, 30),
            date(2010, 12, 31),
            date(2015, 7, 1),
        ];
        let start = date(2016, 1, 1);
        for birth in births {
            for offset in 0..800 {
                let today = start + Duration::days(offset);
                let now = midnight_utc(today) + Duration::hours(13);
                let age = compute_age(birth, now);
                assert!((0..=11).contains(&age.months), "{birth} @ {today}: {age:?}");
                assert!(age.days >= 0, "{birth} @ {today}: {age:?}");
                assert!(age.days <= 31, "{birth} @ {today}: {age:?}");
                assert_eq!(age.years, simple_age(birth, now), "{birth} @ {today}");
            }
        }
    }

    #[test]
    fn test_age_string_pluralises() {
        let age = AgeBreakdown {
            years: 1,
            months: 2,
            days: 1,
            total_days: 427,
        };
        assert_eq!(age_string(&age), "1 year, 2 months, 1 day");
    }

    #[test]
    fn test_century_progress_is_capped() {
        assert_eq!(century_progress(0), 0.0);
        assert!((century_progress(18262) - 50.0).abs() < 0.01);
        assert_eq!(century_progress(50_000), 100.0);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 12), 31);
    }
}
