//! Western zodiac lookup and weekday of birth.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::utils::month_name;

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ZodiacSign {
    pub name: &'static str,
    pub symbol: &'static str,
    /// (month, day), inclusive
    pub start: (u32, u32),
    /// (month, day), inclusive
    pub end: (u32, u32),
}

impl ZodiacSign {
    const fn new(name: &'static str, symbol: &'static str, start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            name,
            symbol,
            start,
            end,
        }
    }

    fn matches(&self, month: u32, day: u32) -> bool {
        (month == self.start.0 && day >= self.start.1) || (month == self.end.0 && day <= self.end.1)
    }

    /// e.g. "March 21 - April 19"
    pub fn date_range_label(&self) -> String {
        format!(
            "{} {} - {} {}",
            month_name(self.start.0),
            self.start.1,
            month_name(self.end.0),
            self.end.1
        )
    }
}

pub static CAPRICORN: ZodiacSign = ZodiacSign::new("Capricorn", "♑", (12, 22), (1, 19));

/// Signs whose range stays within one calendar year, in calendar order from
/// Aries. Capricorn wraps the year boundary and is handled after the scan.
pub static ZODIAC_SIGNS: [ZodiacSign; 11] = [
    ZodiacSign::new("Aries", "♈", (3, 21), (4, 19)),
    ZodiacSign::new("Taurus", "♉", (4, 20), (5, 20)),
    ZodiacSign::new("Gemini", "♊", (5, 21), (6, 20)),
    ZodiacSign::new("Cancer", "♋", (6, 21), (7, 22)),
    ZodiacSign::new("Leo", "♌", (7, 23), (8, 22)),
    ZodiacSign::new("Virgo", "♍", (8, 23), (9, 22)),
    ZodiacSign::new("Libra", "♎", (9, 23), (10, 22)),
    ZodiacSign::new("Scorpio", "♏", (10, 23), (11, 21)),
    ZodiacSign::new("Sagittarius", "♐", (11, 22), (12, 21)),
    ZodiacSign::new("Aquarius", "♒", (1, 20), (2, 18)),
    ZodiacSign::new("Pisces", "♓", (2, 19), (3, 20)),
];

/// The sign for a birth date. Every calendar day belongs to exactly one sign:
/// anything the table does not claim lies in Dec 22 - Jan 19.
pub fn zodiac_for(birthdate: NaiveDate) -> &'static ZodiacSign {
    let (month, day) = (birthdate.month(), birthdate.day());

    ZODIAC_SIGNS
        .iter()
        .find(|sign| sign.matches(month, day))
        .unwrap_or(&CAPRICORN)
}

pub fn day_of_week(birthdate: NaiveDate) -> Weekday {
    birthdate.weekday()
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
