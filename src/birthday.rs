//! One observation of everything derived from a birth date.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::Serialize;

use crate::age::{AgeBreakdown, compute_age};
use crate::countdown::{Countdown, compute_countdown};
use crate::milestones::{Milestone, milestones};
use crate::zodiac::{ZodiacSign, day_of_week, zodiac_for};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthdayInfo {
    pub birthdate: NaiveDate,
    pub observed_at: DateTime<Utc>,
    pub age: AgeBreakdown,
    pub countdown: Countdown,
    pub zodiac: &'static ZodiacSign,
    pub day_of_week: Weekday,
    pub milestones: Vec<Milestone>,
}

pub fn calculate_birthday_info(birthdate: NaiveDate, now: DateTime<Utc>) -> BirthdayInfo {
    BirthdayInfo {
        birthdate,
        observed_at: now,
        age: compute_age(birthdate, now),
        countdown: compute_countdown(birthdate, now),
        zodiac: zodiac_for(birthdate),
        day_of_week: day_of_week(birthdate),
        milestones: milestones(birthdate, now),
    }
}
