//! Round day-count anniversaries ("10,000 Days Old").

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::age::midnight_utc;
use crate::utils::thousands;

const MILESTONE_DAYS: [i64; 6] = [5_000, 10_000, 15_000, 20_000, 25_000, 30_000];

/// How many upcoming milestones are surfaced.
const MAX_UPCOMING: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub label: String,
    pub days: i64,
    pub date: NaiveDate,
}

/// The next few milestones strictly after `now`, ascending.
pub fn milestones(birthdate: NaiveDate, now: DateTime<Utc>) -> Vec<Milestone> {
    MILESTONE_DAYS
        .iter()
        .filter_map(|&days| {
            let date = birthdate.checked_add_signed(Duration::days(days))?;
            Some(Milestone {
                label: format!("{} Days Old", thousands(days)),
                days,
                date,
            })
        })
        .filter(|m| midnight_utc(m.date) > now)
        .take(MAX_UPCOMING)
        .collect()
}
