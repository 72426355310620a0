//! Plain-text dashboard for the terminal, laid out as dot-leader rows.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::age::{age_string, century_progress};
use crate::birthday::BirthdayInfo;
use crate::controller::InsightsState;
use crate::countdown::Countdown;
use crate::numerology::life_path_number;
use crate::storage::SavedBirthday;
use crate::utils::{long_date, thousands};
use crate::zodiac::weekday_name;

const ALIGN_WIDTH: usize = 56;

pub fn build_stat_row(key: &str, value: &str, align_width: usize) -> String {
    let key_part = format!("{key}: ");
    let base_len = key_part.chars().count() + value.chars().count();
    let available = align_width.saturating_sub(base_len);

    let dots = match available {
        0 => "".to_string(),
        1 => " ".to_string(),
        2 => ". ".to_string(),
        n => ".".repeat(n),
    };

    format!("{key_part}{dots}{value}")
}

fn build_header_line(label: &str, align_width: usize) -> String {
    let base = format!("{label} ");
    let dash_count = align_width.saturating_sub(base.chars().count()) + 2;
    format!("{base}{}", "-".repeat(dash_count))
}

fn join(items: &[String]) -> String {
    items.join("; ")
}

pub fn countdown_line(countdown: &Countdown) -> String {
    format!(
        "{}d {:02}h {:02}m {:02}s",
        countdown.days, countdown.hours, countdown.minutes, countdown.seconds
    )
}

pub fn render_dashboard(info: &BirthdayInfo, insights: &InsightsState) -> String {
    let mut rows = vec![
        build_header_line(&format!("Born {}", long_date(info.birthdate)), ALIGN_WIDTH),
        build_stat_row("Age", &age_string(&info.age), ALIGN_WIDTH),
        build_stat_row("Days old", &thousands(info.age.total_days), ALIGN_WIDTH),
        build_stat_row(
            "Toward 100",
            &format!("{:.2}%", century_progress(info.age.total_days)),
            ALIGN_WIDTH,
        ),
        build_stat_row("Next birthday in", &countdown_line(&info.countdown), ALIGN_WIDTH),
        build_stat_row(
            "Zodiac",
            &format!(
                "{} {} ({})",
                info.zodiac.symbol,
                info.zodiac.name,
                info.zodiac.date_range_label()
            ),
            ALIGN_WIDTH,
        ),
        build_stat_row("Born on a", weekday_name(info.day_of_week), ALIGN_WIDTH),
        build_stat_row(
            "Life path number",
            &life_path_number(info.birthdate).to_string(),
            ALIGN_WIDTH,
        ),
    ];

    if !info.milestones.is_empty() {
        rows.push(String::new());
        rows.push(build_header_line("Milestones", ALIGN_WIDTH));
        for m in &info.milestones {
            rows.push(build_stat_row(&m.label, &long_date(m.date), ALIGN_WIDTH));
        }
    }

    rows.push(String::new());
    rows.push(build_header_line("Cosmic insights", ALIGN_WIDTH));
    match insights {
        InsightsState::Idle => {}
        InsightsState::Loading => rows.push("Consulting the stars...".to_string()),
        InsightsState::Failed(message) => rows.push(message.clone()),
        InsightsState::Ready(payload) => {
            rows.push(build_stat_row("Events", &join(&payload.facts.events), ALIGN_WIDTH));
            rows.push(build_stat_row(
                "Famous births",
                &join(&payload.facts.famous_births),
                ALIGN_WIDTH,
            ));
            rows.push(build_stat_row(
                "Life path (remote)",
                &payload.numerology.life_path_number.to_string(),
                ALIGN_WIDTH,
            ));
            let lucky: Vec<String> = payload
                .numerology
                .lucky_numbers
                .iter()
                .map(|n| n.to_string())
                .collect();
            rows.push(build_stat_row("Lucky numbers", &lucky.join(", "), ALIGN_WIDTH));
            rows.push(build_stat_row(
                "Lucky colors",
                &payload.numerology.lucky_colors.join(", "),
                ALIGN_WIDTH,
            ));
            rows.push(build_stat_row("Weather", &payload.weather, ALIGN_WIDTH));
            rows.push(String::new());
            rows.push(payload.insights.personality.clone());
            rows.push(payload.insights.prediction.clone());
        }
    }

    rows.join("\n")
}

/// Machine-readable form of the dashboard.
pub fn render_json(info: &BirthdayInfo, insights: &InsightsState) -> serde_json::Result<String> {
    let (payload, error) = match insights {
        InsightsState::Ready(payload) => (Some(payload), None),
        InsightsState::Failed(message) => (None, Some(message.as_str())),
        InsightsState::Idle | InsightsState::Loading => (None, None),
    };
    serde_json::to_string_pretty(&json!({
        "birthday": info,
        "lifePathNumber": life_path_number(info.birthdate),
        "insights": payload,
        "insightsError": error,
    }))
}

pub fn render_saved(birthdays: &[SavedBirthday], now: DateTime<Utc>) -> String {
    if birthdays.is_empty() {
        return "No saved birthdays.".to_string();
    }

    let mut rows = vec![build_header_line("Saved birthdays", ALIGN_WIDTH)];
    for b in birthdays {
        let bell = if b.is_reminder_active(now) { " [reminder]" } else { "" };
        let reminder = if b.reminder_enabled {
            format!("remind {}d before", b.reminder_days)
        } else {
            "reminder off".to_string()
        };
        rows.push(build_stat_row(
            &format!("{}{bell}", b.name),
            &format!(
                "{} ({} years), {}, {reminder}",
                long_date(b.date),
                b.age(now),
                b.days_away_label(now)
            ),
            ALIGN_WIDTH + 20,
        ));
        rows.push(format!("    id {}", b.id));
    }
    rows.join("\n")
}
