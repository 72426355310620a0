use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::age::century_progress;
use crate::birthday::BirthdayInfo;
use crate::insights::InsightsPayload;
use crate::utils::long_date;

const CARD_SIZE: i32 = 1080;
const PADDING: i32 = 80;
const LINE_HEIGHT: i32 = 44;
const WRAP_CHARS: usize = 48;
const MAX_INSIGHT_LINES: usize = 6;
const BAR_HEIGHT: i32 = 24;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    Starry,
    #[default]
    Glitter,
}

pub struct ThemeColors {
    pub bg: &'static str,
    pub panel: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub accent: &'static str,
    pub highlight: &'static str,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Light, Theme::Dark, Theme::Starry, Theme::Glitter];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Starry => "starry",
            Theme::Glitter => "glitter",
        }
    }

    pub fn colors(self) -> ThemeColors {
        match self {
            Theme::Light => ThemeColors {
                bg: "#f8fafc",
                panel: "#e2e8f0",
                text: "#1e293b",
                muted: "#64748b",
                accent: "#7c3aed",
                highlight: "#db2777",
            },
            Theme::Dark => ThemeColors {
                bg: "#0f172a",
                panel: "#1e293b",
                text: "#e2e8f0",
                muted: "#94a3b8",
                accent: "#c4b5fd",
                highlight: "#f9a8d4",
            },
            Theme::Starry => ThemeColors {
                bg: "#020617",
                panel: "#1e1b4b",
                text: "#e0e7ff",
                muted: "#a5b4fc",
                accent: "#7dd3fc",
                highlight: "#fde68a",
            },
            Theme::Glitter => ThemeColors {
                bg: "#1a0b2e",
                panel: "#2e1065",
                text: "#fdf4ff",
                muted: "#d8b4fe",
                accent: "#f0abfc",
                highlight: "#fbbf24",
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown theme {0:?} (expected light, dark, starry or glitter)")]
pub struct UnknownTheme(String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownTheme(s.to_string()))
    }
}

// Utilities for building SVG content

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Greedy word wrap on character count.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn build_insight_tspans(personality: &str, start_y: i32) -> String {
    let mut lines = wrap_text(personality, WRAP_CHARS);
    if lines.len() > MAX_INSIGHT_LINES {
        lines.truncate(MAX_INSIGHT_LINES);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }

    let center = CARD_SIZE / 2;
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let y = start_y + (i as i32) * LINE_HEIGHT;
        out.push_str(&format!(
            r#"<tspan x="{center}" y="{y}">{}</tspan>
"#,
            escape_xml(line)
        ));
    }
    out
}

/// Shareable square card: date, age, zodiac, life progress and, when
/// available, the personality insight.
pub fn generate_card_svg(info: &BirthdayInfo, insights: Option<&InsightsPayload>, theme: Theme) -> String {
    let colors = theme.colors();
    let size = CARD_SIZE;
    let center = size / 2;
    let half = (size - 2 * PADDING - 40) / 2;
    let right_x = PADDING + half + 40;

    let progress = century_progress(info.age.total_days).max(0.0);
    let bar_width = size - 2 * PADDING;
    let filled = (bar_width as f64 * progress / 100.0).round() as i32;

    let insight_block = match insights {
        Some(payload) => format!(
            r#"<rect x="{PADDING}" y="660" width="{bar_width}" height="330" rx="24" fill="{panel}"/>
<text x="{center}" y="715" text-anchor="middle" font-size="32" font-weight="bold" fill="{muted}">Personality Insight</text>
<text text-anchor="middle" font-size="30" fill="{text}">
{tspans}</text>"#,
            panel = colors.panel,
            muted = colors.muted,
            text = colors.text,
            tspans = build_insight_tspans(&payload.insights.personality, 770),
        ),
        None => String::new(),
    };

    format!(
        r#"<?xml version='1.0' encoding='UTF-8'?>
<svg xmlns="http://www.w3.org/2000/svg"
     width="{size}px" height="{size}px"
     font-family="Orbitron,Inter,sans-serif">

<rect width="{size}px" height="{size}px" fill="{bg}"/>

<text x="{center}" y="140" text-anchor="middle" font-size="64" font-weight="bold" fill="{accent}">Nakshatra Path</text>
<text x="{center}" y="200" text-anchor="middle" font-size="32" fill="{muted}">{date}</text>

<rect x="{PADDING}" y="250" width="{half}" height="260" rx="24" fill="{panel}"/>
<text x="{left_center}" y="300" text-anchor="middle" font-size="26" fill="{muted}">Age</text>
<text x="{left_center}" y="420" text-anchor="middle" font-size="110" font-weight="bold" fill="{accent}">{years}</text>
<text x="{left_center}" y="475" text-anchor="middle" font-size="26" fill="{muted}">years old</text>

<rect x="{right_x}" y="250" width="{half}" height="260" rx="24" fill="{panel}"/>
<text x="{right_center}" y="400" text-anchor="middle" font-size="110" fill="{text}">{symbol}</text>
<text x="{right_center}" y="470" text-anchor="middle" font-size="44" font-weight="bold" fill="{highlight}">{sign}</text>

<text x="{PADDING}" y="575" font-size="24" fill="{muted}">{progress:.2}% of the way to 100 years old</text>
<rect x="{PADDING}" y="595" width="{bar_width}" height="{BAR_HEIGHT}" rx="12" fill="{panel}"/>
<rect x="{PADDING}" y="595" width="{filled}" height="{BAR_HEIGHT}" rx="12" fill="{highlight}"/>

{insight_block}

<text x="{center}" y="1040" text-anchor="middle" font-size="22" fill="{muted}">Born on a {weekday}</text>

</svg>
"#,
        bg = colors.bg,
        panel = colors.panel,
        text = colors.text,
        muted = colors.muted,
        accent = colors.accent,
        highlight = colors.highlight,
        date = escape_xml(&long_date(info.birthdate)),
        left_center = PADDING + half / 2,
        right_center = right_x + half / 2,
        years = info.age.years,
        symbol = info.zodiac.symbol,
        sign = info.zodiac.name,
        weekday = crate::zodiac::weekday_name(info.day_of_week),
    )
}
