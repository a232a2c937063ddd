//! Presentation helpers
//!
//! Pure functions shared by the orchestrator and the terminal front-end:
//! markdown rendering, timestamp formatting, and label lookups.

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use pulldown_cmark::{html, Event, Options, Parser};
use std::collections::HashMap;

/// Renders markdown to HTML
///
/// GitHub-flavored extensions (tables, strikethrough, task lists) are
/// enabled, and single newlines become `<br />` so bot replies keep their
/// line layout.
///
/// # Examples
///
/// ```
/// use reviewlens::presentation::markdown_to_html;
///
/// let html = markdown_to_html("**소음**\n밤에 시끄러워요");
/// assert_eq!(html, "<p><strong>소음</strong><br />\n밤에 시끄러워요</p>\n");
/// ```
pub fn markdown_to_html(source: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;
    let parser = Parser::new_ext(source, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Formats a timestamp as `M/D 오전|오후 h:mm` (12-hour clock)
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use reviewlens::presentation::format_timestamp;
///
/// let ts = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 0).unwrap();
/// assert_eq!(format_timestamp(&ts), "3/7 오후 2:05");
/// ```
pub fn format_timestamp<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    let hour = timestamp.hour();
    let meridiem = if hour < 12 { "오전" } else { "오후" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!(
        "{}/{} {} {}:{:02}",
        timestamp.month(),
        timestamp.day(),
        meridiem,
        hour12,
        timestamp.minute()
    )
}

/// Display label for a summarization strategy
///
/// Overrides from the backend config win; then the built-in names; unknown
/// strategies show their raw name.
pub fn strategy_label<'a>(strategy: &'a str, overrides: &'a HashMap<String, String>) -> &'a str {
    if let Some(label) = overrides.get(strategy) {
        return label;
    }
    match strategy {
        "default" => "기본형",
        "concise" => "간결형",
        "detailed" => "상세형",
        "friendly" => "친근형",
        "custom" => "맞춤형",
        other => other,
    }
}

/// Display label for a key finding's risk level
pub fn risk_label(level: &str) -> &str {
    if level.eq_ignore_ascii_case("high") {
        "높음"
    } else if level.eq_ignore_ascii_case("mid") || level.eq_ignore_ascii_case("medium") {
        "중간"
    } else if level.eq_ignore_ascii_case("low") {
        "낮음"
    } else {
        level
    }
}

/// Star string for a rating, clamped to 0..=5
pub fn rating_stars(rating: u8) -> String {
    "★".repeat(rating.min(5) as usize)
}
