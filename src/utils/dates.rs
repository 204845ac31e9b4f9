use chrono::{NaiveDate, NaiveTime};

use crate::error::{TrackerError, TrackerResult};

pub fn parse_date(s: &str) -> TrackerResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| TrackerError::InvalidDate(s.to_string()))
}

pub fn parse_time(s: &str) -> TrackerResult<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| TrackerError::InvalidTime(s.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a UTC offset string into total minutes.
/// Accepts: "5:30", "+5:30", "-5:30", "5", "+5", "5.5"
pub fn parse_tz_offset(s: &str) -> anyhow::Result<i32> {
    let s = s.trim().trim_start_matches('+');
    let negative = s.starts_with('-');
    let s = s.trim_start_matches('-');
    let sign = if negative { -1 } else { 1 };

    let minutes = if s.contains(':') {
        let mut parts = s.splitn(2, ':');
        let hours: i32 = parts.next().unwrap_or("0").parse()?;
        let mins: i32 = parts.next().unwrap_or("0").parse()?;
        hours * 60 + mins
    } else if s.contains('.') {
        let hours: f64 = s.parse()?;
        (hours * 60.0).round() as i32
    } else {
        let hours: i32 = s.parse()?;
        hours * 60
    };

    Ok(sign * minutes)
}

/// Format total minutes as "+H:MM" string
pub fn format_tz_offset(minutes: i32) -> String {
    let sign = if minutes < 0 { "-" } else { "+" };
    let abs = minutes.abs();
    let h = abs / 60;
    let m = abs % 60;
    if m == 0 {
        format!("{}{}", sign, h)
    } else {
        format!("{}{}:{:02}", sign, h, m)
    }
}
