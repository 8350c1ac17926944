//! Date formatting for submission payloads.
//!
//! Formats are written with moment-style tokens (`DD-MM-YYYY`) and translated
//! to chrono specifiers.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::fmt::Write;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(
        r"\[[^\]]*\]|YYYY|YY|MMMM|MMM|MM|M|Do|dddd|ddd|DD|D|HH|H|hh|h|mm|m|ss|s|SSS|A|a"
    )
    .unwrap();
}

const INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

pub fn to_chrono_format(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut last = 0;
    for m in TOKEN.find_iter(pattern) {
        out.push_str(&pattern[last..m.start()].replace('%', "%%"));
        let token = m.as_str();
        let translated = match token {
            "YYYY" => "%Y",
            "YY" => "%y",
            "MMMM" => "%B",
            "MMM" => "%b",
            "MM" => "%m",
            "M" => "%-m",
            "Do" => "%-d",
            "dddd" => "%A",
            "ddd" => "%a",
            "DD" => "%d",
            "D" => "%-d",
            "HH" => "%H",
            "H" => "%-H",
            "hh" => "%I",
            "h" => "%-I",
            "mm" => "%M",
            "m" => "%-M",
            "ss" => "%S",
            "s" => "%-S",
            "SSS" => "%3f",
            "A" => "%p",
            "a" => "%P",
            literal => {
                out.push_str(&literal[1..literal.len() - 1].replace('%', "%%"));
                last = m.end();
                continue;
            }
        };
        out.push_str(translated);
        last = m.end();
    }
    out.push_str(&pattern[last..].replace('%', "%%"));
    out
}

/// Reads a stored date value: ISO dates and date-times, RFC 3339 with offset,
/// or epoch milliseconds.
pub fn parse(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        Value::String(text) => parse_str(text.trim()),
        _ => None,
    }
}

fn parse_str(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    for format in INPUT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Formats a stored date for submission. Empty values give an empty string;
/// values that cannot be read as dates are passed through as text.
pub fn format_for_submission(value: &Value, pattern: &str) -> String {
    let raw = match value {
        Value::Null => return String::new(),
        Value::String(s) if s.trim().is_empty() => return String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let Some(dt) = parse(value) else {
        log::warn!("Could not read '{}' as a date; submitting it unchanged", raw);
        return raw;
    };
    let mut out = String::new();
    if write!(out, "{}", dt.format(&to_chrono_format(pattern))).is_err() {
        log::warn!("Date format '{}' is not usable; submitting '{}' unchanged", pattern, raw);
        return raw;
    }
    out
}
