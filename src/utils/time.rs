use std::fmt::Write;

use chrono::{
    format::{Item, StrftimeItems},
    DateTime, Duration, Local, NaiveDateTime, TimeZone,
};

/// The standard way of writing a timestamp into the timers file.
const STORED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Spellings accepted when reading a timestamp back. `%.f` makes the fraction optional.
const ACCEPTED_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn timestamp_to_string(timestamp: NaiveDateTime) -> String {
    timestamp.format(STORED_TIMESTAMP_FORMAT).to_string()
}

/// Parses an ISO-8601 timestamp. Offsets are allowed and get converted into local time.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    ACCEPTED_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|v| v.with_timezone(&Local).naive_local())
        })
}

/// Checks that a strftime format doesn't contain unknown specifiers.
pub fn is_valid_time_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Formats a local wall-clock timestamp with a strftime format. Returns [None] if chrono refuses
/// to render it.
pub fn format_local_time(timestamp: NaiveDateTime, format: &str) -> Option<String> {
    let mut result = String::new();
    // Timestamps falling into a DST gap have no local representation. Those are formatted naively.
    let written = match Local.from_local_datetime(&timestamp).earliest() {
        Some(local) => write!(result, "{}", local.format(format)),
        None => write!(result, "{}", timestamp.format(format)),
    };
    written.ok().map(|_| result)
}

const SECONDS_IN_DAY: i64 = 86_400;
const SECONDS_IN_HOUR: i64 = 3_600;
const SECONDS_IN_MINUTE: i64 = 60;

/// Formats a duration using `%D`, `%H`, `%M`, `%S` and `%f` placeholders.
///
/// Days, hours, minutes and seconds are padded to 2 digits, microseconds to 6. Hours never go
/// above 23 because whole days are split off first. `%%` produces a single `%`, every other
/// sequence is copied as is.
pub fn format_duration(duration: Duration, format: &str) -> String {
    let (sign, duration) = if duration < Duration::zero() {
        ("-", -duration)
    } else {
        ("", duration)
    };

    let total_seconds = duration.num_seconds();
    let microseconds = (duration - Duration::seconds(total_seconds))
        .num_microseconds()
        .unwrap_or(0);

    let days = total_seconds / SECONDS_IN_DAY;
    let remainder = total_seconds % SECONDS_IN_DAY;
    let hours = remainder / SECONDS_IN_HOUR;
    let remainder = remainder % SECONDS_IN_HOUR;
    let minutes = remainder / SECONDS_IN_MINUTE;
    let seconds = remainder % SECONDS_IN_MINUTE;

    let mut result = String::from(sign);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('D') => result.push_str(&format!("{days:02}")),
            Some('H') => result.push_str(&format!("{hours:02}")),
            Some('M') => result.push_str(&format!("{minutes:02}")),
            Some('S') => result.push_str(&format!("{seconds:02}")),
            Some('f') => result.push_str(&format!("{microseconds:06}")),
            Some('%') => result.push('%'),
            Some(other) => {
                result.push('%');
                result.push(other);
            }
            None => result.push('%'),
        }
    }
    result
}
