//! Timestamp unit normalization and relative-time rendering.
//!
//! Upstream feeds emit `LastUpdate` as Unix seconds or Unix milliseconds,
//! as a number or a numeric string, with no unit tag. [`normalize_millis`]
//! folds all of that into canonical epoch milliseconds, where `0` means
//! "unknown/no timestamp".
//!
//! # Unit heuristic
//!
//! 1. Coerce to a number; non-finite or zero → 0.
//! 2. Count the decimal digits of the absolute integer part.
//! 3. ≥ 12 digits, or a raw value above 4×10^10, → already milliseconds.
//! 4. 9–11 digits → seconds, multiply by 1000.
//! 5. Anything smaller is not a plausible recent timestamp → 0.
//!
//! The heuristic is idempotent: a canonical millisecond value fed back in
//! comes out unchanged.

use serde_json::Value;

/// Raw values above this are milliseconds even at 11 digits.
const MILLIS_FLOOR: f64 = 40_000_000_000.0;

const MINUTE: i64 = 60;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;
const MONTH: i64 = 2_592_000;
const YEAR: i64 = 31_536_000;

/// Normalize a raw `LastUpdate` value to epoch milliseconds (`0` = unknown).
pub fn normalize_millis(raw: Option<&Value>) -> i64 {
    let num = match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => return 0,
    };
    normalize_numeric_millis(num)
}

/// [`normalize_millis`] for an already-coerced number.
pub fn normalize_numeric_millis(num: f64) -> i64 {
    if !num.is_finite() || num == 0.0 {
        return 0;
    }
    let digits = decimal_digits(num);
    if digits >= 12 || num > MILLIS_FLOOR {
        num as i64
    } else if (9..=11).contains(&digits) {
        (num * 1000.0) as i64
    } else {
        0
    }
}

fn decimal_digits(num: f64) -> u32 {
    let mut magnitude = num.abs().trunc();
    let mut digits = 1;
    while magnitude >= 10.0 {
        magnitude /= 10.0;
        digits += 1;
    }
    digits
}

/// Render canonical millis relative to `now_millis`: "42s ago", "3d ago",
/// "in 2h" for future times, `"unknown"` for 0.
pub fn format_relative(millis: i64, now_millis: i64) -> String {
    if millis == 0 {
        return "unknown".to_string();
    }

    let mut seconds = (now_millis - millis) / 1000;
    let (prefix, suffix) = if seconds < 0 {
        seconds = -seconds;
        ("in ", "")
    } else {
        ("", " ago")
    };

    if seconds < 5 && prefix.is_empty() {
        return "just now".to_string();
    }
    if seconds < MINUTE {
        return format!("{prefix}{seconds}s{suffix}");
    }
    let minutes = seconds / MINUTE;
    if minutes < 60 {
        return format!("{prefix}{minutes}m{suffix}");
    }
    let hours = seconds / HOUR;
    if hours < 24 {
        return format!("{prefix}{hours}h{suffix}");
    }
    let days = seconds / DAY;
    if days < 30 {
        return format!("{prefix}{days}d{suffix}");
    }
    let months = seconds / MONTH;
    if months < 12 {
        return format!("{prefix}{months}mo{suffix}");
    }
    format!("{prefix}{}yr{suffix}", seconds / YEAR)
}

/// [`format_relative`] against the current wall clock.
pub fn format_relative_now(millis: i64) -> String {
    format_relative(millis, chrono::Utc::now().timestamp_millis())
}
