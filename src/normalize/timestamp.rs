//! Timestamp field repair
//!
//! Raw extracts sometimes write the hour without a leading zero (`2024-03-05 9:05:07`),
//! which strict warehouse loaders reject. The only repair performed is padding a
//! one-digit hour; anything else that does not look like `<date> HH:MM:SS[.fff]` is left
//! as it is and reported.

use chrono::NaiveDateTime;

use super::repair::FieldRepair;

const CANONICAL_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Repair a raw `"<date> <H or HH>:<MM>:<SS>"` timestamp
///
/// Empty values are NULLs and stay unchanged.
pub fn repair_timestamp(raw: &str) -> FieldRepair {
    if raw.trim().is_empty() {
        return FieldRepair::Unchanged;
    }

    let Some((date, time)) = raw.split_once(' ') else {
        return FieldRepair::pass_through("missing separator between date and time");
    };

    let parts: Vec<&str> = time.split(':').collect();
    let [hour, minute, second] = parts[..] else {
        return FieldRepair::pass_through(format!(
            "expected HH:MM:SS time, found {} field(s)",
            parts.len()
        ));
    };

    let (whole_seconds, fraction) = match second.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (second, None),
    };

    if !is_digits(hour, 1..=2) {
        return FieldRepair::pass_through(format!("hour '{}' is not a 1-2 digit number", hour));
    }
    if !is_digits(minute, 2..=2) || !is_digits(whole_seconds, 2..=2) {
        return FieldRepair::pass_through("minute and second must be two digits");
    }
    if fraction.is_some_and(|f| !is_digits(f, 1..=9)) {
        return FieldRepair::pass_through("fractional seconds must be digits");
    }

    let candidate = if hour.len() == 1 {
        format!("{} 0{}:{}:{}", date, hour, minute, second)
    } else {
        raw.to_string()
    };

    if NaiveDateTime::parse_from_str(&candidate, CANONICAL_LAYOUT).is_err() {
        return FieldRepair::pass_through(format!("'{}' is not a valid calendar timestamp", candidate));
    }

    if hour.len() == 1 {
        FieldRepair::Repaired(candidate)
    } else {
        FieldRepair::Unchanged
    }
}

fn is_digits(value: &str, len: std::ops::RangeInclusive<usize>) -> bool {
    len.contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}
