//! Warehouse timestamp formatting
//!
//! Every timestamp the crate writes uses the `YYYY-MM-DD HH:MM:SS` layout expected by the
//! warehouse `TIMESTAMP` columns. Reading is more lenient because source extracts are not
//! always consistent about the date/time separator or fractional seconds.

use chrono::NaiveDateTime;

/// Canonical output layout for all timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ACCEPTED_FORMATS: [&str; 4] = [
    TIMESTAMP_FORMAT,
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a timestamp in any of the accepted layouts
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// Render a timestamp in the canonical layout
pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter for `NaiveDateTime` fields stored in the canonical layout
pub mod timestamp_format {
    use super::{format_timestamp, parse_timestamp};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a timestamp as `YYYY-MM-DD HH:MM:SS`
    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_timestamp(value))
    }

    /// Deserialize a timestamp from any accepted layout
    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_accepts_iso_separator_and_fractions() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 30, 15)
            .unwrap();

        assert_eq!(parse_timestamp("2024-01-01 09:30:15"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T09:30:15"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-01 09:30:15.250").map(|t| format_timestamp(&t)),
            Some("2024-01-01 09:30:15".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
