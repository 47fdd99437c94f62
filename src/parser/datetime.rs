use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `%B` also accepts the three-letter abbreviation when parsing.
const PROFILE_DATETIME_FORMAT: &str = "%B %d %Y, %H:%M:%S";

/// Seconds east of UTC for the timezone abbreviations the site prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimezoneOffsets(HashMap<String, i32>);

impl Default for TimezoneOffsets {
    fn default() -> Self {
        Self::empty()
            .with_offset("CEST", 7200)
            .with_offset("CET", 3600)
    }
}

impl TimezoneOffsets {
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    pub fn with_offset(mut self, abbreviation: &str, seconds_east: i32) -> Self {
        self.0.insert(abbreviation.to_string(), seconds_east);
        self
    }

    pub fn offset_seconds(&self, abbreviation: &str) -> Option<i32> {
        self.0
            .get(abbreviation)
            .or_else(|| self.0.get(&abbreviation.to_uppercase()))
            .copied()
    }

    fn resolve(&self, abbreviation: &str) -> Zone {
        let seconds = match self.offset_seconds(abbreviation) {
            Some(seconds) => seconds,
            None => match abbreviation.to_uppercase().as_str() {
                "UTC" | "GMT" | "Z" => 0,
                _ if abbreviation.chars().all(|c| c.is_ascii_alphabetic()) => {
                    return Zone::Unknown
                }
                _ => return Zone::Invalid,
            },
        };

        FixedOffset::east_opt(seconds).map_or(Zone::Invalid, Zone::Fixed)
    }
}

enum Zone {
    Fixed(FixedOffset),
    Unknown,
    Invalid,
}

/// Parses `"<Month> <Day> <Year>, <HH:MM:SS> [TZ]"` into a naive local value.
///
/// The abbreviation is resolved through `offsets` and applied, then the
/// offset is dropped: the result is the wall-clock time as printed, not UTC.
/// Returns `None` on any malformed input.
pub fn parse_datetime(raw: &str, offsets: &TimezoneOffsets) -> Option<NaiveDateTime> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let (clock, zone) = match tokens.len() {
        4 => (tokens.join(" "), None),
        5 => (tokens[..4].join(" "), Some(tokens[4])),
        count => {
            warn!("Failed to parse date '{}': expected 4 or 5 tokens, got {}", raw, count);
            return None;
        }
    };

    let naive = match NaiveDateTime::parse_from_str(&clock, PROFILE_DATETIME_FORMAT) {
        Ok(naive) => naive,
        Err(e) => {
            warn!("Failed to parse date '{}': {}", raw, e);
            return None;
        }
    };

    let Some(zone) = zone else {
        return Some(naive);
    };

    match offsets.resolve(zone) {
        Zone::Fixed(offset) => match offset.from_local_datetime(&naive).single() {
            Some(localized) => Some(localized.naive_local()),
            None => {
                warn!("Failed to parse date '{}': ambiguous local time", raw);
                None
            }
        },
        Zone::Unknown => {
            warn!(
                "Unknown timezone abbreviation '{}' in '{}', keeping wall-clock time",
                zone, raw
            );
            Some(naive)
        }
        Zone::Invalid => {
            warn!("Failed to parse date '{}': invalid timezone '{}'", raw, zone);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Timelike};

    fn parse(raw: &str) -> Option<NaiveDateTime> {
        parse_datetime(raw, &TimezoneOffsets::default())
    }

    #[test]
    fn test_summer_time_fixture() {
        let date = parse("May 01 2023, 12:00:00 CEST").unwrap();
        assert_eq!(date.year(), 2023);
        assert_eq!(date.month(), 5);
        assert_eq!(date.day(), 1);
        assert_eq!(date.hour(), 12);
        assert_eq!(date.minute(), 0);
        assert_eq!(date.second(), 0);
    }

    #[test]
    fn test_winter_time_keeps_wall_clock() {
        let date = parse("Jan 15 2024, 23:59:58 CET").unwrap();
        assert_eq!(
            date,
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(23, 59, 58)
                .unwrap()
        );
    }

    #[test]
    fn test_full_month_name_and_unpadded_day() {
        let date = parse("September 3 2022, 07:05:09 CEST").unwrap();
        assert_eq!((date.month(), date.day()), (9, 3));
        assert_eq!((date.hour(), date.minute(), date.second()), (7, 5, 9));
    }

    #[test]
    fn test_missing_zone_is_accepted() {
        assert!(parse("Apr 15 2023, 14:30:00").is_some());
    }

    #[test]
    fn test_utc_without_table_entry() {
        let date = parse_datetime("Apr 15 2023, 14:30:00 UTC", &TimezoneOffsets::empty()).unwrap();
        assert_eq!(date.hour(), 14);
    }

    #[test]
    fn test_unknown_abbreviation_keeps_value() {
        let date = parse("Apr 15 2023, 14:30:00 PDT").unwrap();
        assert_eq!((date.day(), date.hour()), (15, 14));
    }

    #[test]
    fn test_custom_table() {
        let offsets = TimezoneOffsets::empty().with_offset("BRT", -3 * 3600);
        let date = parse_datetime("Dec 31 2023, 22:00:00 BRT", &offsets).unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2023, 12, 31));
        assert_eq!(offsets.offset_seconds("brt"), Some(-10800));
    }

    #[test]
    fn test_malformed_inputs_are_absent() {
        assert!(parse("Invalid date").is_none());
        assert!(parse("").is_none());
        assert!(parse("May 01 2023 12:00:00 CEST extra tokens").is_none());
        assert!(parse("Feb 30 2023, 10:00:00 CET").is_none());
        assert!(parse("May 01 2023, 25:00:00 CEST").is_none());
        assert!(parse("Foo 01 2023, 12:00:00 CEST").is_none());
        assert!(parse("May 01 2023, 12:00:00 +02:00").is_none());
    }

    #[test]
    fn test_out_of_range_offset_is_absent() {
        let offsets = TimezoneOffsets::empty().with_offset("BAD", 100_000);
        assert!(parse_datetime("May 01 2023, 12:00:00 BAD", &offsets).is_none());
    }

    #[test]
    fn test_offsets_deserialize_from_map() {
        let offsets: TimezoneOffsets = serde_json::from_str(r#"{"CEST": 7200, "CET": 3600}"#).unwrap();
        assert_eq!(offsets, TimezoneOffsets::default());
    }
}
