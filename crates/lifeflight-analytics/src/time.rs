//! Time normalization for raw mission rows.
//!
//! Trip dates arrive as text in a handful of layouts and clock times arrive
//! as either `HH:MM` or `HH:MM:SS`. Clock strings are truncated to their
//! first five characters before parsing, so seconds are always discarded.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use lifeflight_domain::MissionRecord;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y"];

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const CLOCK_PREFIX_LEN: usize = 5;

/// Parse a trip date. Date-time strings keep only their date part.
#[must_use]
pub fn parse_trip_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// First five characters of a clock string (`HH:MM`).
#[must_use]
pub fn clock_prefix(raw: &str) -> &str {
    match raw.char_indices().nth(CLOCK_PREFIX_LEN) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

/// Parse a clock string after truncating it to `HH:MM`.
#[must_use]
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(clock_prefix(raw.trim()), "%H:%M").ok()
}

/// Hour of day of a full clock string, seconds allowed.
#[must_use]
pub fn clock_hour(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
        .map(|t| t.hour())
}

/// Dispatch and enroute timestamps of one mission.
///
/// When the enroute clock reads earlier than dispatch on the same trip date
/// the crew left after midnight, so `enroute` is already moved to the
/// following day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionTimes {
    pub trip_date: NaiveDate,
    pub dispatched: Option<NaiveDateTime>,
    pub enroute: Option<NaiveDateTime>,
    pub crosses_midnight: bool,
}

impl MissionTimes {
    /// Combine a trip date with raw dispatch and enroute clocks.
    #[must_use]
    pub fn normalize(trip_date: NaiveDate, dispatch: Option<&str>, enroute: Option<&str>) -> Self {
        let dispatched = dispatch.and_then(parse_clock).map(|t| trip_date.and_time(t));
        let mut enroute = enroute.and_then(parse_clock).map(|t| trip_date.and_time(t));

        let mut crosses_midnight = false;
        if let (Some(d), Some(e)) = (dispatched, enroute) {
            if e < d {
                enroute = Some(e + Duration::days(1));
                crosses_midnight = true;
            }
        }

        Self {
            trip_date,
            dispatched,
            enroute,
            crosses_midnight,
        }
    }

    /// Normalize a record. `None` when the trip date does not parse; such
    /// rows take no part in any aggregate.
    #[must_use]
    pub fn from_record(record: &MissionRecord) -> Option<Self> {
        let trip_date = record.trip_date.as_deref().and_then(parse_trip_date)?;
        Some(Self::normalize(
            trip_date,
            record.dispatch_time.as_deref(),
            record.enroute_time.as_deref(),
        ))
    }

    /// Dispatch-to-enroute duration, undefined if either clock is missing.
    #[must_use]
    pub fn response_time(&self) -> Option<Duration> {
        Some(self.enroute? - self.dispatched?)
    }

    #[must_use]
    pub fn response_minutes(&self) -> Option<f64> {
        self.response_time()
            .map(|d| d.num_seconds() as f64 / 60.0)
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.trip_date.year()
    }

    #[must_use]
    pub fn month(&self) -> u32 {
        self.trip_date.month()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_trip_date_layouts() {
        assert_eq!(parse_trip_date("2023-06-15"), Some(date(2023, 6, 15)));
        assert_eq!(parse_trip_date("6/15/2023"), Some(date(2023, 6, 15)));
        assert_eq!(parse_trip_date("2023-06-15 00:00:00"), Some(date(2023, 6, 15)));
        assert_eq!(parse_trip_date(" 2023/06/15 "), Some(date(2023, 6, 15)));
        assert_eq!(parse_trip_date("not a date"), None);
        assert_eq!(parse_trip_date(""), None);
    }

    #[test]
    fn test_clock_truncated_to_minutes() {
        assert_eq!(clock_prefix("08:15:30"), "08:15");
        assert_eq!(clock_prefix("08:15"), "08:15");
        assert_eq!(parse_clock("08:15:30"), NaiveTime::from_hms_opt(8, 15, 0));
        assert_eq!(parse_clock("nan"), None);
        assert_eq!(parse_clock("25:00"), None);
    }

    #[test]
    fn test_seconds_discarded_before_duration() {
        let times = MissionTimes::normalize(date(2023, 6, 15), Some("08:00:00"), Some("08:15:30"));
        assert_eq!(times.response_time(), Some(Duration::minutes(15)));
        assert!(!times.crosses_midnight);
    }

    #[test]
    fn test_overnight_wraparound() {
        let times = MissionTimes::normalize(date(2023, 6, 15), Some("23:50"), Some("00:10"));
        assert!(times.crosses_midnight);
        assert_eq!(times.response_minutes(), Some(20.0));
        assert_eq!(times.enroute.unwrap().date(), date(2023, 6, 16));
    }

    #[test]
    fn test_missing_clock_is_undefined() {
        let times = MissionTimes::normalize(date(2023, 6, 15), Some("08:00"), None);
        assert_eq!(times.response_time(), None);

        let times = MissionTimes::normalize(date(2023, 6, 15), Some("garbage"), Some("08:00"));
        assert_eq!(times.response_time(), None);
    }

    #[test]
    fn test_unparseable_date_drops_record() {
        let record = MissionRecord {
            trip_date: Some("unknown".into()),
            dispatch_time: Some("08:00".into()),
            enroute_time: Some("08:10".into()),
            ..Default::default()
        };
        assert!(MissionTimes::from_record(&record).is_none());
    }

    #[test]
    fn test_clock_hour_accepts_seconds() {
        assert_eq!(clock_hour("17:45:12"), Some(17));
        assert_eq!(clock_hour("06:05"), Some(6));
        assert_eq!(clock_hour(""), None);
    }
}
