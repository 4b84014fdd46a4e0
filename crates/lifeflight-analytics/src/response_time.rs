//! Dispatch-to-enroute response times.

use chrono::Duration;
use lifeflight_domain::MissionRecord;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::time::MissionTimes;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Average response time over a period, or "N/A" when no mission in the
/// period has both clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AverageResponseTime {
    Available(Duration),
    NotAvailable,
}

impl AverageResponseTime {
    #[must_use]
    pub fn minutes(&self) -> Option<f64> {
        match self {
            Self::Available(d) => d
                .num_nanoseconds()
                .map(|ns| ns as f64 / 60e9),
            Self::NotAvailable => None,
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl fmt::Display for AverageResponseTime {
    /// `0 days 00:15:00`, with a fractional part only when there is one.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Available(d) = self else {
            return f.write_str("N/A");
        };

        let total_secs = d.num_seconds();
        let nanos = d.subsec_nanos().unsigned_abs();
        let days = total_secs / 86_400;
        let rem = total_secs % 86_400;
        write!(
            f,
            "{days} days {:02}:{:02}:{:02}",
            rem / 3600,
            (rem % 3600) / 60,
            rem % 60
        )?;
        if nanos == 0 {
            Ok(())
        } else if nanos % 1000 == 0 {
            write!(f, ".{:06}", nanos / 1000)
        } else {
            write!(f, ".{nanos:09}")
        }
    }
}

impl Serialize for AverageResponseTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Average response time of missions in `year`, optionally narrowed to
/// `month`. Missions without a usable duration are left out, not counted as
/// zero.
#[must_use]
pub fn average_response_time(
    records: &[MissionRecord],
    year: i32,
    month: Option<u32>,
) -> AverageResponseTime {
    let durations: Vec<Duration> = records
        .iter()
        .filter_map(MissionTimes::from_record)
        .filter(|t| t.year() == year && month.is_none_or(|m| t.month() == m))
        .filter_map(|t| t.response_time())
        .collect();

    let result = mean_duration(&durations);
    tracing::debug!(
        year,
        month,
        samples = durations.len(),
        average = %result,
        "Computed average response time"
    );
    result
}

/// Response time in minutes for every record, in input order.
#[must_use]
pub fn response_minutes(records: &[MissionRecord]) -> Vec<Option<f64>> {
    records
        .iter()
        .map(|r| MissionTimes::from_record(r).and_then(|t| t.response_minutes()))
        .collect()
}

fn mean_duration(durations: &[Duration]) -> AverageResponseTime {
    if durations.is_empty() {
        return AverageResponseTime::NotAvailable;
    }

    let total: i128 = durations
        .iter()
        .map(|d| {
            i128::from(d.num_seconds()) * NANOS_PER_SEC + i128::from(d.subsec_nanos())
        })
        .sum();
    let mean = total / durations.len() as i128;

    i64::try_from(mean)
        .map(Duration::nanoseconds)
        .map_or(AverageResponseTime::NotAvailable, AverageResponseTime::Available)
}
