//! Incident classification and per-period incident rates.
//!
//! A mission counts as an incident when any of three independent
//! conditions holds: its response time is anomalous, its status is not a
//! successful one, or it was cancelled. Each condition is tallied on its own
//! for the breakdown, but a mission is counted once in `incidents`.

use chrono::{Datelike, NaiveDate};
use lifeflight_domain::{Aggregation, FieldValue, MissionRecord, NO_CANCEL_REASON, SUCCESSFUL_STATUSES};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::stats::quantile;
use crate::time::MissionTimes;

/// Response times above this many minutes are always anomalous.
pub const RT_ANOMALY_CAP_MINUTES: f64 = 30.0;
/// Percentile of observed response times used as the adaptive threshold.
pub const RT_ANOMALY_QUANTILE: f64 = 0.75;

/// Per-mission quality flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IncidentFlags {
    pub rt_anomaly: bool,
    pub status_failed: bool,
    pub cancelled: bool,
}

impl IncidentFlags {
    /// Classify one mission against the response-time threshold.
    #[must_use]
    pub fn classify(record: &MissionRecord, response_minutes: Option<f64>, threshold: Option<f64>) -> Self {
        let rt_anomaly = match (response_minutes, threshold) {
            (Some(minutes), Some(limit)) => minutes > limit,
            _ => false,
        };
        Self {
            rt_anomaly,
            status_failed: status_failed(&record.status),
            cancelled: cancelled(&record.cancel_reason),
        }
    }

    #[must_use]
    pub const fn is_incident(&self) -> bool {
        self.rt_anomaly || self.status_failed || self.cancelled
    }
}

/// A status outside the success whitelist is a failure. A dataset with no
/// status column has no failures.
#[must_use]
pub fn status_failed(status: &FieldValue) -> bool {
    match status {
        FieldValue::NotInSchema => false,
        FieldValue::Null => true,
        FieldValue::Value(s) => !SUCCESSFUL_STATUSES.contains(&s.as_str()),
    }
}

/// Cancelled iff a cancel reason is present and is not the `<NONE>` sentinel.
#[must_use]
pub fn cancelled(reason: &FieldValue) -> bool {
    match reason {
        FieldValue::NotInSchema | FieldValue::Null => false,
        FieldValue::Value(s) => s != NO_CANCEL_REASON,
    }
}

/// `min(p75, 30 min)` over all defined durations; `None` when there are none.
#[must_use]
pub fn response_time_threshold(minutes: &[Option<f64>]) -> Option<f64> {
    let valid: Vec<f64> = minutes.iter().flatten().copied().collect();
    quantile(&valid, RT_ANOMALY_QUANTILE).map(|p| p.min(RT_ANOMALY_CAP_MINUTES))
}

/// Sortable period bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Year(i32),
    Month { year: i32, month: u32 },
    /// ISO 8601 week
    Week { year: i32, week: u32 },
}

impl PeriodKey {
    #[must_use]
    pub fn of(date: NaiveDate, aggregation: Aggregation) -> Self {
        match aggregation {
            Aggregation::Year => Self::Year(date.year()),
            Aggregation::Month => Self::Month {
                year: date.year(),
                month: date.month(),
            },
            Aggregation::Week => {
                let iso = date.iso_week();
                Self::Week {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
        }
    }

    /// `2023`, `2023-06` or `2023-W24`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Year(year) => year.to_string(),
            Self::Month { year, month } => format!("{year}-{month:02}"),
            Self::Week { year, week } => format!("{year}-W{week:02}"),
        }
    }
}

/// Independently tallied incident conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IncidentBreakdown {
    pub cancelled: u64,
    pub status_failed: u64,
    pub rt_anomaly: u64,
}

/// Incident statistics of one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAggregate {
    pub period: String,
    /// Earliest trip date in the period
    pub date: NaiveDate,
    pub total_missions: u64,
    pub incidents: u64,
    /// Percentage of missions that were incidents
    pub incident_rate: f64,
    #[serde(flatten)]
    pub breakdown: IncidentBreakdown,
}

#[derive(Default)]
struct PeriodAccumulator {
    first_date: Option<NaiveDate>,
    total: u64,
    incidents: u64,
    breakdown: IncidentBreakdown,
}

impl PeriodAccumulator {
    fn add(&mut self, date: NaiveDate, flags: IncidentFlags) {
        self.first_date = Some(self.first_date.map_or(date, |d| d.min(date)));
        self.total += 1;
        self.incidents += u64::from(flags.is_incident());
        self.breakdown.cancelled += u64::from(flags.cancelled);
        self.breakdown.status_failed += u64::from(flags.status_failed);
        self.breakdown.rt_anomaly += u64::from(flags.rt_anomaly);
    }
}

/// Incident rates per period, ascending by period.
///
/// The response-time threshold is derived from every record passed in, so
/// callers narrow the input (e.g. to a year range) before calling.
#[must_use]
pub fn incident_rate_by_period(records: &[MissionRecord], aggregation: Aggregation) -> Vec<PeriodAggregate> {
    let times: Vec<Option<MissionTimes>> = records.iter().map(MissionTimes::from_record).collect();
    let minutes: Vec<Option<f64>> = times
        .iter()
        .map(|t| t.and_then(|t| t.response_minutes()))
        .collect();
    let threshold = response_time_threshold(&minutes);
    tracing::debug!(
        threshold_minutes = threshold,
        aggregation = aggregation.as_str(),
        "Response-time anomaly threshold"
    );

    let mut periods: BTreeMap<PeriodKey, PeriodAccumulator> = BTreeMap::new();
    for ((record, times), minutes) in records.iter().zip(&times).zip(&minutes) {
        // No trip date, no period.
        let Some(times) = times else { continue };
        let flags = IncidentFlags::classify(record, *minutes, threshold);
        periods
            .entry(PeriodKey::of(times.trip_date, aggregation))
            .or_default()
            .add(times.trip_date, flags);
    }

    periods
        .into_iter()
        .filter_map(|(key, acc)| {
            let date = acc.first_date?;
            Some(PeriodAggregate {
                period: key.label(),
                date,
                total_missions: acc.total,
                incidents: acc.incidents,
                incident_rate: acc.incidents as f64 / acc.total as f64 * 100.0,
                breakdown: acc.breakdown,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mission(date: &str, dispatch: &str, enroute: &str, status: &str, cancel: &str) -> MissionRecord {
        MissionRecord {
            trip_date: Some(date.into()),
            dispatch_time: Some(dispatch.into()),
            enroute_time: Some(enroute.into()),
            status: FieldValue::Value(status.into()),
            cancel_reason: FieldValue::Value(cancel.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_rule() {
        assert!(!status_failed(&FieldValue::Value("Closed".into())));
        assert!(!status_failed(&FieldValue::Value("Verified".into())));
        assert!(status_failed(&FieldValue::Value("Aborted".into())));
        assert!(status_failed(&FieldValue::Value("closed".into())));
        assert!(status_failed(&FieldValue::Null));
        assert!(!status_failed(&FieldValue::NotInSchema));
    }

    #[test]
    fn test_cancel_rule() {
        assert!(!cancelled(&FieldValue::Value("<NONE>".into())));
        assert!(cancelled(&FieldValue::Value("Weather".into())));
        assert!(!cancelled(&FieldValue::Null));
        assert!(!cancelled(&FieldValue::NotInSchema));
    }

    #[test]
    fn test_threshold_is_capped() {
        let slow = [Some(40.0), Some(50.0), Some(60.0), Some(70.0), None];
        assert_eq!(response_time_threshold(&slow), Some(30.0));

        let fast = [Some(5.0), Some(10.0), Some(15.0), Some(20.0), Some(25.0)];
        assert_eq!(response_time_threshold(&fast), Some(20.0));

        assert_eq!(response_time_threshold(&[None, None]), None);
    }

    #[test]
    fn test_cancellation_alone_makes_incident() {
        let record = mission("2023-01-01", "08:00", "08:05", "Closed", "Patient expired");
        let flags = IncidentFlags::classify(&record, Some(5.0), Some(30.0));
        assert!(!flags.rt_anomaly);
        assert!(!flags.status_failed);
        assert!(flags.cancelled);
        assert!(flags.is_incident());
    }

    #[test]
    fn test_undefined_duration_never_anomalous() {
        let record = mission("2023-01-01", "", "", "Closed", "<NONE>");
        let flags = IncidentFlags::classify(&record, None, Some(0.0));
        assert!(!flags.is_incident());
    }

    #[test]
    fn test_incidents_are_a_union() {
        // 10, 20, 30, 40 min -> p75 = 32.5, capped to 30
        let records = vec![
            mission("2023-01-03", "08:00", "08:10", "Closed", "<NONE>"),
            mission("2023-01-04", "08:00", "08:20", "Billed", "<NONE>"),
            mission("2023-01-05", "08:00", "08:30", "Complete", "<NONE>"),
            // anomalous, failed and cancelled at once
            mission("2023-01-06", "08:00", "08:40", "Aborted", "Weather"),
        ];
        let periods = incident_rate_by_period(&records, Aggregation::Month);
        assert_eq!(periods.len(), 1);
        let jan = &periods[0];
        assert_eq!(jan.period, "2023-01");
        assert_eq!(jan.date, NaiveDate::from_ymd_opt(2023, 1, 3).unwrap());
        assert_eq!(jan.total_missions, 4);
        assert_eq!(jan.incidents, 1);
        assert_eq!(jan.incident_rate, 25.0);
        assert_eq!(
            jan.breakdown,
            IncidentBreakdown {
                cancelled: 1,
                status_failed: 1,
                rt_anomaly: 1
            }
        );
    }

    #[test]
    fn test_periods_sorted_and_undated_rows_dropped() {
        let records = vec![
            mission("2023-03-01", "08:00", "08:10", "Closed", "<NONE>"),
            mission("2022-11-01", "08:00", "08:10", "Closed", "<NONE>"),
            mission("not-a-date", "08:00", "08:10", "Closed", "<NONE>"),
            mission("2023-01-01", "08:00", "08:10", "Closed", "<NONE>"),
        ];
        let labels: Vec<String> = incident_rate_by_period(&records, Aggregation::Month)
            .into_iter()
            .map(|p| p.period)
            .collect();
        assert_eq!(labels, vec!["2022-11", "2023-01", "2023-03"]);

        let years = incident_rate_by_period(&records, Aggregation::Year);
        assert_eq!(years.len(), 2);
        assert_eq!(years[1].total_missions, 2);
    }

    #[test]
    fn test_iso_weeks() {
        // 2023-01-01 is a Sunday and belongs to ISO week 2022-W52
        let records = vec![
            mission("2023-01-01", "08:00", "08:10", "Closed", "<NONE>"),
            mission("2023-01-02", "08:00", "08:10", "Closed", "<NONE>"),
        ];
        let labels: Vec<String> = incident_rate_by_period(&records, Aggregation::Week)
            .into_iter()
            .map(|p| p.period)
            .collect();
        assert_eq!(labels, vec!["2022-W52", "2023-W01"]);
    }

    #[test]
    fn test_schema_without_outcome_columns() {
        let records = vec![MissionRecord {
            trip_date: Some("2023-05-05".into()),
            dispatch_time: Some("08:00".into()),
            enroute_time: Some("08:10".into()),
            ..Default::default()
        }];
        let periods = incident_rate_by_period(&records, Aggregation::Month);
        assert_eq!(periods[0].incidents, 0);
        assert_eq!(periods[0].incident_rate, 0.0);
    }

    #[test]
    fn test_breakdown_serializes_flat() {
        let records = vec![mission("2023-01-03", "08:00", "08:10", "Closed", "Weather")];
        let periods = incident_rate_by_period(&records, Aggregation::Month);
        let json = serde_json::to_value(&periods[0]).unwrap();
        assert_eq!(json["cancelled"], 1);
        assert_eq!(json["period"], "2023-01");
        assert_eq!(json["date"], "2023-01-03");
    }
}
