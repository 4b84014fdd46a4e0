//! Composite reports served to dashboards: the SPC chart and the headline
//! indicators.

use chrono::{DateTime, Datelike, Utc};
use lifeflight_domain::{Aggregation, ControlMethod, MissionRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::incidents::{incident_rate_by_period, PeriodAggregate};
use crate::response_time::{average_response_time, AverageResponseTime};
use crate::spc::{control_limits, identify_assignable_causes, AssignableCause, ControlLimits};
use crate::time::parse_trip_date;

pub const DEFAULT_SPC_START_YEAR: i32 = 2020;
pub const DEFAULT_SPC_END_YEAR: i32 = 2023;

/// Parameters of an SPC chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpcRequest {
    pub start_year: i32,
    pub end_year: i32,
    pub aggregation: Aggregation,
    pub method: ControlMethod,
}

impl Default for SpcRequest {
    fn default() -> Self {
        Self {
            start_year: DEFAULT_SPC_START_YEAR,
            end_year: DEFAULT_SPC_END_YEAR,
            aggregation: Aggregation::default(),
            method: ControlMethod::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpcMetadata {
    pub calculation_date: DateTime<Utc>,
    pub data_points: usize,
    pub total_periods: usize,
    pub total_missions: u64,
    pub total_incidents: u64,
    /// Incidents over missions across the whole range, in percent
    pub overall_rate: f64,
}

/// Incident-rate control chart over a year range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpcReport {
    pub start_year: i32,
    pub end_year: i32,
    pub aggregation: Aggregation,
    pub method: ControlMethod,
    pub data: Vec<PeriodAggregate>,
    pub control_limits: ControlLimits,
    pub assignable_causes: Vec<AssignableCause>,
    pub metadata: SpcMetadata,
}

/// Build the SPC chart for records whose trip year lies in
/// `[start_year, end_year]`.
#[must_use]
pub fn spc_report(records: &[MissionRecord], request: &SpcRequest) -> SpcReport {
    spc_report_at(records, request, Utc::now())
}

/// [`spc_report`] with an explicit calculation timestamp.
#[must_use]
pub fn spc_report_at(records: &[MissionRecord], request: &SpcRequest, now: DateTime<Utc>) -> SpcReport {
    let in_range: Vec<MissionRecord> = records
        .iter()
        .filter(|r| {
            r.trip_date
                .as_deref()
                .and_then(parse_trip_date)
                .is_some_and(|d| (request.start_year..=request.end_year).contains(&d.year()))
        })
        .cloned()
        .collect();

    let data = if in_range.is_empty() {
        Vec::new()
    } else {
        incident_rate_by_period(&in_range, request.aggregation)
    };

    let rates: Vec<f64> = data.iter().map(|p| p.incident_rate).collect();
    let limits = control_limits(&rates, request.method);
    let assignable_causes = identify_assignable_causes(&data, &limits);

    let total_missions: u64 = data.iter().map(|p| p.total_missions).sum();
    let total_incidents: u64 = data.iter().map(|p| p.incidents).sum();
    let overall_rate = if total_missions > 0 {
        total_incidents as f64 / total_missions as f64 * 100.0
    } else {
        0.0
    };

    tracing::info!(
        start_year = request.start_year,
        end_year = request.end_year,
        aggregation = request.aggregation.as_str(),
        method = request.method.as_str(),
        periods = data.len(),
        out_of_control = assignable_causes.len(),
        "SPC report computed"
    );

    SpcReport {
        start_year: request.start_year,
        end_year: request.end_year,
        aggregation: request.aggregation,
        method: request.method,
        metadata: SpcMetadata {
            calculation_date: now,
            data_points: data.len(),
            total_periods: data.len(),
            total_missions,
            total_incidents,
            overall_rate,
        },
        control_limits: limits,
        assignable_causes,
        data,
    }
}

impl SpcReport {
    /// Render the report as a Markdown document.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_markdown(&mut out);
        out
    }

    fn write_markdown(&self, out: &mut String) -> std::fmt::Result {
        let m = &self.metadata;
        writeln!(out, "# Safety SPC Report {}-{}", self.start_year, self.end_year)?;
        writeln!(out)?;
        writeln!(
            out,
            "Aggregation: {}, control method: {}, generated {}",
            self.aggregation,
            self.method,
            m.calculation_date.to_rfc3339()
        )?;
        writeln!(out)?;

        writeln!(out, "## Summary")?;
        writeln!(out)?;
        writeln!(out, "| Periods | Missions | Incidents | Overall rate |")?;
        writeln!(out, "|---:|---:|---:|---:|")?;
        writeln!(
            out,
            "| {} | {} | {} | {:.2}% |",
            m.total_periods, m.total_missions, m.total_incidents, m.overall_rate
        )?;
        writeln!(out)?;

        let l = &self.control_limits;
        writeln!(out, "## Control Limits")?;
        writeln!(out)?;
        writeln!(out, "- Mean: {:.2}%", l.mean)?;
        writeln!(out, "- UCL: {:.2}%", l.ucl)?;
        writeln!(out, "- LCL: {:.2}%", l.lcl)?;
        writeln!(out, "- Sigma: {:.2}", l.sigma)?;
        writeln!(out)?;

        writeln!(out, "## Assignable Causes")?;
        writeln!(out)?;
        if self.assignable_causes.is_empty() {
            writeln!(out, "All periods are within control limits.")?;
            return Ok(());
        }
        writeln!(
            out,
            "| Period | Rate | Violation | Missions | Incidents | Cancelled | Status failed | RT anomaly |"
        )?;
        writeln!(out, "|---|---:|---|---:|---:|---:|---:|---:|")?;
        for c in &self.assignable_causes {
            writeln!(
                out,
                "| {} | {:.2}% | {} | {} | {} | {} | {} | {} |",
                c.period,
                c.incident_rate,
                c.violation,
                c.total_missions,
                c.incidents,
                c.details.cancelled,
                c.details.status_failed,
                c.details.rt_anomaly
            )?;
        }
        Ok(())
    }
}

/// Headline numbers for the dashboard landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicators {
    /// Distinct incident numbers across the dataset
    pub total_missions: usize,
    /// Distinct pickup cities across the dataset
    pub total_cities_covered: usize,
    pub year: i32,
    pub month: u32,
    #[serde(rename = "mart")]
    pub monthly_avg_response_time: AverageResponseTime,
    #[serde(rename = "yart")]
    pub yearly_avg_response_time: AverageResponseTime,
}

#[must_use]
pub fn indicators(records: &[MissionRecord], year: i32, month: u32) -> Indicators {
    let total_missions = records
        .iter()
        .filter_map(|r| r.incident_number.as_deref())
        .collect::<BTreeSet<_>>()
        .len();
    let total_cities_covered = records
        .iter()
        .filter_map(|r| r.pickup_city.as_deref())
        .collect::<BTreeSet<_>>()
        .len();

    Indicators {
        total_missions,
        total_cities_covered,
        year,
        month,
        monthly_avg_response_time: average_response_time(records, year, Some(month)),
        yearly_avg_response_time: average_response_time(records, year, None),
    }
}
