//! Seasonality heatmap: missions per (month, weekday, hour) cell.
//!
//! The hour comes from the enroute clock, i.e. when the crew actually
//! launched, not when the call came in. A mission without a usable enroute
//! clock has no hour and is left out of the heatmap entirely.

use chrono::{Datelike, NaiveDate};
use lifeflight_domain::{LocationLevel, MissionRecord};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::population::{PopulationStrategy, PopulationTable};
use crate::time::{clock_hour, parse_trip_date};

/// Monday-first weekday names.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const DAYS_PER_YEAR: f64 = 365.25;

/// Heatmap request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeatmapQuery {
    pub year: i32,
    pub location_level: LocationLevel,
    pub location_value: Option<String>,
    /// Restrict to one month and collapse the month dimension.
    pub month: Option<u32>,
}

impl HeatmapQuery {
    #[must_use]
    pub fn system(year: i32) -> Self {
        Self {
            year,
            ..Default::default()
        }
    }

    fn matches_location(&self, record: &MissionRecord) -> bool {
        let Some(wanted) = self.location_value.as_deref() else {
            return true;
        };
        if self.location_level == LocationLevel::System {
            return true;
        }
        record
            .location(self.location_level)
            .is_some_and(|actual| actual.to_uppercase() == wanted.to_uppercase())
    }
}

/// One heatmap cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    pub weekday: u32,
    pub weekday_name: &'static str,
    pub hour: u32,
    pub count: u64,
    pub missions_per_1000: f64,
}

/// Observed trip-date span of the aggregated missions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Context reported next to the cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapMetadata {
    pub year: i32,
    pub location_level: LocationLevel,
    pub location_value: Option<String>,
    pub month: Option<u32>,
    pub population: u64,
    pub population_source: PopulationStrategy,
    pub population_estimated: bool,
    pub total_missions: u64,
    pub avg_missions_per_day: f64,
    pub date_range: DateRange,
}

/// Heatmap cells plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalityHeatmap {
    pub heatmap_data: Vec<HeatmapCell>,
    pub metadata: HeatmapMetadata,
}

/// Build the seasonality heatmap for one year and location filter.
#[must_use]
pub fn seasonality_heatmap(
    records: &[MissionRecord],
    query: &HeatmapQuery,
    populations: &PopulationTable,
) -> SeasonalityHeatmap {
    let mut counts: BTreeMap<(Option<u32>, u32, u32), u64> = BTreeMap::new();
    let mut range = DateRange::default();
    let mut total_missions = 0_u64;

    for record in records {
        let Some(date) = record.trip_date.as_deref().and_then(parse_trip_date) else {
            continue;
        };
        if date.year() != query.year || !query.matches_location(record) {
            continue;
        }
        let Some(hour) = record.enroute_time.as_deref().and_then(clock_hour) else {
            continue;
        };
        let month = date.month();
        if query.month.is_some_and(|m| m != month) {
            continue;
        }

        let weekday = date.weekday().num_days_from_monday();
        let month_key = query.month.is_none().then_some(month);
        *counts.entry((month_key, weekday, hour)).or_default() += 1;

        total_missions += 1;
        range.start = Some(range.start.map_or(date, |s| s.min(date)));
        range.end = Some(range.end.map_or(date, |e| e.max(date)));
    }

    let estimate = populations.resolve(
        query.year,
        query.location_level,
        query.location_value.as_deref(),
    );
    let population = estimate.population as f64;

    let heatmap_data = counts
        .into_iter()
        .map(|((month, weekday, hour), count)| HeatmapCell {
            month,
            weekday,
            weekday_name: WEEKDAY_NAMES[weekday as usize],
            hour,
            count,
            missions_per_1000: count as f64 / population * 1000.0,
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        year = query.year,
        level = query.location_level.as_str(),
        cells = heatmap_data.len(),
        total_missions,
        population = estimate.population,
        "Built seasonality heatmap"
    );

    SeasonalityHeatmap {
        heatmap_data,
        metadata: HeatmapMetadata {
            year: query.year,
            location_level: query.location_level,
            location_value: query.location_value.clone(),
            month: query.month,
            population: estimate.population,
            population_source: estimate.strategy,
            population_estimated: estimate.estimated,
            total_missions,
            avg_missions_per_day: round2(total_missions as f64 / DAYS_PER_YEAR),
            date_range: range,
        },
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
