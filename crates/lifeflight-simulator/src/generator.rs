//! Mission export generation.
//!
//! Produces rows shaped like the dispatch system's CSV export: text dates
//! and clock times, a status from the dispatch vocabulary, and the `<NONE>`
//! sentinel for missions that were not cancelled.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use lifeflight_domain::{NO_CANCEL_REASON, SUCCESSFUL_STATUSES};
use rand::distributions::{WeightedError, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal, Poisson};
use serde::Serialize;
use thiserror::Error;

use crate::towns::{TownPicker, STATE};

const MINUTES_PER_DAY: u32 = 24 * 60;
const MAX_RESPONSE_MINUTES: f64 = 120.0;

const CANCEL_REASONS: [&str; 4] = ["Weather", "Aircraft Maintenance", "Ground Transport", "Patient Expired"];
const FAILED_STATUSES: [&str; 3] = ["Aborted", "Diverted", "Open"];

/// Relative dispatch volume per hour of day.
const HOURLY_WEIGHTS: [u32; 24] = [
    3, 2, 2, 2, 2, 3, 4, 6, 8, 9, 10, 10, 10, 10, 10, 10, 9, 9, 8, 7, 6, 5, 4, 3,
];

/// One row of a mission export. Field names follow the export headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulatedMission {
    #[serde(rename = "Incident Number")]
    pub incident_number: String,
    #[serde(rename = "PU City")]
    pub pickup_city: String,
    #[serde(rename = "PU County")]
    pub pickup_county: String,
    #[serde(rename = "PU State")]
    pub pickup_state: String,
    #[serde(rename = "tdate")]
    pub trip_date: String,
    #[serde(rename = "disptime")]
    pub dispatch_time: String,
    #[serde(rename = "enrtime")]
    pub enroute_time: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Cancel Reason")]
    pub cancel_reason: String,
}

/// Scenario parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Mean missions per day (Poisson)
    pub missions_per_day: f64,
    /// Median dispatch-to-enroute minutes (log-normal)
    pub median_response_minutes: f64,
    /// Spread of the log-normal response time
    pub response_sigma: f64,
    /// Share of missions dispatched before and enroute after midnight
    pub overnight_share: f64,
    pub cancel_share: f64,
    /// Share of non-cancelled missions closed with a non-successful status
    pub failed_share: f64,
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            missions_per_day: 6.0,
            median_response_minutes: 12.0,
            response_sigma: 0.45,
            overnight_share: 0.02,
            cancel_share: 0.08,
            failed_share: 0.03,
            seed: 42,
        }
    }
}

/// Invalid scenario parameters
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("start date {start} is after end date {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    #[error("{name} must be between 0 and 1, got {value}")]
    Share { name: &'static str, value: f64 },

    #[error("invalid distribution parameter: {0}")]
    Distribution(String),

    #[error("invalid town weights: {0}")]
    Towns(#[from] WeightedError),
}

/// Deterministic generator of mission rows.
#[derive(Debug)]
pub struct MissionGenerator {
    config: ScenarioConfig,
    rng: StdRng,
    towns: TownPicker,
    daily_count: Poisson<f64>,
    response_minutes: LogNormal<f64>,
    hours: WeightedIndex<u32>,
    sequence: u32,
}

impl MissionGenerator {
    pub fn new(config: ScenarioConfig) -> Result<Self, ScenarioError> {
        if config.start > config.end {
            return Err(ScenarioError::EmptyRange {
                start: config.start,
                end: config.end,
            });
        }
        for (name, value) in [
            ("overnight_share", config.overnight_share),
            ("cancel_share", config.cancel_share),
            ("failed_share", config.failed_share),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScenarioError::Share { name, value });
            }
        }

        let daily_count =
            Poisson::new(config.missions_per_day).map_err(|e| ScenarioError::Distribution(e.to_string()))?;
        let response_minutes = LogNormal::new(config.median_response_minutes.ln(), config.response_sigma)
            .map_err(|e| ScenarioError::Distribution(e.to_string()))?;

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            towns: TownPicker::new()?,
            hours: WeightedIndex::new(HOURLY_WEIGHTS)?,
            daily_count,
            response_minutes,
            config,
            sequence: 0,
        })
    }

    /// Generate every mission of the scenario, in trip-date order.
    pub fn generate(&mut self) -> Vec<SimulatedMission> {
        let mut missions = Vec::new();
        let mut date = self.config.start;
        while date <= self.config.end {
            // Poisson samples are whole numbers carried as f64.
            let count = self.daily_count.sample(&mut self.rng) as u32;
            for _ in 0..count {
                missions.push(self.mission_on(date));
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        tracing::info!(
            start = %self.config.start,
            end = %self.config.end,
            missions = missions.len(),
            seed = self.config.seed,
            "Scenario generated"
        );
        missions
    }

    fn mission_on(&mut self, date: NaiveDate) -> SimulatedMission {
        self.sequence += 1;
        let town = self.towns.pick(&mut self.rng);

        let response = self
            .response_minutes
            .sample(&mut self.rng)
            .clamp(1.0, MAX_RESPONSE_MINUTES) as u32;
        let dispatch_minute = if self.rng.gen_bool(self.config.overnight_share) {
            // Dispatched shortly before midnight, enroute after it
            MINUTES_PER_DAY - self.rng.gen_range(1..=response)
        } else {
            let hour = self.hours.sample(&mut self.rng) as u32;
            let minute = hour * 60 + self.rng.gen_range(0..60);
            minute.min(MINUTES_PER_DAY - response - 1)
        };
        let enroute_minute = (dispatch_minute + response) % MINUTES_PER_DAY;

        let (status, cancel_reason) = if self.rng.gen_bool(self.config.cancel_share) {
            ("Cancelled", CANCEL_REASONS[self.rng.gen_range(0..CANCEL_REASONS.len())])
        } else if self.rng.gen_bool(self.config.failed_share) {
            (FAILED_STATUSES[self.rng.gen_range(0..FAILED_STATUSES.len())], NO_CANCEL_REASON)
        } else {
            (
                SUCCESSFUL_STATUSES[self.rng.gen_range(0..SUCCESSFUL_STATUSES.len())],
                NO_CANCEL_REASON,
            )
        };

        SimulatedMission {
            incident_number: format!("{:02}-{:06}", date.year() % 100, self.sequence),
            pickup_city: town.city.to_string(),
            pickup_county: town.county.to_string(),
            pickup_state: STATE.to_string(),
            trip_date: date.format("%Y-%m-%d").to_string(),
            dispatch_time: self.clock(dispatch_minute),
            enroute_time: self.clock(enroute_minute),
            status: status.to_string(),
            cancel_reason: cancel_reason.to_string(),
        }
    }

    /// `HH:MM:SS` with random seconds, as the export writes clock times.
    fn clock(&mut self, minute_of_day: u32) -> String {
        let second = self.rng.gen_range(0..60);
        NaiveTime::from_hms_opt(minute_of_day / 60, minute_of_day % 60, second)
            .map(|t| format!("{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second()))
            .unwrap_or_default()
    }
}
