//! # LifeFlight Analytics
//!
//! Pure, synchronous pipeline over raw dispatch records.
//!
//! ## Features
//!
//! - Response-time averages with overnight correction
//! - Incident classification and per-period incident rates
//! - SPC control limits and assignable-cause detection
//! - Seasonality heatmaps normalized per 1,000 population
//! - Demand forecasts from pre-trained models
//!
//! Nothing here performs I/O. Records, population tables and trained models
//! are handed in by the caller.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod forecast;
pub mod incidents;
pub mod population;
pub mod reports;
pub mod response_time;
pub mod seasonality;
pub mod spc;
pub mod stats;
pub mod time;

pub use error::{AnalyticsError, BoxError, ErrorCategory, Result};
pub use forecast::{
    forecast, monthly_history, DemandForecast, DemandModel, ForecastPoint, ForecastRequest, HistoricalPoint,
    ModelArtifact, ModelStore, RawForecast,
};
pub use incidents::{incident_rate_by_period, IncidentBreakdown, IncidentFlags, PeriodAggregate};
pub use population::{PopulationEstimate, PopulationStrategy, PopulationTable};
pub use reports::{indicators, spc_report, Indicators, SpcReport, SpcRequest};
pub use response_time::{average_response_time, AverageResponseTime};
pub use seasonality::{seasonality_heatmap, HeatmapQuery, SeasonalityHeatmap};
pub use spc::{control_limits, identify_assignable_causes, AssignableCause, ControlLimits};
pub use time::MissionTimes;
