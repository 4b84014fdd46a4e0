//! # LifeFlight Operational Analytics - Domain Model
//!
//! Mission records and the request vocabulary shared by the analytics core,
//! the loaders and the REST surface. Records are kept as the raw text the
//! dispatch export provides; parsing belongs to the analytics pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Statuses that mark a mission as successfully completed.
pub const SUCCESSFUL_STATUSES: [&str; 4] = ["Closed", "Billed", "Verified", "Complete"];

/// Literal the dispatch export writes when a mission was not cancelled.
pub const NO_CANCEL_REASON: &str = "<NONE>";

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// A column value that may be missing from the export schema altogether.
///
/// `NotInSchema` and `Null` are deliberately different: a dataset without a
/// `Status` column says nothing about mission outcomes, while an empty
/// `Status` cell on a dataset that has one is an unknown outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// The column does not exist in the source.
    #[default]
    NotInSchema,
    /// The column exists but this row has no value.
    Null,
    /// The column exists and holds a value.
    Value(String),
}

impl FieldValue {
    /// Build from a column that is known to exist.
    #[must_use]
    pub fn from_cell(cell: Option<String>) -> Self {
        cell.map_or(Self::Null, Self::Value)
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v.as_str()),
            Self::NotInSchema | Self::Null => None,
        }
    }

    #[must_use]
    pub const fn in_schema(&self) -> bool {
        !matches!(self, Self::NotInSchema)
    }
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// One dispatched air-ambulance mission, as exported.
///
/// Immutable input: analytics derive working values from it but never write
/// back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MissionRecord {
    pub incident_number: Option<String>,

    // Pickup location
    pub pickup_city: Option<String>,
    pub pickup_county: Option<String>,
    pub pickup_state: Option<String>,

    // Raw temporal fields
    pub trip_date: Option<String>,
    pub dispatch_time: Option<String>,
    pub enroute_time: Option<String>,

    // Outcome
    pub status: FieldValue,
    pub cancel_reason: FieldValue,
}

impl MissionRecord {
    /// Location field matching a location level. `System` has none.
    #[must_use]
    pub fn location(&self, level: LocationLevel) -> Option<&str> {
        match level {
            LocationLevel::System => None,
            LocationLevel::State => self.pickup_state.as_deref(),
            LocationLevel::County => self.pickup_county.as_deref(),
            LocationLevel::City => self.pickup_city.as_deref(),
        }
    }
}

// =============================================================================
// ENUMS
// =============================================================================

/// Geographic scope of a seasonality query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationLevel {
    #[default]
    System,
    State,
    County,
    City,
}

impl LocationLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::State => "state",
            Self::County => "county",
            Self::City => "city",
        }
    }
}

/// Period bucket for incident rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Month,
    Week,
    Year,
}

impl Aggregation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Week => "week",
            Self::Year => "year",
        }
    }
}

/// How sigma is estimated for control limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControlMethod {
    /// Sample standard deviation of the rate series
    #[default]
    #[serde(rename = "3sigma")]
    ThreeSigma,
    /// Average moving range over d2
    #[serde(rename = "individual")]
    Individual,
}

impl ControlMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeSigma => "3sigma",
            Self::Individual => "individual",
        }
    }
}

/// Pre-trained demand forecasting models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastModelKind {
    Prophet,
    Arima,
}

impl ForecastModelKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Prophet => "prophet",
            Self::Arima => "arima",
        }
    }
}

/// Which control limit an out-of-control period crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CauseType {
    AboveUcl,
    BelowLcl,
}

impl CauseType {
    /// Short label of the violated limit.
    pub const fn violation(&self) -> &'static str {
        match self {
            Self::AboveUcl => "UCL",
            Self::BelowLcl => "LCL",
        }
    }
}

macro_rules! impl_vocabulary {
    ($ty:ty, $field:literal, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                [$($variant),+]
                    .into_iter()
                    .find(|v: &$ty| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| DomainError::InvalidValue {
                        field: $field,
                        value: s.to_string(),
                        expected: [$($variant.as_str()),+].join(", "),
                    })
            }
        }
    };
}

impl_vocabulary!(
    LocationLevel,
    "location_level",
    [
        LocationLevel::System,
        LocationLevel::State,
        LocationLevel::County,
        LocationLevel::City,
    ]
);
impl_vocabulary!(
    Aggregation,
    "aggregation",
    [Aggregation::Month, Aggregation::Week, Aggregation::Year]
);
impl_vocabulary!(
    ControlMethod,
    "method",
    [ControlMethod::ThreeSigma, ControlMethod::Individual]
);
impl_vocabulary!(
    ForecastModelKind,
    "model",
    [ForecastModelKind::Prophet, ForecastModelKind::Arima]
);

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid {field}: '{value}' (expected one of: {expected})")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: String,
    },
}
