//! Demand forecasting: historical monthly counts followed by model output.
//!
//! Models are opaque. The adapter only validates the request, asks a
//! [`ModelStore`] for the trained artifact, and turns whatever the model
//! predicts into integer counts.

pub mod artifacts;

use chrono::{Datelike, Months, NaiveDate};
use lifeflight_domain::{ForecastModelKind, MissionRecord};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{AnalyticsError, BoxError, Result};
use crate::time::parse_trip_date;

pub use artifacts::{ArimaArtifact, ModelArtifact, ProphetArtifact};

pub const MIN_HORIZON_YEARS: i64 = 1;
pub const MAX_HORIZON_YEARS: i64 = 10;

/// A validated forecast request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastRequest {
    pub model: ForecastModelKind,
    pub horizon_years: u32,
}

impl ForecastRequest {
    /// Validate the horizon; fails before any artifact is touched.
    pub fn new(model: ForecastModelKind, horizon_years: i64) -> Result<Self> {
        if !(MIN_HORIZON_YEARS..=MAX_HORIZON_YEARS).contains(&horizon_years) {
            return Err(AnalyticsError::InvalidParameter(format!(
                "Prediction years must be between {MIN_HORIZON_YEARS} and {MAX_HORIZON_YEARS}, current value: {horizon_years}"
            )));
        }
        let horizon_years = u32::try_from(horizon_years)
            .map_err(|e| AnalyticsError::InvalidParameter(e.to_string()))?;
        Ok(Self {
            model,
            horizon_years,
        })
    }

    /// Validate a model name and horizon as received from a caller.
    pub fn parse(model: &str, horizon_years: i64) -> Result<Self> {
        Self::new(model.parse()?, horizon_years)
    }

    #[must_use]
    pub const fn horizon_months(&self) -> u32 {
        self.horizon_years * 12
    }
}

/// One month of model output before rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawForecast {
    pub date: NaiveDate,
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
}

/// A trained forecasting model.
pub trait DemandModel: Send + Sync {
    /// Predict `months` consecutive months beginning with the month of
    /// `start`.
    fn predict(&self, start: NaiveDate, months: u32) -> std::result::Result<Vec<RawForecast>, BoxError>;
}

/// Source of trained models.
///
/// Implementations report a missing artifact as [`AnalyticsError::NotFound`]
/// and an unreadable one as [`AnalyticsError::PredictionFailed`].
pub trait ModelStore: Send + Sync {
    fn load(&self, kind: ForecastModelKind) -> Result<Box<dyn DemandModel>>;
}

/// Observed missions in one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoricalPoint {
    /// First day of the month
    pub date: NaiveDate,
    pub count: u64,
}

/// Predicted missions in one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_count: i64,
    pub lower_bound: i64,
    pub upper_bound: i64,
}

/// History and forecast, ready to plot on one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemandForecast {
    pub model_type: ForecastModelKind,
    pub historical: Vec<HistoricalPoint>,
    pub forecast: Vec<ForecastPoint>,
    pub total_points: usize,
}

/// First day of the month containing `date`.
#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month `offset` months after the month of `start`.
#[must_use]
pub fn month_end(start: NaiveDate, offset: u32) -> Option<NaiveDate> {
    month_start(start)
        .checked_add_months(Months::new(offset + 1))?
        .pred_opt()
}

/// Monthly mission counts up to and including the cutoff month.
#[must_use]
pub fn monthly_history(records: &[MissionRecord], cutoff: NaiveDate) -> Vec<HistoricalPoint> {
    let cutoff = month_start(cutoff);
    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for date in records.iter().filter_map(|r| r.trip_date.as_deref().and_then(parse_trip_date)) {
        let month = month_start(date);
        if month <= cutoff {
            *counts.entry(month).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(date, count)| HistoricalPoint { date, count })
        .collect()
}

/// Combine history up to `cutoff` with `horizon_months` of model output
/// starting the month after it.
pub fn forecast(
    records: &[MissionRecord],
    store: &dyn ModelStore,
    request: &ForecastRequest,
    cutoff: NaiveDate,
) -> Result<DemandForecast> {
    let historical = monthly_history(records, cutoff);

    let model = store.load(request.model)?;
    let start = month_start(cutoff)
        .checked_add_months(Months::new(1))
        .ok_or_else(|| AnalyticsError::InvalidParameter(format!("cutoff out of range: {cutoff}")))?;
    let months = request.horizon_months();

    let raw = model
        .predict(start, months)
        .map_err(AnalyticsError::PredictionFailed)?;
    if raw.len() != months as usize {
        return Err(AnalyticsError::prediction(format!(
            "model returned {} points, expected {months}",
            raw.len()
        )));
    }

    let forecast = raw
        .iter()
        .map(round_point)
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        model = request.model.as_str(),
        horizon_months = months,
        historical_points = historical.len(),
        first_forecast = %start,
        "Demand forecast produced"
    );

    Ok(DemandForecast {
        model_type: request.model,
        total_points: historical.len() + forecast.len(),
        historical,
        forecast,
    })
}

fn round_point(raw: &RawForecast) -> Result<ForecastPoint> {
    Ok(ForecastPoint {
        date: raw.date,
        predicted_count: round_count(raw.estimate)?,
        lower_bound: round_count(raw.lower)?,
        upper_bound: round_count(raw.upper)?,
    })
}

/// Counts are whole missions; halves round to even.
fn round_count(value: f64) -> Result<i64> {
    if !value.is_finite() {
        return Err(AnalyticsError::prediction(format!(
            "model produced a non-finite value: {value}"
        )));
    }
    Ok(value.round_ties_even() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use std::path::PathBuf;

    struct FixedModel(Vec<f64>);

    impl DemandModel for FixedModel {
        fn predict(&self, start: NaiveDate, months: u32) -> std::result::Result<Vec<RawForecast>, BoxError> {
            (0..months)
                .map(|i| {
                    let value = *self
                        .0
                        .get(i as usize)
                        .ok_or("not enough values")?;
                    Ok(RawForecast {
                        date: month_end(start, i).ok_or("date overflow")?,
                        estimate: value,
                        lower: value - 10.0,
                        upper: value + 10.0,
                    })
                })
                .collect()
        }
    }

    struct StaticStore(Option<Vec<f64>>);

    impl ModelStore for StaticStore {
        fn load(&self, kind: ForecastModelKind) -> Result<Box<dyn DemandModel>> {
            match &self.0 {
                Some(values) => Ok(Box::new(FixedModel(values.clone()))),
                None => Err(AnalyticsError::NotFound {
                    artifact: "Model file",
                    path: PathBuf::from(format!("model/model_{kind}.json")),
                }),
            }
        }
    }

    fn on(date: &str) -> MissionRecord {
        MissionRecord {
            trip_date: Some(date.into()),
            ..Default::default()
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_request_validation() {
        assert!(ForecastRequest::parse("prophet", 1).is_ok());
        assert!(ForecastRequest::parse("ARIMA", 10).is_ok());

        let err = ForecastRequest::parse("prophet", 11).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::BadInput);
        assert!(ForecastRequest::parse("prophet", 0).is_err());
        let err = ForecastRequest::parse("lstm", 2).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::BadInput);

        assert_eq!(ForecastRequest::parse("arima", 2).unwrap().horizon_months(), 24);
    }

    #[test]
    fn test_month_end_dates() {
        assert_eq!(month_end(ymd(2024, 1, 1), 0), Some(ymd(2024, 1, 31)));
        assert_eq!(month_end(ymd(2024, 1, 1), 1), Some(ymd(2024, 2, 29)));
        assert_eq!(month_end(ymd(2024, 1, 15), 11), Some(ymd(2024, 12, 31)));
    }

    #[test]
    fn test_history_stops_at_cutoff() {
        let records = vec![
            on("2023-11-02"),
            on("2023-11-20"),
            on("2023-12-31"),
            on("2024-01-01"),
            on("garbage"),
            on("2012-07-04"),
        ];
        let history = monthly_history(&records, ymd(2023, 12, 1));
        assert_eq!(
            history,
            vec![
                HistoricalPoint { date: ymd(2012, 7, 1), count: 1 },
                HistoricalPoint { date: ymd(2023, 11, 1), count: 2 },
                HistoricalPoint { date: ymd(2023, 12, 1), count: 1 },
            ]
        );
    }

    #[test]
    fn test_forecast_merges_and_rounds() {
        let values: Vec<f64> = (0..12).map(|i| 100.5 + f64::from(i)).collect();
        let store = StaticStore(Some(values));
        let request = ForecastRequest::parse("prophet", 1).unwrap();
        let result = forecast(&[on("2023-12-05")], &store, &request, ymd(2023, 12, 1)).unwrap();

        assert_eq!(result.model_type, ForecastModelKind::Prophet);
        assert_eq!(result.historical.len(), 1);
        assert_eq!(result.forecast.len(), 12);
        assert_eq!(result.total_points, 13);

        let first = result.forecast[0];
        assert_eq!(first.date, ymd(2024, 1, 31));
        // 100.5 -> 100, 101.5 -> 102
        assert_eq!(first.predicted_count, 100);
        assert_eq!(result.forecast[1].predicted_count, 102);
        assert_eq!(first.lower_bound, 90);
        assert_eq!(first.upper_bound, 110);
    }

    #[test]
    fn test_missing_model_is_not_found() {
        let request = ForecastRequest::parse("prophet", 1).unwrap();
        let err = forecast(&[], &StaticStore(None), &request, ymd(2023, 12, 1)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_model_failure_is_computation_error() {
        let store = StaticStore(Some(vec![1.0; 3]));
        let request = ForecastRequest::parse("arima", 1).unwrap();
        let err = forecast(&[], &store, &request, ymd(2023, 12, 1)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Computation);
        assert!(err.to_string().contains("not enough values"));
    }

    #[test]
    fn test_non_finite_output_rejected() {
        let store = StaticStore(Some(vec![f64::NAN; 12]));
        let request = ForecastRequest::parse("arima", 1).unwrap();
        let err = forecast(&[], &store, &request, ymd(2023, 12, 1)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Computation);
    }
}
