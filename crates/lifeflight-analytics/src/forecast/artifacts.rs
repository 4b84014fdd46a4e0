//! Serialized forms of the trained forecasting models.
//!
//! Training happens offline. An artifact is a JSON document tagged with the
//! model kind; each kind carries just enough state to replay its forecast.

use chrono::{Datelike, NaiveDate};
use lifeflight_domain::ForecastModelKind;
use serde::{Deserialize, Serialize};

use super::{month_end, DemandModel, RawForecast};
use crate::error::BoxError;

/// A trained model as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelArtifact {
    Prophet(ProphetArtifact),
    Arima(ArimaArtifact),
}

impl ModelArtifact {
    #[must_use]
    pub const fn kind(&self) -> ForecastModelKind {
        match self {
            Self::Prophet(_) => ForecastModelKind::Prophet,
            Self::Arima(_) => ForecastModelKind::Arima,
        }
    }

    #[must_use]
    pub fn into_model(self) -> Box<dyn DemandModel> {
        match self {
            Self::Prophet(a) => Box::new(a),
            Self::Arima(a) => Box::new(a),
        }
    }
}

/// Additive trend plus monthly seasonality.
///
/// The interval half-width grows with the square root of the number of
/// steps past the training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProphetArtifact {
    /// Month the trend is anchored at (t = 0)
    pub origin: NaiveDate,
    pub intercept: f64,
    pub slope_per_month: f64,
    /// Additive offsets for January through December
    pub seasonality: Vec<f64>,
    /// Half-width of the interval one step ahead
    pub interval_width: f64,
}

impl DemandModel for ProphetArtifact {
    fn predict(&self, start: NaiveDate, months: u32) -> Result<Vec<RawForecast>, BoxError> {
        if self.seasonality.len() != 12 {
            return Err(format!(
                "prophet artifact has {} seasonal terms, expected 12",
                self.seasonality.len()
            )
            .into());
        }

        (0..months)
            .map(|step| {
                let date = month_end(start, step).ok_or("forecast date out of range")?;
                let t = months_between(self.origin, date);
                let seasonal = self.seasonality[date.month0() as usize];
                let estimate = self.intercept + self.slope_per_month * t + seasonal;
                let half_width = self.interval_width * f64::from(step + 1).sqrt();
                Ok(RawForecast {
                    date,
                    estimate,
                    lower: estimate - half_width,
                    upper: estimate + half_width,
                })
            })
            .collect()
    }
}

/// Precomputed forecast path with its confidence intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaArtifact {
    pub predicted_mean: Vec<f64>,
    /// `[lower, upper]` per step
    pub conf_int: Vec<[f64; 2]>,
}

impl DemandModel for ArimaArtifact {
    fn predict(&self, start: NaiveDate, months: u32) -> Result<Vec<RawForecast>, BoxError> {
        let wanted = months as usize;
        if self.predicted_mean.len() < wanted || self.conf_int.len() < wanted {
            return Err(format!(
                "unexpected arima artifact shape: {} means and {} intervals for {wanted} steps",
                self.predicted_mean.len(),
                self.conf_int.len()
            )
            .into());
        }

        self.predicted_mean
            .iter()
            .zip(&self.conf_int)
            .take(wanted)
            .zip(0..months)
            .map(|((&estimate, &[lower, upper]), step)| {
                Ok(RawForecast {
                    date: month_end(start, step).ok_or("forecast date out of range")?,
                    estimate,
                    lower,
                    upper,
                })
            })
            .collect()
    }
}

fn months_between(from: NaiveDate, to: NaiveDate) -> f64 {
    let months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    f64::from(months)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn prophet() -> ProphetArtifact {
        let mut seasonality = vec![0.0; 12];
        seasonality[0] = -5.0;
        seasonality[6] = 12.0;
        ProphetArtifact {
            origin: ymd(2012, 1, 1),
            intercept: 300.0,
            slope_per_month: 0.5,
            seasonality,
            interval_width: 20.0,
        }
    }

    #[test]
    fn test_prophet_trend_and_season() {
        let out = prophet().predict(ymd(2024, 1, 1), 12).unwrap();
        assert_eq!(out.len(), 12);

        // 2024-01 is 144 months after origin
        let jan = out[0];
        assert_eq!(jan.date, ymd(2024, 1, 31));
        assert!((jan.estimate - (300.0 + 72.0 - 5.0)).abs() < 1e-9);
        assert!((jan.upper - jan.estimate - 20.0).abs() < 1e-9);

        let jul = out[6];
        assert!((jul.estimate - (300.0 + 75.0 + 12.0)).abs() < 1e-9);
        assert!(out[11].upper - out[11].lower > jan.upper - jan.lower);
    }

    #[test]
    fn test_prophet_rejects_bad_seasonality() {
        let mut artifact = prophet();
        artifact.seasonality.pop();
        assert!(artifact.predict(ymd(2024, 1, 1), 12).is_err());
    }

    #[test]
    fn test_arima_replays_stored_path() {
        let artifact = ArimaArtifact {
            predicted_mean: vec![410.2, 398.7, 405.0],
            conf_int: vec![[380.0, 440.0], [360.0, 437.0], [362.5, 447.5]],
        };
        let out = artifact.predict(ymd(2024, 1, 1), 2).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].date, ymd(2024, 2, 29));
        assert_eq!(out[1].lower, 360.0);

        let err = artifact.predict(ymd(2024, 1, 1), 12).unwrap_err();
        assert!(err.to_string().contains("unexpected arima artifact shape"));
    }

    #[test]
    fn test_artifact_json_is_tagged() {
        let json = r#"{"kind":"arima","predicted_mean":[1.0],"conf_int":[[0.0,2.0]]}"#;
        let artifact: ModelArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.kind(), ForecastModelKind::Arima);
        assert_eq!(artifact.into_model().predict(ymd(2024, 1, 1), 1).unwrap().len(), 1);
    }
}
