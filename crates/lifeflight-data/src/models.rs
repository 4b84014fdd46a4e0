//! File-backed store of trained forecast models.

use lifeflight_analytics::{AnalyticsError, DemandModel, ModelArtifact, ModelStore};
use lifeflight_domain::ForecastModelKind;
use std::path::{Path, PathBuf};

use crate::error::{DataError, Result};

/// Reads `model_<kind>.json` artifacts from a directory.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    model_dir: PathBuf,
}

impl FileModelStore {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    #[must_use]
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    #[must_use]
    pub fn artifact_path(&self, kind: ForecastModelKind) -> PathBuf {
        self.model_dir.join(format!("model_{kind}.json"))
    }

    /// Read and check the artifact of one model kind.
    pub fn read_artifact(&self, kind: ForecastModelKind) -> Result<ModelArtifact> {
        if !self.model_dir.is_dir() {
            return Err(DataError::NotFound {
                artifact: "Model directory",
                path: self.model_dir.clone(),
            });
        }
        let path = self.artifact_path(kind);
        if !path.is_file() {
            return Err(DataError::NotFound {
                artifact: "Model file",
                path,
            });
        }

        let artifact: ModelArtifact = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        if artifact.kind() != kind {
            return Err(DataError::InvalidArtifact(format!(
                "{} holds a {} model, expected {kind}",
                path.display(),
                artifact.kind()
            )));
        }

        tracing::debug!(model = kind.as_str(), path = %path.display(), "Model artifact loaded");
        Ok(artifact)
    }
}

impl ModelStore for FileModelStore {
    fn load(&self, kind: ForecastModelKind) -> lifeflight_analytics::Result<Box<dyn DemandModel>> {
        self.read_artifact(kind)
            .map(ModelArtifact::into_model)
            .map_err(AnalyticsError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lifeflight_analytics::{forecast, ErrorCategory, ForecastRequest};
    use std::fs;

    const ARIMA_ONE_YEAR: &str = r#"{
        "kind": "arima",
        "predicted_mean": [410.2, 398.7, 405.0, 420.5, 431.0, 445.9, 460.1, 455.3, 430.8, 415.2, 400.0, 402.5],
        "conf_int": [[380,440],[360,437],[362,448],[370,471],[375,487],[380,512],
                     [390,530],[380,531],[350,512],[330,500],[310,490],[305,500]]
    }"#;

    fn store_with(file: &str, contents: &str) -> (tempfile::TempDir, FileModelStore) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(file), contents).unwrap();
        let store = FileModelStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_missing_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing_dir = FileModelStore::new(dir.path().join("model"));
        let err = missing_dir.load(ForecastModelKind::Prophet).err().unwrap();
        assert_eq!(err.category(), ErrorCategory::NotFound);

        let missing_file = FileModelStore::new(dir.path());
        let err = missing_file.load(ForecastModelKind::Arima).err().unwrap();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.to_string().contains("model_arima.json"));
    }

    #[test]
    fn test_corrupt_artifact_is_computation_error() {
        let (_dir, store) = store_with("model_prophet.json", "{not json");
        let err = store.load(ForecastModelKind::Prophet).err().unwrap();
        assert_eq!(err.category(), ErrorCategory::Computation);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let (_dir, store) = store_with("model_prophet.json", ARIMA_ONE_YEAR);
        let err = store.read_artifact(ForecastModelKind::Prophet).unwrap_err();
        assert!(matches!(err, DataError::InvalidArtifact(_)));
    }

    #[test]
    fn test_forecast_from_stored_arima() {
        let (_dir, store) = store_with("model_arima.json", ARIMA_ONE_YEAR);
        let cutoff = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();

        let one_year = ForecastRequest::parse("arima", 1).unwrap();
        let result = forecast(&[], &store, &one_year, cutoff).unwrap();
        assert_eq!(result.forecast.len(), 12);
        assert_eq!(result.forecast[0].predicted_count, 410);
        assert_eq!(result.forecast[0].date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        // Only twelve steps are stored.
        let two_years = ForecastRequest::parse("arima", 2).unwrap();
        let err = forecast(&[], &store, &two_years, cutoff).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Computation);
    }
}
