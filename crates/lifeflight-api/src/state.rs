//! # Application State
//!
//! Shared, read-only dependencies of the request handlers.

use lifeflight_analytics::{ModelStore, PopulationTable};
use lifeflight_data::{
    load_population_table, DataError, FileModelStore, MissionCsvLoader, MissionRepository, MissionSource,
};
use lifeflight_domain::MissionRecord;
use std::sync::Arc;

use crate::config::{AnalyticsSettings, Config};
use crate::error::{ApiError, ApiResult};

/// Application state for Axum handlers
#[derive(Clone)]
pub struct AppState {
    pub missions: Arc<dyn MissionSource>,
    pub population: Arc<PopulationTable>,
    pub models: Arc<dyn ModelStore>,
    pub settings: AnalyticsSettings,
}

impl AppState {
    pub fn new(
        missions: Arc<dyn MissionSource>,
        population: PopulationTable,
        models: Arc<dyn ModelStore>,
        settings: AnalyticsSettings,
    ) -> Self {
        Self {
            missions,
            population: Arc::new(population),
            models,
            settings,
        }
    }

    /// Wire the file-backed collaborators described by `config`.
    ///
    /// The population tables are read once here; the mission dataset is read
    /// per request according to the configured load strategy.
    pub fn from_config(config: &Config) -> Result<Self, DataError> {
        let data = &config.data;
        let loader = MissionCsvLoader::new(&data.data_path).with_encoding(data.encoding.clone());
        let missions = MissionRepository::new(loader, data.load_strategy);
        let population = load_population_table(&data.state_population_path, &data.county_population_path)?;
        let models = FileModelStore::new(&data.model_dir);

        tracing::info!(
            data_path = %data.data_path.display(),
            load_strategy = %data.load_strategy,
            model_dir = %data.model_dir.display(),
            population_loaded = !population.is_empty(),
            "Application state initialised"
        );

        Ok(Self::new(
            Arc::new(missions),
            population,
            Arc::new(models),
            config.analytics,
        ))
    }

    /// Load the dataset and run `work` on it off the async runtime.
    pub async fn with_records<T, F>(&self, work: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&AppState, &[MissionRecord]) -> ApiResult<T> + Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || {
            let records = state.missions.load()?;
            work(&state, &records)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("analytics task failed: {e}")))?
    }
}
