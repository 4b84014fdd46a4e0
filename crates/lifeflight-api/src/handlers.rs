//! # Request Handlers
//!
//! Query parameters are validated before any dataset or model is read.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use lifeflight_analytics::{
    average_response_time, forecast, indicators, seasonality_heatmap, spc_report, AverageResponseTime,
    DemandForecast, ForecastRequest, HeatmapQuery, Indicators, SeasonalityHeatmap, SpcReport, SpcRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::VERSION;

/// Success envelope shared by the data endpoints
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            status: "success",
            message: message.into(),
            data,
        })
    }
}

fn query<T>(extracted: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    extracted
        .map(|Query(q)| q)
        .map_err(|e| ApiError::InvalidInput(e.body_text()))
}

fn check_month(month: Option<u32>) -> ApiResult<Option<u32>> {
    match month {
        Some(m) if !(1..=12).contains(&m) => Err(ApiError::InvalidInput(format!(
            "month must be between 1 and 12, got {m}"
        ))),
        other => Ok(other),
    }
}

/// Service banner
pub async fn index() -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "LifeFlight API is running",
        "version": VERSION,
    }))
}

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "LifeFlight Backend API",
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Headline indicators for the configured (or requested) month
pub async fn get_indicators(
    State(state): State<AppState>,
    params: Result<Query<PeriodParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Indicators>>> {
    let params = query(params)?;
    let year = params.year.unwrap_or(state.settings.indicator_year);
    let month = check_month(params.month)?.unwrap_or(state.settings.indicator_month);

    let data = state
        .with_records(move |_, records| Ok(indicators(records, year, month)))
        .await?;
    Ok(ApiResponse::success("Indicator data fetched successfully", data))
}

#[derive(Debug, Serialize)]
pub struct ResponseTimeSummary {
    pub year: i32,
    pub month: Option<u32>,
    pub average_response_time: AverageResponseTime,
    pub average_minutes: Option<f64>,
}

/// Average dispatch-to-enroute time for a year or one month of it
pub async fn get_response_time(
    State(state): State<AppState>,
    params: Result<Query<PeriodParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<ResponseTimeSummary>>> {
    let params = query(params)?;
    let year = params.year.unwrap_or(state.settings.indicator_year);
    let month = check_month(params.month)?;

    let data = state
        .with_records(move |_, records| {
            let average = average_response_time(records, year, month);
            Ok(ResponseTimeSummary {
                year,
                month,
                average_minutes: average.minutes(),
                average_response_time: average,
            })
        })
        .await?;
    Ok(ApiResponse::success("Response time calculated successfully", data))
}

#[derive(Debug, Default, Deserialize)]
pub struct SeasonalityParams {
    pub year: Option<i32>,
    pub location_level: Option<String>,
    pub location_value: Option<String>,
    pub month: Option<u32>,
}

/// Weekday by hour heatmap per 1,000 population
pub async fn get_seasonality(
    State(state): State<AppState>,
    params: Result<Query<SeasonalityParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<SeasonalityHeatmap>>> {
    let params = query(params)?;
    let heatmap_query = HeatmapQuery {
        year: params.year.unwrap_or(state.settings.indicator_year),
        location_level: params
            .location_level
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default(),
        location_value: params.location_value.filter(|v| !v.trim().is_empty()),
        month: check_month(params.month)?,
    };

    let data = state
        .with_records(move |state, records| {
            Ok(seasonality_heatmap(records, &heatmap_query, &state.population))
        })
        .await?;
    Ok(ApiResponse::success("Seasonality heatmap calculated successfully", data))
}

#[derive(Debug, Default, Deserialize)]
pub struct SpcParams {
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub aggregation: Option<String>,
    pub method: Option<String>,
}

impl SpcParams {
    fn into_request(self) -> ApiResult<SpcRequest> {
        let defaults = SpcRequest::default();
        Ok(SpcRequest {
            start_year: self.start_year.unwrap_or(defaults.start_year),
            end_year: self.end_year.unwrap_or(defaults.end_year),
            aggregation: self
                .aggregation
                .as_deref()
                .map(str::parse)
                .transpose()?
                .unwrap_or(defaults.aggregation),
            method: self
                .method
                .as_deref()
                .map(str::parse)
                .transpose()?
                .unwrap_or(defaults.method),
        })
    }
}

async fn build_spc_report(state: &AppState, params: Result<Query<SpcParams>, QueryRejection>) -> ApiResult<SpcReport> {
    let request = query(params)?.into_request()?;
    state
        .with_records(move |_, records| Ok(spc_report(records, &request)))
        .await
}

/// Incident-rate control chart
pub async fn get_spc(
    State(state): State<AppState>,
    params: Result<Query<SpcParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<SpcReport>>> {
    let report = build_spc_report(&state, params).await?;
    Ok(ApiResponse::success("SPC data calculated successfully", report))
}

/// Incident-rate control chart as a Markdown document
pub async fn get_spc_report(
    State(state): State<AppState>,
    params: Result<Query<SpcParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let report = build_spc_report(&state, params).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        report.to_markdown(),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastParams {
    pub model: Option<String>,
    pub years: Option<i64>,
}

/// Historical monthly demand followed by a model forecast
pub async fn get_forecast(
    State(state): State<AppState>,
    params: Result<Query<ForecastParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<DemandForecast>>> {
    let params = query(params)?;
    let request = ForecastRequest::parse(params.model.as_deref().unwrap_or("prophet"), params.years.unwrap_or(1))?;

    let data = state
        .with_records(move |state, records| {
            Ok(forecast(
                records,
                state.models.as_ref(),
                &request,
                state.settings.forecast_cutoff,
            )?)
        })
        .await?;
    Ok(ApiResponse::success("Demand forecast generated successfully", data))
}
