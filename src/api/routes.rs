/*
* Smart Water Plus HTTP routes
* ----------------------------
*
* GET    /               - Liveness message
* POST   /predict        - Leak prediction for one sensor reading
* POST   /forecast       - Daily demand forecast, or hourly from a usage history
* POST   /schedule       - Water allocation across houses
* GET    /simulate-data  - Random sensor reading for demos
*
* Every handler is a stateless computation over read-only state. Domain
* failures come back as 400 `{"error": message}`.
*/

use axum::{
    extract::{DefaultBodyLimit, State},
    http::Uri,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, warn};

use super::error::{ApiError, ApiJson};
use super::params;
use crate::config::ModelSettings;
use crate::forecast::{forecast_daily, DemandForecaster};
use crate::prediction::{outputs_to_json, FeatureSchema, LeakPredictors};
use crate::schedule;
use crate::simulate::SensorSample;

pub const INDEX_MESSAGE: &str = "Smart Water Leak Detection API is running!";
pub const FORECAST_MESSAGE: &str = "Forecasted daily demand (liters)";

#[derive(Debug)]
pub struct AppState {
    pub predictors: LeakPredictors,
    pub forecaster: DemandForecaster,
}

impl AppState {
    /// Loads model artifacts, degrading to dummy mode for anything missing.
    pub fn load(models: &ModelSettings) -> Self {
        Self::from_dir(&models.dir, models.feature_schema)
    }

    pub fn from_dir(dir: &Path, schema: FeatureSchema) -> Self {
        Self {
            predictors: LeakPredictors::load(dir, schema),
            forecaster: DemandForecaster::load(dir),
        }
    }

    pub fn dummy(schema: FeatureSchema) -> Self {
        Self {
            predictors: LeakPredictors::dummy(schema),
            forecaster: DemandForecaster::dummy(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    #[serde(default = "default_days", deserialize_with = "params::count")]
    pub days: u32,
    #[serde(default = "default_avg_flow", deserialize_with = "params::number")]
    pub avg_flow: f64,
    #[serde(default = "default_temperature", deserialize_with = "params::number")]
    pub temperature: f64,
    #[serde(default)]
    pub historical_usage: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default = "default_total_water", deserialize_with = "params::number")]
    pub total_water: f64,
    #[serde(default = "default_houses", deserialize_with = "params::count")]
    pub houses: u32,
    #[serde(default)]
    pub forecasted_demand: Option<Vec<f64>>,
}

fn default_days() -> u32 {
    7
}

fn default_avg_flow() -> f64 {
    100.0
}

fn default_temperature() -> f64 {
    25.0
}

fn default_total_water() -> f64 {
    10_000.0
}

fn default_houses() -> u32 {
    10
}

pub fn create_router(app_state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .route("/forecast", post(forecast))
        .route("/schedule", post(schedule_water))
        .route("/simulate-data", get(simulate_data))
        .fallback(fallback_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .with_state(app_state)
}

async fn index() -> Json<Value> {
    Json(json!({ "message": INDEX_MESSAGE }))
}

#[axum::debug_handler]
async fn predict(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, ApiError> {
    let features = state.predictors.schema().extract(&body)?;
    let outputs = state.predictors.predict(&features, &mut rand::thread_rng());
    Ok(Json(outputs_to_json(&outputs)))
}

#[axum::debug_handler]
async fn forecast(
    State(state): State<Arc<AppState>>,
    ApiJson(params): ApiJson<ForecastRequest>,
) -> Result<Json<Value>, ApiError> {
    if let Some(history) = params.historical_usage {
        let hourly = state.forecaster.forecast_hourly(&history)?;
        return Ok(Json(json!({ "forecast": hourly })));
    }

    let daily = forecast_daily(
        params.days,
        params.avg_flow,
        params.temperature,
        &mut rand::thread_rng(),
    )?;
    Ok(Json(json!({
        "message": FORECAST_MESSAGE,
        "forecast": daily,
    })))
}

#[axum::debug_handler]
async fn schedule_water(ApiJson(params): ApiJson<ScheduleRequest>) -> Result<Json<Value>, ApiError> {
    let allocation = schedule::allocate(
        params.total_water,
        params.houses,
        params.forecasted_demand.as_deref(),
    )?;
    debug!("Allocated {} liters across {} houses", params.total_water, allocation.len());

    Ok(Json(json!({
        "total_water_available": params.total_water,
        "houses": params.houses,
        "allocation_L_per_house": allocation,
    })))
}

async fn simulate_data() -> Json<SensorSample> {
    Json(SensorSample::sample(&mut rand::thread_rng()))
}

async fn fallback_handler(uri: Uri) -> ApiError {
    warn!("No route for {}", uri);
    ApiError::not_found(format!("no route for {}", uri.path()))
}
