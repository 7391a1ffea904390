//! Water demand forecasting.
//!
//! The daily forecast is a simple simulated model: average flow plus a
//! temperature term plus uniform noise. The hourly forecast uses a trained
//! artifact when one is available and a flat dummy profile otherwise.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::errors::{ModelError, ValidationError};
use crate::utils::round_to;

pub const HOURLY_HORIZON: usize = 24;
pub const MAX_FORECAST_DAYS: u32 = 366;
pub const DUMMY_HOURLY_DEMAND: f64 = 0.5;
pub const HOURLY_MODEL_FILE: &str = "demand_forecaster.json";

const TEMPERATURE_FACTOR: f64 = 0.2;
const NOISE_AMPLITUDE: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyDemand {
    pub day: u32,
    #[serde(rename = "predicted_demand_L")]
    pub predicted_demand_l: f64,
}

/// Predicted demand for days `1..=days`, in liters, rounded to 2 decimals.
pub fn forecast_daily<R: Rng + ?Sized>(
    days: u32,
    avg_flow: f64,
    temperature: f64,
    rng: &mut R,
) -> Result<Vec<DailyDemand>, ValidationError> {
    if days > MAX_FORECAST_DAYS {
        return Err(ValidationError::invalid(
            "days",
            format!("must be at most {}", MAX_FORECAST_DAYS),
        ));
    }
    if !avg_flow.is_finite() {
        return Err(ValidationError::invalid("avg_flow", "must be a finite number"));
    }
    if !temperature.is_finite() {
        return Err(ValidationError::invalid("temperature", "must be a finite number"));
    }

    Ok((1..=days)
        .map(|day| {
            let noise = rng.gen_range(-NOISE_AMPLITUDE..=NOISE_AMPLITUDE);
            DailyDemand {
                day,
                predicted_demand_l: round_to(avg_flow + TEMPERATURE_FACTOR * temperature + noise, 2),
            }
        })
        .collect())
}

/// Per-hour linear model over the mean of the usage history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyModel {
    pub coefficients: Vec<f64>,
    pub intercept: Vec<f64>,
}

impl HourlyModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: HourlyModel = serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.len() != HOURLY_HORIZON || self.intercept.len() != HOURLY_HORIZON {
            return Err(ModelError::Malformed(format!(
                "hourly model needs {} coefficients and intercepts, got {} and {}",
                HOURLY_HORIZON,
                self.coefficients.len(),
                self.intercept.len()
            )));
        }
        Ok(())
    }

    fn forecast(&self, level: f64) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.intercept)
            .map(|(c, b)| c * level + b)
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemandForecaster {
    hourly: Option<HourlyModel>,
}

impl DemandForecaster {
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(HOURLY_MODEL_FILE);
        match HourlyModel::load(&path) {
            Ok(model) => {
                info!("Hourly demand model loaded from {}", path.display());
                Self { hourly: Some(model) }
            }
            Err(e) => {
                warn!("Hourly demand model unavailable, serving dummy forecast: {}", e);
                Self::dummy()
            }
        }
    }

    pub fn dummy() -> Self {
        Self { hourly: None }
    }

    pub fn with_model(model: HourlyModel) -> Self {
        Self { hourly: Some(model) }
    }

    pub fn is_loaded(&self) -> bool {
        self.hourly.is_some()
    }

    /// Next 24 hours of demand from a usage history.
    ///
    /// The history is validated the same way whether or not a model is loaded.
    pub fn forecast_hourly(&self, history: &[f64]) -> Result<Vec<f64>, ValidationError> {
        if history.is_empty() {
            return Err(ValidationError::invalid("historical_usage", "must not be empty"));
        }
        if history.iter().any(|v| !v.is_finite()) {
            return Err(ValidationError::invalid("historical_usage", "must contain finite numbers"));
        }

        Ok(match &self.hourly {
            Some(model) => {
                let level = history.iter().sum::<f64>() / history.len() as f64;
                model.forecast(level)
            }
            None => vec![DUMMY_HOURLY_DEMAND; HOURLY_HORIZON],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_daily_forecast_shape_and_bounds() {
        let forecast = forecast_daily(7, 100.0, 25.0, &mut rand::thread_rng()).unwrap();
        assert_eq!(forecast.len(), 7);
        assert_eq!(forecast[0].day, 1);
        assert_eq!(forecast[6].day, 7);
        // 100 + 0.2 * 25 = 105, noise within ±5
        assert!(forecast
            .iter()
            .all(|d| (100.0..=110.0).contains(&d.predicted_demand_l)));
    }

    #[test]
    fn test_daily_forecast_zero_days() {
        let forecast = forecast_daily(0, 100.0, 25.0, &mut StepRng::new(0, 1)).unwrap();
        assert!(forecast.is_empty());
    }

    #[test]
    fn test_daily_forecast_rejects_huge_horizon() {
        assert!(forecast_daily(MAX_FORECAST_DAYS + 1, 1.0, 1.0, &mut StepRng::new(0, 1)).is_err());
    }

    #[test]
    fn test_dummy_hourly_forecast() {
        let forecaster = DemandForecaster::dummy();
        assert_eq!(forecaster.forecast_hourly(&[1.0, 2.0]).unwrap(), vec![0.5; 24]);
        assert!(forecaster.forecast_hourly(&[]).is_err());
    }

    #[test]
    fn test_model_hourly_forecast() {
        let model = HourlyModel {
            coefficients: vec![2.0; HOURLY_HORIZON],
            intercept: (0..HOURLY_HORIZON).map(|h| h as f64).collect(),
        };
        let forecaster = DemandForecaster::with_model(model);

        let forecast = forecaster.forecast_hourly(&[1.0, 3.0]).unwrap();
        assert_eq!(forecast.len(), HOURLY_HORIZON);
        assert_eq!(forecast[0], 4.0);
        assert_eq!(forecast[23], 27.0);
    }

    #[test]
    fn test_model_shape_validated() {
        let model = HourlyModel {
            coefficients: vec![1.0; 3],
            intercept: vec![0.0; HOURLY_HORIZON],
        };
        assert!(matches!(model.validate(), Err(ModelError::Malformed(_))));
    }
}
