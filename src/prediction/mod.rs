//! Leak prediction over single sensor readings.
//!
//! Two predictors are served side by side. When their artifacts cannot be
//! loaded the service keeps running in dummy mode: every predictor answers
//! `0` with a uniformly random probability.

pub mod features;
pub mod model;

use rand::Rng;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, warn};

pub use features::FeatureSchema;
pub use model::{LeakClassifier, LinearClassifier};

use crate::errors::ModelError;

/// Predictor names and the artifact each one is loaded from.
pub const PREDICTORS: [(&str, &str); 2] = [
    ("RandomForest", "leak_detector_rf.json"),
    ("LogisticRegression", "leak_detector_lr.json"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct PredictorOutput {
    pub name: String,
    pub prediction: u8,
    pub probability: f64,
}

pub struct LeakPredictors {
    schema: FeatureSchema,
    models: Option<Vec<(String, Box<dyn LeakClassifier>)>>,
}

impl std::fmt::Debug for LeakPredictors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeakPredictors")
            .field("schema", &self.schema)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl LeakPredictors {
    /// Loads every predictor from `dir`. If any artifact fails, none are used.
    pub fn load(dir: &Path, schema: FeatureSchema) -> Self {
        match Self::try_load(dir, schema) {
            Ok(models) => {
                info!("Leak models loaded from {}", dir.display());
                Self {
                    schema,
                    models: Some(models),
                }
            }
            Err(e) => {
                warn!("Model loading failed, serving dummy predictions: {}", e);
                Self::dummy(schema)
            }
        }
    }

    fn try_load(dir: &Path, schema: FeatureSchema) -> Result<Vec<(String, Box<dyn LeakClassifier>)>, ModelError> {
        PREDICTORS
            .iter()
            .map(|(name, file)| {
                let model = LinearClassifier::load(&dir.join(file), schema)?;
                Ok((name.to_string(), Box::new(model) as Box<dyn LeakClassifier>))
            })
            .collect()
    }

    pub fn dummy(schema: FeatureSchema) -> Self {
        Self { schema, models: None }
    }

    pub fn with_models(schema: FeatureSchema, models: Vec<(String, Box<dyn LeakClassifier>)>) -> Self {
        Self {
            schema,
            models: Some(models),
        }
    }

    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    pub fn is_loaded(&self) -> bool {
        self.models.is_some()
    }

    pub fn predict<R: Rng + ?Sized>(&self, features: &[f64; 3], rng: &mut R) -> Vec<PredictorOutput> {
        match &self.models {
            Some(models) => models
                .iter()
                .map(|(name, model)| PredictorOutput {
                    name: name.clone(),
                    prediction: model.predict(features),
                    probability: model.predict_proba(features),
                })
                .collect(),
            None => PREDICTORS
                .iter()
                .map(|(name, _)| PredictorOutput {
                    name: name.to_string(),
                    prediction: 0,
                    probability: rng.gen_range(0.0..=1.0),
                })
                .collect(),
        }
    }
}

/// Flattens outputs into `{Name}_Prediction` / `{Name}_Leak_Probability` keys.
pub fn outputs_to_json(outputs: &[PredictorOutput]) -> Value {
    let mut body = Map::new();
    for out in outputs {
        body.insert(format!("{}_Prediction", out.name), Value::from(out.prediction));
        body.insert(format!("{}_Leak_Probability", out.name), Value::from(out.probability));
    }
    Value::Object(body)
}
