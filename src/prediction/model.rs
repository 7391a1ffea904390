//! Serialized leak classifiers.
//!
//! Training happens offline; the service only loads the resulting artifact,
//! a JSON description of a logistic model over the configured features.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::features::FeatureSchema;
use crate::errors::ModelError;

pub trait LeakClassifier: Send + Sync {
    /// Probability that the sample comes from a leaking pipe, in `[0, 1]`.
    fn predict_proba(&self, features: &[f64]) -> f64;

    /// Hard 0/1 decision.
    fn predict(&self, features: &[f64]) -> u8;
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub name: String,
    pub features: Vec<String>,
    pub weights: Vec<f64>,
    pub bias: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LinearClassifier {
    pub fn load(path: &Path, schema: FeatureSchema) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: LinearClassifier = serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        model.validate(schema)?;
        Ok(model)
    }

    pub fn validate(&self, schema: FeatureSchema) -> Result<(), ModelError> {
        let expected: Vec<String> = schema.feature_names().iter().map(|s| s.to_string()).collect();
        if self.features != expected {
            return Err(ModelError::FeatureMismatch {
                expected,
                found: self.features.clone(),
            });
        }
        if self.weights.len() != self.features.len() {
            return Err(ModelError::Malformed(format!(
                "{} weights for {} features",
                self.weights.len(),
                self.features.len()
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelError::Malformed(format!(
                "decision threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ModelError::Malformed("non-finite coefficient".to_string()));
        }
        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LeakClassifier for LinearClassifier {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        sigmoid(z)
    }

    fn predict(&self, features: &[f64]) -> u8 {
        u8::from(self.predict_proba(features) >= self.threshold)
    }
}
