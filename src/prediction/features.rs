use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;

/// Which third sensor feature the leak predictors consume besides pressure and flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSchema {
    #[default]
    Temperature,
    TankLevel,
}

impl FeatureSchema {
    pub fn feature_names(&self) -> [&'static str; 3] {
        match self {
            FeatureSchema::Temperature => ["pressure", "flow", "temperature"],
            FeatureSchema::TankLevel => ["pressure", "flow", "tank_level"],
        }
    }

    /// Pulls the feature vector out of a request body.
    ///
    /// Each field may be a JSON number or a numeric string.
    pub fn extract(&self, body: &Value) -> Result<[f64; 3], ValidationError> {
        let object = body
            .as_object()
            .ok_or_else(|| ValidationError::Body("expected a JSON object".to_string()))?;

        let mut features = [0.0; 3];
        for (slot, name) in features.iter_mut().zip(self.feature_names()) {
            let raw = object
                .get(name)
                .filter(|v| !v.is_null())
                .ok_or_else(|| ValidationError::MissingField(name.to_string()))?;
            *slot = as_number(name, raw)?;
        }
        Ok(features)
    }
}

fn as_number(name: &str, value: &Value) -> Result<f64, ValidationError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ValidationError::invalid(name, format!("must be a number, got {}", value))),
    }
}
