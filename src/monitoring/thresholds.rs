//! Threshold policy governing anomaly classification.

use serde::Serialize;

use crate::errors::PolicyError;

/// Numeric constants deciding when a measurement counts as anomalous.
///
/// Immutable once built; a scanner receives one at construction and keeps it
/// for every scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdPolicy {
    cluster_flow_ratio: f64,
    cluster_min_flow: f64,
    low_pressure_m: Option<f64>,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            cluster_flow_ratio: 1.30,
            cluster_min_flow: 1e-4,
            low_pressure_m: Some(10.0),
        }
    }
}

impl ThresholdPolicy {
    pub fn new(
        cluster_flow_ratio: f64,
        cluster_min_flow: f64,
        low_pressure_m: Option<f64>,
    ) -> Result<Self, PolicyError> {
        if !cluster_flow_ratio.is_finite() || cluster_flow_ratio <= 1.0 {
            return Err(PolicyError::RatioOutOfRange(cluster_flow_ratio));
        }
        if !cluster_min_flow.is_finite() || cluster_min_flow < 0.0 {
            return Err(PolicyError::MinFlowOutOfRange(cluster_min_flow));
        }
        if let Some(p) = low_pressure_m {
            if !p.is_finite() {
                return Err(PolicyError::LowPressureOutOfRange(p));
            }
        }

        Ok(Self {
            cluster_flow_ratio,
            cluster_min_flow,
            low_pressure_m,
        })
    }

    /// Multiple of the mean cluster flow above which a cluster is flagged.
    pub fn cluster_flow_ratio(&self) -> f64 {
        self.cluster_flow_ratio
    }

    /// Absolute floor (m³/s) a cluster flow must exceed to be flagged.
    pub fn cluster_min_flow(&self) -> f64 {
        self.cluster_min_flow
    }

    /// Pressure (m) below which a house is flagged. `None` disables the rule.
    pub fn low_pressure_m(&self) -> Option<f64> {
        self.low_pressure_m
    }

    /// Flow a cluster has to strictly exceed, given the mean over all clusters.
    pub fn flow_limit(&self, mean_flow: f64) -> f64 {
        self.cluster_min_flow.max(self.cluster_flow_ratio * mean_flow)
    }
}
