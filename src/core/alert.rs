use serde::Serialize;
use std::fmt;

use super::Timestamp;

/// Which detection rule produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertKind {
    HighClusterFlow,
    LowPressure,
}

impl AlertKind {
    pub const ALL: [AlertKind; 2] = [AlertKind::HighClusterFlow, AlertKind::LowPressure];

    /// Label used in reports and in the `Type` column of the alert CSV.
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::HighClusterFlow => "High Cluster Flow",
            AlertKind::LowPressure => "Low Pressure",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single timestamped finding from one detection rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    timestamp: Timestamp,
    kind: AlertKind,
    target: String,
    value: f64,
}

impl Alert {
    pub fn new(timestamp: Timestamp, kind: AlertKind, target: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp,
            kind,
            target: target.into(),
            value,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Alerts in discovery order: timestamp-major, then rule, then column order.
///
/// Only the scanner appends; once handed out the log is read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AlertLog {
    alerts: Vec<Alert>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn as_slice(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Alert> {
        self.alerts.iter()
    }

    pub fn count(&self, kind: AlertKind) -> usize {
        self.alerts.iter().filter(|a| a.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Alert> {
        self.alerts
    }
}

impl From<Vec<Alert>> for AlertLog {
    fn from(alerts: Vec<Alert>) -> Self {
        Self { alerts }
    }
}

impl<'a> IntoIterator for &'a AlertLog {
    type Item = &'a Alert;
    type IntoIter = std::slice::Iter<'a, Alert>;

    fn into_iter(self) -> Self::IntoIter {
        self.alerts.iter()
    }
}
