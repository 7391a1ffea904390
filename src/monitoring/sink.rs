//! Alert log projections (summary, sample, CSV) and report sinks.
//!
//! Sinks have an explicit lifecycle: a scan opens the sink before it starts
//! and closes it once it is done, whatever the outcome.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use super::thresholds::ThresholdPolicy;
use crate::core::csv::{escape_field, format_number};
use crate::core::{Alert, AlertKind, AlertLog, VillageTopology};
use crate::errors::SinkError;

/// Number of alerts shown in summaries before truncating.
pub const SAMPLE_LIMIT: usize = 10;

pub const ALERTS_FILE: &str = "leak_alerts.csv";
pub const REPORT_FILE: &str = "report.txt";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub total: usize,
    pub high_cluster_flow: usize,
    pub low_pressure: usize,
}

impl AlertSummary {
    pub fn from_log(log: &AlertLog) -> Self {
        Self {
            total: log.len(),
            high_cluster_flow: log.count(AlertKind::HighClusterFlow),
            low_pressure: log.count(AlertKind::LowPressure),
        }
    }

    pub fn count(&self, kind: AlertKind) -> usize {
        match kind {
            AlertKind::HighClusterFlow => self.high_cluster_flow,
            AlertKind::LowPressure => self.low_pressure,
        }
    }
}

/// One human-readable line per alert.
pub fn format_alert(alert: &Alert) -> String {
    format!(
        "- {}: {} @ {} (value={:.5})",
        alert.timestamp(),
        alert.kind(),
        alert.target(),
        alert.value()
    )
}

/// The first `limit` alerts in log order, plus a truncation notice when more remain.
pub fn sample_lines(log: &AlertLog, limit: usize) -> Vec<String> {
    let mut lines: Vec<String> = log.iter().take(limit).map(format_alert).collect();
    if log.len() > limit {
        lines.push(format!("... and {} more", log.len() - limit));
    }
    lines
}

/// The full log as a `Time,Type,Target,Value` table.
pub fn alerts_csv(log: &AlertLog) -> String {
    let mut out = String::from("Time,Type,Target,Value\n");
    for alert in log {
        out.push_str(&format!(
            "{},{},{},{}\n",
            alert.timestamp(),
            escape_field(alert.kind().label()),
            escape_field(alert.target()),
            format_number(alert.value())
        ));
    }
    out
}

/// Run metadata printed at the top of the text report.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub scan_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub village: VillageTopology,
    pub policy: ThresholdPolicy,
}

impl ReportContext {
    pub fn new(village: VillageTopology, policy: ThresholdPolicy) -> Self {
        Self {
            scan_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            village,
            policy,
        }
    }
}

pub fn render_report(ctx: &ReportContext, log: &AlertLog) -> String {
    let mut lines = vec![
        "Smart Water Plus – Simulation Summary".to_string(),
        format!("Scan: {} ({})", ctx.scan_id, ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        String::new(),
        format!("Clusters: {}", ctx.village.num_clusters),
        format!("Houses per cluster: {}", ctx.village.houses_per_cluster),
        format!("Total houses: {}", ctx.village.total_houses()),
        format!(
            "Cluster flow anomaly ratio: {}x mean (min {} m³/s)",
            ctx.policy.cluster_flow_ratio(),
            ctx.policy.cluster_min_flow()
        ),
        match ctx.policy.low_pressure_m() {
            Some(p) => format!("Low pressure threshold: {} m", p),
            None => "Low pressure threshold: disabled".to_string(),
        },
        String::new(),
    ];

    if log.is_empty() {
        lines.push("Anomalies: 0 (no alerts)".to_string());
    } else {
        let summary = AlertSummary::from_log(log);
        lines.push(format!(
            "Anomalies: {}  →  High Cluster Flow: {}, Low Pressure: {}",
            summary.total, summary.high_cluster_flow, summary.low_pressure
        ));
        lines.push(String::new());
        lines.extend(sample_lines(log, SAMPLE_LIMIT));
    }

    lines.join("\n")
}

/// Destination for the products of a scan.
pub trait ReportSink {
    fn open(&mut self) -> Result<(), SinkError>;

    /// Persists the full alert log. Returns where it went, if anywhere.
    fn write_alerts(&mut self, log: &AlertLog) -> Result<Option<PathBuf>, SinkError>;

    fn write_report(&mut self, report: &str) -> Result<Option<PathBuf>, SinkError>;

    fn close(&mut self) -> Result<(), SinkError>;
}

/// Writes `leak_alerts.csv` into the data directory and `report.txt` into the
/// log directory.
#[derive(Debug)]
pub struct FileSink {
    data_dir: PathBuf,
    log_dir: PathBuf,
    open: bool,
}

impl FileSink {
    pub fn new(data_dir: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_dir: log_dir.into(),
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self) -> Result<(), SinkError> {
        if self.open {
            Ok(())
        } else {
            Err(SinkError::NotOpen)
        }
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), SinkError> {
    fs::write(path, contents).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create_dir(path: &Path) -> Result<(), SinkError> {
    fs::create_dir_all(path).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl ReportSink for FileSink {
    fn open(&mut self) -> Result<(), SinkError> {
        create_dir(&self.data_dir)?;
        create_dir(&self.log_dir)?;
        self.open = true;
        Ok(())
    }

    fn write_alerts(&mut self, log: &AlertLog) -> Result<Option<PathBuf>, SinkError> {
        self.ensure_open()?;
        if log.is_empty() {
            info!("No anomalies detected (thresholds may be conservative)");
            return Ok(None);
        }

        let path = self.data_dir.join(ALERTS_FILE);
        write_file(&path, &alerts_csv(log))?;
        info!("{} anomalies written to {}", log.len(), path.display());
        Ok(Some(path))
    }

    fn write_report(&mut self, report: &str) -> Result<Option<PathBuf>, SinkError> {
        self.ensure_open()?;
        let path = self.log_dir.join(REPORT_FILE);
        write_file(&path, report)?;
        info!("Summary written to {}", path.display());
        Ok(Some(path))
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.open = false;
        Ok(())
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub alerts_csv: Option<String>,
    pub report: Option<String>,
    pub opened: usize,
    pub closed: usize,
    open: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl ReportSink for MemorySink {
    fn open(&mut self) -> Result<(), SinkError> {
        self.open = true;
        self.opened += 1;
        Ok(())
    }

    fn write_alerts(&mut self, log: &AlertLog) -> Result<Option<PathBuf>, SinkError> {
        if !self.open {
            return Err(SinkError::NotOpen);
        }
        if !log.is_empty() {
            self.alerts_csv = Some(alerts_csv(log));
        }
        Ok(None)
    }

    fn write_report(&mut self, report: &str) -> Result<Option<PathBuf>, SinkError> {
        if !self.open {
            return Err(SinkError::NotOpen);
        }
        self.report = Some(report.to_string());
        Ok(None)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.open = false;
        self.closed += 1;
        Ok(())
    }
}
