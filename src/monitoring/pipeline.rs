//! Loader → scanner → sink, run once per scan.

use std::path::{Path, PathBuf};
use tracing::{error, info, info_span};
use uuid::Uuid;

use super::anomaly_detection::AnomalyScanner;
use super::debounce::{self, AlertEvent};
use super::sink::{render_report, AlertSummary, ReportContext, ReportSink};
use super::thresholds::ThresholdPolicy;
use crate::core::{AlertLog, SimulationLoader, SimulationTables, VillageTopology};
use crate::errors::WaterResult;

#[derive(Debug)]
pub struct ScanOutcome {
    pub scan_id: Uuid,
    pub log: AlertLog,
    pub summary: AlertSummary,
    pub report: String,
    pub alerts_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    /// Present when the job was asked to debounce.
    pub events: Option<Vec<AlertEvent>>,
}

#[derive(Debug, Clone)]
pub struct ScanJob {
    village: VillageTopology,
    scanner: AnomalyScanner,
    debounce: bool,
}

impl ScanJob {
    pub fn new(village: VillageTopology, policy: ThresholdPolicy) -> Self {
        Self {
            village,
            scanner: AnomalyScanner::new(policy),
            debounce: false,
        }
    }

    pub fn with_debounce(mut self, debounce: bool) -> Self {
        self.debounce = debounce;
        self
    }

    /// Loads both CSVs, keeping the village's cluster columns, then runs the scan.
    pub fn run_files<S: ReportSink>(
        &self,
        network_results: &Path,
        cluster_flows: &Path,
        sink: &mut S,
    ) -> WaterResult<ScanOutcome> {
        let tables = SimulationLoader::with_clusters(self.village.cluster_ids())
            .load_files(network_results, cluster_flows)?;
        self.run(&tables, sink)
    }

    /// Scans already loaded tables. The sink is opened first and closed on
    /// every path out of this function.
    pub fn run<S: ReportSink>(&self, tables: &SimulationTables, sink: &mut S) -> WaterResult<ScanOutcome> {
        let ctx = ReportContext::new(self.village.clone(), *self.scanner.policy());
        let span = info_span!("scan", id = %ctx.scan_id);
        let _guard = span.enter();

        sink.open()?;
        let result = self.scan_into(tables, &ctx, sink);
        let closed = sink.close();

        match (result, closed) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    error!("Failed to close report sink after error: {}", close_err);
                }
                Err(e)
            }
        }
    }

    fn scan_into<S: ReportSink>(
        &self,
        tables: &SimulationTables,
        ctx: &ReportContext,
        sink: &mut S,
    ) -> WaterResult<ScanOutcome> {
        let houses = self.village.house_ids();
        let log = self
            .scanner
            .scan(&tables.flow_by_cluster, &tables.pressure_by_node, &houses)?;
        let summary = AlertSummary::from_log(&log);

        info!(
            "Scan complete: {} alerts (high cluster flow: {}, low pressure: {})",
            summary.total, summary.high_cluster_flow, summary.low_pressure
        );

        let events = self
            .debounce
            .then(|| debounce::collapse(&log, tables.flow_by_cluster.timestamps()));

        let alerts_path = sink.write_alerts(&log)?;
        let report = render_report(ctx, &log);
        let report_path = sink.write_report(&report)?;

        Ok(ScanOutcome {
            scan_id: ctx.scan_id,
            log,
            summary,
            report,
            alerts_path,
            report_path,
            events,
        })
    }
}
