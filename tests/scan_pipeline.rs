use std::fs;
use std::path::{Path, PathBuf};

use smart_water_plus::core::{AlertKind, VillageTopology};
use smart_water_plus::errors::WaterError;
use smart_water_plus::monitoring::sink::{ALERTS_FILE, REPORT_FILE};
use smart_water_plus::monitoring::{FileSink, MemorySink, ScanJob, ThresholdPolicy};

const NETWORK_RESULTS: &str = "\
,Pressure,Pressure,Pressure,Pressure,Pressure,Demand
,C1H1,C1H2,C2H1,C2H2,J1,C1H1
name,,,,,,
0,20,20,20,20,30,0.1
3600,20,8,20,20,30,0.1
7200,20,20,20,20,5,0.1
";

const CLUSTER_FLOWS: &str = "\
,Cluster1,Cluster2,Scenario
0,1.0,1.0,base
3600,10.0,1.0,base
7200,10.0,1.0,base
";

fn write_inputs(dir: &Path, flows: &str) -> (PathBuf, PathBuf) {
    let network_results = dir.join("network_results.csv");
    let cluster_flows = dir.join("cluster_flows.csv");
    fs::write(&network_results, NETWORK_RESULTS).unwrap();
    fs::write(&cluster_flows, flows).unwrap();
    (network_results, cluster_flows)
}

fn job() -> ScanJob {
    ScanJob::new(VillageTopology::new(2, 2), ThresholdPolicy::default())
}

#[test]
fn test_scan_writes_alerts_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let (network_results, cluster_flows) = write_inputs(dir.path(), CLUSTER_FLOWS);
    let data_dir = dir.path().join("data");
    let log_dir = dir.path().join("logs");
    let mut sink = FileSink::new(&data_dir, &log_dir);

    let outcome = job().run_files(&network_results, &cluster_flows, &mut sink).unwrap();

    assert_eq!(outcome.summary.total, 3);
    assert_eq!(outcome.summary.count(AlertKind::HighClusterFlow), 2);
    assert_eq!(outcome.summary.count(AlertKind::LowPressure), 1);
    assert!(!sink.is_open());

    let csv = fs::read_to_string(data_dir.join(ALERTS_FILE)).unwrap();
    assert_eq!(
        csv,
        "Time,Type,Target,Value\n\
         3600,High Cluster Flow,Cluster1,10.0\n\
         3600,Low Pressure,C1H2,8.0\n\
         7200,High Cluster Flow,Cluster1,10.0\n"
    );

    let report = fs::read_to_string(log_dir.join(REPORT_FILE)).unwrap();
    assert_eq!(report, outcome.report);
    assert!(report.contains("Anomalies: 3  →  High Cluster Flow: 2, Low Pressure: 1"));
    assert!(report.contains("- 3600: Low Pressure @ C1H2 (value=8.00000)"));
    assert!(report.contains(&outcome.scan_id.to_string()));
}

#[test]
fn test_quiet_network_writes_report_only() {
    let dir = tempfile::tempdir().unwrap();
    let flows = ",Cluster1,Cluster2\n0,1.0,1.0\n3600,1.0,1.0\n7200,1.0,1.0\n";
    let (network_results, cluster_flows) = write_inputs(dir.path(), flows);

    let policy = ThresholdPolicy::new(1.3, 1e-4, None).unwrap();
    let job = ScanJob::new(VillageTopology::new(2, 2), policy);
    let mut sink = FileSink::new(dir.path().join("data"), dir.path().join("logs"));

    let outcome = job.run_files(&network_results, &cluster_flows, &mut sink).unwrap();

    assert!(outcome.log.is_empty());
    assert_eq!(outcome.alerts_path, None);
    assert!(!dir.path().join("data").join(ALERTS_FILE).exists());
    assert!(outcome.report.contains("Anomalies: 0 (no alerts)"));
}

#[test]
fn test_misaligned_inputs_fail_before_scanning() {
    let dir = tempfile::tempdir().unwrap();
    let flows = ",Cluster1,Cluster2\n0,1.0,1.0\n3600,10.0,1.0\n";
    let (network_results, cluster_flows) = write_inputs(dir.path(), flows);
    let mut sink = MemorySink::new();

    let err = job().run_files(&network_results, &cluster_flows, &mut sink).unwrap_err();

    assert!(matches!(err, WaterError::LoadError(_)));
    assert!(sink.alerts_csv.is_none());
    assert!(sink.report.is_none());
}

#[test]
fn test_debounce_collapses_consecutive_alerts() {
    let dir = tempfile::tempdir().unwrap();
    let (network_results, cluster_flows) = write_inputs(dir.path(), CLUSTER_FLOWS);
    let mut sink = MemorySink::new();

    let outcome = job()
        .with_debounce(true)
        .run_files(&network_results, &cluster_flows, &mut sink)
        .unwrap();

    let events = outcome.events.unwrap();
    assert_eq!(events.len(), 2);
    let flow = events
        .iter()
        .find(|e| e.kind == AlertKind::HighClusterFlow)
        .unwrap();
    assert_eq!(flow.target, "Cluster1");
    assert_eq!(flow.steps, 2);
    assert_eq!(sink.opened, 1);
    assert_eq!(sink.closed, 1);
}
