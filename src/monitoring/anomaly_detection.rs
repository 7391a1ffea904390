//! Per-timestep anomaly scan over simulation output.
//!
//! Two independent rules run at every step of the shared time axis:
//!
//! * high cluster flow: a cluster's trunk flow strictly exceeds
//!   `max(cluster_min_flow, cluster_flow_ratio * mean)`, where the mean is
//!   taken over all clusters at that step;
//! * low pressure: a house's pressure is strictly below `low_pressure_m`.
//!
//! Steps are evaluated without memory of earlier steps, so a condition that
//! persists for N steps yields N alerts. Collapsing those runs is the job of
//! [`crate::monitoring::debounce`].

use tracing::{debug, warn};

use super::thresholds::ThresholdPolicy;
use crate::core::{Alert, AlertKind, AlertLog, TimeSeriesTable, Timestamp};
use crate::errors::SchemaError;

#[derive(Debug, Clone)]
pub struct AnomalyScanner {
    policy: ThresholdPolicy,
}

impl AnomalyScanner {
    pub fn new(policy: ThresholdPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    /// Scans both tables and returns the alerts in discovery order.
    ///
    /// `houses` lists the house ids to check for low pressure; ids that are not
    /// columns of `pressure_by_node` are skipped. Fails without producing any
    /// alert when the two tables do not share the same timestamp axis.
    pub fn scan<S: AsRef<str>>(
        &self,
        flow_by_cluster: &TimeSeriesTable,
        pressure_by_node: &TimeSeriesTable,
        houses: &[S],
    ) -> Result<AlertLog, SchemaError> {
        check_axes(flow_by_cluster, pressure_by_node)?;

        let house_columns: Vec<(usize, &str)> = houses
            .iter()
            .map(|h| h.as_ref())
            .filter_map(|h| pressure_by_node.column_index(h).map(|col| (col, h)))
            .collect();

        let mut log = AlertLog::new();
        for (step, &t) in flow_by_cluster.timestamps().iter().enumerate() {
            self.check_cluster_flows(t, flow_by_cluster.row(step), flow_by_cluster.columns(), &mut log);

            if let Some(limit) = self.policy.low_pressure_m() {
                if !house_columns.is_empty() {
                    check_house_pressure(t, pressure_by_node.row(step), &house_columns, limit, &mut log);
                }
            }
        }

        debug!(
            "Scanned {} timesteps over {} clusters and {} houses: {} alerts",
            flow_by_cluster.len(),
            flow_by_cluster.width(),
            house_columns.len(),
            log.len()
        );
        Ok(log)
    }

    fn check_cluster_flows(&self, t: Timestamp, flows: &[f64], clusters: &[String], log: &mut AlertLog) {
        let Some(mean) = mean_flow(flows) else {
            return;
        };
        let limit = self.policy.flow_limit(mean);

        for (cluster, &flow) in clusters.iter().zip(flows) {
            if flow > limit {
                warn!("Possible leak: {} flow={:.5} m³/s at t={}", cluster, flow, t);
                log.push(Alert::new(t, AlertKind::HighClusterFlow, cluster.as_str(), flow));
            }
        }
    }
}

fn check_house_pressure(
    t: Timestamp,
    pressures: &[f64],
    houses: &[(usize, &str)],
    limit: f64,
    log: &mut AlertLog,
) {
    for &(col, house) in houses {
        let pressure = pressures[col];
        if pressure < limit {
            warn!("Low pressure: {} pressure={:.2} m at t={}", house, pressure, t);
            log.push(Alert::new(t, AlertKind::LowPressure, house, pressure));
        }
    }
}

/// Mean over the clusters that reported a value; `None` when there are none.
fn mean_flow(flows: &[f64]) -> Option<f64> {
    let (sum, n) = flows
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn check_axes(flow: &TimeSeriesTable, pressure: &TimeSeriesTable) -> Result<(), SchemaError> {
    if flow.len() != pressure.len() {
        return Err(SchemaError::LengthMismatch {
            flow: flow.len(),
            pressure: pressure.len(),
        });
    }

    for (index, (f, p)) in flow.timestamps().iter().zip(pressure.timestamps()).enumerate() {
        if f != p {
            return Err(SchemaError::TimestampMismatch {
                index,
                flow: *f,
                pressure: *p,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(n: i64) -> Vec<Timestamp> {
        (0..n).map(Timestamp).collect()
    }

    fn table(n: i64, columns: Vec<(&str, Vec<f64>)>) -> TimeSeriesTable {
        TimeSeriesTable::from_columns(axis(n), columns).unwrap()
    }

    fn scanner(ratio: f64, min_flow: f64, low: Option<f64>) -> AnomalyScanner {
        AnomalyScanner::new(ThresholdPolicy::new(ratio, min_flow, low).unwrap())
    }

    const NO_HOUSES: [&str; 0] = [];

    #[test]
    fn test_two_cluster_example() {
        let flows = table(2, vec![("A", vec![1.0, 10.0]), ("B", vec![1.0, 1.0])]);
        let pressure = table(2, vec![]);

        let log = scanner(1.3, 1e-4, None).scan(&flows, &pressure, &NO_HOUSES).unwrap();

        assert_eq!(
            log.as_slice(),
            &[Alert::new(Timestamp(1), AlertKind::HighClusterFlow, "A", 10.0)]
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        let empty = table(1, vec![]);

        // mean = 2.0, limit = max(0, 2.0 * 2.0) = 4.0
        let at_ratio_limit = table(1, vec![("A", vec![4.0]), ("B", vec![2.0]), ("C", vec![0.0])]);
        let log = scanner(2.0, 0.0, None).scan(&at_ratio_limit, &empty, &NO_HOUSES).unwrap();
        assert!(log.is_empty());

        // mean = 2.5, limit = max(5.0, 1.3 * 2.5) = 5.0
        let at_floor = table(1, vec![("A", vec![5.0]), ("B", vec![0.0])]);
        let log = scanner(1.3, 5.0, None).scan(&at_floor, &empty, &NO_HOUSES).unwrap();
        assert!(log.is_empty());

        // mean = 3.0, limit = max(5.0, 3.9) = 5.0
        let above_floor = table(1, vec![("A", vec![6.0]), ("B", vec![0.0])]);
        let log = scanner(1.3, 5.0, None).scan(&above_floor, &empty, &NO_HOUSES).unwrap();
        assert_eq!(log.as_slice(), &[Alert::new(Timestamp(0), AlertKind::HighClusterFlow, "A", 6.0)]);
    }

    #[test]
    fn test_min_flow_floor_suppresses_near_zero_flows() {
        let flows = table(1, vec![("A", vec![5e-5]), ("B", vec![0.0]), ("C", vec![0.0])]);
        let empty = table(1, vec![]);
        let log = scanner(1.3, 1e-4, None).scan(&flows, &empty, &NO_HOUSES).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_zero_clusters_yield_no_flow_alerts() {
        let flows = table(3, vec![]);
        let pressure = table(3, vec![("C1H1", vec![12.0, 12.0, 12.0])]);
        let log = scanner(1.3, 0.0, Some(10.0))
            .scan(&flows, &pressure, &["C1H1"])
            .unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_disabled_low_pressure_rule() {
        let flows = table(2, vec![]);
        let pressure = table(2, vec![("C1H1", vec![0.0, -5.0])]);
        let log = scanner(1.3, 1e-4, None).scan(&flows, &pressure, &["C1H1"]).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_low_pressure_only_checks_known_houses() {
        let flows = table(1, vec![]);
        let pressure = table(
            1,
            vec![("C1", vec![1.0]), ("C1H1", vec![9.0]), ("C1H2", vec![10.0])],
        );
        let log = scanner(1.3, 1e-4, Some(10.0))
            .scan(&flows, &pressure, &["C1H2", "C9H9", "C1H1"])
            .unwrap();

        // C1 is a cluster junction, not a house; C1H2 sits exactly on the limit.
        assert_eq!(
            log.as_slice(),
            &[Alert::new(Timestamp(0), AlertKind::LowPressure, "C1H1", 9.0)]
        );
    }

    #[test]
    fn test_ordering_is_time_then_rule_then_column() {
        let flows = table(
            2,
            vec![
                ("Cluster1", vec![9.0, 0.0]),
                ("Cluster2", vec![0.0, 9.0]),
                ("Cluster3", vec![0.0, 9.0]),
                ("Cluster4", vec![0.0, 0.0]),
            ],
        );
        let pressure = table(
            2,
            vec![("C1H1", vec![5.0, 5.0]), ("C2H1", vec![5.0, 50.0])],
        );
        let log = scanner(1.5, 0.0, Some(10.0))
            .scan(&flows, &pressure, &["C1H1", "C2H1"])
            .unwrap();

        let got: Vec<(i64, AlertKind, &str)> = log
            .iter()
            .map(|a| (a.timestamp().seconds(), a.kind(), a.target()))
            .collect();
        assert_eq!(
            got,
            vec![
                (0, AlertKind::HighClusterFlow, "Cluster1"),
                (0, AlertKind::LowPressure, "C1H1"),
                (0, AlertKind::LowPressure, "C2H1"),
                (1, AlertKind::HighClusterFlow, "Cluster2"),
                (1, AlertKind::HighClusterFlow, "Cluster3"),
                (1, AlertKind::LowPressure, "C1H1"),
            ]
        );
    }

    #[test]
    fn test_persistent_condition_alerts_every_step() {
        let flows = table(4, vec![("A", vec![10.0; 4]), ("B", vec![1.0; 4])]);
        let empty = table(4, vec![]);
        let log = scanner(1.3, 1e-4, None).scan(&flows, &empty, &NO_HOUSES).unwrap();
        assert_eq!(log.count(AlertKind::HighClusterFlow), 4);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let flows = table(3, vec![("A", vec![1.0, 7.0, 2.0]), ("B", vec![3.0, 1.0, 9.0])]);
        let pressure = table(3, vec![("C1H1", vec![9.0, 11.0, 8.0])]);
        let s = scanner(1.2, 1e-4, Some(10.0));

        let first = s.scan(&flows, &pressure, &["C1H1"]).unwrap();
        let second = s.scan(&flows, &pressure, &["C1H1"]).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_schema_mismatch_aborts_scan() {
        let flows = table(3, vec![("A", vec![10.0, 10.0, 10.0])]);
        let pressure = table(2, vec![("C1H1", vec![1.0, 1.0])]);
        let err = scanner(1.3, 1e-4, Some(10.0))
            .scan(&flows, &pressure, &["C1H1"])
            .unwrap_err();
        assert_eq!(err, SchemaError::LengthMismatch { flow: 3, pressure: 2 });

        let shifted = TimeSeriesTable::from_columns(
            vec![Timestamp(0), Timestamp(5), Timestamp(2)],
            vec![("C1H1", vec![1.0, 1.0, 1.0])],
        )
        .unwrap();
        let err = scanner(1.3, 1e-4, Some(10.0))
            .scan(&flows, &shifted, &["C1H1"])
            .unwrap_err();
        assert!(matches!(err, SchemaError::TimestampMismatch { index: 1, .. }));
    }

    #[test]
    fn test_missing_flow_values_are_ignored_in_mean() {
        let flows = table(1, vec![("A", vec![f64::NAN]), ("B", vec![1.0]), ("C", vec![3.0])]);
        let empty = table(1, vec![]);
        // mean over B and C = 2.0, limit = 2.6
        let log = scanner(1.3, 0.0, None).scan(&flows, &empty, &NO_HOUSES).unwrap();
        assert_eq!(log.as_slice(), &[Alert::new(Timestamp(0), AlertKind::HighClusterFlow, "C", 3.0)]);
    }
}
