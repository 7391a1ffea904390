//! Optional post-processing that collapses per-step alerts into events.
//!
//! The scanner reports every step a condition holds. Here consecutive steps
//! for the same rule and target become a single event. The alert log itself
//! is left untouched.

use serde::Serialize;
use std::collections::HashMap;

use crate::core::{AlertKind, AlertLog, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub target: String,
    pub start: Timestamp,
    pub end: Timestamp,
    /// Number of alerts folded into this event.
    pub steps: usize,
    /// Highest flow for cluster events, lowest pressure for house events.
    pub peak: f64,
}

/// Groups alerts of one `(kind, target)` found on adjacent positions of `axis`.
///
/// Events come out ordered by start position, ties broken by log order.
/// Alerts whose timestamp is not on `axis` each form their own event.
pub fn collapse(log: &AlertLog, axis: &[Timestamp]) -> Vec<AlertEvent> {
    let mut positions = HashMap::with_capacity(axis.len());
    for (i, t) in axis.iter().enumerate() {
        positions.entry(*t).or_insert(i);
    }

    let mut events: Vec<AlertEvent> = Vec::new();
    // (kind, target) -> (index into events, axis position of last alert)
    let mut open: HashMap<(AlertKind, &str), (usize, usize)> = HashMap::new();

    for alert in log {
        let position = positions.get(&alert.timestamp()).copied();
        let key = (alert.kind(), alert.target());

        if let (Some(pos), Some((idx, last))) = (position, open.get(&key).copied()) {
            if pos == last + 1 {
                let event = &mut events[idx];
                event.end = alert.timestamp();
                event.steps += 1;
                event.peak = match alert.kind() {
                    AlertKind::HighClusterFlow => event.peak.max(alert.value()),
                    AlertKind::LowPressure => event.peak.min(alert.value()),
                };
                open.insert(key, (idx, pos));
                continue;
            }
        }

        events.push(AlertEvent {
            kind: alert.kind(),
            target: alert.target().to_string(),
            start: alert.timestamp(),
            end: alert.timestamp(),
            steps: 1,
            peak: alert.value(),
        });
        match position {
            Some(pos) => {
                open.insert(key, (events.len() - 1, pos));
            }
            None => {
                open.remove(&key);
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Alert;

    fn axis(n: i64) -> Vec<Timestamp> {
        (0..n).map(|i| Timestamp(i * 3600)).collect()
    }

    fn alert(step: i64, kind: AlertKind, target: &str, value: f64) -> Alert {
        Alert::new(Timestamp(step * 3600), kind, target, value)
    }

    #[test]
    fn test_consecutive_steps_collapse() {
        let log = AlertLog::from(vec![
            alert(1, AlertKind::HighClusterFlow, "Cluster3", 0.02),
            alert(2, AlertKind::HighClusterFlow, "Cluster3", 0.05),
            alert(3, AlertKind::HighClusterFlow, "Cluster3", 0.03),
        ]);
        let events = collapse(&log, &axis(6));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, Timestamp(3600));
        assert_eq!(events[0].end, Timestamp(3 * 3600));
        assert_eq!(events[0].steps, 3);
        assert_eq!(events[0].peak, 0.05);
    }

    #[test]
    fn test_gap_starts_new_event() {
        let log = AlertLog::from(vec![
            alert(0, AlertKind::LowPressure, "C1H1", 9.0),
            alert(1, AlertKind::LowPressure, "C1H1", 8.0),
            alert(3, AlertKind::LowPressure, "C1H1", 9.5),
        ]);
        let events = collapse(&log, &axis(4));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].steps, 2);
        assert_eq!(events[0].peak, 8.0);
        assert_eq!(events[1].start, Timestamp(3 * 3600));
    }

    #[test]
    fn test_events_ordered_by_start_then_log_order() {
        let log = AlertLog::from(vec![
            alert(0, AlertKind::HighClusterFlow, "Cluster2", 0.1),
            alert(0, AlertKind::LowPressure, "C2H1", 9.0),
            alert(1, AlertKind::HighClusterFlow, "Cluster1", 0.1),
            alert(1, AlertKind::HighClusterFlow, "Cluster2", 0.1),
            alert(1, AlertKind::LowPressure, "C2H1", 9.0),
        ]);
        let events = collapse(&log, &axis(2));

        let order: Vec<(&str, usize)> = events.iter().map(|e| (e.target.as_str(), e.steps)).collect();
        assert_eq!(order, vec![("Cluster2", 2), ("C2H1", 2), ("Cluster1", 1)]);
    }

    #[test]
    fn test_same_target_different_rules_stay_apart() {
        let log = AlertLog::from(vec![
            alert(0, AlertKind::HighClusterFlow, "X", 1.0),
            alert(1, AlertKind::LowPressure, "X", 1.0),
        ]);
        assert_eq!(collapse(&log, &axis(2)).len(), 2);
    }

    #[test]
    fn test_off_axis_alerts_stand_alone() {
        let log = AlertLog::from(vec![
            Alert::new(Timestamp(5), AlertKind::LowPressure, "C1H1", 1.0),
            Alert::new(Timestamp(6), AlertKind::LowPressure, "C1H1", 1.0),
        ]);
        assert_eq!(collapse(&log, &axis(2)).len(), 2);
    }
}
