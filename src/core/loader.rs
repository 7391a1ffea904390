//! Turns raw simulation CSV output into aligned time-series tables.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::csv::{self, Record};
use super::{TimeSeriesTable, Timestamp};
use crate::errors::LoadError;

/// Column group holding nodal pressure in `network_results.csv`.
pub const PRESSURE_GROUP: &str = "Pressure";

/// Pressure and cluster-flow tables sharing one timestamp axis.
#[derive(Debug, Clone)]
pub struct SimulationTables {
    pub pressure_by_node: TimeSeriesTable,
    pub flow_by_cluster: TimeSeriesTable,
}

#[derive(Debug, Clone, Default)]
pub struct SimulationLoader {
    clusters: Option<Vec<String>>,
}

impl SimulationLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the flow table to the given cluster ids, in that order.
    /// Ids the source does not contain are dropped.
    pub fn with_clusters<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            clusters: Some(ids.into_iter().map(Into::into).collect()),
        }
    }

    pub fn load_files(&self, pressure: &Path, flow: &Path) -> Result<SimulationTables, LoadError> {
        let pressure_text = read_source(pressure)?;
        let flow_text = read_source(flow)?;
        self.load_str(
            &pressure.display().to_string(),
            &pressure_text,
            &flow.display().to_string(),
            &flow_text,
        )
    }

    pub fn load_str(
        &self,
        pressure_name: &str,
        pressure_text: &str,
        flow_name: &str,
        flow_text: &str,
    ) -> Result<SimulationTables, LoadError> {
        let pressure_by_node = parse_pressure(pressure_name, pressure_text)?;
        let mut flow_by_cluster = parse_flat(flow_name, flow_text)?;

        if let Some(ids) = &self.clusters {
            for id in ids.iter().filter(|id| !flow_by_cluster.has_column(id)) {
                debug!("Cluster {} not present in {}, skipping", id, flow_name);
            }
            flow_by_cluster = flow_by_cluster.select(ids);
        }

        check_alignment(&pressure_by_node, &flow_by_cluster)?;

        info!(
            "Loaded {} timesteps: {} pressure nodes, {} cluster flows",
            pressure_by_node.len(),
            pressure_by_node.width(),
            flow_by_cluster.width()
        );

        Ok(SimulationTables {
            pressure_by_node,
            flow_by_cluster,
        })
    }
}

fn read_source(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a single-header table: `,<id>,<id>...` followed by `<t>,<v>,<v>...`.
pub fn parse_flat(source_name: &str, text: &str) -> Result<TimeSeriesTable, LoadError> {
    let records = csv::parse_records(text);
    let (header, data) = records.split_first().ok_or_else(|| LoadError::Empty {
        source_name: source_name.to_string(),
    })?;

    let ids: Vec<(usize, String)> = header
        .fields
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, id)| (i, id.trim().to_string()))
        .collect();

    build_table(source_name, header.fields.len(), ids, data)
}

/// Parses a two-level header table and keeps the columns of `group`.
///
/// The first header row carries group names (`Pressure`, `Demand`), the second
/// the node ids. An index-name row with empty value cells may follow.
pub fn parse_grouped(source_name: &str, text: &str, group: &str) -> Result<TimeSeriesTable, LoadError> {
    let records = csv::parse_records(text);
    if records.len() < 2 {
        return Err(LoadError::Empty {
            source_name: source_name.to_string(),
        });
    }
    let (groups, ids_row) = (&records[0], &records[1]);

    let mut data = &records[2..];
    if let Some(first) = data.first() {
        if is_index_name_row(first) {
            data = &data[1..];
        }
    }

    let ids: Vec<(usize, String)> = groups
        .fields
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, g)| g.trim() == group)
        .filter_map(|(i, _)| ids_row.fields.get(i).map(|id| (i, id.trim().to_string())))
        .collect();

    if ids.is_empty() {
        return Err(LoadError::MissingGroup {
            source_name: source_name.to_string(),
            group: group.to_string(),
        });
    }

    build_table(source_name, groups.fields.len(), ids, data)
}

/// Parses a pressure source, accepting both `network_results.csv` and a flat
/// per-node pressure table.
pub fn parse_pressure(source_name: &str, text: &str) -> Result<TimeSeriesTable, LoadError> {
    let records = csv::parse_records(text);
    let grouped = records.len() >= 2
        && records[0].fields.iter().skip(1).any(|g| g.trim() == PRESSURE_GROUP)
        && records[1]
            .fields
            .first()
            .map_or(true, |cell| Timestamp::parse(cell).is_none());

    if grouped {
        parse_grouped(source_name, text, PRESSURE_GROUP)
    } else {
        parse_flat(source_name, text)
    }
}

fn is_index_name_row(record: &Record) -> bool {
    let first = record.fields.first().map(|c| c.trim()).unwrap_or("");
    Timestamp::parse(first).is_none() && record.fields.iter().skip(1).all(|c| c.trim().is_empty())
}

fn build_table(
    source_name: &str,
    expected_fields: usize,
    ids: Vec<(usize, String)>,
    data: &[Record],
) -> Result<TimeSeriesTable, LoadError> {
    let first = data.first().ok_or_else(|| LoadError::Empty {
        source_name: source_name.to_string(),
    })?;

    // Columns whose first cell is not numeric carry metadata (e.g. the
    // scenario name) and are not part of the table.
    let mut seen = HashSet::new();
    let mut numeric = Vec::with_capacity(ids.len());
    for (field, id) in ids {
        let sample = first.fields.get(field).map(String::as_str).unwrap_or("");
        if csv::parse_number(sample).is_none() {
            debug!("Skipping non-numeric column '{}' in {}", id, source_name);
            continue;
        }
        if !seen.insert(id.clone()) {
            return Err(LoadError::DuplicateColumn {
                source_name: source_name.to_string(),
                column: id,
            });
        }
        numeric.push((field, id));
    }

    let mut timestamps = Vec::with_capacity(data.len());
    let mut rows = Vec::with_capacity(data.len());

    for record in data {
        if record.fields.len() != expected_fields {
            return Err(LoadError::RaggedRow {
                source_name: source_name.to_string(),
                line: record.line,
                expected: expected_fields,
                found: record.fields.len(),
            });
        }

        let raw_t = &record.fields[0];
        let t = Timestamp::parse(raw_t).ok_or_else(|| LoadError::BadTimestamp {
            source_name: source_name.to_string(),
            line: record.line,
            value: raw_t.clone(),
        })?;

        let mut row = Vec::with_capacity(numeric.len());
        for (field, id) in &numeric {
            let raw = &record.fields[*field];
            let value = csv::parse_number(raw).ok_or_else(|| LoadError::BadValue {
                source_name: source_name.to_string(),
                line: record.line,
                column: id.clone(),
                value: raw.clone(),
            })?;
            row.push(value);
        }

        timestamps.push(t);
        rows.push(row);
    }

    let columns = numeric.into_iter().map(|(_, id)| id).collect();
    TimeSeriesTable::from_rows(timestamps, columns, rows)
}

fn check_alignment(pressure: &TimeSeriesTable, flow: &TimeSeriesTable) -> Result<(), LoadError> {
    if pressure.len() != flow.len() {
        return Err(LoadError::AxisLength {
            pressure: pressure.len(),
            flow: flow.len(),
        });
    }

    let diverged = pressure
        .timestamps()
        .iter()
        .zip(flow.timestamps())
        .enumerate()
        .find(|(_, (p, f))| p != f);

    match diverged {
        Some((row, (p, f))) => Err(LoadError::AxisOrder {
            row,
            pressure: *p,
            flow: *f,
        }),
        None => Ok(()),
    }
}
