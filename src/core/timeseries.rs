use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::LoadError;

/// A point on the simulation time axis, in seconds from the start of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Parses an index cell as written by the simulation driver.
    ///
    /// Accepts plain integers and floats with no fractional part (`3600.0`).
    /// Floats outside the `i64` range are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(secs) = raw.parse::<i64>() {
            return Some(Timestamp(secs));
        }
        match raw.parse::<f64>() {
            Ok(secs) if secs.fract() == 0.0 && in_i64_range(secs) => Some(Timestamp(secs as i64)),
            _ => None,
        }
    }

    pub fn seconds(&self) -> i64 {
        self.0
    }
}

// i64::MAX rounds up to 2^63 as f64, hence the strict upper bound.
fn in_i64_range(secs: f64) -> bool {
    secs >= i64::MIN as f64 && secs < i64::MAX as f64
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-timestep table of named numeric columns.
///
/// Column order is fixed at construction and is the iteration order used by
/// the scanner. Rows are stored in the order of the timestamp axis, which is
/// never re-sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    timestamps: Vec<Timestamp>,
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
    index: HashMap<String, usize>,
}

impl TimeSeriesTable {
    /// Builds a table from row-major values.
    pub fn from_rows(
        timestamps: Vec<Timestamp>,
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, LoadError> {
        if timestamps.len() != rows.len() {
            return Err(LoadError::Shape(format!(
                "{} timestamps but {} rows",
                timestamps.len(),
                rows.len()
            )));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(LoadError::Shape(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                columns.len()
            )));
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(LoadError::Shape(format!("duplicate column '{}'", name)));
            }
        }

        Ok(Self {
            timestamps,
            columns,
            rows,
            index,
        })
    }

    /// Builds a table from named column vectors, keeping the given column order.
    pub fn from_columns<S: Into<String>>(
        timestamps: Vec<Timestamp>,
        columns: Vec<(S, Vec<f64>)>,
    ) -> Result<Self, LoadError> {
        let mut names = Vec::with_capacity(columns.len());
        let mut rows = vec![Vec::with_capacity(columns.len()); timestamps.len()];

        for (name, values) in columns {
            let name = name.into();
            if values.len() != timestamps.len() {
                return Err(LoadError::Shape(format!(
                    "column '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    timestamps.len()
                )));
            }
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
            names.push(name);
        }

        Self::from_rows(timestamps, names, rows)
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of timesteps.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn row(&self, step: usize) -> &[f64] {
        &self.rows[step]
    }

    pub fn value(&self, step: usize, column: usize) -> f64 {
        self.rows[step][column]
    }

    /// All values of one column, in axis order.
    pub fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[col]).collect())
    }

    /// Returns a table restricted to the given columns, in the given order.
    ///
    /// Names missing from this table are skipped.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let mut picked: Vec<(usize, String)> = Vec::new();
        for name in names {
            let name = name.as_ref();
            if let Some(i) = self.column_index(name) {
                if !picked.iter().any(|(j, _)| *j == i) {
                    picked.push((i, name.to_string()));
                }
            }
        }

        let rows = self
            .rows
            .iter()
            .map(|row| picked.iter().map(|(i, _)| row[*i]).collect())
            .collect();
        let columns: Vec<String> = picked.into_iter().map(|(_, n)| n).collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        Self {
            timestamps: self.timestamps.clone(),
            columns,
            rows,
            index,
        }
    }

    /// True when both tables have the same timestamps in the same order.
    pub fn same_axis(&self, other: &TimeSeriesTable) -> bool {
        self.timestamps == other.timestamps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(n: i64) -> Vec<Timestamp> {
        (0..n).map(|i| Timestamp(i * 3600)).collect()
    }

    #[test]
    fn test_timestamp_parse() {
        assert_eq!(Timestamp::parse("3600"), Some(Timestamp(3600)));
        assert_eq!(Timestamp::parse(" 7200.0 "), Some(Timestamp(7200)));
        assert_eq!(Timestamp::parse("1.5"), None);
        assert_eq!(Timestamp::parse("noon"), None);
    }

    #[test]
    fn test_timestamp_parse_rejects_out_of_range_floats() {
        assert_eq!(Timestamp::parse("1e300"), None);
        assert_eq!(Timestamp::parse("-1e300"), None);
        assert_eq!(Timestamp::parse("9223372036854775808.0"), None);
        assert_eq!(Timestamp::parse("inf"), None);
        assert_eq!(Timestamp::parse("1e15"), Some(Timestamp(1_000_000_000_000_000)));
    }

    #[test]
    fn test_from_columns_keeps_order() {
        let table = TimeSeriesTable::from_columns(
            axis(2),
            vec![("B", vec![1.0, 2.0]), ("A", vec![3.0, 4.0])],
        )
        .unwrap();

        assert_eq!(table.columns(), &["B".to_string(), "A".to_string()]);
        assert_eq!(table.row(1), &[2.0, 4.0]);
        assert_eq!(table.column_index("A"), Some(1));
        assert_eq!(table.column_values("B"), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn test_from_columns_rejects_short_column() {
        let result = TimeSeriesTable::from_columns(axis(3), vec![("A", vec![1.0])]);
        assert!(matches!(result, Err(LoadError::Shape(_))));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = TimeSeriesTable::from_columns(
            axis(1),
            vec![("A", vec![1.0]), ("A", vec![2.0])],
        );
        assert!(matches!(result, Err(LoadError::Shape(_))));
    }

    #[test]
    fn test_select_skips_missing_and_reorders() {
        let table = TimeSeriesTable::from_columns(
            axis(1),
            vec![("A", vec![1.0]), ("B", vec![2.0]), ("C", vec![3.0])],
        )
        .unwrap();

        let picked = table.select(&["C", "missing", "A"]);
        assert_eq!(picked.columns(), &["C".to_string(), "A".to_string()]);
        assert_eq!(picked.row(0), &[3.0, 1.0]);
        assert!(picked.same_axis(&table));
    }
}
