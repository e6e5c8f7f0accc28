//! # Time-Grid Alignment
//!
//! Resamples heterogeneous input series (hourly waves, hourly weather, tide
//! tables with irregular times) onto one uniform grid.
//!
//! Alignment is fail-closed: a grid point is kept only if every column has a
//! value there after interpolation. Points outside any series' range are
//! dropped and reported, never filled by extrapolation.

use crate::error::{HazardError, Result};
use crate::TimeSeries;
use chrono::{Duration, NaiveDateTime};
use tracing::debug;

/// Ordered timestamps `start + i·step`, `start ≤ t ≤ end`.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformGrid {
    start: NaiveDateTime,
    end: NaiveDateTime,
    step: Duration,
}

impl UniformGrid {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, step: Duration) -> Result<Self> {
        if step <= Duration::zero() {
            return Err(HazardError::InvalidInput(format!(
                "grid step must be positive, got {step}"
            )));
        }
        if end < start {
            return Err(HazardError::InvalidInput(format!(
                "grid end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end, step })
    }

    /// Grid spanning `series` from its first to its last sample.
    pub fn spanning(series: &TimeSeries, step: Duration) -> Result<Self> {
        let (start, end) = series.span().ok_or_else(|| {
            HazardError::InvalidInput(format!("series {} is empty", series.name()))
        })?;
        Self::new(start, end, step)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn len(&self) -> usize {
        let span = (self.end - self.start).num_milliseconds();
        (span / self.step.num_milliseconds()) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        (0..self.len())
            .map(|i| self.start + self.step * i as i32)
            .collect()
    }
}

/// One fully covered grid point; `values` follows the table's column order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub time: NaiveDateTime,
    pub values: Vec<f64>,
}

/// Inputs merged onto the grid.
#[derive(Debug, Clone, Default)]
pub struct AlignedTable {
    columns: Vec<String>,
    rows: Vec<AlignedRow>,
    dropped: Vec<NaiveDateTime>,
}

impl AlignedTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    /// Grid timestamps excluded for missing coverage.
    pub fn dropped(&self) -> &[NaiveDateTime] {
        &self.dropped
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Column index for `name`, as an error when the column is absent.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| {
            HazardError::InvalidInput(format!("aligned table has no column {name}"))
        })
    }

    /// Values of one column over all kept rows.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }
}

/// Interpolate every series onto `grid` and keep only fully covered points.
///
/// # Example
/// ```
/// use beach_hazard_lib::grid::{align, UniformGrid};
/// use beach_hazard_lib::TimeSeries;
/// use chrono::{Duration, NaiveDate};
///
/// let t0 = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let hs = TimeSeries::from_pairs("Hs", &[t0, t0 + Duration::hours(1)], &[1.0, 2.0]).unwrap();
/// let grid = UniformGrid::new(t0, t0 + Duration::hours(1), Duration::minutes(10)).unwrap();
///
/// let table = align(&grid, &[&hs]);
/// assert_eq!(table.rows().len(), 7);
/// ```
pub fn align(grid: &UniformGrid, series: &[&TimeSeries]) -> AlignedTable {
    let columns: Vec<String> = series.iter().map(|s| s.name().to_string()).collect();
    let mut rows = Vec::with_capacity(grid.len());
    let mut dropped = Vec::new();

    for time in grid.timestamps() {
        let values: Option<Vec<f64>> = series.iter().map(|s| s.value_at(time)).collect();
        match values {
            Some(values) => rows.push(AlignedRow { time, values }),
            None => {
                let missing: Vec<&str> = series
                    .iter()
                    .filter(|s| s.value_at(time).is_none())
                    .map(|s| s.name())
                    .collect();
                debug!(%time, ?missing, "{}", HazardError::MissingCoverage { time });
                dropped.push(time);
            }
        }
    }

    AlignedTable {
        columns,
        rows,
        dropped,
    }
}
