//! # Beach Hazard Core Library
//!
//! Nearshore hazard forecasting for a fixed beach: rip-current velocity,
//! shore-break energy and expected attendance, each classified into five
//! levels on a uniform 10-minute grid.
//!
//! ## Data Flow
//! 1. **Acquire**: wave/weather forecasts from Open-Meteo and a tide table
//!    ([`sources`]), or a synthetic tide ([`fallback`]) when none is available
//! 2. **Align**: every series is interpolated in time onto one grid ([`grid`]);
//!    grid points without full coverage are dropped
//! 3. **Evaluate**: per grid point, dispersion → refraction/breaking →
//!    rip current and shore-break, plus the attendance predictor ([`pipeline`])
//! 4. **Classify**: continuous outputs become levels 0–4 ([`classify`])
//!
//! Each grid point is a pure function of its aligned inputs and the immutable
//! [`config::Config`]; there is no state carried between points.
//!
//! ## Core Types
//! - [`Sample`] / [`TimeSeries`]: a named physical quantity over time
//! - [`HazardRecord`] / [`HazardTable`]: the pipeline's terminal output

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub mod attendance;
pub mod classify;
pub mod config;
pub mod dispersion;
pub mod error;
pub mod fallback;
pub mod grid;
pub mod pipeline;
pub mod refraction;
pub mod report;
pub mod rip_current;
pub mod shore_break;
pub mod sources;

pub use classify::HazardLevel;
pub use error::HazardError;

/// One observation or forecast value.
///
/// Times are naive local site time; the operating-hours window and the
/// daily-mean features are defined in that clock.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: NaiveDateTime,
    pub value: f64,
}

/// A named physical quantity sampled at strictly increasing times.
///
/// # Example
/// ```
/// use beach_hazard_lib::{Sample, TimeSeries};
/// use chrono::NaiveDate;
///
/// let t0 = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap().and_hms_opt(10, 0, 0).unwrap();
/// let series = TimeSeries::new(
///     "Hs",
///     vec![
///         Sample { time: t0, value: 1.2 },
///         Sample { time: t0 + chrono::Duration::hours(1), value: 1.4 },
///     ],
/// )
/// .unwrap();
///
/// let mid = series.value_at(t0 + chrono::Duration::minutes(30)).unwrap();
/// assert!((mid - 1.3).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    name: String,
    samples: Vec<Sample>,
}

impl TimeSeries {
    /// Build a series, rejecting non-finite values and timestamps that are not
    /// strictly increasing.
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> error::Result<Self> {
        let name = name.into();
        if let Some(bad) = samples.iter().find(|s| !s.value.is_finite()) {
            return Err(HazardError::InvalidInput(format!(
                "series {name}: non-finite value at {}",
                bad.time
            )));
        }
        if let Some(w) = samples.windows(2).find(|w| w[0].time >= w[1].time) {
            return Err(HazardError::InvalidInput(format!(
                "series {name}: timestamps not strictly increasing at {}",
                w[1].time
            )));
        }
        Ok(Self { name, samples })
    }

    /// Build a series from parallel time/value slices.
    pub fn from_pairs(
        name: impl Into<String>,
        times: &[NaiveDateTime],
        values: &[f64],
    ) -> error::Result<Self> {
        let name = name.into();
        if times.len() != values.len() {
            return Err(HazardError::InvalidInput(format!(
                "series {name}: {} times for {} values",
                times.len(),
                values.len()
            )));
        }
        let samples = times
            .iter()
            .zip(values)
            .map(|(&time, &value)| Sample { time, value })
            .collect();
        Self::new(name, samples)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// First and last timestamps, if any.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.samples.first()?.time, self.samples.last()?.time))
    }

    /// Linear interpolation in time at `time`.
    ///
    /// Weights are proportional to elapsed time, not sample count. Returns
    /// `None` outside the sampled range; there is no extrapolation.
    pub fn value_at(&self, time: NaiveDateTime) -> Option<f64> {
        let (first, last) = self.span()?;
        if time < first || time > last {
            return None;
        }

        let upper = self.samples.partition_point(|s| s.time < time);
        let hi = self.samples[upper];
        if hi.time == time || upper == 0 {
            return Some(hi.value);
        }
        let lo = self.samples[upper - 1];

        let span = (hi.time - lo.time).num_milliseconds() as f64;
        let elapsed = (time - lo.time).num_milliseconds() as f64;
        let alpha = elapsed / span;
        Some(lo.value + alpha * (hi.value - lo.value))
    }

    /// Interpolate onto arbitrary timestamps.
    pub fn resample(&self, times: &[NaiveDateTime]) -> Vec<Option<f64>> {
        times.iter().map(|&t| self.value_at(t)).collect()
    }
}

/// Marine inputs at one grid point, carried into the record for export.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarineConditions {
    /// Significant wave height Hs (m)
    pub hs: f64,
    /// Peak period Tp (s)
    pub tp: f64,
    /// Incident direction, compass degrees
    pub dir: f64,
    /// Tide elevation η relative to the site datum (m)
    pub eta: f64,
}

/// Hazard outputs at one grid point.
///
/// `None` marks a quantity that could not be computed (out-of-hours
/// attendance, a failed solver, a tide outside the beach profile). It is never
/// the same thing as level 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardRecord {
    pub time: NaiveDateTime,
    pub conditions: MarineConditions,
    /// Predicted attendance in percent of the maximum crowd
    pub attendance_pct: Option<f64>,
    pub attendance_level: Option<HazardLevel>,
    /// Rip discharge velocity U (m/s)
    pub rip_velocity: Option<f64>,
    pub rip_level: Option<HazardLevel>,
    pub shorebreak_index: Option<f64>,
    pub shorebreak_level: Option<HazardLevel>,
}

/// The pipeline's terminal output, one record per covered grid point.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HazardTable {
    pub records: Vec<HazardRecord>,
    /// Grid timestamps excluded for missing input coverage
    pub dropped: Vec<NaiveDateTime>,
    /// True if the tide came from the synthetic fallback model
    pub tide_offline: bool,
}

impl HazardTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, time: NaiveDateTime) -> Option<&HazardRecord> {
        self.records
            .binary_search_by(|r| r.time.cmp(&time))
            .ok()
            .map(|i| &self.records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn t(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 14)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_series_rejects_unordered_times() {
        let samples = vec![
            Sample { time: t(10, 0), value: 1.0 },
            Sample { time: t(10, 0), value: 2.0 },
        ];
        assert!(TimeSeries::new("Hs", samples).is_err());
    }

    #[test]
    fn test_series_rejects_nan() {
        let samples = vec![Sample { time: t(10, 0), value: f64::NAN }];
        assert!(TimeSeries::new("Hs", samples).is_err());
    }

    #[test]
    fn test_time_weighted_interpolation() {
        // Uneven spacing: 1 h then 3 h
        let series = TimeSeries::from_pairs(
            "Eta",
            &[t(0, 0), t(1, 0), t(4, 0)],
            &[0.0, 1.0, 4.0],
        )
        .unwrap();
        // Time weighting gives 2.5 at 02:30; index weighting would not
        let v = series.value_at(t(2, 30)).unwrap();
        assert!((v - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_no_extrapolation() {
        let series = TimeSeries::from_pairs("Eta", &[t(1, 0), t(2, 0)], &[0.0, 1.0]).unwrap();
        assert_eq!(series.value_at(t(0, 50)), None);
        assert_eq!(series.value_at(t(2, 10)), None);
        assert_eq!(series.value_at(t(2, 0)), Some(1.0));
        assert_eq!(series.value_at(t(1, 0)), Some(0.0));
    }

    #[test]
    fn test_resample_onto_own_timestamps_is_exact() {
        let times: Vec<_> = (0..12).map(|i| t(6, 0) + Duration::minutes(i * 37)).collect();
        let values: Vec<f64> = times.iter().enumerate().map(|(i, _)| (i as f64 * 0.7).sin()).collect();
        let series = TimeSeries::from_pairs("Hs", &times, &values).unwrap();

        let resampled = series.resample(&times);
        for (original, back) in values.iter().zip(resampled) {
            assert!((original - back.unwrap()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_series_has_no_values() {
        let series = TimeSeries::new("Hs", vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.value_at(t(0, 0)), None);
    }
}
