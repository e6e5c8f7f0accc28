//! # Fallback Tide Model
//!
//! Synthetic semidiurnal tide used when no tide table is available. It keeps
//! the forecast running with a plausible tidal cycle, and the resulting hazard
//! table is flagged `tide_offline` so readers know the tide is approximate.
//!
//! ## Model Characteristics
//! - **Period**: 12.42 hours (principal lunar semidiurnal M2)
//! - **Amplitude**: 1.5 m around the site datum
//! - **Phase**: zero at the first grid timestamp
//!
//! ### Accuracy Trade-offs
//! - ✅ **Correct period**: matches the real semidiurnal cycle
//! - ❌ **No phase alignment**: high water is not synchronized with the site
//! - ❌ **No spring–neap envelope**: constant amplitude
//!
//! Rip and shore-break hazards depend strongly on tide level, so a forecast
//! on the synthetic tide indicates the range of conditions, not their timing.

use crate::error::Result;
use crate::grid::UniformGrid;
use crate::{Sample, TimeSeries};
use std::f64::consts::TAU;

/// M2 period in hours
const TIDE_PERIOD_HRS: f64 = 12.42;

/// Tide amplitude in metres
const TIDE_AMPLITUDE_M: f64 = 1.5;

/// Generate a synthetic tide elevation series on `grid`.
pub fn synthetic_tide(grid: &UniformGrid) -> Result<TimeSeries> {
    let start = grid.start();
    let samples = grid
        .timestamps()
        .into_iter()
        .map(|time| {
            let hours = (time - start).num_seconds() as f64 / 3600.0;
            Sample {
                time,
                value: TIDE_AMPLITUDE_M * (TAU * hours / TIDE_PERIOD_HRS).sin(),
            }
        })
        .collect();
    TimeSeries::new(crate::pipeline::columns::ETA, samples)
}
