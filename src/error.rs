//! # Hazard Pipeline Errors
//!
//! One taxonomy covers every failure the core can report. None of them is
//! fatal: per-point failures leave that point's hazard fields undefined and the
//! run continues, and coverage failures drop the grid point from the table.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised by the physics models, the aligner and the attendance stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HazardError {
    /// Non-physical parameter (non-positive depth, period, height, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Iterative solver exhausted its iteration budget
    #[error("no convergence after {iterations} iterations (residual {residual:e})")]
    NonConvergence { iterations: usize, residual: f64 },

    /// Intermediate value left the real domain (e.g. square root of a negative)
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    /// Grid point without interpolation support in at least one input
    #[error("missing coverage at {time}")]
    MissingCoverage { time: NaiveDateTime },

    /// The attendance predictor failed for a feature vector
    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// Shorthand used across the library.
pub type Result<T> = std::result::Result<T, HazardError>;

/// Reject values that are not strictly positive and finite.
pub(crate) fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(HazardError::InvalidInput(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}
