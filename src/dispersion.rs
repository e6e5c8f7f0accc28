//! # Linear Dispersion Relation
//!
//! Solves `ω² = g·k·tanh(k·d)` for the wavenumber `k` by Newton-Raphson.
//! The iteration is bounded: degenerate inputs (very shallow water, extreme
//! periods) report [`HazardError::NonConvergence`] instead of spinning.

use crate::error::{require_positive, HazardError, Result};
use std::f64::consts::TAU;

/// Standard gravity in m/s²
pub const GRAVITY: f64 = 9.81;

/// Starting wavenumber for the Newton iteration (rad/m)
const INITIAL_GUESS: f64 = 0.5;

/// Newton-Raphson parameters for the dispersion relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispersionSolver {
    pub gravity: f64,
    /// Convergence threshold on `|ω² − g·k·tanh(k·d)|`
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for DispersionSolver {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            tolerance: 1e-4,
            max_iterations: 100,
        }
    }
}

impl DispersionSolver {
    pub fn new(gravity: f64, tolerance: f64, max_iterations: usize) -> Self {
        Self {
            gravity,
            tolerance: tolerance.abs(),
            max_iterations,
        }
    }

    /// Wavenumber `k > 0` for wave period `period` (s) in water of depth `depth` (m).
    ///
    /// # Errors
    /// - [`HazardError::InvalidInput`] for non-positive or non-finite period/depth
    /// - [`HazardError::NonConvergence`] when the iteration budget runs out or
    ///   the iterate leaves the finite range
    ///
    /// # Example
    /// ```
    /// use beach_hazard_lib::dispersion::DispersionSolver;
    ///
    /// let solver = DispersionSolver::default();
    /// let k = solver.solve(8.0, 6.5).unwrap();
    /// assert!(k > 0.0);
    /// ```
    pub fn solve(&self, period: f64, depth: f64) -> Result<f64> {
        require_positive("wave period", period)?;
        require_positive("water depth", depth)?;

        let g = self.gravity;
        let omega2 = (TAU / period).powi(2);
        let mut k = INITIAL_GUESS;

        let mut iteration = 0;
        loop {
            let tanh_kd = (k * depth).tanh();
            let residual = omega2 - g * k * tanh_kd;

            if residual.abs() <= self.tolerance {
                // f is even in k, so a negative root mirrors the positive one
                let k = k.abs();
                if k == 0.0 {
                    return Err(HazardError::NonConvergence {
                        iterations: iteration,
                        residual,
                    });
                }
                return Ok(k);
            }
            if iteration >= self.max_iterations {
                return Err(HazardError::NonConvergence {
                    iterations: iteration,
                    residual,
                });
            }

            let slope = -g * (tanh_kd + k * depth * (1.0 - tanh_kd * tanh_kd));
            if slope == 0.0 || !slope.is_finite() {
                return Err(HazardError::NonConvergence {
                    iterations: iteration,
                    residual,
                });
            }
            k -= residual / slope;

            if !k.is_finite() {
                return Err(HazardError::NonConvergence {
                    iterations: iteration + 1,
                    residual,
                });
            }
            iteration += 1;
        }
    }
}

/// Solve with the default gravity, the given tolerance and the default iteration cap.
pub fn solve_wavenumber(period: f64, depth: f64, tolerance: f64) -> Result<f64> {
    DispersionSolver {
        tolerance: tolerance.abs(),
        ..DispersionSolver::default()
    }
    .solve(period, depth)
}

/// Deep-water wavelength `L0 = g·T²/(2π)`.
pub fn deep_water_wavelength(period: f64, gravity: f64) -> f64 {
    gravity * period * period / TAU
}
