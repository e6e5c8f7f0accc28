//! # Wave Refraction and Breaking
//!
//! Parametric transform from offshore wave conditions to the breaking point
//! (Larson et al., 2010). The model returns the breaking height, angle and
//! depth for a single wave state or, element-wise, for a batch.
//!
//! Waves approaching from behind the coastline normal (`|θ0| ≥ 90°`) never
//! reach the shore and are reported as fully dissipated.

use crate::dispersion::DispersionSolver;
use crate::error::{require_positive, HazardError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Wave state at the breaking point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakingWave {
    /// Breaking wave height Hb (m)
    pub height: f64,
    /// Breaking angle θb relative to the shore normal (degrees)
    pub angle_deg: f64,
    /// Breaking depth hb (m)
    pub depth: f64,
}

impl BreakingWave {
    /// Fully dissipated wave for an approach angle beyond ±90°.
    fn dissipated(theta0_deg: f64) -> Self {
        Self {
            height: 0.0,
            angle_deg: 90.0_f64.copysign(theta0_deg),
            depth: 0.0,
        }
    }
}

/// Refraction/breaking transform bound to a dispersion solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefractionModel {
    pub solver: DispersionSolver,
}

impl RefractionModel {
    pub fn new(solver: DispersionSolver) -> Self {
        Self { solver }
    }

    /// Transform offshore height `hs0`, period `tp0` and relative angle `theta0_deg`
    /// given at reference depth `h0` into the breaking wave state, using breaker
    /// index `gamma_b`.
    ///
    /// # Errors
    /// - [`HazardError::InvalidInput`] for non-positive height, period, depth or breaker index
    /// - [`HazardError::NumericalDegeneracy`] when the refraction coefficient
    ///   leaves the real domain
    /// - Solver errors propagate unchanged
    pub fn refract_and_break(
        &self,
        hs0: f64,
        tp0: f64,
        theta0_deg: f64,
        h0: f64,
        gamma_b: f64,
    ) -> Result<BreakingWave> {
        require_positive("reference depth", h0)?;
        require_positive("wave height", hs0)?;
        require_positive("wave period", tp0)?;
        require_positive("breaker index", gamma_b)?;
        if !theta0_deg.is_finite() {
            return Err(HazardError::InvalidInput(format!(
                "wave angle must be finite, got {theta0_deg}"
            )));
        }

        if theta0_deg.abs() >= 90.0 {
            return Ok(BreakingWave::dissipated(theta0_deg));
        }

        let g = self.solver.gravity;
        let k0 = self.solver.solve(tp0, h0)?;
        let c0 = TAU / (k0 * tp0);
        let cg0 = c0 * (0.5 + k0 * h0 / (2.0 * k0 * h0).sinh());

        let alpha = (c0 / (g * hs0).sqrt()).powi(4) * c0 * gamma_b * gamma_b / cg0;
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(HazardError::NumericalDegeneracy(format!(
                "breaking scale factor alpha = {alpha}"
            )));
        }

        let theta0 = theta0_deg.to_radians();
        let lambda_a = (theta0.cos() / alpha).powf(0.4);
        let eps = theta0.sin().powi(2) * lambda_a;
        let lambda = lambda_a
            * (1.0 + 0.1649 * eps + 0.5948 * eps.powi(2) - 1.6787 * eps.powi(3)
                + 2.8573 * eps.powi(4));

        if !lambda.is_finite() || lambda < 0.0 {
            return Err(HazardError::NumericalDegeneracy(format!(
                "refraction coefficient lambda = {lambda}"
            )));
        }

        let sin_b = lambda.sqrt() * theta0.sin();
        if sin_b.abs() > 1.0 {
            return Err(HazardError::NumericalDegeneracy(format!(
                "sin of breaking angle = {sin_b}"
            )));
        }

        let depth = lambda_a * c0 * c0 / g;
        Ok(BreakingWave {
            height: depth * gamma_b,
            angle_deg: sin_b.asin().to_degrees(),
            depth,
        })
    }

    /// Element-wise transform over equal-length slices.
    ///
    /// Each element carries its own result so one bad sample does not hide the
    /// others. Mismatched lengths are rejected up front.
    pub fn refract_and_break_batch(
        &self,
        hs0: &[f64],
        tp0: &[f64],
        theta0_deg: &[f64],
        h0: f64,
        gamma_b: f64,
    ) -> Result<Vec<Result<BreakingWave>>> {
        if hs0.len() != tp0.len() || hs0.len() != theta0_deg.len() {
            return Err(HazardError::InvalidInput(format!(
                "batch lengths differ: Hs={}, Tp={}, theta={}",
                hs0.len(),
                tp0.len(),
                theta0_deg.len()
            )));
        }

        Ok(hs0
            .iter()
            .zip(tp0)
            .zip(theta0_deg)
            .map(|((&h, &t), &a)| self.refract_and_break(h, t, a, h0, gamma_b))
            .collect())
    }
}

/// Incidence angle relative to the coastline normal, `direction − coastline`.
///
/// The difference is not wrapped; anything beyond ±90°, however far, is
/// treated as dissipated.
pub fn relative_angle(direction_deg: f64, coastline_deg: f64) -> f64 {
    direction_deg - coastline_deg
}
