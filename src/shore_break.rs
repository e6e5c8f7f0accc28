//! # Shore-Break Index Model
//!
//! Shore-break waves plunge directly on the steep upper beach. Their energy is
//! scored with an Iribarren-type surf-similarity number computed from the
//! local beach slope at the tide level and the breaking height that survives
//! the low-tide terrace:
//!
//! ```text
//! Irr   = slope / sqrt(Hbs / L0)
//! Index = Irr * Hbs^e
//! ```
//!
//! The beach is an idealized concave profile `z(x) = z0 + b·x^c`; its slope is
//! looked up by elevation, and tide levels outside the profile have no index.

use crate::classify::{HazardLevel, Thresholds};
use crate::config::ShoreBreakConfig;
use crate::dispersion::deep_water_wavelength;
use crate::error::{require_positive, HazardError, Result};
use serde::{Deserialize, Serialize};

/// Static cross-shore beach profile, slope keyed by elevation.
///
/// Built once at startup and shared read-only by every grid point.
#[derive(Debug, Clone)]
pub struct BeachProfile {
    /// Segment midpoint elevations, ascending
    elevations: Vec<f64>,
    /// Slope `-dz/dx` at the matching midpoint
    slopes: Vec<f64>,
}

impl BeachProfile {
    /// Sample `z(x) = crest + b·x^c` on `x ∈ [0, length]` every `dx` metres.
    ///
    /// # Errors
    /// [`HazardError::InvalidInput`] for non-positive spacing/length or a shape
    /// that is not strictly monotonic (slope lookup by elevation needs it).
    pub fn new(crest: f64, b: f64, c: f64, dx: f64, length: f64) -> Result<Self> {
        require_positive("profile spacing", dx)?;
        require_positive("profile length", length)?;

        let nodes = (length / dx).round() as usize + 1;
        if nodes < 2 {
            return Err(HazardError::InvalidInput(format!(
                "profile needs at least two nodes (length {length}, dx {dx})"
            )));
        }
        let z: Vec<f64> = (0..nodes)
            .map(|i| crest + b * (i as f64 * dx).powf(c))
            .collect();

        let mut segments: Vec<(f64, f64)> = z
            .windows(2)
            .map(|w| (0.5 * (w[0] + w[1]), -(w[1] - w[0]) / dx))
            .collect();
        segments.sort_by(|a, b| a.0.total_cmp(&b.0));

        if segments
            .windows(2)
            .any(|w| !(w[0].0 < w[1].0) || !w[0].0.is_finite() || !w[1].0.is_finite())
        {
            return Err(HazardError::InvalidInput(format!(
                "profile shape (b = {b}, c = {c}) is not strictly monotonic"
            )));
        }

        let (elevations, slopes) = segments.into_iter().unzip();
        Ok(Self { elevations, slopes })
    }

    pub fn from_config(config: &ShoreBreakConfig) -> Result<Self> {
        Self::new(
            config.crest_elevation,
            config.profile_b,
            config.profile_c,
            config.profile_dx,
            config.profile_length,
        )
    }

    /// Linear interpolation of the slope at `elevation`; `None` outside the profile.
    pub fn slope_at(&self, elevation: f64) -> Option<f64> {
        let first = *self.elevations.first()?;
        let last = *self.elevations.last()?;
        if !(first..=last).contains(&elevation) {
            return None;
        }

        let upper = self
            .elevations
            .partition_point(|&e| e < elevation)
            .max(1)
            .min(self.elevations.len() - 1);
        let (e0, e1) = (self.elevations[upper - 1], self.elevations[upper]);
        let (s0, s1) = (self.slopes[upper - 1], self.slopes[upper]);
        let alpha = (elevation - e0) / (e1 - e0);
        Some(s0 + alpha * (s1 - s0))
    }

    /// Elevation range `(lowest, highest)` covered by the slope table.
    pub fn elevation_range(&self) -> (f64, f64) {
        (
            self.elevations.first().copied().unwrap_or(f64::NAN),
            self.elevations.last().copied().unwrap_or(f64::NAN),
        )
    }
}

/// Shore-break state for one grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShoreBreak {
    /// Beach slope at the tide level
    pub slope: f64,
    /// Breaking height reaching the shore Hbs (m)
    pub breaking_height: f64,
    /// Surf-similarity number Irr
    pub iribarren: f64,
    /// Shore-break energy index
    pub index: f64,
}

impl ShoreBreak {
    const CALM: ShoreBreak = ShoreBreak {
        slope: 0.0,
        breaking_height: 0.0,
        iribarren: 0.0,
        index: 0.0,
    };
}

#[derive(Debug, Clone)]
pub struct ShoreBreakModel {
    gravity: f64,
    /// Breaker parameter γs
    gamma: f64,
    /// Low-tide terrace elevation Zl (m)
    terrace_elevation: f64,
    /// Exponent e on Hbs in the index
    exponent: f64,
    thresholds: Thresholds,
    profile: BeachProfile,
}

impl ShoreBreakModel {
    pub fn new(config: &ShoreBreakConfig, gravity: f64) -> Result<Self> {
        Ok(Self {
            gravity,
            gamma: config.gamma,
            terrace_elevation: config.terrace_elevation,
            exponent: config.exponent,
            thresholds: config.thresholds,
            profile: BeachProfile::from_config(config)?,
        })
    }

    pub fn profile(&self) -> &BeachProfile {
        &self.profile
    }

    /// Evaluate at tide elevation `eta` for breaking height `breaking_height`
    /// and peak period `period`.
    ///
    /// Returns `None` when the tide level falls outside the beach profile.
    pub fn evaluate(&self, eta: f64, breaking_height: f64, period: f64) -> Option<ShoreBreak> {
        // Tide below the terrace: waves break on the terrace, not the beach face
        if eta < self.terrace_elevation {
            return Some(ShoreBreak::CALM);
        }
        if breaking_height <= 0.0 {
            return Some(ShoreBreak::CALM);
        }

        let clearance = eta - self.terrace_elevation;
        let height = if eta - breaking_height / self.gamma > self.terrace_elevation {
            breaking_height
        } else {
            breaking_height - (breaking_height - self.gamma * clearance).powi(2) / breaking_height
        };

        let slope = self.profile.slope_at(eta)?;
        let wavelength = deep_water_wavelength(period, self.gravity);
        let iribarren = if height > 0.0 {
            slope / (height / wavelength).sqrt()
        } else {
            0.0
        };

        Some(ShoreBreak {
            slope,
            breaking_height: height,
            iribarren,
            index: iribarren * height.max(0.0).powf(self.exponent),
        })
    }

    pub fn classify(&self, index: f64) -> Option<HazardLevel> {
        self.thresholds.classify(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use approx::assert_relative_eq;

    fn model() -> ShoreBreakModel {
        let config = Config::default();
        ShoreBreakModel::new(&config.site.shore_break, config.site.gravity).unwrap()
    }

    #[test]
    fn test_profile_range_and_slope() {
        let profile = BeachProfile::new(5.0, -2.75, 0.3, 2.0, 1000.0).unwrap();
        let (low, high) = profile.elevation_range();
        assert!(low < -16.0 && low > -17.0, "low = {low}");
        assert!(high < 5.0 && high > 3.0, "high = {high}");

        // Concave profile: steeper near the top than offshore
        let upper = profile.slope_at(2.0).unwrap();
        let lower = profile.slope_at(-10.0).unwrap();
        assert!(upper > lower && lower > 0.0);
    }

    #[test]
    fn test_slope_interpolates_linearly() {
        // Linear profile z = 5 - 0.1 x: constant slope 0.1
        let profile = BeachProfile::new(5.0, -0.1, 1.0, 1.0, 100.0).unwrap();
        assert_relative_eq!(profile.slope_at(0.0).unwrap(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(profile.slope_at(-3.33).unwrap(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_slope_outside_profile_is_undefined() {
        let profile = BeachProfile::new(5.0, -2.75, 0.3, 2.0, 1000.0).unwrap();
        assert_eq!(profile.slope_at(6.0), None);
        assert_eq!(profile.slope_at(-40.0), None);
        assert_eq!(profile.slope_at(f64::NAN), None);
    }

    #[test]
    fn test_flat_profile_is_rejected() {
        assert!(BeachProfile::new(5.0, 0.0, 0.3, 2.0, 1000.0).is_err());
        assert!(BeachProfile::new(5.0, -2.75, 0.3, 0.0, 1000.0).is_err());
    }

    #[test]
    fn test_submerged_terrace_regime() {
        let sb = model().evaluate(-2.5, 2.0, 10.0).unwrap();
        assert_eq!(sb, ShoreBreak::CALM);
    }

    #[test]
    fn test_full_breaking_height_reaches_shore() {
        let m = model();
        // eta - H/γs = 2.0 - 1.0/0.4 = -0.5 > -2
        let sb = m.evaluate(2.0, 1.0, 10.0).unwrap();
        assert_eq!(sb.breaking_height, 1.0);
        let l0 = 9.81 * 100.0 / std::f64::consts::TAU;
        let slope = m.profile().slope_at(2.0).unwrap();
        assert_relative_eq!(sb.iribarren, slope / (1.0 / l0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(sb.index, sb.iribarren, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_dissipation_regime() {
        // eta - H/γs = -1.0 - 2.0/0.4 = -6 <= -2
        let sb = model().evaluate(-1.0, 2.0, 10.0).unwrap();
        let expected = 2.0 - (2.0 - 0.4 * 1.0_f64).powi(2) / 2.0;
        assert_relative_eq!(sb.breaking_height, expected, epsilon = 1e-12);
        assert!(sb.breaking_height > 0.0 && sb.breaking_height < 2.0);
        assert!(sb.index > 0.0);
    }

    #[test]
    fn test_zero_breaking_height_is_calm() {
        let sb = model().evaluate(1.0, 0.0, 10.0).unwrap();
        assert_eq!(sb.index, 0.0);
        assert_eq!(sb.iribarren, 0.0);
    }

    #[test]
    fn test_tide_at_terrace_has_no_index() {
        let sb = model().evaluate(-2.0, 1.0, 10.0).unwrap();
        assert_eq!(sb.breaking_height, 0.0);
        assert_eq!(sb.index, 0.0);
    }

    #[test]
    fn test_tide_above_profile_is_undefined() {
        assert_eq!(model().evaluate(8.0, 1.0, 10.0), None);
    }

    #[test]
    fn test_classification() {
        let m = model();
        assert_eq!(m.classify(1.0), Some(HazardLevel::Negligible));
        assert_eq!(m.classify(5.1730), Some(HazardLevel::High));
        assert_eq!(m.classify(f64::NAN), None);
    }
}
