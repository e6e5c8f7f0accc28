//! # Rip Current Model
//!
//! Bar/channel setup model for a barred beach (Castelle et al., 2025). Wave
//! breaking over the sandbar raises the mean water level more than over the
//! rip channel; the setup difference drives the seaward discharge.

use crate::classify::{HazardLevel, Thresholds};
use crate::config::RipConfig;
use serde::{Deserialize, Serialize};

/// Empirical setup coefficient
const SETUP_COEFFICIENT: f64 = 0.16;

/// Rip current state for one grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RipCurrent {
    /// Setup over the bar crest Eta_b (m)
    pub bar_setup: f64,
    /// Setup over the channel Eta_c (m)
    pub channel_setup: f64,
    /// Pg = max(0, Eta_b − Eta_c) (m)
    pub pressure_gradient: f64,
    /// Discharge velocity U (m/s)
    pub velocity: f64,
}

/// Rip current model for a fixed bar/channel geometry.
#[derive(Debug, Clone)]
pub struct RipCurrentModel {
    gravity: f64,
    /// Breaker parameter γ
    gamma: f64,
    /// Sandbar crest elevation z̄ relative to the tide datum (m)
    bar_elevation: f64,
    /// Channel depth below the bar crest d (m)
    channel_depth: f64,
    thresholds: Thresholds,
}

impl RipCurrentModel {
    pub fn new(config: &RipConfig, gravity: f64) -> Self {
        Self {
            gravity,
            gamma: config.gamma,
            bar_elevation: config.bar_elevation,
            channel_depth: config.channel_depth,
            thresholds: config.thresholds,
        }
    }

    /// Evaluate the model for tide elevation `eta` and breaking height `breaking_height`.
    pub fn evaluate(&self, eta: f64, breaking_height: f64) -> RipCurrent {
        let h = eta - self.bar_elevation;
        let bar_setup = self.setup(h, breaking_height);
        let channel_setup = self.setup(h + self.channel_depth, breaking_height);
        let pressure_gradient = (bar_setup - channel_setup).max(0.0);

        RipCurrent {
            bar_setup,
            channel_setup,
            pressure_gradient,
            velocity: discharge_velocity(pressure_gradient, self.gravity),
        }
    }

    pub fn classify(&self, velocity: f64) -> Option<HazardLevel> {
        self.thresholds.classify(velocity)
    }

    /// Setup over a feature submerged by `depth`; zero when dry or when the
    /// wave passes without breaking.
    fn setup(&self, depth: f64, height: f64) -> f64 {
        if depth <= 0.0 || height <= self.gamma * depth {
            0.0
        } else {
            SETUP_COEFFICIENT * (height - self.gamma * depth).powi(2) / height
        }
    }
}

/// `U = √(2·g·Pg)`; non-positive gradients give no flow.
pub fn discharge_velocity(pressure_gradient: f64, gravity: f64) -> f64 {
    (2.0 * gravity * pressure_gradient.max(0.0)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn model() -> RipCurrentModel {
        let config = Config::default();
        RipCurrentModel::new(&config.site.rip, config.site.gravity)
    }

    #[test]
    fn test_dry_bar_gives_no_flow() {
        // eta = -5 with bar at -3: h = -2
        let rip = model().evaluate(-5.0, 1.8);
        assert_eq!(rip.bar_setup, 0.0);
        assert_eq!(rip.velocity, 0.0);
        assert_eq!(model().classify(rip.velocity), Some(HazardLevel::Negligible));
    }

    #[test]
    fn test_breaking_over_bar_drives_flow() {
        // h = 0.5 over the bar, 7 m over the channel
        let rip = model().evaluate(-2.5, 2.0);
        let expected_bar = 0.16 * (2.0 - 0.23 * 0.5_f64).powi(2) / 2.0;
        assert!((rip.bar_setup - expected_bar).abs() < 1e-12);
        // 2.0 <= 0.23 * 7.0, so no breaking over the channel
        assert_eq!(rip.channel_setup, 0.0);
        assert!((rip.velocity - (2.0 * 9.81 * expected_bar).sqrt()).abs() < 1e-12);
        assert!(rip.velocity > 0.0);
    }

    #[test]
    fn test_no_flow_when_channel_setup_dominates() {
        let m = model();
        for eta in [-4.0, -3.0, -2.0, 0.0, 2.0] {
            for height in [0.0, 0.5, 1.5, 3.0, 6.0] {
                let r = m.evaluate(eta, height);
                if r.bar_setup <= r.channel_setup {
                    assert_eq!(r.velocity, 0.0);
                }
                assert!(r.pressure_gradient >= 0.0);
            }
        }
        assert_eq!(discharge_velocity(-0.1, 9.81), 0.0);
    }

    #[test]
    fn test_velocity_monotonic_in_gradient() {
        let mut previous = 0.0;
        for i in 0..100 {
            let u = discharge_velocity(i as f64 * 0.01, 9.81);
            assert!(u >= previous);
            previous = u;
        }
    }

    #[test]
    fn test_zero_breaking_height_is_calm() {
        let rip = model().evaluate(0.0, 0.0);
        assert_eq!(rip.velocity, 0.0);
        assert!(rip.bar_setup == 0.0 && rip.channel_setup == 0.0);
    }

    #[test]
    fn test_low_tide_with_big_waves_is_hazardous() {
        let m = model();
        let rip = m.evaluate(-2.0, 3.0);
        assert!(rip.velocity > 0.9107, "U = {}", rip.velocity);
        assert!(m.classify(rip.velocity).unwrap() >= HazardLevel::Moderate);
    }
}
