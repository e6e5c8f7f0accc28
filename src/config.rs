//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! hazard-config.toml file. Every site constant the models use is a named
//! field here; components receive the parsed values at construction and never
//! look anything up globally.
//!
//! Defaults are the calibrated values for Biscarrosse beach (Castelle et al.).

use crate::classify::Thresholds;
use crate::dispersion::{DispersionSolver, GRAVITY};
use crate::error::{require_positive, HazardError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "hazard-config.toml";

/// Application configuration loaded from hazard-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Physical site constants and hazard thresholds
    pub site: SiteConfig,
    /// Attendance model boundary
    pub attendance: AttendanceConfig,
    /// Forecast data sources
    pub sources: SourceConfig,
    /// Time grid
    pub grid: GridConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Gravity in m/s²
    pub gravity: f64,
    /// Shore-normal compass orientation θc in degrees
    pub coastline_orientation: f64,
    pub solver: SolverConfig,
    pub refraction: RefractionConfig,
    pub rip: RipConfig,
    pub shore_break: ShoreBreakConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RefractionConfig {
    /// Depth at which offshore conditions are given (m)
    pub reference_depth: f64,
    /// Breaker index γb
    pub breaker_index: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RipConfig {
    /// Breaker parameter γ
    pub gamma: f64,
    /// Sandbar crest elevation z̄ (m)
    pub bar_elevation: f64,
    /// Rip channel depth d (m)
    pub channel_depth: f64,
    /// SR1..SR4 in m/s
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShoreBreakConfig {
    /// Breaker parameter γs
    pub gamma: f64,
    /// Low-tide terrace elevation Zl (m)
    pub terrace_elevation: f64,
    /// Exponent e on the shore breaking height
    pub exponent: f64,
    /// Profile elevation at x = 0 (m)
    pub crest_elevation: f64,
    /// Shape parameters of z = crest + b·x^c
    pub profile_b: f64,
    pub profile_c: f64,
    /// Cross-shore spacing dx (m)
    pub profile_dx: f64,
    /// Cross-shore extent (m)
    pub profile_length: f64,
    /// SS1..SS4
    pub thresholds: Thresholds,
}

/// Standardization parameters for one predictor feature.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeatureScaling {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Maximum potential attendance (people), the 100 % reference
    pub max_crowd: f64,
    /// Beach supervision opens at this hour (inclusive)
    pub open_hour: u32,
    /// Beach supervision closes at this hour (exclusive)
    pub close_hour: u32,
    /// Daily-mean weather features average over [start, end) hours
    pub mean_window_start: u32,
    pub mean_window_end: u32,
    /// S1..S4 in percent of max crowd
    pub thresholds: Thresholds,
    /// Target denormalization
    pub target_mean: f64,
    pub target_std: f64,
    /// Feature standardization, in predictor input order
    pub features: Vec<FeatureScaling>,
    /// Linear stand-in for the trained regression model
    pub model: LinearModelConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LinearModelConfig {
    pub weights: Vec<f64>,
    pub bias: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Open-Meteo marine endpoint (wave_height, wave_direction, wave_period)
    pub marine_url: String,
    /// Open-Meteo forecast endpoint (temperature, precipitation, clouds, wind)
    pub weather_url: String,
    /// Tide table CSV; the synthetic tide is used when absent or unreadable
    pub tide_csv: Option<String>,
    /// Height column in the tide table
    pub tide_column: String,
    /// Directory for cached API responses
    pub cache_dir: String,
    /// Cache TTL in minutes
    pub cache_ttl_minutes: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GridConfig {
    /// Grid spacing Δt in minutes
    pub step_minutes: i64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            gravity: GRAVITY,
            coastline_orientation: 284.1,
            solver: SolverConfig::default(),
            refraction: RefractionConfig::default(),
            rip: RipConfig::default(),
            shore_break: ShoreBreakConfig::default(),
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            tolerance: 1e-4,
            max_iterations: 100,
        }
    }
}

impl Default for RefractionConfig {
    fn default() -> Self {
        RefractionConfig {
            reference_depth: 10.0,
            breaker_index: 0.7,
        }
    }
}

impl Default for RipConfig {
    fn default() -> Self {
        RipConfig {
            gamma: 0.23,
            bar_elevation: -3.0,
            channel_depth: 6.5,
            thresholds: Thresholds([0.3006, 0.9107, 1.3764, 1.8915]),
        }
    }
}

impl Default for ShoreBreakConfig {
    fn default() -> Self {
        ShoreBreakConfig {
            gamma: 0.4,
            terrace_elevation: -2.0,
            exponent: 2.0,
            crest_elevation: 5.0,
            profile_b: -2.75,
            profile_c: 0.3,
            profile_dx: 2.0,
            profile_length: 1000.0,
            thresholds: Thresholds([1.7607, 2.9321, 5.1730, 8.6697]),
        }
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        let scaling = |name: &str, mean: f64, std: f64| FeatureScaling {
            name: name.to_string(),
            mean,
            std,
        };
        AttendanceConfig {
            max_crowd: 2300.0,
            open_hour: 8,
            close_hour: 21,
            mean_window_start: 10,
            mean_window_end: 18,
            thresholds: Thresholds([5.0, 20.0, 50.0, 90.0]),
            target_mean: 600.0,
            target_std: 450.0,
            features: vec![
                scaling("RR1_dm", 0.5, 1.0),
                scaling("T_dm", 15.0, 5.0),
                scaling("FF_dm", 3.0, 2.0),
                scaling("DD_dm", 180.0, 90.0),
                scaling("INS_dm", 30.0, 20.0),
                scaling("Day", 15.0, 8.0),
                scaling("Month", 6.0, 3.0),
                scaling("Hour", 12.0, 6.0),
            ],
            model: LinearModelConfig::default(),
        }
    }
}

impl Default for LinearModelConfig {
    fn default() -> Self {
        LinearModelConfig {
            // Rain and wind keep people away, warmth and sunshine bring them
            weights: vec![-0.35, 0.55, -0.25, 0.0, 0.40, 0.0, 0.10, 0.0],
            bias: 0.0,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            marine_url: "https://marine-api.open-meteo.com/v1/marine?latitude=44.446321&longitude=-1.256297&hourly=wave_height,wave_direction,wave_period&timezone=auto".to_string(),
            weather_url: "https://api.open-meteo.com/v1/forecast?latitude=44.458336&longitude=-1.2916565&hourly=temperature_2m,precipitation,cloud_cover,wind_speed_10m,wind_direction_10m&timezone=auto&wind_speed_unit=ms".to_string(),
            tide_csv: None,
            tide_column: "Hauteur relative à 2.4m".to_string(),
            cache_dir: "/tmp".to_string(),
            cache_ttl_minutes: 30,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig { step_minutes: 10 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            site: SiteConfig::default(),
            attendance: AttendanceConfig::default(),
            sources: SourceConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Dispersion solver configured from the site's gravity and solver settings.
    pub fn dispersion_solver(&self) -> DispersionSolver {
        DispersionSolver::new(
            self.gravity,
            self.solver.tolerance,
            self.solver.max_iterations,
        )
    }
}

impl Config {
    /// Load configuration from hazard-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => match config.validate() {
                    Ok(()) => {
                        info!(path = %path.display(), "loaded configuration");
                        config
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "invalid configuration values, using defaults");
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file format, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using default configuration (Biscarrosse)");
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path as pretty TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }

    /// Check physical constants and threshold ordering.
    pub fn validate(&self) -> Result<()> {
        let site = &self.site;
        require_positive("gravity", site.gravity)?;
        require_positive("solver tolerance", site.solver.tolerance)?;
        require_positive("reference depth", site.refraction.reference_depth)?;
        require_positive("breaker index", site.refraction.breaker_index)?;
        require_positive("rip breaker parameter", site.rip.gamma)?;
        require_positive("channel depth", site.rip.channel_depth)?;
        require_positive("shore-break breaker parameter", site.shore_break.gamma)?;
        require_positive("profile spacing", site.shore_break.profile_dx)?;
        require_positive("profile length", site.shore_break.profile_length)?;
        site.rip.thresholds.validate()?;
        site.shore_break.thresholds.validate()?;

        let attendance = &self.attendance;
        require_positive("max crowd", attendance.max_crowd)?;
        require_positive("target std", attendance.target_std)?;
        attendance.thresholds.validate()?;
        if attendance.open_hour >= attendance.close_hour || attendance.close_hour > 24 {
            return Err(HazardError::InvalidInput(format!(
                "operating hours {}..{} are not a valid window",
                attendance.open_hour, attendance.close_hour
            )));
        }
        if attendance.mean_window_start >= attendance.mean_window_end
            || attendance.mean_window_end > 24
        {
            return Err(HazardError::InvalidInput(format!(
                "daily-mean window {}..{} is not a valid window",
                attendance.mean_window_start, attendance.mean_window_end
            )));
        }
        if let Some(bad) = attendance.features.iter().find(|f| !(f.std > 0.0)) {
            return Err(HazardError::InvalidInput(format!(
                "feature {} has non-positive std {}",
                bad.name, bad.std
            )));
        }
        if attendance.model.weights.len() != attendance.features.len() {
            return Err(HazardError::InvalidInput(format!(
                "model has {} weights for {} features",
                attendance.model.weights.len(),
                attendance.features.len()
            )));
        }

        if self.grid.step_minutes <= 0 {
            return Err(HazardError::InvalidInput(format!(
                "grid step must be positive, got {} minutes",
                self.grid.step_minutes
            )));
        }
        Ok(())
    }
}
