//! # Beach Attendance
//!
//! The attendance forecast is a pre-trained regression model treated as a
//! black box behind [`AttendancePredictor`]. This module owns everything
//! around it: the daily-mean weather features, standardization of the feature
//! vector, denormalization of the score into a percentage of the maximum
//! crowd, and the operating-hours mask.
//!
//! Feature order (configurable, see [`crate::config::AttendanceConfig`]):
//! `RR1_dm, T_dm, FF_dm, DD_dm, INS_dm, Day, Month, Hour`.

use crate::classify::{HazardLevel, Thresholds};
use crate::config::{AttendanceConfig, FeatureScaling};
use crate::error::{HazardError, Result};
use crate::{Sample, TimeSeries};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Daily-mean weather feature names, in the order the pipeline aligns them.
pub const DAILY_MEAN_FEATURES: [&str; 5] = ["RR1_dm", "T_dm", "FF_dm", "DD_dm", "INS_dm"];

/// Minutes of sunshine per hour under a clear sky
const CLEAR_SKY_SUNSHINE: f64 = 60.0;

/// Sunshine duration (min/h) from cloud cover in percent.
pub fn sunshine_from_cloud_cover(cloud_cover_pct: f64) -> f64 {
    CLEAR_SKY_SUNSHINE * (1.0 - cloud_cover_pct / 100.0)
}

/// Replace each sample by the mean of its day's samples taken in
/// `[start_hour, end_hour)`.
///
/// Days without any sample in the window are left out of the result. At the
/// ends of the series the aligner then drops those points; a day between two
/// covered days is bridged by time interpolation between their means.
pub fn daily_window_means(
    series: &TimeSeries,
    name: &str,
    start_hour: u32,
    end_hour: u32,
) -> Result<TimeSeries> {
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for sample in series.samples() {
        let hour = sample.time.hour();
        if (start_hour..end_hour).contains(&hour) {
            let entry = sums.entry(sample.time.date()).or_insert((0.0, 0));
            entry.0 += sample.value;
            entry.1 += 1;
        }
    }

    let samples = series
        .samples()
        .iter()
        .filter_map(|s| {
            sums.get(&s.time.date()).map(|&(sum, n)| Sample {
                time: s.time,
                value: sum / n as f64,
            })
        })
        .collect();
    TimeSeries::new(name, samples)
}

/// Black-box attendance model: standardized features in, standardized score out.
pub trait AttendancePredictor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

/// Linear stand-in for the trained regression model.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPredictor {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearPredictor {
    pub fn from_config(config: &AttendanceConfig) -> Self {
        Self {
            weights: config.model.weights.clone(),
            bias: config.model.bias,
        }
    }
}

impl AttendancePredictor for LinearPredictor {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.weights.len() {
            return Err(HazardError::Prediction(format!(
                "expected {} features, got {}",
                self.weights.len(),
                features.len()
            )));
        }
        Ok(self.bias
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }
}

/// Daily-mean weather at one grid point, in [`DAILY_MEAN_FEATURES`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyWeather(pub [f64; 5]);

/// Predictor plus the scaling, masking and classification around it.
pub struct AttendanceModel {
    scaling: Vec<FeatureScaling>,
    target_mean: f64,
    target_std: f64,
    max_crowd: f64,
    open_hour: u32,
    close_hour: u32,
    thresholds: Thresholds,
    predictor: Box<dyn AttendancePredictor>,
}

impl AttendanceModel {
    pub fn new(config: &AttendanceConfig, predictor: Box<dyn AttendancePredictor>) -> Self {
        for feature in &config.features {
            if raw_feature(&feature.name, NaiveDateTime::MIN, &DailyWeather([0.0; 5])).is_none() {
                warn!(feature = %feature.name, "unknown attendance feature, using its mean");
            }
        }
        Self {
            scaling: config.features.clone(),
            target_mean: config.target_mean,
            target_std: config.target_std,
            max_crowd: config.max_crowd,
            open_hour: config.open_hour,
            close_hour: config.close_hour,
            thresholds: config.thresholds,
            predictor,
        }
    }

    /// Model built around the configured [`LinearPredictor`].
    pub fn with_linear_predictor(config: &AttendanceConfig) -> Self {
        Self::new(config, Box::new(LinearPredictor::from_config(config)))
    }

    pub fn is_open(&self, time: NaiveDateTime) -> bool {
        (self.open_hour..self.close_hour).contains(&time.hour())
    }

    /// Standardized feature vector for `time`.
    ///
    /// Features the model does not know contribute 0, their standardized mean.
    pub fn features(&self, time: NaiveDateTime, weather: &DailyWeather) -> Vec<f64> {
        self.scaling
            .iter()
            .map(|f| match raw_feature(&f.name, time, weather) {
                Some(raw) => (raw - f.mean) / f.std,
                None => 0.0,
            })
            .collect()
    }

    /// Attendance in percent of the maximum crowd, clipped to `[0, 100]`.
    ///
    /// `None` outside operating hours or when the predictor fails.
    pub fn estimate(&self, time: NaiveDateTime, weather: &DailyWeather) -> Option<f64> {
        if !self.is_open(time) {
            return None;
        }
        let features = self.features(time, weather);
        let score = match self.predictor.predict(&features) {
            Ok(score) => score,
            Err(e) => {
                debug!(%time, error = %e, "attendance prediction failed");
                return None;
            }
        };

        let crowd = score * self.target_std + self.target_mean;
        let percent = crowd / (self.max_crowd / 100.0);
        percent.is_finite().then(|| percent.clamp(0.0, 100.0))
    }

    pub fn classify(&self, percent: f64) -> Option<HazardLevel> {
        self.thresholds.classify(percent)
    }
}

fn raw_feature(name: &str, time: NaiveDateTime, weather: &DailyWeather) -> Option<f64> {
    if let Some(i) = DAILY_MEAN_FEATURES.iter().position(|&f| f == name) {
        return Some(weather.0[i]);
    }
    match name {
        "Day" => Some(time.day() as f64),
        "Month" => Some(time.month() as f64),
        "Hour" => Some(time.hour() as f64 + time.minute() as f64 / 60.0),
        _ => None,
    }
}
