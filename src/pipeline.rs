//! # Hazard Pipeline
//!
//! Wires the models together. Raw series are aligned onto the grid, then each
//! grid point runs independently:
//!
//! ```text
//! (Hs, Tp, Dir, η) ── refraction/breaking ──┬── rip current ── level
//!                                           └── shore-break ── level
//! (daily weather, time) ── attendance ───────────────────────── level
//! ```
//!
//! Points are evaluated in parallel with rayon and collected in grid order,
//! so the table is identical to a sequential run. A failure at one point
//! (bad input, solver divergence, degenerate refraction) leaves that point's
//! fields undefined and never aborts the run.

use crate::attendance::{
    daily_window_means, AttendanceModel, AttendancePredictor, DailyWeather, DAILY_MEAN_FEATURES,
};
use crate::config::Config;
use crate::error::Result;
use crate::grid::{align, AlignedRow, AlignedTable, UniformGrid};
use crate::refraction::{relative_angle, RefractionModel};
use crate::rip_current::RipCurrentModel;
use crate::shore_break::ShoreBreakModel;
use crate::{HazardRecord, HazardTable, MarineConditions, TimeSeries};
use chrono::{Duration, NaiveDateTime};
use rayon::prelude::*;
use tracing::{debug, info};

/// Column names of the marine inputs in the aligned table.
pub mod columns {
    pub const HS: &str = "Hs";
    pub const TP: &str = "Tp";
    pub const DIR: &str = "Dir";
    pub const ETA: &str = "Eta";
}

/// Raw input series as delivered by the acquisition layer.
#[derive(Debug, Clone)]
pub struct ForecastInputs {
    /// Significant wave height (m)
    pub hs: TimeSeries,
    /// Peak period (s)
    pub tp: TimeSeries,
    /// Wave direction (compass degrees)
    pub dir: TimeSeries,
    /// Tide elevation (m)
    pub eta: TimeSeries,
    /// Precipitation (mm)
    pub precipitation: TimeSeries,
    /// Air temperature (°C)
    pub temperature: TimeSeries,
    /// Wind speed (m/s)
    pub wind_speed: TimeSeries,
    /// Wind direction (degrees)
    pub wind_direction: TimeSeries,
    /// Sunshine duration (min/h)
    pub sunshine: TimeSeries,
    /// True if `eta` is the synthetic fallback tide
    pub tide_offline: bool,
}

impl ForecastInputs {
    /// Weather series in [`DAILY_MEAN_FEATURES`] order.
    fn weather(&self) -> [&TimeSeries; 5] {
        [
            &self.precipitation,
            &self.temperature,
            &self.wind_speed,
            &self.wind_direction,
            &self.sunshine,
        ]
    }

    /// Forecast grid spanning the weather forecast.
    pub fn grid(&self, step: Duration) -> Result<UniformGrid> {
        UniformGrid::spanning(&self.temperature, step)
    }
}

/// All hazard models built from one configuration.
pub struct HazardPipeline {
    refraction: RefractionModel,
    rip: RipCurrentModel,
    shore_break: ShoreBreakModel,
    attendance: AttendanceModel,
    coastline_orientation: f64,
    reference_depth: f64,
    breaker_index: f64,
    mean_window: (u32, u32),
}

impl HazardPipeline {
    pub fn new(config: &Config, predictor: Box<dyn AttendancePredictor>) -> Result<Self> {
        Self::from_parts(config, AttendanceModel::new(&config.attendance, predictor))
    }

    /// Pipeline using the configured linear attendance model.
    pub fn with_linear_predictor(config: &Config) -> Result<Self> {
        Self::from_parts(
            config,
            AttendanceModel::with_linear_predictor(&config.attendance),
        )
    }

    fn from_parts(config: &Config, attendance: AttendanceModel) -> Result<Self> {
        let site = &config.site;
        Ok(Self {
            refraction: RefractionModel::new(site.dispersion_solver()),
            rip: RipCurrentModel::new(&site.rip, site.gravity),
            shore_break: ShoreBreakModel::new(&site.shore_break, site.gravity)?,
            attendance,
            coastline_orientation: site.coastline_orientation,
            reference_depth: site.refraction.reference_depth,
            breaker_index: site.refraction.breaker_index,
            mean_window: (
                config.attendance.mean_window_start,
                config.attendance.mean_window_end,
            ),
        })
    }

    /// Align `inputs` onto `grid` and evaluate every covered point.
    pub fn run(&self, inputs: &ForecastInputs, grid: &UniformGrid) -> Result<HazardTable> {
        let (start, end) = self.mean_window;
        let daily_means = inputs
            .weather()
            .iter()
            .zip(DAILY_MEAN_FEATURES)
            .map(|(series, name)| daily_window_means(series, name, start, end))
            .collect::<Result<Vec<_>>>()?;

        let mut series = vec![&inputs.hs, &inputs.tp, &inputs.dir, &inputs.eta];
        series.extend(daily_means.iter());
        let aligned = align(grid, &series);

        let mut table = self.evaluate(&aligned)?;
        table.tide_offline = inputs.tide_offline;
        Ok(table)
    }

    /// Evaluate an aligned table carrying the marine columns and, optionally,
    /// the daily-mean weather columns.
    ///
    /// Without the weather columns attendance is undefined everywhere.
    pub fn evaluate(&self, aligned: &AlignedTable) -> Result<HazardTable> {
        let marine = [
            aligned.require_column(columns::HS)?,
            aligned.require_column(columns::TP)?,
            aligned.require_column(columns::DIR)?,
            aligned.require_column(columns::ETA)?,
        ];
        let weather: Option<Vec<usize>> = DAILY_MEAN_FEATURES
            .iter()
            .map(|name| aligned.column_index(name))
            .collect();

        let records: Vec<HazardRecord> = aligned
            .rows()
            .par_iter()
            .map(|row| self.evaluate_row(row, &marine, weather.as_deref()))
            .collect();

        let table = HazardTable {
            records,
            dropped: aligned.dropped().to_vec(),
            tide_offline: false,
        };
        info!(
            records = table.len(),
            dropped = table.dropped.len(),
            rip_undefined = table.records.iter().filter(|r| r.rip_velocity.is_none()).count(),
            shorebreak_undefined = table
                .records
                .iter()
                .filter(|r| r.shorebreak_index.is_none())
                .count(),
            "hazard table computed"
        );
        Ok(table)
    }

    fn evaluate_row(
        &self,
        row: &AlignedRow,
        marine: &[usize; 4],
        weather: Option<&[usize]>,
    ) -> HazardRecord {
        let conditions = MarineConditions {
            hs: row.values[marine[0]],
            tp: row.values[marine[1]],
            dir: row.values[marine[2]],
            eta: row.values[marine[3]],
        };
        let daily = weather.map(|idx| {
            let mut values = [0.0; 5];
            for (v, &i) in values.iter_mut().zip(idx) {
                *v = row.values[i];
            }
            DailyWeather(values)
        });
        self.evaluate_point(row.time, conditions, daily.as_ref())
    }

    /// Hazards at one grid point.
    pub fn evaluate_point(
        &self,
        time: NaiveDateTime,
        conditions: MarineConditions,
        weather: Option<&DailyWeather>,
    ) -> HazardRecord {
        let theta = relative_angle(conditions.dir, self.coastline_orientation);
        let breaking = self.refraction.refract_and_break(
            conditions.hs,
            conditions.tp,
            theta,
            self.reference_depth,
            self.breaker_index,
        );

        let (rip_velocity, shorebreak_index) = match breaking {
            Ok(wave) => {
                let rip = self.rip.evaluate(conditions.eta, wave.height);
                let shore = self
                    .shore_break
                    .evaluate(conditions.eta, wave.height, conditions.tp);
                if shore.is_none() {
                    debug!(%time, eta = conditions.eta, "tide outside beach profile");
                }
                (Some(rip.velocity), shore.map(|s| s.index))
            }
            Err(e) => {
                debug!(%time, error = %e, "breaking wave undefined");
                (None, None)
            }
        };

        let attendance_pct = weather.and_then(|w| self.attendance.estimate(time, w));

        HazardRecord {
            time,
            conditions,
            attendance_pct,
            attendance_level: attendance_pct.and_then(|p| self.attendance.classify(p)),
            rip_velocity,
            rip_level: rip_velocity.and_then(|u| self.rip.classify(u)),
            shorebreak_index,
            shorebreak_level: shorebreak_index.and_then(|i| self.shore_break.classify(i)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::HazardLevel;
    use crate::Sample;
    use chrono::NaiveDate;

    fn t(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 14)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn pipeline() -> HazardPipeline {
        HazardPipeline::with_linear_predictor(&Config::default()).unwrap()
    }

    fn conditions(hs: f64, dir: f64, eta: f64) -> MarineConditions {
        MarineConditions {
            hs,
            tp: 9.0,
            dir,
            eta,
        }
    }

    const WEATHER: DailyWeather = DailyWeather([0.0, 25.0, 3.0, 300.0, 50.0]);

    #[test]
    fn test_normal_swell_at_mid_tide() {
        let record = pipeline().evaluate_point(t(14, 0), conditions(1.5, 284.1, 0.5), Some(&WEATHER));
        assert!(record.rip_velocity.unwrap() >= 0.0);
        assert!(record.rip_level.is_some());
        assert!(record.shorebreak_index.unwrap() > 0.0);
        assert!(record.shorebreak_level.is_some());
        assert!(record.attendance_pct.is_some());
        assert!(record.attendance_level.is_some());
    }

    #[test]
    fn test_dry_bar_has_rip_level_zero() {
        let record = pipeline().evaluate_point(t(14, 0), conditions(1.5, 284.1, -5.0), None);
        assert_eq!(record.rip_velocity, Some(0.0));
        assert_eq!(record.rip_level, Some(HazardLevel::Negligible));
        // No weather columns: attendance undefined, not zero
        assert_eq!(record.attendance_pct, None);
    }

    #[test]
    fn test_invalid_wave_height_leaves_point_undefined() {
        let record = pipeline().evaluate_point(t(14, 0), conditions(0.0, 284.1, 0.5), Some(&WEATHER));
        assert_eq!(record.rip_velocity, None);
        assert_eq!(record.rip_level, None);
        assert_eq!(record.shorebreak_index, None);
        // Attendance does not depend on the waves
        assert!(record.attendance_pct.is_some());
    }

    #[test]
    fn test_offshore_waves_are_calm() {
        // Coming from land: relative angle 180°
        let record = pipeline().evaluate_point(t(14, 0), conditions(3.0, 104.1, 0.5), None);
        assert_eq!(record.rip_velocity, Some(0.0));
        assert_eq!(record.shorebreak_index, Some(0.0));
    }

    #[test]
    fn test_northerly_waves_are_dissipated() {
        // 5° - 284.1° = -279.1°: no breaking, even for a big swell at low tide
        for dir in [5.0, 10.0] {
            let record = pipeline().evaluate_point(t(14, 0), conditions(2.5, dir, -2.5), None);
            assert_eq!(record.rip_velocity, Some(0.0));
            assert_eq!(record.rip_level, Some(HazardLevel::Negligible));
        }
    }

    #[test]
    fn test_degenerate_refraction_leaves_point_undefined() {
        let record = pipeline().evaluate_point(
            t(14, 0),
            MarineConditions { hs: 50.0, tp: 8.0, dir: 314.1, eta: 0.5 },
            Some(&WEATHER),
        );
        assert_eq!(record.rip_velocity, None);
        assert_eq!(record.shorebreak_index, None);
        assert!(record.attendance_pct.is_some());
    }

    #[test]
    fn test_evaluate_requires_marine_columns() {
        let hs = TimeSeries::new("Hs", vec![Sample { time: t(0, 0), value: 1.0 }]).unwrap();
        let grid = UniformGrid::spanning(&hs, Duration::minutes(10)).unwrap();
        let aligned = align(&grid, &[&hs]);
        assert!(pipeline().evaluate(&aligned).is_err());
    }
}
