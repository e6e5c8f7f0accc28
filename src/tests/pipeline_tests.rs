//! # End-to-End Forecast Scenarios
//!
//! Full pipeline runs on small synthetic forecasts: alignment drops, operating
//! hours, the synthetic tide flag, configuration files and JSON export.

use beach_hazard_lib::config::Config;
use beach_hazard_lib::fallback;
use beach_hazard_lib::pipeline::{ForecastInputs, HazardPipeline};
use beach_hazard_lib::{HazardLevel, HazardTable, TimeSeries};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tempfile::NamedTempFile;

fn t(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 14)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Constant hourly series over `hours`.
fn hourly(name: &str, hours: std::ops::RangeInclusive<u32>, value: f64) -> TimeSeries {
    let times: Vec<_> = hours.map(|h| t(h, 0)).collect();
    let values = vec![value; times.len()];
    TimeSeries::from_pairs(name, &times, &values).unwrap()
}

/// One summer day of shore-normal swell; the tide table starts at 02:00.
fn summer_day(eta: f64) -> ForecastInputs {
    ForecastInputs {
        hs: hourly("Hs", 0..=23, 1.5),
        tp: hourly("Tp", 0..=23, 9.0),
        dir: hourly("Dir", 0..=23, 284.1),
        eta: hourly("Eta", 2..=23, eta),
        precipitation: hourly("RR1", 0..=23, 0.0),
        temperature: hourly("T", 0..=23, 25.0),
        wind_speed: hourly("FF", 0..=23, 3.0),
        wind_direction: hourly("DD", 0..=23, 300.0),
        sunshine: hourly("INS", 0..=23, 50.0),
        tide_offline: false,
    }
}

fn run(inputs: &ForecastInputs) -> HazardTable {
    let pipeline = HazardPipeline::with_linear_predictor(&Config::default()).unwrap();
    let grid = inputs.grid(Duration::minutes(10)).unwrap();
    pipeline.run(inputs, &grid).unwrap()
}

#[test]
fn uncovered_timestamps_are_absent_from_table() {
    let table = run(&summer_day(0.5));

    // 00:00..=23:00 every 10 min is 139 points; the tide misses 00:00..=01:50
    assert_eq!(table.dropped.len(), 12);
    assert_eq!(table.len(), 127);
    assert!(table.get(t(1, 50)).is_none());
    assert!(table.get(t(2, 0)).is_some());
    assert!(!table.tide_offline);
}

#[test]
fn records_follow_grid_order() {
    let table = run(&summer_day(0.5));
    for pair in table.records.windows(2) {
        assert_eq!(pair[1].time - pair[0].time, Duration::minutes(10));
    }
}

#[test]
fn attendance_only_during_operating_hours() {
    let table = run(&summer_day(0.5));

    let early = table.get(t(6, 0)).unwrap();
    assert_eq!(early.attendance_pct, None);
    assert_eq!(early.attendance_level, None);

    let noon = table.get(t(12, 0)).unwrap();
    let pct = noon.attendance_pct.unwrap();
    assert!((0.0..=100.0).contains(&pct));
    assert!(noon.attendance_level.is_some());

    assert_eq!(table.get(t(21, 0)).unwrap().attendance_pct, None);
}

#[test]
fn constant_conditions_give_constant_hazards() {
    let table = run(&summer_day(0.5));
    let first = &table.records[0];
    assert!(first.rip_velocity.unwrap() >= 0.0);
    assert!(first.shorebreak_index.unwrap() > 0.0);

    for record in &table.records {
        assert_eq!(record.rip_velocity, first.rip_velocity);
        assert_eq!(record.rip_level, first.rip_level);
        assert_eq!(record.shorebreak_index, first.shorebreak_index);
    }
}

#[test]
fn tide_above_profile_leaves_shore_break_undefined() {
    let table = run(&summer_day(4.5));
    let record = table.get(t(12, 0)).unwrap();
    assert_eq!(record.shorebreak_index, None);
    assert_eq!(record.shorebreak_level, None);
    assert!(record.rip_velocity.is_some());
}

#[test]
fn synthetic_tide_is_flagged_offline() {
    let mut inputs = summer_day(0.5);
    let grid = inputs.grid(Duration::minutes(10)).unwrap();
    inputs.eta = fallback::synthetic_tide(&grid).unwrap();
    inputs.tide_offline = true;

    let table = run(&inputs);
    assert!(table.tide_offline);
    assert!(table.dropped.is_empty());
    assert_eq!(table.len(), 139);
    assert!(table.records.iter().all(|r| r.shorebreak_index.is_some()));
}

#[test]
fn repeated_runs_are_identical() {
    let inputs = summer_day(0.5);
    let a = run(&inputs);
    let b = run(&inputs);
    assert_eq!(a.records, b.records);
    assert_eq!(a.dropped, b.dropped);
}

#[test]
fn configuration_file_drives_classification() {
    let mut config = Config::default();
    // Every positive velocity is severe
    config.site.rip.thresholds.0 = [0.0, 1e-9, 2e-9, 3e-9];
    let file = NamedTempFile::new().unwrap();
    config.save(file.path()).unwrap();

    let loaded = Config::load_from_path(file.path());
    let pipeline = HazardPipeline::with_linear_predictor(&loaded).unwrap();
    let inputs = summer_day(0.5);
    let grid = inputs.grid(Duration::minutes(10)).unwrap();
    let table = pipeline.run(&inputs, &grid).unwrap();

    let record = table.get(t(12, 0)).unwrap();
    assert!(record.rip_velocity.unwrap() > 0.0);
    assert_eq!(record.rip_level, Some(HazardLevel::Severe));
}

#[test]
fn degenerate_point_does_not_affect_neighbours() {
    let mut inputs = summer_day(0.5);
    let times: Vec<_> = (0..=23).map(|h| t(h, 0)).collect();
    // A single extreme sea state at noon, 30° off the shore normal
    let heights: Vec<f64> = (0..=23).map(|h| if h == 12 { 50.0 } else { 1.5 }).collect();
    inputs.hs = TimeSeries::from_pairs("Hs", &times, &heights).unwrap();
    inputs.tp = hourly("Tp", 0..=23, 8.0);
    inputs.dir = hourly("Dir", 0..=23, 314.1);

    let table = run(&inputs);
    assert_eq!(table.len(), 127);

    let noon = table.get(t(12, 0)).unwrap();
    assert_eq!(noon.rip_velocity, None);
    assert_eq!(noon.rip_level, None);
    assert_eq!(noon.shorebreak_index, None);
    assert!(noon.attendance_pct.is_some());

    for hour in [10, 14] {
        let record = table.get(t(hour, 0)).unwrap();
        assert!(record.rip_velocity.is_some());
        assert!(record.shorebreak_index.is_some());
    }
}

#[test]
fn json_export_uses_numeric_levels() {
    let table = run(&summer_day(0.5));
    let json = serde_json::to_value(&table).unwrap();

    let record = &json["records"][0];
    assert!(record["rip_level"].is_u64());
    assert!(record["attendance_pct"].is_null());
    assert_eq!(json["tide_offline"], serde_json::Value::Bool(false));

    let back: HazardTable = serde_json::from_value(json).unwrap();
    assert_eq!(back.len(), table.len());
    assert_eq!(back.records[0].rip_level, table.records[0].rip_level);
}
