//! # Forecast Data Sources
//!
//! Acquisition of the raw series the pipeline consumes:
//!
//! - **Waves**: Open-Meteo marine API, hourly `wave_height`, `wave_direction`, `wave_period`
//! - **Weather**: Open-Meteo forecast API, hourly temperature, precipitation,
//!   cloud cover and 10 m wind
//! - **Tide**: a tide table CSV (`Date`, `Heure`, height column)
//!
//! ## Caching Strategy
//! API responses are cached as raw JSON under the configured cache directory
//! with a TTL (30 minutes by default). A fresh cache entry is served without
//! touching the network; a failed cache write is not an error.
//!
//! ## Truncation
//! The marine forecast ends before the weather forecast and its tail carries
//! `null` periods. Both forecasts are cut at the first missing wave period so
//! they cover the same horizon. Other `null`s are skipped per series and the
//! aligner bridges them.

use crate::attendance::sunshine_from_cloud_cover;
use crate::config::SourceConfig;
use crate::error::HazardError;
use crate::pipeline::columns;
use crate::TimeSeries;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use std::{fs, io};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while acquiring forecast data.
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body or file content does not have the expected shape
    #[error("parse failed: {0}")]
    Parse(String),

    /// JSON decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache or file operations failed
    #[error("cache/file IO: {0}")]
    Cache(#[from] io::Error),

    /// Tide table is not well-formed CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Decoded values do not form a valid series
    #[error("invalid series: {0}")]
    Series(#[from] HazardError),
}

/// Open-Meteo timestamp format with `timezone=auto`
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Wave forecast series.
#[derive(Debug, Clone)]
pub struct MarineForecast {
    pub hs: TimeSeries,
    pub tp: TimeSeries,
    pub dir: TimeSeries,
    /// Time of the first missing wave period, where the forecast was cut
    pub cutoff: Option<NaiveDateTime>,
}

/// Weather forecast series.
#[derive(Debug, Clone)]
pub struct WeatherForecast {
    pub precipitation: TimeSeries,
    pub temperature: TimeSeries,
    pub wind_speed: TimeSeries,
    pub wind_direction: TimeSeries,
    /// Sunshine in min/h derived from cloud cover
    pub sunshine: TimeSeries,
}

#[derive(Deserialize)]
struct Response<H> {
    hourly: H,
}

#[derive(Deserialize)]
struct MarineHourly {
    time: Vec<String>,
    wave_height: Vec<Option<f64>>,
    wave_direction: Vec<Option<f64>>,
    wave_period: Vec<Option<f64>>,
}

#[derive(Deserialize)]
struct WeatherHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    cloud_cover: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    wind_direction_10m: Vec<Option<f64>>,
}

fn parse_times(raw: &[String]) -> Result<Vec<NaiveDateTime>, SourceError> {
    raw.iter()
        .map(|s| {
            NaiveDateTime::parse_from_str(s.trim(), TIME_FORMAT)
                .map_err(|e| SourceError::Parse(format!("bad timestamp {s:?}: {e}")))
        })
        .collect()
}

/// Series from the first `len` entries, skipping `null`s.
fn series_from(
    name: &str,
    times: &[NaiveDateTime],
    values: &[Option<f64>],
    len: usize,
) -> Result<TimeSeries, SourceError> {
    if values.len() != times.len() {
        return Err(SourceError::Parse(format!(
            "{name}: {} values for {} timestamps",
            values.len(),
            times.len()
        )));
    }
    let (t, v): (Vec<_>, Vec<_>) = times[..len]
        .iter()
        .zip(&values[..len])
        .filter_map(|(&t, v)| v.map(|v| (t, v)))
        .unzip();
    Ok(TimeSeries::from_pairs(name, &t, &v)?)
}

/// Decode an Open-Meteo marine response.
pub fn parse_marine(body: &str) -> Result<MarineForecast, SourceError> {
    let hourly = serde_json::from_str::<Response<MarineHourly>>(body)?.hourly;
    let times = parse_times(&hourly.time)?;

    let len = hourly
        .wave_period
        .iter()
        .position(Option::is_none)
        .unwrap_or(hourly.wave_period.len())
        .min(times.len());
    let cutoff = times.get(len).copied();
    if let Some(cutoff) = cutoff {
        info!(%cutoff, "wave period missing, forecast truncated");
    }

    Ok(MarineForecast {
        hs: series_from(columns::HS, &times, &hourly.wave_height, len)?,
        tp: series_from(columns::TP, &times, &hourly.wave_period, len)?,
        dir: series_from(columns::DIR, &times, &hourly.wave_direction, len)?,
        cutoff,
    })
}

/// Decode an Open-Meteo weather response, keeping timestamps before `cutoff`.
pub fn parse_weather(
    body: &str,
    cutoff: Option<NaiveDateTime>,
) -> Result<WeatherForecast, SourceError> {
    let hourly = serde_json::from_str::<Response<WeatherHourly>>(body)?.hourly;
    let times = parse_times(&hourly.time)?;
    let len = cutoff
        .and_then(|c| times.iter().position(|&t| t >= c))
        .unwrap_or(times.len());

    let sunshine: Vec<Option<f64>> = hourly
        .cloud_cover
        .iter()
        .map(|c| c.map(sunshine_from_cloud_cover))
        .collect();

    Ok(WeatherForecast {
        precipitation: series_from("RR1", &times, &hourly.precipitation, len)?,
        temperature: series_from("T", &times, &hourly.temperature_2m, len)?,
        wind_speed: series_from("FF", &times, &hourly.wind_speed_10m, len)?,
        wind_direction: series_from("DD", &times, &hourly.wind_direction_10m, len)?,
        sunshine: series_from("INS", &times, &sunshine, len)?,
    })
}

/// Fetch the marine forecast (cache first).
pub async fn fetch_marine(config: &SourceConfig) -> Result<MarineForecast, SourceError> {
    let body = fetch_cached(&config.marine_url, &cache_path(config, "marine"), ttl(config)).await?;
    parse_marine(&body)
}

/// Fetch the weather forecast (cache first), cut at the marine cutoff.
pub async fn fetch_weather(
    config: &SourceConfig,
    cutoff: Option<NaiveDateTime>,
) -> Result<WeatherForecast, SourceError> {
    let body =
        fetch_cached(&config.weather_url, &cache_path(config, "weather"), ttl(config)).await?;
    parse_weather(&body, cutoff)
}

fn cache_path(config: &SourceConfig, name: &str) -> PathBuf {
    Path::new(&config.cache_dir).join(format!("beach_hazard_{name}.json"))
}

fn ttl(config: &SourceConfig) -> Duration {
    Duration::from_secs(config.cache_ttl_minutes * 60)
}

async fn fetch_cached(url: &str, cache: &Path, ttl: Duration) -> Result<String, SourceError> {
    // Try cache first - much faster than network fetch
    if let Ok(body) = load_cache(cache, ttl) {
        debug!(path = %cache.display(), "serving cached response");
        return Ok(body);
    }

    info!(%url, "fetching forecast");
    let body = reqwest::get(url).await?.error_for_status()?.text().await?;

    if let Err(e) = save_cache(cache, &body) {
        warn!(path = %cache.display(), error = %e, "could not write cache");
    }
    Ok(body)
}

/// Read a cache file if it is younger than `ttl`.
fn load_cache(path: &Path, ttl: Duration) -> Result<String, io::Error> {
    let meta = fs::metadata(path)?;

    // Check if cache has expired based on file modification time
    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .map_err(|_| io::Error::other("time error"))?;

    if age > ttl {
        return Err(io::Error::other("stale"));
    }
    fs::read_to_string(path)
}

fn save_cache(path: &Path, body: &str) -> Result<(), io::Error> {
    fs::write(path, body)
}

/// Parse a tide table with `Date` (`%Y-%m-%d`), `Heure` (`%H:%M`) and a height
/// column named `column`. Heights may use a decimal comma; blank heights are
/// skipped.
pub fn parse_tide_csv<R: io::Read>(reader: R, column: &str) -> Result<TimeSeries, SourceError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| SourceError::Parse(format!("tide table has no column {name:?}")))
    };
    let (date_col, time_col, height_col) = (find("Date")?, find("Heure")?, find(column)?);

    let mut times = Vec::new();
    let mut heights = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let field = |i: usize| {
            record
                .get(i)
                .ok_or_else(|| SourceError::Parse(format!("line {line}: missing field {i}")))
        };

        let raw_height = field(height_col)?;
        if raw_height.is_empty() {
            continue;
        }
        let date = NaiveDate::parse_from_str(field(date_col)?, "%Y-%m-%d")
            .map_err(|e| SourceError::Parse(format!("line {line}: bad date: {e}")))?;
        let time = NaiveTime::parse_from_str(field(time_col)?, "%H:%M")
            .map_err(|e| SourceError::Parse(format!("line {line}: bad time: {e}")))?;
        let height: f64 = raw_height
            .replace(',', ".")
            .trim_end_matches('m')
            .parse()
            .map_err(|e| SourceError::Parse(format!("line {line}: bad height: {e}")))?;

        times.push(date.and_time(time));
        heights.push(height);
    }

    Ok(TimeSeries::from_pairs(columns::ETA, &times, &heights)?)
}

/// Load a tide table CSV from disk.
pub fn load_tide_csv<P: AsRef<Path>>(path: P, column: &str) -> Result<TimeSeries, SourceError> {
    let file = fs::File::open(path.as_ref())?;
    let series = parse_tide_csv(io::BufReader::new(file), column)?;
    info!(path = %path.as_ref().display(), samples = series.len(), "loaded tide table");
    Ok(series)
}
