//! # Beach Hazard Forecast Entry Point
//!
//! Fetches the wave and weather forecasts, loads the tide table (or falls back
//! to the synthetic tide), runs the hazard pipeline and prints the result as a
//! terminal report or as JSON.

#[cfg(test)]
mod tests;

use anyhow::Context;
use beach_hazard_lib::config::Config;
use beach_hazard_lib::grid::UniformGrid;
use beach_hazard_lib::pipeline::{ForecastInputs, HazardPipeline};
use beach_hazard_lib::{fallback, report::draw_ascii, sources, TimeSeries};
use chrono::Duration;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "beach-hazard", about = "Rip current, shore-break and attendance forecast")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = beach_hazard_lib::config::CONFIG_FILE)]
    config: PathBuf,

    /// Tide table CSV, overrides the configured one
    #[arg(long)]
    tide_csv: Option<PathBuf>,

    /// Print the hazard table as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

/// Tide from the table if one is configured and readable.
fn load_tide(args: &Args, config: &Config) -> Option<TimeSeries> {
    let path = args
        .tide_csv
        .clone()
        .or_else(|| config.sources.tide_csv.as_ref().map(PathBuf::from))?;

    match sources::load_tide_csv(&path, &config.sources.tide_column) {
        Ok(tide) => Some(tide),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "tide table unavailable");
            None
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("install log subscriber")?;

    let config = Config::load_from_path(&args.config);

    let rt = tokio::runtime::Runtime::new()?;
    let (marine, weather) = rt.block_on(async {
        let marine = sources::fetch_marine(&config.sources).await?;
        let weather = sources::fetch_weather(&config.sources, marine.cutoff).await?;
        Ok::<_, sources::SourceError>((marine, weather))
    })
    .context("fetch forecast")?;

    let step = Duration::minutes(config.grid.step_minutes);
    let grid = UniformGrid::spanning(&weather.temperature, step)?;

    let (eta, tide_offline) = match load_tide(&args, &config) {
        Some(tide) => (tide, false),
        None => {
            warn!("no tide table, falling back to synthetic tide");
            (fallback::synthetic_tide(&grid)?, true)
        }
    };

    let inputs = ForecastInputs {
        hs: marine.hs,
        tp: marine.tp,
        dir: marine.dir,
        eta,
        precipitation: weather.precipitation,
        temperature: weather.temperature,
        wind_speed: weather.wind_speed,
        wind_direction: weather.wind_direction,
        sunshine: weather.sunshine,
        tide_offline,
    };

    let pipeline = HazardPipeline::with_linear_predictor(&config)?;
    let table = pipeline.run(&inputs, &grid)?;
    info!(
        start = %grid.start(),
        end = %grid.end(),
        records = table.len(),
        "forecast ready"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        draw_ascii(&table);
    }
    Ok(())
}
