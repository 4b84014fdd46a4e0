//! LifeFlight Simulator CLI
//!
//! Writes a synthetic mission export that the API can load.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use lifeflight_simulator::{write_csv, MissionGenerator, ScenarioConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lifeflight-simulator")]
#[command(about = "Generate a synthetic air-ambulance mission export")]
struct Args {
    /// Output CSV path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// First trip date (YYYY-MM-DD)
    #[arg(long, default_value = "2020-01-01")]
    start: NaiveDate,

    /// Last trip date (YYYY-MM-DD)
    #[arg(long, default_value = "2023-12-31")]
    end: NaiveDate,

    /// Mean missions per day
    #[arg(long, default_value = "6.0")]
    missions_per_day: f64,

    /// Median dispatch-to-enroute minutes
    #[arg(long, default_value = "12.0")]
    median_response: f64,

    /// Share of missions crossing midnight between dispatch and enroute
    #[arg(long, default_value = "0.02")]
    overnight_share: f64,

    /// Share of cancelled missions
    #[arg(long, default_value = "0.08")]
    cancel_share: f64,

    /// Share of missions closed with a non-successful status
    #[arg(long, default_value = "0.03")]
    failed_share: f64,

    /// RNG seed
    #[arg(short, long, default_value = "42")]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lifeflight_simulator=info".parse()?))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = ScenarioConfig {
        start: args.start,
        end: args.end,
        missions_per_day: args.missions_per_day,
        median_response_minutes: args.median_response,
        overnight_share: args.overnight_share,
        cancel_share: args.cancel_share,
        failed_share: args.failed_share,
        seed: args.seed,
        ..ScenarioConfig::default()
    };

    info!(
        "Simulating {} to {} at {} missions/day (seed {})",
        config.start, config.end, config.missions_per_day, config.seed
    );

    let missions = MissionGenerator::new(config)?.generate();

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_csv(BufWriter::new(file), &missions)?;
            info!("Wrote {} missions to {}", missions.len(), path.display());
        }
        None => write_csv(io::stdout().lock(), &missions)?,
    }

    Ok(())
}
