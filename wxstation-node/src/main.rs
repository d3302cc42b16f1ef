// WXStation Node - Bench harness
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # WXStation Node
//!
//! Runs a hub and simulated satellites in one process on an accelerated
//! clock. Satellites report over an in-process mesh; the hub logs what it
//! would publish upstream.
//!
//! ## Usage
//!
//! ```bash
//! # One hub, three satellites, 15 simulated minutes at 60x
//! wxstation-node
//!
//! # Storm over six satellites for two simulated hours
//! wxstation-node --scenario storm --satellites 6 --duration 7200 --speed 600
//!
//! # A single bench station
//! wxstation-node --standalone --log-level debug
//! ```

mod clock;
mod error;
mod mesh;
mod runner;
mod uplink;

use clap::Parser;
use error::{NodeError, Result};
use runner::{run_fleet, FleetConfig, HUB_MAC};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;
use wxstation::StationConfig;
use wxstation_sim::{Scenario, SimConfig};

/// WXStation bench node
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of satellites reporting to the hub
    #[arg(short = 'n', long, default_value = "3")]
    satellites: u8,

    /// Clock speed multiplier (1.0 = real-time)
    #[arg(short, long, default_value = "60.0")]
    speed: f64,

    /// Simulated run time in seconds
    #[arg(short, long, default_value = "900")]
    duration: u64,

    /// Seed for the synthetic sensors
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Weather scenario (calm, storm, sensor_failure)
    #[arg(long, default_value = "calm")]
    scenario: String,

    /// JSON simulator profile; overrides --scenario
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Run one standalone station instead of a hub and satellites
    #[arg(long)]
    standalone: bool,

    /// Battery voltage the stations report, in millivolts
    #[arg(long, default_value = "3900")]
    battery_mv: u16,

    /// Uplink topic prefix
    #[arg(long, default_value = wxstation::config::DEFAULT_TOPIC_PREFIX)]
    topic_prefix: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn fleet_config(&self) -> Result<FleetConfig> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(NodeError::InvalidArgument(format!(
                "speed must be a positive number, got {}",
                self.speed
            )));
        }

        let sim = match &self.profile {
            Some(path) => SimConfig::from_json_file(path)?.with_seed(self.seed),
            None => {
                let scenario: Scenario = self.scenario.parse()?;
                SimConfig::from_scenario(scenario).with_seed(self.seed)
            }
        };

        Ok(FleetConfig {
            satellites: self.satellites,
            speed: self.speed,
            duration_ms: self.duration.saturating_mul(1000),
            standalone: self.standalone,
            battery_mv: self.battery_mv,
            sim,
            station: StationConfig::new()
                .with_hub_address(HUB_MAC)
                .with_topic_prefix(self.topic_prefix.clone()),
            ..FleetConfig::default()
        })
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: Args) -> Result<()> {
    let config = args.fleet_config()?;
    info!(
        "WXStation node v{} (core v{})",
        env!("CARGO_PKG_VERSION"),
        wxstation::VERSION
    );

    let report = run_fleet(config).await?;
    info!(
        "Run finished after {} simulated ms\n{}",
        report.simulated_ms,
        serde_json::to_string_pretty(&report)?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
