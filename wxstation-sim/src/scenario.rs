// WXStation Sim - Weather scenarios
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Weather scenarios and simulator configuration.
//!
//! A [`Scenario`] is a named preset producing a [`SensorProfile`]. A
//! [`SimConfig`] pairs a profile with a seed and can be loaded from JSON.

use crate::error::{Result, SimError};
use crate::patterns::SignalPattern;
use crate::sensors::{FailureMode, SensorFailure, SensorProfile, WeatherSensors};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const HOUR_MS: u64 = 3_600_000;

/// Named weather preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Fair weather: diurnal cycle, light breeze, no rain
    #[default]
    Calm,
    /// Falling pressure, gusty wind veering, heavy rain
    Storm,
    /// Calm weather with the sensor bus failing for half an hour
    SensorFailure,
}

impl Scenario {
    /// All presets.
    pub const ALL: [Scenario; 3] = [Scenario::Calm, Scenario::Storm, Scenario::SensorFailure];

    /// Preset name.
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Calm => "calm",
            Scenario::Storm => "storm",
            Scenario::SensorFailure => "sensor_failure",
        }
    }

    /// Sensor profile for this preset.
    pub fn profile(&self) -> SensorProfile {
        match self {
            Scenario::Calm => calm(),
            Scenario::Storm => storm(),
            Scenario::SensorFailure => SensorProfile {
                failure: Some(SensorFailure {
                    start_ms: HOUR_MS / 2,
                    duration_ms: Some(HOUR_MS / 2),
                    mode: FailureMode::NotResponding,
                }),
                dropout_probability: 0.05,
                ..calm()
            },
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "calm" => Ok(Scenario::Calm),
            "storm" => Ok(Scenario::Storm),
            "sensor_failure" | "failure" => Ok(Scenario::SensorFailure),
            _ => Err(SimError::UnknownScenario(s.to_string())),
        }
    }
}

fn calm() -> SensorProfile {
    SensorProfile {
        temperature: SignalPattern::drifting(SignalPattern::temperature_diurnal(8.0, 22.0), 0.02),
        humidity: SignalPattern::Constant { value: 65.0 },
        humidity_per_degree: 1.5,
        pressure: SignalPattern::RandomWalk {
            start: 1016.0,
            step_std: 0.01,
        },
        gas_resistance: SignalPattern::drifting(SignalPattern::Constant { value: 180.0 }, 0.2),
        lux: SignalPattern::daylight(60_000.0),
        co2: SignalPattern::Sine {
            amplitude: 20.0,
            period_ms: 24 * HOUR_MS,
            phase: 0.0,
            offset: 420.0,
        },
        tvoc: SignalPattern::LogNormal {
            mu: 2.5,
            sigma: 0.3,
        },
        wind_speed: SignalPattern::LogNormal {
            mu: 0.7,
            sigma: 0.4,
        },
        wind_direction: SignalPattern::RandomWalk {
            start: 240.0,
            step_std: 2.0,
        },
        rain_rate: SignalPattern::Constant { value: 0.0 },
        dropout_probability: 0.0,
        failure: None,
    }
}

fn storm() -> SensorProfile {
    SensorProfile {
        temperature: SignalPattern::drifting(SignalPattern::temperature_diurnal(9.0, 14.0), 0.05),
        humidity: SignalPattern::Constant { value: 92.0 },
        humidity_per_degree: 0.5,
        pressure: SignalPattern::Step {
            levels: vec![(0, 1008.0), (HOUR_MS, 998.0), (2 * HOUR_MS, 991.0)],
        },
        gas_resistance: SignalPattern::drifting(SignalPattern::Constant { value: 90.0 }, 0.5),
        lux: SignalPattern::daylight(12_000.0),
        co2: SignalPattern::Constant { value: 410.0 },
        tvoc: SignalPattern::LogNormal {
            mu: 2.0,
            sigma: 0.3,
        },
        wind_speed: SignalPattern::LogNormal {
            mu: 2.3,
            sigma: 0.6,
        },
        wind_direction: SignalPattern::RandomWalk {
            start: 200.0,
            step_std: 12.0,
        },
        rain_rate: SignalPattern::Poisson {
            lambda: 4.0,
            scale: 3.0,
        },
        dropout_probability: 0.01,
        failure: None,
    }
}

/// Simulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Base seed; station `n` uses `seed + n`.
    pub seed: u64,
    /// Sensor profile shared by every station.
    pub profile: SensorProfile,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::from_scenario(Scenario::default())
    }
}

impl SimConfig {
    /// Configuration for a preset.
    pub fn from_scenario(scenario: Scenario) -> Self {
        Self {
            seed: 42,
            profile: scenario.profile(),
        }
    }

    /// Set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.profile.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save configuration to a JSON file.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Sensors for the station at `index`.
    pub fn sensors_for(&self, index: u64) -> Result<WeatherSensors> {
        WeatherSensors::new(&self.profile, self.seed.wrapping_add(index))
    }
}
