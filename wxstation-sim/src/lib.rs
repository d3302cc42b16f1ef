// WXStation Sim - Synthetic weather sensors
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # WXStation Sim
//!
//! Deterministic synthetic weather sensors for benches and tests.
//!
//! - **Signal patterns**: diurnal curves, sine waves, random walks, log-normal gusts
//! - **Derived channels**: humidity against temperature, irradiance from lux,
//!   cumulative rain gauge
//! - **Scenarios**: calm, storm, sensor failure
//!
//! ## Quick Start
//!
//! ```rust
//! use wxstation::SensorSource;
//! use wxstation_sim::{Scenario, SimConfig};
//!
//! let config = SimConfig::from_scenario(Scenario::Storm).with_seed(7);
//! let mut sensors = config.sensors_for(0).unwrap();
//!
//! let sample = sensors.read_all(3_000).unwrap();
//! assert!(sample.wind_direction < 360);
//! ```

pub mod error;
pub mod patterns;
pub mod scenario;
pub mod sensors;

pub use error::{Result, SimError};
pub use patterns::{PatternState, SignalPattern};
pub use scenario::{Scenario, SimConfig};
pub use sensors::{FailureMode, SensorFailure, SensorProfile, WeatherSensors};
