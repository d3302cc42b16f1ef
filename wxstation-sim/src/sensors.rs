// WXStation Sim - Synthetic sensor suite
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Synthetic sensor suite implementing [`wxstation::SensorSource`].
//!
//! Every channel is driven by a [`SignalPattern`]; a few are derived:
//!
//! - humidity falls as temperature rises (`humidity_per_degree`)
//! - solar irradiance follows lux ([`wxstation::LUX_TO_WM2`])
//! - wind direction wraps into 0..360
//! - precipitation integrates a rain rate into a cumulative gauge

use crate::error::{Result, SimError};
use crate::patterns::{PatternState, SignalPattern};
use log::{debug, warn};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use wxstation::{RawSample, SensorError, SensorSource, LUX_TO_WM2};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Temperature the humidity coupling is centred on, °C
const HUMIDITY_REFERENCE_C: f64 = 20.0;

/// How a scripted sensor failure shows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Samples come back flagged invalid
    Invalid,
    /// The bus stops answering
    NotResponding,
}

/// A sensor failure starting at a fixed time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorFailure {
    /// Milliseconds since boot when the failure starts
    pub start_ms: u64,
    /// How long it lasts (None = until the end)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub mode: FailureMode,
}

impl SensorFailure {
    fn active_at(&self, now_ms: u64) -> bool {
        now_ms >= self.start_ms
            && self
                .duration_ms
                .map_or(true, |d| now_ms < self.start_ms.saturating_add(d))
    }
}

/// Patterns for every channel of a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorProfile {
    /// °C
    pub temperature: SignalPattern,
    /// % RH at the reference temperature
    pub humidity: SignalPattern,
    /// % RH lost per °C above 20 °C
    #[serde(default)]
    pub humidity_per_degree: f64,
    /// hPa
    pub pressure: SignalPattern,
    /// kOhm
    pub gas_resistance: SignalPattern,
    /// lux
    pub lux: SignalPattern,
    /// ppm
    pub co2: SignalPattern,
    /// ppb
    pub tvoc: SignalPattern,
    /// m/s
    pub wind_speed: SignalPattern,
    /// Degrees, wrapped into 0..360
    pub wind_direction: SignalPattern,
    /// mm per hour
    pub rain_rate: SignalPattern,
    /// Chance that any one read comes back invalid
    #[serde(default)]
    pub dropout_probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<SensorFailure>,
}

impl SensorProfile {
    /// Check every pattern and the dropout probability.
    pub fn validate(&self) -> Result<()> {
        let channels = [
            ("temperature", &self.temperature),
            ("humidity", &self.humidity),
            ("pressure", &self.pressure),
            ("gas_resistance", &self.gas_resistance),
            ("lux", &self.lux),
            ("co2", &self.co2),
            ("tvoc", &self.tvoc),
            ("wind_speed", &self.wind_speed),
            ("wind_direction", &self.wind_direction),
            ("rain_rate", &self.rain_rate),
        ];
        for (field, pattern) in channels {
            pattern
                .validate()
                .map_err(|message| SimError::InvalidPattern {
                    field: field.to_string(),
                    message,
                })?;
        }
        if !(0.0..=1.0).contains(&self.dropout_probability) {
            return Err(SimError::InvalidProbability(self.dropout_probability));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Channel {
    pattern: SignalPattern,
    state: PatternState,
}

impl Channel {
    fn new(pattern: &SignalPattern) -> Self {
        Self {
            state: PatternState::for_pattern(pattern),
            pattern: pattern.clone(),
        }
    }

    fn next(&mut self, now_ms: u64, rng: &mut StdRng) -> f64 {
        self.state.evaluate(&self.pattern, now_ms, rng)
    }
}

/// Seeded synthetic sensors for one station.
#[derive(Debug, Clone)]
pub struct WeatherSensors {
    rng: StdRng,
    temperature: Channel,
    humidity: Channel,
    humidity_per_degree: f64,
    pressure: Channel,
    gas_resistance: Channel,
    lux: Channel,
    co2: Channel,
    tvoc: Channel,
    wind_speed: Channel,
    wind_direction: Channel,
    rain_rate: Channel,
    dropout_probability: f64,
    failure: Option<SensorFailure>,
    precipitation_mm: f64,
    last_read_ms: Option<u64>,
    reads: u64,
    dropouts: u64,
}

impl WeatherSensors {
    /// Build a suite from a validated profile.
    pub fn new(profile: &SensorProfile, seed: u64) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            temperature: Channel::new(&profile.temperature),
            humidity: Channel::new(&profile.humidity),
            humidity_per_degree: profile.humidity_per_degree,
            pressure: Channel::new(&profile.pressure),
            gas_resistance: Channel::new(&profile.gas_resistance),
            lux: Channel::new(&profile.lux),
            co2: Channel::new(&profile.co2),
            tvoc: Channel::new(&profile.tvoc),
            wind_speed: Channel::new(&profile.wind_speed),
            wind_direction: Channel::new(&profile.wind_direction),
            rain_rate: Channel::new(&profile.rain_rate),
            dropout_probability: profile.dropout_probability,
            failure: profile.failure,
            precipitation_mm: 0.0,
            last_read_ms: None,
            reads: 0,
            dropouts: 0,
        })
    }

    /// Gauge total so far, mm
    pub fn precipitation_mm(&self) -> f64 {
        self.precipitation_mm
    }

    /// Number of successful reads (valid or not)
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Number of reads that came back invalid
    pub fn dropouts(&self) -> u64 {
        self.dropouts
    }

    fn accumulate_rain(&mut self, now_ms: u64) {
        let rate = self.rain_rate.next(now_ms, &mut self.rng).max(0.0);
        let dt_ms = self
            .last_read_ms
            .map_or(0, |last| now_ms.saturating_sub(last));
        self.precipitation_mm += rate * dt_ms as f64 / MS_PER_HOUR;
        self.last_read_ms = Some(now_ms);
    }

    fn sample(&mut self, now_ms: u64) -> RawSample {
        let rng = &mut self.rng;

        let temperature = self.temperature.next(now_ms, rng);
        let humidity = (self.humidity.next(now_ms, rng)
            - self.humidity_per_degree * (temperature - HUMIDITY_REFERENCE_C))
            .clamp(0.0, 100.0);
        let pressure = self.pressure.next(now_ms, rng).max(0.0);
        let gas = self.gas_resistance.next(now_ms, rng).max(0.0);

        let lux = self.lux.next(now_ms, rng).clamp(0.0, u32::MAX as f64) as u32;
        let co2 = self.co2.next(now_ms, rng).clamp(0.0, u16::MAX as f64) as u16;
        let tvoc = self.tvoc.next(now_ms, rng).clamp(0.0, u16::MAX as f64) as u16;

        let wind_speed = self.wind_speed.next(now_ms, rng).max(0.0);
        let direction = self.wind_direction.next(now_ms, rng).rem_euclid(360.0) as u16 % 360;

        RawSample::new(now_ms)
            .with_climate(temperature, humidity, pressure)
            .with_gas_resistance(gas)
            .with_light(lux, lux as f64 * LUX_TO_WM2)
            .with_air_quality(co2, tvoc)
            .with_wind(wind_speed, direction)
            .with_precipitation(self.precipitation_mm)
    }
}

impl SensorSource for WeatherSensors {
    fn read_all(&mut self, now_ms: u64) -> std::result::Result<RawSample, SensorError> {
        if let Some(failure) = self.failure.filter(|f| f.active_at(now_ms)) {
            if failure.mode == FailureMode::NotResponding {
                warn!("Simulated sensor bus not responding at {} ms", now_ms);
                return Err(SensorError::NotResponding {
                    name: "bme680".to_string(),
                });
            }
        }

        self.accumulate_rain(now_ms);
        let mut sample = self.sample(now_ms);
        self.reads += 1;

        let failed = self
            .failure
            .map_or(false, |f| f.active_at(now_ms) && f.mode == FailureMode::Invalid);
        let dropped =
            self.dropout_probability > 0.0 && self.rng.gen::<f64>() < self.dropout_probability;
        if failed || dropped {
            self.dropouts += 1;
            sample.is_valid = false;
            debug!("Simulated dropout at {} ms", now_ms);
        }

        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn constant(value: f64) -> SignalPattern {
        SignalPattern::Constant { value }
    }

    fn flat_profile() -> SensorProfile {
        SensorProfile {
            temperature: constant(20.0),
            humidity: constant(60.0),
            humidity_per_degree: 0.0,
            pressure: constant(1013.0),
            gas_resistance: constant(150.0),
            lux: constant(10_000.0),
            co2: constant(450.0),
            tvoc: constant(20.0),
            wind_speed: constant(3.0),
            wind_direction: constant(90.0),
            rain_rate: constant(0.0),
            dropout_probability: 0.0,
            failure: None,
        }
    }

    #[test]
    fn test_flat_profile_reads() {
        let mut sensors = WeatherSensors::new(&flat_profile(), 1).unwrap();
        let s = sensors.read_all(3000).unwrap();
        assert_eq!(s.timestamp_ms, 3000);
        assert_eq!(s.temperature, 20.0);
        assert_eq!(s.humidity, 60.0);
        assert_eq!(s.lux, 10_000);
        assert_abs_diff_eq!(s.solar_irradiance, 79.0, epsilon = 1e-9);
        assert_eq!(s.co2, 450);
        assert_eq!(s.wind_direction, 90);
        assert!(s.is_valid);
        assert_eq!(sensors.reads(), 1);
    }

    #[test]
    fn test_humidity_falls_with_temperature() {
        let profile = SensorProfile {
            temperature: constant(30.0),
            humidity_per_degree: 2.0,
            ..flat_profile()
        };
        let mut sensors = WeatherSensors::new(&profile, 1).unwrap();
        assert_eq!(sensors.read_all(0).unwrap().humidity, 40.0);
    }

    #[test]
    fn test_humidity_clamped() {
        let profile = SensorProfile {
            humidity: constant(130.0),
            ..flat_profile()
        };
        let mut sensors = WeatherSensors::new(&profile, 1).unwrap();
        assert_eq!(sensors.read_all(0).unwrap().humidity, 100.0);
    }

    #[test]
    fn test_direction_wraps() {
        let profile = SensorProfile {
            wind_direction: constant(-30.0),
            ..flat_profile()
        };
        let mut sensors = WeatherSensors::new(&profile, 1).unwrap();
        assert_eq!(sensors.read_all(0).unwrap().wind_direction, 330);

        let profile = SensorProfile {
            wind_direction: constant(725.0),
            ..flat_profile()
        };
        let mut sensors = WeatherSensors::new(&profile, 1).unwrap();
        assert_eq!(sensors.read_all(0).unwrap().wind_direction, 5);
    }

    #[test]
    fn test_precipitation_is_cumulative() {
        let profile = SensorProfile {
            rain_rate: constant(12.0),
            ..flat_profile()
        };
        let mut sensors = WeatherSensors::new(&profile, 1).unwrap();
        assert_eq!(sensors.read_all(0).unwrap().precipitation, 0.0);
        // 12 mm/h over 5 minutes
        let s = sensors.read_all(300_000).unwrap();
        assert_abs_diff_eq!(s.precipitation, 1.0, epsilon = 1e-9);
        let s = sensors.read_all(600_000).unwrap();
        assert_abs_diff_eq!(s.precipitation, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_same_seed_same_readings() {
        let profile = SensorProfile {
            temperature: SignalPattern::drifting(constant(15.0), 0.5),
            ..flat_profile()
        };
        let mut a = WeatherSensors::new(&profile, 7).unwrap();
        let mut b = WeatherSensors::new(&profile, 7).unwrap();
        for t in 0..50 {
            assert_eq!(a.read_all(t * 3000).unwrap(), b.read_all(t * 3000).unwrap());
        }
    }

    #[test]
    fn test_dropout_rate() {
        let profile = SensorProfile {
            dropout_probability: 0.2,
            ..flat_profile()
        };
        let mut sensors = WeatherSensors::new(&profile, 99).unwrap();
        let invalid = (0..1000)
            .filter(|t| !sensors.read_all(t * 1000).unwrap().is_valid)
            .count();
        assert!((120..280).contains(&invalid), "got {}", invalid);
        assert_eq!(sensors.dropouts(), invalid as u64);
    }

    #[test]
    fn test_failure_window() {
        let profile = SensorProfile {
            failure: Some(SensorFailure {
                start_ms: 10_000,
                duration_ms: Some(5_000),
                mode: FailureMode::NotResponding,
            }),
            ..flat_profile()
        };
        let mut sensors = WeatherSensors::new(&profile, 1).unwrap();
        assert!(sensors.read_all(9_999).is_ok());
        assert!(matches!(
            sensors.read_all(10_000),
            Err(SensorError::NotResponding { .. })
        ));
        assert!(sensors.read_all(14_999).is_err());
        assert!(sensors.read_all(15_000).is_ok());
    }

    #[test]
    fn test_invalid_failure_mode() {
        let profile = SensorProfile {
            failure: Some(SensorFailure {
                start_ms: 0,
                duration_ms: None,
                mode: FailureMode::Invalid,
            }),
            ..flat_profile()
        };
        let mut sensors = WeatherSensors::new(&profile, 1).unwrap();
        let s = sensors.read_all(1_000_000).unwrap();
        assert!(!s.is_valid);
    }

    #[test]
    fn test_bad_probability_rejected() {
        let profile = SensorProfile {
            dropout_probability: 1.5,
            ..flat_profile()
        };
        assert!(matches!(
            WeatherSensors::new(&profile, 1),
            Err(SimError::InvalidProbability(_))
        ));
    }
}
