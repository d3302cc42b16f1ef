// WXStation - Remote weather station telemetry core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Windowed sample aggregation
//!
//! [`SampleAggregator`] keeps O(1) running state per field (sum, extrema and
//! a sin/cos accumulator for wind direction) so a window summary can be
//! produced without retaining individual samples.
//!
//! # Example
//!
//! ```rust
//! use wxstation::{ManualClock, RawSample, SampleAggregator};
//!
//! let clock = ManualClock::new(0);
//! let mut aggregator = SampleAggregator::new(clock.clone());
//!
//! aggregator.add_sample(&RawSample::new(0).with_wind(2.0, 0));
//! aggregator.add_sample(&RawSample::new(3000).with_wind(4.0, 90));
//!
//! let summary = aggregator.get_and_reset();
//! assert_eq!(summary.sample_count, 2);
//! assert!((summary.wind_direction - 45.0).abs() < 1e-9);
//! assert_eq!(summary.wind_gust(), 4.0);
//! ```

use crate::clock::{Clock, SystemClock};
use crate::config::DEFAULT_AGGREGATION_WINDOW_MS;
use crate::reading::{DataField, FieldStats, RawSample, WindowSummary};
use log::debug;

/// Initial value of every minimum accumulator; any sample compares lower
pub const NO_DATA_MIN: f64 = f64::MAX;

/// Initial value of every maximum accumulator; any sample compares higher
pub const NO_DATA_MAX: f64 = f64::MIN;

/// Running sum and extrema for one scalar field
#[derive(Debug, Clone, Copy, PartialEq)]
struct RunningStats {
    sum: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    const EMPTY: Self = Self {
        sum: 0.0,
        min: NO_DATA_MIN,
        max: NO_DATA_MAX,
    };

    fn push(&mut self, value: f64) {
        self.sum += value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    fn mean(&self, count: u32) -> f64 {
        if count == 0 {
            return 0.0;
        }
        self.sum / count as f64
    }

    /// Stats for `count` samples; the mean is pinned into `[min, max]`
    fn stats(&self, count: u32) -> FieldStats {
        if count == 0 {
            return FieldStats::default();
        }
        FieldStats {
            avg: self.mean(count).max(self.min).min(self.max),
            min: self.min,
            max: self.max,
        }
    }
}

/// Vector accumulator for angles in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct CircularMean {
    sin_sum: f64,
    cos_sum: f64,
}

impl CircularMean {
    fn push(&mut self, degrees: f64) {
        let radians = degrees.to_radians();
        self.sin_sum += radians.sin();
        self.cos_sum += radians.cos();
    }

    /// `atan2(Σsin, Σcos)` in degrees, normalized into `[0, 360)`
    fn mean_degrees(&self) -> f64 {
        let degrees = self.sin_sum.atan2(self.cos_sum).to_degrees();
        let normalized = degrees.rem_euclid(360.0);
        // rem_euclid of a tiny negative rounds up to 360.0
        if normalized >= 360.0 {
            0.0
        } else {
            normalized
        }
    }
}

/// Accumulates samples into windowed statistics
#[derive(Debug, Clone)]
pub struct SampleAggregator<C: Clock = SystemClock> {
    clock: C,
    window_ms: u64,
    window_start_ms: u64,
    sample_count: u32,

    temperature: RunningStats,
    humidity: RunningStats,
    pressure: RunningStats,
    gas_resistance: RunningStats,
    wind_speed: RunningStats,
    lux: RunningStats,
    solar_irradiance: RunningStats,
    co2: RunningStats,
    tvoc: RunningStats,

    wind_direction: CircularMean,
    precipitation: f64,
}

impl<C: Clock> SampleAggregator<C> {
    /// Aggregator with the default five-minute window
    pub fn new(clock: C) -> Self {
        Self::with_window(clock, DEFAULT_AGGREGATION_WINDOW_MS)
    }

    /// Aggregator with a custom window duration
    pub fn with_window(clock: C, window_ms: u64) -> Self {
        let window_start_ms = clock.now_ms();
        Self {
            clock,
            window_ms,
            window_start_ms,
            sample_count: 0,
            temperature: RunningStats::EMPTY,
            humidity: RunningStats::EMPTY,
            pressure: RunningStats::EMPTY,
            gas_resistance: RunningStats::EMPTY,
            wind_speed: RunningStats::EMPTY,
            lux: RunningStats::EMPTY,
            solar_irradiance: RunningStats::EMPTY,
            co2: RunningStats::EMPTY,
            tvoc: RunningStats::EMPTY,
            wind_direction: CircularMean::default(),
            precipitation: 0.0,
        }
    }

    /// Fold one sample into the running state
    ///
    /// Samples flagged invalid, or carrying non-finite values, are skipped
    /// and do not count.
    pub fn add_sample(&mut self, sample: &RawSample) {
        if !sample.is_valid {
            return;
        }
        if !sample.is_finite() {
            debug!(
                "Skipping sample at {} ms with non-finite values",
                sample.timestamp_ms
            );
            return;
        }

        self.sample_count = self.sample_count.saturating_add(1);

        self.temperature.push(sample.temperature);
        self.humidity.push(sample.humidity);
        self.pressure.push(sample.pressure);
        self.gas_resistance.push(sample.gas_resistance);
        self.wind_speed.push(sample.wind_speed);
        self.lux.push(sample.lux as f64);
        self.solar_irradiance.push(sample.solar_irradiance);
        self.co2.push(sample.co2 as f64);
        self.tvoc.push(sample.tvoc as f64);

        self.wind_direction.push(sample.wind_direction as f64);

        // Gauge already reports a cumulative depth
        self.precipitation = sample.precipitation;
    }

    /// True once the configured window has elapsed
    pub fn is_window_complete(&self) -> bool {
        self.window_elapsed() >= self.window_ms
    }

    /// Summary of the current window, without resetting it
    pub fn get_window_summary(&self) -> WindowSummary {
        let now = self.clock.now_ms();
        let duration = now.saturating_sub(self.window_start_ms);
        let n = self.sample_count;

        if n == 0 {
            return WindowSummary::empty(now, duration);
        }

        WindowSummary {
            timestamp_ms: now,
            window_duration_ms: duration,
            sample_count: n,
            temperature: self.temperature.stats(n),
            humidity: self.humidity.stats(n),
            pressure: self.pressure.stats(n),
            gas_resistance: self.gas_resistance.stats(n),
            wind_speed: self.wind_speed.stats(n),
            wind_direction: self.wind_direction.mean_degrees(),
            precipitation: self.precipitation,
            lux: self.lux.stats(n),
            solar_irradiance: self.solar_irradiance.stats(n),
            co2: self.co2.stats(n),
            tvoc: self.tvoc.stats(n),
        }
    }

    /// Summary of the current window, then start a new one
    pub fn get_and_reset(&mut self) -> WindowSummary {
        let summary = self.get_window_summary();
        self.reset();
        summary
    }

    /// Clear all running state and restart the window clock
    pub fn reset(&mut self) {
        self.window_start_ms = self.clock.now_ms();
        self.sample_count = 0;

        self.temperature = RunningStats::EMPTY;
        self.humidity = RunningStats::EMPTY;
        self.pressure = RunningStats::EMPTY;
        self.gas_resistance = RunningStats::EMPTY;
        self.wind_speed = RunningStats::EMPTY;
        self.lux = RunningStats::EMPTY;
        self.solar_irradiance = RunningStats::EMPTY;
        self.co2 = RunningStats::EMPTY;
        self.tvoc = RunningStats::EMPTY;

        self.wind_direction = CircularMean::default();
        self.precipitation = 0.0;
    }

    /// Valid samples in the current window
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Milliseconds since the window started
    pub fn window_elapsed(&self) -> u64 {
        self.clock.now_ms().saturating_sub(self.window_start_ms)
    }

    /// Configured window duration
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Live average of one field; zero before the first valid sample
    pub fn current_average(&self, field: DataField) -> f64 {
        let n = self.sample_count;
        if n == 0 {
            return 0.0;
        }

        match field {
            DataField::Temperature => self.temperature.mean(n),
            DataField::Humidity => self.humidity.mean(n),
            DataField::Pressure => self.pressure.mean(n),
            DataField::GasResistance => self.gas_resistance.mean(n),
            DataField::WindSpeed => self.wind_speed.mean(n),
            DataField::WindDirection => self.wind_direction.mean_degrees(),
            DataField::Precipitation => self.precipitation,
            DataField::Lux => self.lux.mean(n),
            DataField::SolarIrradiance => self.solar_irradiance.mean(n),
            DataField::Co2 => self.co2.mean(n),
            DataField::Tvoc => self.tvoc.mean(n),
        }
    }
}
