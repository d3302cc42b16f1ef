//! Sensor readings and window summaries
//!
//! [`RawSample`] is one snapshot produced by the sensor collaborator per
//! sampling tick. [`WindowSummary`] is what the aggregator reports for all
//! valid samples seen since the last reset.

use serde::Serialize;
use std::fmt;

/// One sensor snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawSample {
    /// Milliseconds since boot
    pub timestamp_ms: u64,
    /// °C
    pub temperature: f64,
    /// % RH
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    /// kOhm
    pub gas_resistance: f64,
    /// Raw lux
    pub lux: u32,
    /// W/m²
    pub solar_irradiance: f64,
    /// ppm (equivalent CO2)
    pub co2: u16,
    /// ppb
    pub tvoc: u16,
    /// m/s
    pub wind_speed: f64,
    /// Degrees, 0-359
    pub wind_direction: u16,
    /// Cumulative depth reported by the gauge, mm
    pub precipitation: f64,
    /// Cleared by the sensor collaborator when the read failed
    pub is_valid: bool,
}

impl RawSample {
    /// Create a valid sample with every measurement at zero
    pub fn new(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            temperature: 0.0,
            humidity: 0.0,
            pressure: 0.0,
            gas_resistance: 0.0,
            lux: 0,
            solar_irradiance: 0.0,
            co2: 0,
            tvoc: 0,
            wind_speed: 0.0,
            wind_direction: 0,
            precipitation: 0.0,
            is_valid: true,
        }
    }

    /// Create a sample flagged as not ok
    pub fn invalid(timestamp_ms: u64) -> Self {
        Self {
            is_valid: false,
            ..Self::new(timestamp_ms)
        }
    }

    /// Set temperature, humidity and pressure
    pub fn with_climate(mut self, temperature: f64, humidity: f64, pressure: f64) -> Self {
        self.temperature = temperature;
        self.humidity = humidity;
        self.pressure = pressure;
        self
    }

    /// Set gas resistance
    pub fn with_gas_resistance(mut self, kohm: f64) -> Self {
        self.gas_resistance = kohm;
        self
    }

    /// Set wind speed and direction
    pub fn with_wind(mut self, speed: f64, direction: u16) -> Self {
        self.wind_speed = speed;
        self.wind_direction = direction;
        self
    }

    /// Set lux and solar irradiance
    pub fn with_light(mut self, lux: u32, solar_irradiance: f64) -> Self {
        self.lux = lux;
        self.solar_irradiance = solar_irradiance;
        self
    }

    /// Set CO2 and TVOC
    pub fn with_air_quality(mut self, co2: u16, tvoc: u16) -> Self {
        self.co2 = co2;
        self.tvoc = tvoc;
        self
    }

    /// Set cumulative precipitation
    pub fn with_precipitation(mut self, mm: f64) -> Self {
        self.precipitation = mm;
        self
    }

    /// True when every floating-point measurement is finite
    pub fn is_finite(&self) -> bool {
        [
            self.temperature,
            self.humidity,
            self.pressure,
            self.gas_resistance,
            self.solar_irradiance,
            self.wind_speed,
            self.precipitation,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Average, minimum and maximum of one field over a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FieldStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl FieldStats {
    /// Stats where all three values are `value`
    pub fn flat(value: f64) -> Self {
        Self {
            avg: value,
            min: value,
            max: value,
        }
    }
}

/// Aggregation of every valid sample observed since the last reset
///
/// When `sample_count == 0` every derived field is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowSummary {
    /// Time the summary was taken, ms since boot
    pub timestamp_ms: u64,
    /// Time since window start
    pub window_duration_ms: u64,
    /// Number of valid samples aggregated
    pub sample_count: u32,

    pub temperature: FieldStats,
    pub humidity: FieldStats,
    pub pressure: FieldStats,
    pub gas_resistance: FieldStats,
    /// `max` is the gust
    pub wind_speed: FieldStats,
    /// Circular mean in `[0, 360)`
    pub wind_direction: f64,
    /// Latest cumulative depth
    pub precipitation: f64,
    pub lux: FieldStats,
    pub solar_irradiance: FieldStats,
    pub co2: FieldStats,
    pub tvoc: FieldStats,
}

impl WindowSummary {
    /// All-zero summary for a window without valid samples
    pub fn empty(timestamp_ms: u64, window_duration_ms: u64) -> Self {
        Self {
            timestamp_ms,
            window_duration_ms,
            ..Self::default()
        }
    }

    /// True when no valid sample was aggregated
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Maximum wind speed seen in the window
    pub fn wind_gust(&self) -> f64 {
        self.wind_speed.max
    }
}

impl fmt::Display for WindowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Window: {} ms, Samples: {}",
            self.window_duration_ms, self.sample_count
        )?;
        let t = &self.temperature;
        writeln!(f, "Temperature: {:.2} °C (min: {:.2}, max: {:.2})", t.avg, t.min, t.max)?;
        let h = &self.humidity;
        writeln!(f, "Humidity: {:.2} % (min: {:.2}, max: {:.2})", h.avg, h.min, h.max)?;
        let p = &self.pressure;
        writeln!(f, "Pressure: {:.2} hPa (min: {:.2}, max: {:.2})", p.avg, p.min, p.max)?;
        let g = &self.gas_resistance;
        writeln!(f, "Gas Resistance: {:.2} kOhm (min: {:.2}, max: {:.2})", g.avg, g.min, g.max)?;
        writeln!(
            f,
            "Wind: {:.2} m/s avg (max: {:.2}) @ {:.0}°",
            self.wind_speed.avg, self.wind_speed.max, self.wind_direction
        )?;
        writeln!(f, "Precipitation: {:.2} mm", self.precipitation)?;
        writeln!(
            f,
            "Light: {:.0} lux avg (max: {:.0}), Solar: {:.2} W/m² avg",
            self.lux.avg, self.lux.max, self.solar_irradiance.avg
        )?;
        write!(
            f,
            "CO2: {:.0} ppm avg (max: {:.0}), TVOC: {:.0} ppb avg (max: {:.0})",
            self.co2.avg, self.co2.max, self.tvoc.avg, self.tvoc.max
        )
    }
}

/// Field selector for live averages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataField {
    Temperature,
    Humidity,
    Pressure,
    GasResistance,
    WindSpeed,
    WindDirection,
    Precipitation,
    Lux,
    SolarIrradiance,
    Co2,
    Tvoc,
}

impl DataField {
    /// Every field, in wire order
    pub const ALL: [DataField; 11] = [
        DataField::Temperature,
        DataField::Humidity,
        DataField::Pressure,
        DataField::GasResistance,
        DataField::WindSpeed,
        DataField::WindDirection,
        DataField::Precipitation,
        DataField::Lux,
        DataField::SolarIrradiance,
        DataField::Co2,
        DataField::Tvoc,
    ];

    /// Key used in textual payloads
    pub fn key(&self) -> &'static str {
        match self {
            DataField::Temperature => "temperature",
            DataField::Humidity => "humidity",
            DataField::Pressure => "pressure",
            DataField::GasResistance => "gas_resistance",
            DataField::WindSpeed => "wind_speed",
            DataField::WindDirection => "wind_direction",
            DataField::Precipitation => "precipitation",
            DataField::Lux => "lux",
            DataField::SolarIrradiance => "solar_irradiance",
            DataField::Co2 => "co2",
            DataField::Tvoc => "tvoc",
        }
    }

    /// Unit label used in textual payloads
    pub fn unit(&self) -> &'static str {
        match self {
            DataField::Temperature => "C",
            DataField::Humidity => "%",
            DataField::Pressure => "hPa",
            DataField::GasResistance => "KOhms",
            DataField::WindSpeed => "m/s",
            DataField::WindDirection => "deg",
            DataField::Precipitation => "mm",
            DataField::Lux => "lux",
            DataField::SolarIrradiance => "W/m2",
            DataField::Co2 => "ppm",
            DataField::Tvoc => "ppb",
        }
    }
}

impl fmt::Display for DataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
