//! Textual payloads for the uplink
//!
//! The uplink is assumed reliable and ordered, so these documents carry full
//! precision and no integrity field. JSON is produced with `serde_json`; CSV
//! and InfluxDB line protocol are plain formatted text.

use crate::config::{BatteryState, Location};
use crate::error::{Result, StationError};
use crate::protocol::PacketMeasurements;
use crate::reading::{DataField, FieldStats, RawSample, WindowSummary};
use serde::Serialize;
use std::fmt::Write as _;

/// Topic for weather reports of `station_id`
pub fn weather_topic(prefix: &str, station_id: &str) -> String {
    format!("{}/{}/weather", prefix, station_id)
}

/// Topic for status messages of `station_id`
pub fn status_topic(prefix: &str, station_id: &str) -> String {
    format!("{}/{}/status", prefix, station_id)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| StationError::Payload(e.to_string()))
}

#[derive(Debug, Serialize)]
struct Measure {
    value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
    unit: &'static str,
}

impl Measure {
    fn full(stats: &FieldStats, field: DataField) -> Self {
        Self {
            value: stats.avg,
            min: Some(stats.min),
            max: Some(stats.max),
            unit: field.unit(),
        }
    }

    fn with_max(stats: &FieldStats, field: DataField) -> Self {
        Self {
            value: stats.avg,
            min: None,
            max: Some(stats.max),
            unit: field.unit(),
        }
    }

    fn value(value: f64, field: DataField) -> Self {
        Self {
            value,
            min: None,
            max: None,
            unit: field.unit(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryData {
    temperature: Measure,
    humidity: Measure,
    pressure: Measure,
    gas_resistance: Measure,
    wind_speed: Measure,
    wind_direction: Measure,
    precipitation: Measure,
    lux: Measure,
    solar_irradiance: Measure,
    co2: Measure,
    tvoc: Measure,
}

#[derive(Debug, Serialize)]
struct SummaryMeta {
    samples: u32,
    window_ms: u64,
}

#[derive(Debug, Serialize)]
struct UplinkDocument<'a> {
    station_id: &'a str,
    timestamp: u64,
    data: SummaryData,
    meta: SummaryMeta,
}

/// Uplink JSON for a window summary
///
/// `wind_speed.max` is the gust. The layout is:
///
/// ```text
/// {"station_id":..,"timestamp":..,
///  "data":{"temperature":{"value":..,"min":..,"max":..,"unit":"C"},..},
///  "meta":{"samples":..,"window_ms":..}}
/// ```
pub fn summary_json(station_id: &str, summary: &WindowSummary) -> Result<String> {
    let doc = UplinkDocument {
        station_id,
        timestamp: summary.timestamp_ms,
        data: SummaryData {
            temperature: Measure::full(&summary.temperature, DataField::Temperature),
            humidity: Measure::full(&summary.humidity, DataField::Humidity),
            pressure: Measure::full(&summary.pressure, DataField::Pressure),
            gas_resistance: Measure::full(&summary.gas_resistance, DataField::GasResistance),
            wind_speed: Measure::with_max(&summary.wind_speed, DataField::WindSpeed),
            wind_direction: Measure::value(summary.wind_direction, DataField::WindDirection),
            precipitation: Measure::value(summary.precipitation, DataField::Precipitation),
            lux: Measure::full(&summary.lux, DataField::Lux),
            solar_irradiance: Measure::with_max(
                &summary.solar_irradiance,
                DataField::SolarIrradiance,
            ),
            co2: Measure::with_max(&summary.co2, DataField::Co2),
            tvoc: Measure::with_max(&summary.tvoc, DataField::Tvoc),
        },
        meta: SummaryMeta {
            samples: summary.sample_count,
            window_ms: summary.window_duration_ms,
        },
    };
    to_json(&doc)
}

#[derive(Debug, Serialize)]
struct RelayDocument<'a> {
    #[serde(flatten)]
    measurements: &'a PacketMeasurements,
    relayed_by: &'a str,
}

/// Uplink JSON for a packet received over the mesh
pub fn relay_json(measurements: &PacketMeasurements, relayed_by: &str) -> Result<String> {
    to_json(&RelayDocument {
        measurements,
        relayed_by,
    })
}

/// JSON for a single reading
pub fn reading_json(sample: &RawSample) -> Result<String> {
    to_json(sample)
}

/// Periodic station health report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub station_id: String,
    pub role: String,
    pub timestamp: u64,
    pub battery_mv: u16,
    pub battery_state: BatteryState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Valid samples in the open window
    pub window_samples: u32,
    pub samples: u64,
    pub sensor_errors: u64,
    pub transmissions: u64,
    pub send_failures: u64,
    pub relayed: u64,
    pub rejected: u64,
}

/// JSON for a status report
pub fn status_json(report: &StatusReport) -> Result<String> {
    to_json(report)
}

/// CSV header matching [`reading_csv_row`]
pub const READING_CSV_HEADER: &str = "timestamp,temperature,humidity,pressure,gas_resistance,\
wind_speed,wind_direction,precipitation,lux,solar_irradiance,co2,tvoc,valid";

/// One CSV row for a reading, without trailing newline
pub fn reading_csv_row(s: &RawSample) -> String {
    format!(
        "{},{:.2},{:.2},{:.2},{:.2},{:.2},{},{:.2},{},{:.2},{},{},{}",
        s.timestamp_ms,
        s.temperature,
        s.humidity,
        s.pressure,
        s.gas_resistance,
        s.wind_speed,
        s.wind_direction,
        s.precipitation,
        s.lux,
        s.solar_irradiance,
        s.co2,
        s.tvoc,
        u8::from(s.is_valid)
    )
}

/// CSV header matching [`summary_csv_row`]
pub const SUMMARY_CSV_HEADER: &str = "timestamp,window_ms,samples,\
temp_avg,temp_min,temp_max,\
humidity_avg,humidity_min,humidity_max,\
pressure_avg,pressure_min,pressure_max,\
gas_avg,gas_min,gas_max,\
wind_speed_avg,wind_speed_max,wind_dir_avg,\
precipitation,\
lux_avg,lux_max,solar_avg,\
co2_avg,co2_max,tvoc_avg,tvoc_max";

/// One CSV row for a summary, without trailing newline
pub fn summary_csv_row(s: &WindowSummary) -> String {
    let mut row = format!("{},{},{}", s.timestamp_ms, s.window_duration_ms, s.sample_count);
    for stats in [&s.temperature, &s.humidity, &s.pressure, &s.gas_resistance] {
        let _ = write!(row, ",{:.2},{:.2},{:.2}", stats.avg, stats.min, stats.max);
    }
    let _ = write!(
        row,
        ",{:.2},{:.2},{:.0},{:.2},{:.0},{:.0},{:.2},{:.0},{:.0},{:.0},{:.0}",
        s.wind_speed.avg,
        s.wind_speed.max,
        s.wind_direction,
        s.precipitation,
        s.lux.avg,
        s.lux.max,
        s.solar_irradiance.avg,
        s.co2.avg,
        s.co2.max,
        s.tvoc.avg,
        s.tvoc.max
    );
    row
}

/// Render readings as a CSV document with header
pub fn readings_csv<'a>(samples: impl IntoIterator<Item = &'a RawSample>) -> String {
    let mut out = String::from(READING_CSV_HEADER);
    out.push('\n');
    for sample in samples {
        out.push_str(&reading_csv_row(sample));
        out.push('\n');
    }
    out
}

/// InfluxDB line protocol for a summary
///
/// The millisecond timestamp is written in nanoseconds.
pub fn influx_line(measurement: &str, station_id: &str, s: &WindowSummary) -> String {
    let mut line = format!(
        "{},station={} ",
        escape_measurement(measurement),
        escape_tag_value(station_id)
    );
    let groups = [
        ("temp", &s.temperature),
        ("humidity", &s.humidity),
        ("pressure", &s.pressure),
        ("gas", &s.gas_resistance),
    ];
    for (name, stats) in groups {
        let _ = write!(
            line,
            "{name}_avg={:.2},{name}_min={:.2},{name}_max={:.2},",
            stats.avg,
            stats.min,
            stats.max,
            name = name
        );
    }
    let _ = write!(
        line,
        "wind_speed_avg={:.2},wind_speed_max={:.2},wind_dir={:.0},precipitation={:.2},\
lux_avg={:.0},lux_max={:.0},solar_avg={:.2},\
co2_avg={:.0},co2_max={:.0},tvoc_avg={:.0},tvoc_max={:.0},samples={}i {}000000",
        s.wind_speed.avg,
        s.wind_speed.max,
        s.wind_direction,
        s.precipitation,
        s.lux.avg,
        s.lux.max,
        s.solar_irradiance.avg,
        s.co2.avg,
        s.co2.max,
        s.tvoc.avg,
        s.tvoc.max,
        s.sample_count,
        s.timestamp_ms
    );
    line
}

/// Spaces and commas must be escaped in a measurement name.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Commas, equals signs and spaces must be escaped in a tag value.
fn escape_tag_value(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
