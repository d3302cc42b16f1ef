//! Packet encoder
//!
//! Turns a single reading or a window summary into a [`WirePacket`]. Each
//! measurement is multiplied by its scale factor, truncated toward zero and
//! clamped to the range of its integer field. Out-of-range values lose
//! precision silently; they never wrap.

use crate::protocol::{
    WirePacket, FLAG_VALID, GAS_RESISTANCE_SCALE, HUMIDITY_SCALE, PACKET_SIZE,
    PACKET_TYPE_TELEMETRY, PRECIPITATION_SCALE, PRESSURE_SCALE, TEMPERATURE_SCALE, WIND_SPEED_SCALE,
};
use crate::reading::{RawSample, WindowSummary};
use crate::role::StationId;

/// Measurement values handed to the encoder, in engineering units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    pub timestamp_ms: u64,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub gas_resistance: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub precipitation: f64,
    pub lux: f64,
    pub co2: f64,
    pub tvoc: f64,
    pub valid: bool,
}

/// Anything that can be put on the wire
pub trait Telemetry {
    /// Values to encode
    fn measurements(&self) -> Measurements;
}

impl Telemetry for RawSample {
    fn measurements(&self) -> Measurements {
        Measurements {
            timestamp_ms: self.timestamp_ms,
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            gas_resistance: self.gas_resistance,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction as f64,
            precipitation: self.precipitation,
            lux: self.lux as f64,
            co2: self.co2 as f64,
            tvoc: self.tvoc as f64,
            valid: self.is_valid,
        }
    }
}

impl Telemetry for WindowSummary {
    fn measurements(&self) -> Measurements {
        Measurements {
            timestamp_ms: self.timestamp_ms,
            temperature: self.temperature.avg,
            humidity: self.humidity.avg,
            pressure: self.pressure.avg,
            gas_resistance: self.gas_resistance.avg,
            wind_speed: self.wind_speed.avg,
            wind_direction: self.wind_direction,
            precipitation: self.precipitation,
            lux: self.lux.avg,
            co2: self.co2.avg,
            tvoc: self.tvoc.avg,
            valid: !self.is_empty(),
        }
    }
}

/// `value * scale` as `i16`, truncated and clamped; NaN maps to 0
pub fn quantize_i16(value: f64, scale: f64) -> i16 {
    // float-to-int `as` saturates and maps NaN to zero
    (value * scale).trunc() as i16
}

/// `value * scale` as `u16`, truncated and clamped; NaN and negatives map to 0
pub fn quantize_u16(value: f64, scale: f64) -> u16 {
    (value * scale).trunc() as u16
}

/// `value` as `u32`, truncated and clamped; NaN and negatives map to 0
pub fn quantize_u32(value: f64) -> u32 {
    value.trunc() as u32
}

/// Direction in whole degrees, wrapped into 0-359
pub fn quantize_direction(degrees: f64) -> u16 {
    if !degrees.is_finite() {
        return 0;
    }
    (degrees.trunc().rem_euclid(360.0) as u16) % 360
}

/// Encoder for telemetry packets
#[derive(Debug, Clone)]
pub struct PacketEncoder {
    /// Battery voltage written into every packet
    battery_mv: u16,
    /// Packets produced so far
    packets_encoded: u64,
}

impl PacketEncoder {
    /// Create an encoder reporting 0 mV until told otherwise
    pub fn new() -> Self {
        Self {
            battery_mv: 0,
            packets_encoded: 0,
        }
    }

    /// Create an encoder with a battery reading
    pub fn with_battery(battery_mv: u16) -> Self {
        Self {
            battery_mv,
            packets_encoded: 0,
        }
    }

    /// Update the battery voltage
    pub fn set_battery_mv(&mut self, battery_mv: u16) {
        self.battery_mv = battery_mv;
    }

    /// Current battery voltage
    pub fn battery_mv(&self) -> u16 {
        self.battery_mv
    }

    /// Number of packets encoded
    pub fn packets_encoded(&self) -> u64 {
        self.packets_encoded
    }

    /// Encode a reading or summary for `station_id`
    pub fn encode<T: Telemetry + ?Sized>(
        &mut self,
        source: &T,
        station_id: &StationId,
    ) -> WirePacket {
        let m = source.measurements();
        self.packets_encoded += 1;

        let mut packet = WirePacket {
            packet_type: PACKET_TYPE_TELEMETRY,
            station_id: station_id.wire_bytes(),
            // wraps like a 32-bit millisecond counter
            timestamp: (m.timestamp_ms & 0xFFFF_FFFF) as u32,
            temperature: quantize_i16(m.temperature, TEMPERATURE_SCALE),
            humidity: quantize_u16(m.humidity, HUMIDITY_SCALE),
            pressure: quantize_u16(m.pressure, PRESSURE_SCALE),
            gas_resistance: quantize_u16(m.gas_resistance, GAS_RESISTANCE_SCALE),
            wind_speed: quantize_u16(m.wind_speed, WIND_SPEED_SCALE),
            wind_direction: quantize_direction(m.wind_direction),
            precipitation: quantize_u16(m.precipitation, PRECIPITATION_SCALE),
            lux: quantize_u32(m.lux),
            co2: quantize_u16(m.co2, 1.0),
            tvoc: quantize_u16(m.tvoc, 1.0),
            battery_mv: self.battery_mv,
            flags: if m.valid { FLAG_VALID } else { 0 },
            checksum: 0,
        };
        packet.checksum = packet.to_bytes()[PACKET_SIZE - 1];
        packet
    }

    /// Encode straight to bytes
    pub fn encode_bytes<T: Telemetry + ?Sized>(
        &mut self,
        source: &T,
        station_id: &StationId,
    ) -> [u8; PACKET_SIZE] {
        self.encode(source, station_id).to_bytes()
    }
}

impl Default for PacketEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::xor_checksum;
    use crate::reading::FieldStats;

    fn station() -> StationId {
        StationId::parse("SAT01").unwrap()
    }

    #[test]
    fn test_quantize_truncates_toward_zero() {
        assert_eq!(quantize_i16(21.239, 100.0), 2123);
        assert_eq!(quantize_i16(-12.349, 100.0), -1234);
        assert_eq!(quantize_u16(55.555, 100.0), 5555);
    }

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize_i16(400.0, 100.0), i16::MAX);
        assert_eq!(quantize_i16(-400.0, 100.0), i16::MIN);
        assert_eq!(quantize_u16(10_000.0, 10.0), u16::MAX);
        assert_eq!(quantize_u16(-5.0, 100.0), 0);
        assert_eq!(quantize_u16(f64::NAN, 100.0), 0);
        assert_eq!(quantize_i16(f64::NAN, 100.0), 0);
        assert_eq!(quantize_u32(1e12), u32::MAX);
        assert_eq!(quantize_u32(-1.0), 0);
    }

    #[test]
    fn test_quantize_direction_wraps() {
        assert_eq!(quantize_direction(0.0), 0);
        assert_eq!(quantize_direction(359.9), 359);
        assert_eq!(quantize_direction(360.0), 0);
        assert_eq!(quantize_direction(725.0), 5);
        assert_eq!(quantize_direction(-90.0), 270);
        assert_eq!(quantize_direction(f64::NAN), 0);
    }

    #[test]
    fn test_encode_reading() {
        let sample = RawSample::new(5_000)
            .with_climate(21.5, 40.25, 1013.2)
            .with_gas_resistance(150.0)
            .with_wind(3.2, 270)
            .with_light(12_000, 94.8)
            .with_air_quality(410, 12)
            .with_precipitation(1.25);

        let mut encoder = PacketEncoder::with_battery(3900);
        let packet = encoder.encode(&sample, &station());

        assert_eq!(packet.packet_type, PACKET_TYPE_TELEMETRY);
        assert_eq!(packet.station_id(), "SAT01");
        assert_eq!(packet.timestamp, 5_000);
        assert_eq!(packet.temperature, 2150);
        assert_eq!(packet.humidity, 4025);
        assert_eq!(packet.gas_resistance, 1500);
        assert_eq!(packet.wind_direction, 270);
        assert_eq!(packet.precipitation, 125);
        assert_eq!(packet.lux, 12_000);
        assert_eq!(packet.co2, 410);
        assert_eq!(packet.battery_mv, 3900);
        assert!(packet.is_valid());
        assert_eq!(encoder.packets_encoded(), 1);
    }

    #[test]
    fn test_checksum_matches_bytes() {
        let mut encoder = PacketEncoder::new();
        let sample = RawSample::new(1).with_climate(20.0, 50.0, 1000.0);
        let packet = encoder.encode(&sample, &station());
        let bytes = packet.to_bytes();
        assert_eq!(packet.checksum, bytes[39]);
        assert_eq!(xor_checksum(&bytes[..39]), bytes[39]);
    }

    #[test]
    fn test_invalid_reading_clears_flag() {
        let mut encoder = PacketEncoder::new();
        let packet = encoder.encode(&RawSample::invalid(10), &station());
        assert!(!packet.is_valid());
    }

    #[test]
    fn test_encode_summary_uses_averages() {
        let mut summary = WindowSummary::empty(9_000, 30_000);
        summary.sample_count = 10;
        summary.temperature = FieldStats {
            avg: 18.5,
            min: 17.0,
            max: 20.0,
        };
        summary.wind_speed = FieldStats {
            avg: 2.5,
            min: 0.0,
            max: 7.0,
        };
        summary.wind_direction = 359.6;
        summary.lux = FieldStats::flat(800.7);

        let packet = PacketEncoder::new().encode(&summary, &station());
        assert_eq!(packet.temperature, 1850);
        assert_eq!(packet.wind_speed, 250);
        assert_eq!(packet.wind_direction, 359);
        assert_eq!(packet.lux, 800);
        assert!(packet.is_valid());
    }

    #[test]
    fn test_empty_summary_not_valid() {
        let packet = PacketEncoder::new().encode(&WindowSummary::empty(0, 0), &station());
        assert!(!packet.is_valid());
        assert_eq!(packet.temperature, 0);
    }

    #[test]
    fn test_gas_resistance_clamped() {
        let sample = RawSample::new(0).with_gas_resistance(9_000.0);
        let packet = PacketEncoder::new().encode(&sample, &station());
        assert_eq!(packet.gas_resistance, u16::MAX);
    }

    #[test]
    fn test_timestamp_wraps_to_u32() {
        let sample = RawSample::new((1u64 << 32) + 77);
        let packet = PacketEncoder::new().encode(&sample, &station());
        assert_eq!(packet.timestamp, 77);
    }
}
