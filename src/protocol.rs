//! Mesh wire protocol
//!
//! A telemetry packet is a fixed 40-byte frame. Fields are written at fixed
//! offsets, multi-byte integers little-endian, independent of any struct
//! layout:
//!
//! ```text
//! off  len  field            encoding
//!   0    1  packet type      0x01 = telemetry
//!   1    9  station id       ASCII, null-padded
//!  10    4  timestamp        u32 ms since boot
//!  14    2  temperature      i16, °C x100
//!  16    2  humidity         u16, % x100
//!  18    2  pressure         u16, hPa x10
//!  20    2  gas resistance   u16, kOhm x10, clamped
//!  22    2  wind speed       u16, m/s x100
//!  24    2  wind direction   u16, degrees 0-359
//!  26    2  precipitation    u16, mm x100
//!  28    4  lux              u32, raw
//!  32    2  co2              u16, ppm
//!  34    2  tvoc             u16, ppb
//!  36    2  battery          u16, mV
//!  38    1  flags            bit 0 = valid
//!  39    1  checksum         XOR of bytes 0..39
//! ```

use crate::error::DecodeError;
use serde::Serialize;
use std::fmt;

/// Total packet size in bytes
pub const PACKET_SIZE: usize = 40;

/// Width of the station id field
pub const STATION_ID_FIELD_LEN: usize = 9;

/// Type tag for telemetry packets
pub const PACKET_TYPE_TELEMETRY: u8 = 0x01;

/// Flag bit marking the reading as valid
pub const FLAG_VALID: u8 = 0x01;

/// Fixed-point scale for temperature
pub const TEMPERATURE_SCALE: f64 = 100.0;
/// Fixed-point scale for humidity
pub const HUMIDITY_SCALE: f64 = 100.0;
/// Fixed-point scale for pressure
pub const PRESSURE_SCALE: f64 = 10.0;
/// Fixed-point scale for gas resistance
pub const GAS_RESISTANCE_SCALE: f64 = 10.0;
/// Fixed-point scale for wind speed
pub const WIND_SPEED_SCALE: f64 = 100.0;
/// Fixed-point scale for precipitation
pub const PRECIPITATION_SCALE: f64 = 100.0;

mod offset {
    pub const TYPE: usize = 0;
    pub const STATION_ID: usize = 1;
    pub const TIMESTAMP: usize = 10;
    pub const TEMPERATURE: usize = 14;
    pub const HUMIDITY: usize = 16;
    pub const PRESSURE: usize = 18;
    pub const GAS_RESISTANCE: usize = 20;
    pub const WIND_SPEED: usize = 22;
    pub const WIND_DIRECTION: usize = 24;
    pub const PRECIPITATION: usize = 26;
    pub const LUX: usize = 28;
    pub const CO2: usize = 32;
    pub const TVOC: usize = 34;
    pub const BATTERY: usize = 36;
    pub const FLAGS: usize = 38;
    pub const CHECKSUM: usize = 39;
}

/// XOR of every byte in `bytes`
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc ^ b)
}

/// One telemetry packet in its fixed-point wire representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WirePacket {
    pub packet_type: u8,
    pub station_id: [u8; STATION_ID_FIELD_LEN],
    pub timestamp: u32,
    pub temperature: i16,
    pub humidity: u16,
    pub pressure: u16,
    pub gas_resistance: u16,
    pub wind_speed: u16,
    pub wind_direction: u16,
    pub precipitation: u16,
    pub lux: u32,
    pub co2: u16,
    pub tvoc: u16,
    pub battery_mv: u16,
    pub flags: u8,
    /// Stored checksum; [`WirePacket::to_bytes`] always writes a fresh one
    pub checksum: u8,
}

impl WirePacket {
    /// Packet size in bytes
    pub const SIZE: usize = PACKET_SIZE;

    /// Pack `id` into the fixed id field, truncating to 9 bytes
    pub fn pack_station_id(id: &str) -> [u8; STATION_ID_FIELD_LEN] {
        let mut field = [0u8; STATION_ID_FIELD_LEN];
        let bytes = id.as_bytes();
        let len = bytes.len().min(STATION_ID_FIELD_LEN);
        field[..len].copy_from_slice(&bytes[..len]);
        field
    }

    /// Station id with padding removed
    pub fn station_id(&self) -> String {
        let end = self
            .station_id
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(STATION_ID_FIELD_LEN);
        String::from_utf8_lossy(&self.station_id[..end]).into_owned()
    }

    /// True for the telemetry type tag
    pub fn is_telemetry(&self) -> bool {
        self.packet_type == PACKET_TYPE_TELEMETRY
    }

    /// Validity flag
    pub fn is_valid(&self) -> bool {
        self.flags & FLAG_VALID != 0
    }

    /// Body bytes followed by a freshly computed checksum
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let mut buf = [0u8; PACKET_SIZE];

        buf[offset::TYPE] = self.packet_type;
        buf[offset::STATION_ID..offset::STATION_ID + STATION_ID_FIELD_LEN]
            .copy_from_slice(&self.station_id);
        put(&mut buf, offset::TIMESTAMP, &self.timestamp.to_le_bytes());
        put(&mut buf, offset::TEMPERATURE, &self.temperature.to_le_bytes());
        put(&mut buf, offset::HUMIDITY, &self.humidity.to_le_bytes());
        put(&mut buf, offset::PRESSURE, &self.pressure.to_le_bytes());
        put(&mut buf, offset::GAS_RESISTANCE, &self.gas_resistance.to_le_bytes());
        put(&mut buf, offset::WIND_SPEED, &self.wind_speed.to_le_bytes());
        put(&mut buf, offset::WIND_DIRECTION, &self.wind_direction.to_le_bytes());
        put(&mut buf, offset::PRECIPITATION, &self.precipitation.to_le_bytes());
        put(&mut buf, offset::LUX, &self.lux.to_le_bytes());
        put(&mut buf, offset::CO2, &self.co2.to_le_bytes());
        put(&mut buf, offset::TVOC, &self.tvoc.to_le_bytes());
        put(&mut buf, offset::BATTERY, &self.battery_mv.to_le_bytes());
        buf[offset::FLAGS] = self.flags;
        buf[offset::CHECKSUM] = xor_checksum(&buf[..offset::CHECKSUM]);

        buf
    }

    /// Parse and verify a received packet
    ///
    /// Rejects any length other than [`PACKET_SIZE`] before touching the
    /// contents, then rejects a checksum mismatch.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let buf: &[u8; PACKET_SIZE] =
            bytes.try_into().map_err(|_| DecodeError::WrongLength {
                expected: PACKET_SIZE,
                actual: bytes.len(),
            })?;

        let expected = buf[offset::CHECKSUM];
        let actual = xor_checksum(&buf[..offset::CHECKSUM]);
        if expected != actual {
            return Err(DecodeError::ChecksumMismatch { expected, actual });
        }

        let mut station_id = [0u8; STATION_ID_FIELD_LEN];
        let end = offset::STATION_ID + STATION_ID_FIELD_LEN;
        station_id.copy_from_slice(&buf[offset::STATION_ID..end]);

        Ok(Self {
            packet_type: buf[offset::TYPE],
            station_id,
            timestamp: u32::from_le_bytes(take(buf, offset::TIMESTAMP)),
            temperature: i16::from_le_bytes(take(buf, offset::TEMPERATURE)),
            humidity: u16::from_le_bytes(take(buf, offset::HUMIDITY)),
            pressure: u16::from_le_bytes(take(buf, offset::PRESSURE)),
            gas_resistance: u16::from_le_bytes(take(buf, offset::GAS_RESISTANCE)),
            wind_speed: u16::from_le_bytes(take(buf, offset::WIND_SPEED)),
            wind_direction: u16::from_le_bytes(take(buf, offset::WIND_DIRECTION)),
            precipitation: u16::from_le_bytes(take(buf, offset::PRECIPITATION)),
            lux: u32::from_le_bytes(take(buf, offset::LUX)),
            co2: u16::from_le_bytes(take(buf, offset::CO2)),
            tvoc: u16::from_le_bytes(take(buf, offset::TVOC)),
            battery_mv: u16::from_le_bytes(take(buf, offset::BATTERY)),
            flags: buf[offset::FLAGS],
            checksum: expected,
        })
    }

    /// Values converted back to engineering units
    pub fn measurements(&self) -> PacketMeasurements {
        PacketMeasurements {
            station_id: self.station_id(),
            timestamp_ms: self.timestamp,
            temperature: self.temperature as f64 / TEMPERATURE_SCALE,
            humidity: self.humidity as f64 / HUMIDITY_SCALE,
            pressure: self.pressure as f64 / PRESSURE_SCALE,
            gas_resistance: self.gas_resistance as f64 / GAS_RESISTANCE_SCALE,
            wind_speed: self.wind_speed as f64 / WIND_SPEED_SCALE,
            wind_direction: self.wind_direction,
            precipitation: self.precipitation as f64 / PRECIPITATION_SCALE,
            lux: self.lux,
            co2: self.co2,
            tvoc: self.tvoc,
            battery_mv: self.battery_mv,
            valid: self.is_valid(),
        }
    }
}

fn put(buf: &mut [u8; PACKET_SIZE], at: usize, bytes: &[u8]) {
    buf[at..at + bytes.len()].copy_from_slice(bytes);
}

fn take<const N: usize>(buf: &[u8; PACKET_SIZE], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[at..at + N]);
    out
}

impl fmt::Display for WirePacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "packet[type=0x{:02x} station={} t={} temp={:.2}°C flags=0x{:02x}]",
            self.packet_type,
            self.station_id(),
            self.timestamp,
            self.temperature as f64 / TEMPERATURE_SCALE,
            self.flags
        )
    }
}

/// Decoded packet contents in engineering units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketMeasurements {
    pub station_id: String,
    pub timestamp_ms: u32,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub gas_resistance: f64,
    pub wind_speed: f64,
    pub wind_direction: u16,
    pub precipitation: f64,
    pub lux: u32,
    pub co2: u16,
    pub tvoc: u16,
    pub battery_mv: u16,
    pub valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_packet() -> WirePacket {
        WirePacket {
            packet_type: PACKET_TYPE_TELEMETRY,
            station_id: WirePacket::pack_station_id("1A2B3C4D"),
            timestamp: 123_456,
            temperature: -1234,
            humidity: 5512,
            pressure: 10132,
            gas_resistance: 1500,
            wind_speed: 345,
            wind_direction: 270,
            precipitation: 125,
            lux: 70_000,
            co2: 415,
            tvoc: 12,
            battery_mv: 3900,
            flags: FLAG_VALID,
            checksum: 0,
        }
    }

    #[test]
    fn test_packet_size() {
        assert_eq!(sample_packet().to_bytes().len(), 40);
        assert_eq!(WirePacket::SIZE, PACKET_SIZE);
    }

    #[test]
    fn test_fixed_offsets_little_endian() {
        let bytes = sample_packet().to_bytes();
        assert_eq!(bytes[0], 0x01);
        assert_eq!(&bytes[1..9], b"1A2B3C4D");
        assert_eq!(bytes[9], 0);
        assert_eq!(&bytes[10..14], &123_456u32.to_le_bytes());
        assert_eq!(&bytes[14..16], &(-1234i16).to_le_bytes());
        assert_eq!(&bytes[24..26], &270u16.to_le_bytes());
        assert_eq!(&bytes[28..32], &70_000u32.to_le_bytes());
        assert_eq!(&bytes[36..38], &3900u16.to_le_bytes());
        assert_eq!(bytes[38], FLAG_VALID);
    }

    #[test]
    fn test_checksum_is_xor_of_body() {
        let bytes = sample_packet().to_bytes();
        let expected = bytes[..39].iter().fold(0u8, |a, b| a ^ b);
        assert_eq!(bytes[39], expected);
        // XOR over the whole frame cancels out
        assert_eq!(xor_checksum(&bytes), 0);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let packet = sample_packet();
        let restored = WirePacket::from_bytes(&packet.to_bytes()).unwrap();

        assert_eq!(restored.station_id(), "1A2B3C4D");
        assert_eq!(restored.temperature, packet.temperature);
        assert_eq!(restored.lux, packet.lux);
        assert_eq!(restored.checksum, packet.to_bytes()[39]);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let bytes = sample_packet().to_bytes();

        let short = WirePacket::from_bytes(&bytes[..39]);
        assert_eq!(
            short,
            Err(DecodeError::WrongLength {
                expected: 40,
                actual: 39
            })
        );

        let mut long = bytes.to_vec();
        long.push(0);
        assert!(matches!(
            WirePacket::from_bytes(&long),
            Err(DecodeError::WrongLength { actual: 41, .. })
        ));

        assert!(matches!(
            WirePacket::from_bytes(&[]),
            Err(DecodeError::WrongLength { actual: 0, .. })
        ));
    }

    #[test]
    fn test_corruption_detected() {
        let mut bytes = sample_packet().to_bytes();
        bytes[15] ^= 0x10;

        assert!(matches!(
            WirePacket::from_bytes(&bytes),
            Err(DecodeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_checksum_byte_corruption_detected() {
        let mut bytes = sample_packet().to_bytes();
        bytes[39] ^= 0x01;
        assert!(matches!(
            WirePacket::from_bytes(&bytes),
            Err(DecodeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_station_id_packing() {
        assert_eq!(WirePacket::pack_station_id("AB"), *b"AB\0\0\0\0\0\0\0");
        assert_eq!(WirePacket::pack_station_id("WX1A2B3C4D"), *b"WX1A2B3C4");
        assert_eq!(WirePacket::pack_station_id(""), [0u8; 9]);

        let mut packet = sample_packet();
        packet.station_id = *b"NINECHARS";
        assert_eq!(packet.station_id(), "NINECHARS");
    }

    #[test]
    fn test_measurements_units() {
        let m = sample_packet().measurements();
        assert_eq!(m.station_id, "1A2B3C4D");
        assert!((m.temperature - -12.34).abs() < 1e-9);
        assert!((m.humidity - 55.12).abs() < 1e-9);
        assert!((m.pressure - 1013.2).abs() < 1e-9);
        assert!((m.gas_resistance - 150.0).abs() < 1e-9);
        assert!((m.wind_speed - 3.45).abs() < 1e-9);
        assert!((m.precipitation - 1.25).abs() < 1e-9);
        assert_eq!(m.wind_direction, 270);
        assert!(m.valid);
    }

    #[test]
    fn test_flags() {
        let mut packet = sample_packet();
        assert!(packet.is_valid());
        assert!(packet.is_telemetry());
        packet.flags = 0;
        assert!(!packet.is_valid());
        packet.packet_type = 0x7f;
        assert!(!packet.is_telemetry());
    }
}
