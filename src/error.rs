//! Error types for wxstation
//!
//! Invalid samples, clamped fields and empty windows are resolved locally
//! with a defined fallback and never show up here. Only conditions a caller
//! has to act on are surfaced.

use thiserror::Error;

/// Result type alias for station operations
pub type Result<T> = std::result::Result<T, StationError>;

/// Main error type for station operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StationError {
    /// Decoding error
    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Sensor error
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// Textual payload could not be produced
    #[error("Payload error: {0}")]
    Payload(String),
}

/// Errors while decoding a mesh packet
///
/// A packet failing either check is rejected as a whole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Byte length differs from the fixed packet size (malformed)
    #[error("Wrong packet length: expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    /// XOR checksum does not match (corrupted)
    #[error("Checksum mismatch: expected {expected:02x}, got {actual:02x}")]
    ChecksumMismatch { expected: u8, actual: u8 },
}

/// Errors in station configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An interval or window is zero
    #[error("Interval must be non-zero: {name}")]
    ZeroInterval { name: &'static str },

    /// Station identifier rejected
    #[error("Invalid station id {id:?}: {reason}")]
    InvalidStationId { id: String, reason: &'static str },

    /// Mesh payload cap cannot carry a telemetry packet
    #[error("Mesh payload limit {limit} bytes is below packet size {packet}")]
    MeshLimitTooSmall { limit: usize, packet: usize },

    /// Critical battery level above the low level
    #[error("Critical battery level {critical_mv} mV is above low level {low_mv} mV")]
    BatteryThresholds { low_mv: u16, critical_mv: u16 },

    /// Coordinates out of range
    #[error("Invalid location: {reason}")]
    InvalidLocation { reason: &'static str },

    /// Router and station were built from different settings
    #[error("Role router does not match the station configuration: {field} differs")]
    RouterMismatch { field: &'static str },
}

/// Errors reported by transport collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Link is down or not initialised
    #[error("Disconnected: {reason}")]
    Disconnected { reason: String },

    /// Payload exceeds the link limit
    #[error("Payload too large: {size} bytes exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// Outgoing queue is full
    #[error("Send buffer full")]
    BufferFull,
}

/// Errors reported by the sensor collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// Sensor bus not initialised
    #[error("Sensors not initialised")]
    NotInitialised,

    /// A specific device did not answer
    #[error("Sensor {name} not responding")]
    NotResponding { name: String },
}
