//! # WXStation - Remote weather station telemetry core
//!
//! Aggregation, wire codec and role routing for a network of battery-powered
//! weather stations. A satellite samples its sensors, summarizes them over a
//! window and sends a 40-byte packet to the hub over a short-range mesh; the
//! hub publishes its own summaries and relays satellite packets upstream as
//! JSON.
//!
//! ## Key Features
//!
//! - **O(1) aggregation**: running sums, extrema and a circular mean for wind
//! - **Fixed-point wire packet**: fixed offsets, little-endian, XOR checksum
//! - **Role routing**: one boot-time input fixes cadence and transport
//!
//! ## Quick Start
//!
//! ```rust
//! use wxstation::{decode, ManualClock, PacketEncoder, RawSample, SampleAggregator, StationId};
//!
//! let clock = ManualClock::new(0);
//! let mut aggregator = SampleAggregator::new(clock.clone());
//!
//! for i in 0..10 {
//!     let sample = RawSample::new(i * 3000).with_climate(20.0, 55.0, 1013.2);
//!     aggregator.add_sample(&sample);
//! }
//! clock.advance(30_000);
//! let summary = aggregator.get_and_reset();
//!
//! let id = StationId::parse("RIDGE01").unwrap();
//! let bytes = PacketEncoder::with_battery(3900).encode_bytes(&summary, &id);
//! let packet = decode(&bytes).unwrap();
//!
//! assert_eq!(packet.station_id(), "RIDGE01");
//! assert!((packet.measurements().temperature - 20.0).abs() < 0.01);
//! ```
//!
//! ## Modules
//!
//! - [`aggregator`]: Windowed statistics
//! - [`protocol`]: Wire packet layout
//! - [`encoder`] / [`decoder`]: Packet codec
//! - [`payload`]: JSON, CSV and line-protocol text for the uplink
//! - [`role`]: Role detection and routing
//! - [`transport`]: Collaborator traits and in-memory links
//! - [`station`]: Polling loop tying it together

// Modules
pub mod aggregator;
pub mod clock;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod payload;
pub mod protocol;
pub mod reading;
pub mod role;
pub mod station;
pub mod transport;

// Re-exports for convenient access
pub use aggregator::{SampleAggregator, NO_DATA_MAX, NO_DATA_MIN};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BatteryState, BatteryThresholds, Location, StationConfig, TimingConfig};
pub use decoder::{decode, DecoderStats, PacketDecoder};
pub use encoder::{Measurements, PacketEncoder, Telemetry};
pub use error::{
    ConfigError, DecodeError, Result, SensorError, StationError, TransportError,
};
pub use payload::StatusReport;
pub use protocol::{PacketMeasurements, WirePacket, PACKET_SIZE, PACKET_TYPE_TELEMETRY};
pub use reading::{DataField, FieldStats, RawSample, WindowSummary};
pub use role::{
    MacAddress, ModeInput, PinLevel, RoleProfile, RoleRouter, StationId, StationRole,
    TransmitPath,
};
pub use station::{RelayOutcome, Station, StationIo, StationStats, TickReport, Transmission};
pub use transport::{
    BatteryMonitor, FixedBattery, HardwareId, LinkMetrics, LossyMeshLink, MemoryMeshLink,
    MemoryUplink, MeshFrame, MeshLink, PublishedMessage, ScriptedSensors, SensorSource, Uplink,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Conversion from lux to solar irradiance in W/m² (daylight approximation)
pub const LUX_TO_WM2: f64 = 0.0079;
