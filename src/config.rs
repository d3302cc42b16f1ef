//! Configuration types for a station
//!
//! Defaults reproduce the firmware timing table. Every value can be
//! overridden with the `with_*` builders and checked with
//! [`StationConfig::validate`].

use crate::error::ConfigError;
use crate::protocol::PACKET_SIZE;
use crate::role::{MacAddress, StationId};
use serde::Serialize;
use std::fmt;

/// Sample sensors every 3 seconds
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 3_000;

/// Hub publishes upstream every 5 minutes
pub const DEFAULT_HUB_TRANSMIT_INTERVAL_MS: u64 = 300_000;

/// Satellites report to the hub every 30 seconds
pub const DEFAULT_SATELLITE_TRANSMIT_INTERVAL_MS: u64 = 30_000;

/// Bench sampling interval
pub const DEFAULT_STANDALONE_SAMPLE_INTERVAL_MS: u64 = 1_000;

/// Bench report interval
pub const DEFAULT_STANDALONE_TRANSMIT_INTERVAL_MS: u64 = 10_000;

/// Aggregation window (same as the hub transmit interval)
pub const DEFAULT_AGGREGATION_WINDOW_MS: u64 = 300_000;

/// Status report every minute
pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 60_000;

/// Largest payload the mesh radio accepts
pub const DEFAULT_MESH_MAX_PAYLOAD: usize = 250;

/// Prefix for uplink topics
pub const DEFAULT_TOPIC_PREFIX: &str = "wxstation/weather";

/// Below this the battery is reported low
pub const DEFAULT_BATTERY_LOW_MV: u16 = 3_300;

/// Below this the battery is reported critical
pub const DEFAULT_BATTERY_CRITICAL_MV: u16 = 3_000;

/// Role-dependent intervals, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingConfig {
    /// Sampling interval for hub and satellite
    pub sample_interval_ms: u64,
    /// Hub uplink interval
    pub hub_transmit_interval_ms: u64,
    /// Satellite mesh interval
    pub satellite_transmit_interval_ms: u64,
    /// Standalone sampling interval
    pub standalone_sample_interval_ms: u64,
    /// Standalone report interval
    pub standalone_transmit_interval_ms: u64,
    /// Status report interval
    pub status_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            hub_transmit_interval_ms: DEFAULT_HUB_TRANSMIT_INTERVAL_MS,
            satellite_transmit_interval_ms: DEFAULT_SATELLITE_TRANSMIT_INTERVAL_MS,
            standalone_sample_interval_ms: DEFAULT_STANDALONE_SAMPLE_INTERVAL_MS,
            standalone_transmit_interval_ms: DEFAULT_STANDALONE_TRANSMIT_INTERVAL_MS,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
        }
    }
}

impl TimingConfig {
    /// Divide every interval by `factor` (at least 1 ms each)
    ///
    /// Used by bench runs that want the full cycle in less time.
    pub fn scaled_down(&self, factor: u64) -> Self {
        let factor = factor.max(1);
        let scale = |ms: u64| (ms / factor).max(1);
        Self {
            sample_interval_ms: scale(self.sample_interval_ms),
            hub_transmit_interval_ms: scale(self.hub_transmit_interval_ms),
            satellite_transmit_interval_ms: scale(self.satellite_transmit_interval_ms),
            standalone_sample_interval_ms: scale(self.standalone_sample_interval_ms),
            standalone_transmit_interval_ms: scale(self.standalone_transmit_interval_ms),
            status_interval_ms: scale(self.status_interval_ms),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("sample_interval_ms", self.sample_interval_ms),
            ("hub_transmit_interval_ms", self.hub_transmit_interval_ms),
            (
                "satellite_transmit_interval_ms",
                self.satellite_transmit_interval_ms,
            ),
            (
                "standalone_sample_interval_ms",
                self.standalone_sample_interval_ms,
            ),
            (
                "standalone_transmit_interval_ms",
                self.standalone_transmit_interval_ms,
            ),
            ("status_interval_ms", self.status_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { name });
            }
        }
        Ok(())
    }
}

/// Battery level classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryState {
    #[default]
    Normal,
    Low,
    Critical,
}

impl BatteryState {
    /// Lower-case name
    pub fn name(&self) -> &'static str {
        match self {
            BatteryState::Normal => "normal",
            BatteryState::Low => "low",
            BatteryState::Critical => "critical",
        }
    }
}

impl fmt::Display for BatteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Battery warning thresholds in millivolts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryThresholds {
    pub low_mv: u16,
    pub critical_mv: u16,
}

impl Default for BatteryThresholds {
    fn default() -> Self {
        Self {
            low_mv: DEFAULT_BATTERY_LOW_MV,
            critical_mv: DEFAULT_BATTERY_CRITICAL_MV,
        }
    }
}

impl BatteryThresholds {
    /// Classify a battery reading; both thresholds are exclusive
    pub fn classify(&self, battery_mv: u16) -> BatteryState {
        if battery_mv < self.critical_mv {
            BatteryState::Critical
        } else if battery_mv < self.low_mv {
            BatteryState::Low
        } else {
            BatteryState::Normal
        }
    }
}

/// Where the station is installed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    /// Degrees north
    pub latitude: f64,
    /// Degrees east
    pub longitude: f64,
    /// Metres above sea level
    pub elevation_m: i32,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, elevation_m: i32) -> Self {
        Self {
            latitude,
            longitude,
            elevation_m,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ConfigError::InvalidLocation {
                reason: "latitude outside -90..=90",
            });
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::InvalidLocation {
                reason: "longitude outside -180..=180",
            });
        }
        Ok(())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6}, {:.6}, {} m",
            self.latitude, self.longitude, self.elevation_m
        )
    }
}

/// Station-level configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StationConfig {
    /// Intervals per role
    pub timing: TimingConfig,
    /// Operator-assigned identifier; derived from the MAC when `None`
    pub station_id: Option<String>,
    /// Uplink topic prefix
    pub topic_prefix: String,
    /// Hub address satellites send to (broadcast by default)
    pub hub_address: MacAddress,
    /// Mesh payload cap in bytes
    pub mesh_max_payload: usize,
    /// Low and critical battery levels
    pub battery: BatteryThresholds,
    /// Installation site, reported in status messages
    pub location: Option<Location>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            station_id: None,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            hub_address: MacAddress::BROADCAST,
            mesh_max_payload: DEFAULT_MESH_MAX_PAYLOAD,
            battery: BatteryThresholds::default(),
            location: None,
        }
    }
}

impl StationConfig {
    /// Create a default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom timing
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set an operator-assigned station id
    pub fn with_station_id(mut self, id: impl Into<String>) -> Self {
        self.station_id = Some(id.into());
        self
    }

    /// Set the uplink topic prefix
    pub fn with_topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into();
        self
    }

    /// Set the hub peer address
    pub fn with_hub_address(mut self, address: MacAddress) -> Self {
        self.hub_address = address;
        self
    }

    /// Set the mesh payload cap
    pub fn with_mesh_max_payload(mut self, bytes: usize) -> Self {
        self.mesh_max_payload = bytes;
        self
    }

    /// Set the battery warning thresholds
    pub fn with_battery_thresholds(mut self, low_mv: u16, critical_mv: u16) -> Self {
        self.battery = BatteryThresholds {
            low_mv,
            critical_mv,
        };
        self
    }

    /// Set the installation site
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Check the configuration for values the station cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;

        if let Some(id) = &self.station_id {
            StationId::parse(id)?;
        }

        if self.mesh_max_payload < PACKET_SIZE {
            return Err(ConfigError::MeshLimitTooSmall {
                limit: self.mesh_max_payload,
                packet: PACKET_SIZE,
            });
        }

        if self.battery.critical_mv > self.battery.low_mv {
            return Err(ConfigError::BatteryThresholds {
                low_mv: self.battery.low_mv,
                critical_mv: self.battery.critical_mv,
            });
        }

        if let Some(location) = &self.location {
            location.validate()?;
        }

        Ok(())
    }
}
