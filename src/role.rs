//! Station role detection and routing
//!
//! The role is read once at boot from a single discrete input and turned into
//! a [`RoleProfile`]: the sampling and transmit cadence plus the transport the
//! station loop must use. Nothing downstream branches on [`StationRole`]
//! directly.

use crate::config::{StationConfig, TimingConfig};
use crate::error::ConfigError;
use crate::protocol::STATION_ID_FIELD_LEN;
use crate::transport::HardwareId;
use log::info;
use std::fmt;

/// Longest accepted station id
pub const MAX_STATION_ID_LEN: usize = 16;

/// Six-byte hardware network address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// All-ones broadcast address
    pub const BROADCAST: MacAddress = MacAddress([0xff; 6]);

    /// Wrap raw bytes
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// True for the broadcast address
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Station identifier, immutable after startup
///
/// Carries two forms: the full id used in uplink topics and textual
/// payloads, and the short form that fits the 9-byte mesh field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StationId {
    full: String,
    short: String,
}

impl StationId {
    /// Validate an operator-assigned id
    ///
    /// Accepts 1 to 16 printable ASCII characters without whitespace. Ids
    /// longer than the mesh field are cut to their first 9 bytes on the wire.
    pub fn parse(id: &str) -> Result<Self, ConfigError> {
        let reject = |reason| ConfigError::InvalidStationId {
            id: id.to_string(),
            reason,
        };

        if id.is_empty() {
            return Err(reject("empty"));
        }
        if id.len() > MAX_STATION_ID_LEN {
            return Err(reject("longer than 16 characters"));
        }
        if !id.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(reject("must be printable ASCII without spaces"));
        }
        if id.contains('/') || id.contains('+') || id.contains('#') {
            return Err(reject("contains a topic separator or wildcard"));
        }

        let short_len = id.len().min(STATION_ID_FIELD_LEN);
        Ok(Self {
            full: id.to_string(),
            short: id[..short_len].to_string(),
        })
    }

    /// Default id derived from the hardware address
    ///
    /// The full form is `WX` followed by bytes 2..6 in upper-case hex; the
    /// mesh form drops the `WX` prefix.
    pub fn from_mac(mac: &MacAddress) -> Self {
        let b = mac.0;
        let hex = format!("{:02X}{:02X}{:02X}{:02X}", b[2], b[3], b[4], b[5]);
        Self {
            full: format!("WX{}", hex),
            short: hex,
        }
    }

    /// Full id
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Id as carried in mesh packets
    pub fn short(&self) -> &str {
        &self.short
    }

    /// Null-padded mesh field
    pub fn wire_bytes(&self) -> [u8; STATION_ID_FIELD_LEN] {
        let mut field = [0u8; STATION_ID_FIELD_LEN];
        let bytes = self.short.as_bytes();
        field[..bytes.len()].copy_from_slice(bytes);
        field
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

/// Logic level of the role-select input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinLevel {
    /// Jumper installed
    Low,
    /// Pulled up, no jumper
    High,
}

/// Source of the role-select level
pub trait ModeInput {
    /// Level of the input at boot
    fn read_level(&self) -> PinLevel;
}

impl ModeInput for PinLevel {
    fn read_level(&self) -> PinLevel {
        *self
    }
}

/// Operational role of a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationRole {
    /// Publishes upstream and relays mesh traffic
    Hub,
    /// Reports to the hub over the mesh
    Satellite,
    /// Bench mode, local output only
    Standalone,
}

impl StationRole {
    /// Role for a boot-time input level
    ///
    /// Never yields [`StationRole::Standalone`].
    pub fn from_level(level: PinLevel) -> Self {
        match level {
            PinLevel::Low => StationRole::Hub,
            PinLevel::High => StationRole::Satellite,
        }
    }

    /// Lower-case name
    pub fn name(&self) -> &'static str {
        match self {
            StationRole::Hub => "hub",
            StationRole::Satellite => "satellite",
            StationRole::Standalone => "standalone",
        }
    }
}

impl fmt::Display for StationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transport used for a station's own reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransmitPath {
    /// Textual payload over the uplink
    Uplink,
    /// Binary packet over the mesh
    Mesh,
    /// Printed locally, nothing sent
    LocalOnly,
}

/// Behaviour fixed by the role, computed once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleProfile {
    pub role: StationRole,
    pub sample_interval_ms: u64,
    pub transmit_interval_ms: u64,
    pub transmit_path: TransmitPath,
    pub relays_mesh: bool,
}

impl RoleProfile {
    /// Profile for `role` under `timing`
    pub fn for_role(role: StationRole, timing: &TimingConfig) -> Self {
        match role {
            StationRole::Hub => Self {
                role,
                sample_interval_ms: timing.sample_interval_ms,
                transmit_interval_ms: timing.hub_transmit_interval_ms,
                transmit_path: TransmitPath::Uplink,
                relays_mesh: true,
            },
            StationRole::Satellite => Self {
                role,
                sample_interval_ms: timing.sample_interval_ms,
                transmit_interval_ms: timing.satellite_transmit_interval_ms,
                transmit_path: TransmitPath::Mesh,
                relays_mesh: false,
            },
            StationRole::Standalone => Self {
                role,
                sample_interval_ms: timing.standalone_sample_interval_ms,
                transmit_interval_ms: timing.standalone_transmit_interval_ms,
                transmit_path: TransmitPath::LocalOnly,
                relays_mesh: false,
            },
        }
    }

    /// True when the station publishes over the uplink
    pub fn uses_uplink(&self) -> bool {
        self.transmit_path == TransmitPath::Uplink
    }

    /// True when the mesh radio is brought up (to send or to receive)
    pub fn uses_mesh(&self) -> bool {
        self.transmit_path == TransmitPath::Mesh || self.relays_mesh
    }

    /// True when mesh packets received are forwarded upstream
    pub fn should_relay(&self) -> bool {
        self.relays_mesh
    }
}

/// Boot-time role decision and station identity
#[derive(Debug, Clone)]
pub struct RoleRouter {
    profile: RoleProfile,
    station_id: StationId,
    mac: MacAddress,
    timing: TimingConfig,
}

impl RoleRouter {
    /// Read the role input once and fix the profile
    pub fn detect(
        input: &dyn ModeInput,
        hardware: &dyn HardwareId,
        config: &StationConfig,
    ) -> Result<Self, ConfigError> {
        let level = input.read_level();
        let role = StationRole::from_level(level);
        let router = Self::with_role(role, hardware.mac_address(), config)?;
        info!(
            "Role input {:?}: running as {} with station id {}",
            level,
            role,
            router.station_id()
        );
        Ok(router)
    }

    /// Router for an explicit role
    pub fn with_role(
        role: StationRole,
        mac: MacAddress,
        config: &StationConfig,
    ) -> Result<Self, ConfigError> {
        let station_id = match &config.station_id {
            Some(id) => StationId::parse(id)?,
            None => StationId::from_mac(&mac),
        };
        Ok(Self {
            profile: RoleProfile::for_role(role, &config.timing),
            station_id,
            mac,
            timing: config.timing.clone(),
        })
    }

    /// Force a role, for bench and test setups
    pub fn override_role(&mut self, role: StationRole) {
        if role != self.profile.role {
            info!("Role overridden: {} -> {}", self.profile.role, role);
        }
        self.profile = RoleProfile::for_role(role, &self.timing);
    }

    /// Replace the station id
    pub fn set_station_id(&mut self, id: &str) -> Result<(), ConfigError> {
        self.station_id = StationId::parse(id)?;
        Ok(())
    }

    /// Current role
    pub fn role(&self) -> StationRole {
        self.profile.role
    }

    /// Behaviour profile
    pub fn profile(&self) -> &RoleProfile {
        &self.profile
    }

    /// Station id in use
    pub fn station_id(&self) -> &StationId {
        &self.station_id
    }

    /// Timing the profile was computed from
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Hardware address the router was built with
    pub fn mac_address(&self) -> MacAddress {
        self.mac
    }

    pub fn uses_uplink(&self) -> bool {
        self.profile.uses_uplink()
    }

    pub fn uses_mesh(&self) -> bool {
        self.profile.uses_mesh()
    }

    pub fn should_relay(&self) -> bool {
        self.profile.should_relay()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedMac(MacAddress);

    impl HardwareId for FixedMac {
        fn mac_address(&self) -> MacAddress {
            self.0
        }
    }

    const MAC: MacAddress = MacAddress::new([0x24, 0x6f, 0x1a, 0x2b, 0x3c, 0x4d]);

    #[test]
    fn test_level_to_role() {
        assert_eq!(StationRole::from_level(PinLevel::Low), StationRole::Hub);
        assert_eq!(
            StationRole::from_level(PinLevel::High),
            StationRole::Satellite
        );
    }

    #[test]
    fn test_detection_is_deterministic() {
        let config = StationConfig::default();
        for level in [PinLevel::Low, PinLevel::High] {
            let a = RoleRouter::detect(&level, &FixedMac(MAC), &config).unwrap();
            let b = RoleRouter::detect(&level, &FixedMac(MAC), &config).unwrap();
            assert_eq!(a.profile(), b.profile());
            assert_eq!(a.station_id(), b.station_id());
        }
    }

    #[test]
    fn test_role_table() {
        let timing = TimingConfig::default();

        let hub = RoleProfile::for_role(StationRole::Hub, &timing);
        assert_eq!(hub.sample_interval_ms, 3_000);
        assert_eq!(hub.transmit_interval_ms, 300_000);
        assert!(hub.uses_uplink());
        assert!(hub.uses_mesh());
        assert!(hub.should_relay());

        let sat = RoleProfile::for_role(StationRole::Satellite, &timing);
        assert_eq!(sat.sample_interval_ms, 3_000);
        assert_eq!(sat.transmit_interval_ms, 30_000);
        assert!(!sat.uses_uplink());
        assert!(sat.uses_mesh());
        assert!(!sat.should_relay());

        let bench = RoleProfile::for_role(StationRole::Standalone, &timing);
        assert_eq!(bench.sample_interval_ms, 1_000);
        assert_eq!(bench.transmit_interval_ms, 10_000);
        assert!(!bench.uses_uplink());
        assert!(!bench.uses_mesh());
        assert!(!bench.should_relay());
        assert_eq!(bench.transmit_path, TransmitPath::LocalOnly);
    }

    #[test]
    fn test_override_reaches_standalone() {
        let config = StationConfig::default();
        let mut router = RoleRouter::detect(&PinLevel::High, &FixedMac(MAC), &config).unwrap();
        assert_eq!(router.role(), StationRole::Satellite);

        router.override_role(StationRole::Standalone);
        assert_eq!(router.role(), StationRole::Standalone);
        assert_eq!(router.profile().sample_interval_ms, 1_000);
        assert!(!router.uses_mesh());
    }

    #[test]
    fn test_default_id_from_mac() {
        let id = StationId::from_mac(&MAC);
        assert_eq!(id.as_str(), "WX1A2B3C4D");
        assert_eq!(id.short(), "1A2B3C4D");
        assert_eq!(id.wire_bytes(), *b"1A2B3C4D\0");
    }

    #[test]
    fn test_configured_id_wins() {
        let config = StationConfig::new().with_station_id("RIDGE-NORTH");
        let router = RoleRouter::detect(&PinLevel::Low, &FixedMac(MAC), &config).unwrap();
        assert_eq!(router.station_id().as_str(), "RIDGE-NORTH");
        assert_eq!(router.station_id().short(), "RIDGE-NOR");
        assert_eq!(router.station_id().wire_bytes(), *b"RIDGE-NOR");
    }

    #[test]
    fn test_station_id_validation() {
        assert!(StationId::parse("").is_err());
        assert!(StationId::parse("has space").is_err());
        assert!(StationId::parse("a/b").is_err());
        assert!(StationId::parse("ÄBC").is_err());
        assert!(StationId::parse("ABCDEFGHIJKLMNOPQ").is_err());
        assert!(StationId::parse("ABCDEFGHIJKLMNOP").is_ok());

        let short = StationId::parse("S1").unwrap();
        assert_eq!(short.wire_bytes(), *b"S1\0\0\0\0\0\0\0");
    }

    #[test]
    fn test_set_station_id() {
        let mut router =
            RoleRouter::with_role(StationRole::Hub, MAC, &StationConfig::default()).unwrap();
        router.set_station_id("FIELD-07").unwrap();
        assert_eq!(router.station_id().as_str(), "FIELD-07");
        assert!(router.set_station_id("bad id").is_err());
        assert_eq!(router.station_id().as_str(), "FIELD-07");
    }

    #[test]
    fn test_mac_display() {
        assert_eq!(MAC.to_string(), "24:6F:1A:2B:3C:4D");
        assert!(MacAddress::BROADCAST.is_broadcast());
        assert!(!MAC.is_broadcast());
    }
}
