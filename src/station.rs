// WXStation - Remote weather station telemetry core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Polling station loop
//!
//! [`Station`] owns the aggregator and drives it from a single cooperative
//! loop: every [`Station::tick`] compares elapsed time against the role's
//! intervals and calls the collaborators synchronously. The hub's receive
//! path is [`Station::handle_mesh_packet`], called by whoever owns the radio
//! with the station passed explicitly.

use crate::aggregator::SampleAggregator;
use crate::clock::Clock;
use crate::config::{BatteryState, StationConfig};
use crate::decoder::{DecoderStats, PacketDecoder};
use crate::encoder::PacketEncoder;
use crate::error::{ConfigError, Result, StationError};
use crate::payload::{self, StatusReport};
use crate::reading::WindowSummary;
use crate::role::{MacAddress, RoleRouter, StationId, TransmitPath};
use crate::transport::{BatteryMonitor, MeshLink, SensorSource, Uplink};
use log::{debug, info, warn};
use serde::Serialize;

/// Collaborators borrowed for one tick
pub struct StationIo<'a> {
    pub sensors: &'a mut dyn SensorSource,
    pub mesh: &'a mut dyn MeshLink,
    pub uplink: &'a mut dyn Uplink,
    pub battery: &'a mut dyn BatteryMonitor,
}

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StationStats {
    /// Readings handed to the aggregator (valid or not)
    pub samples: u64,
    /// Readings flagged invalid by the sensors
    pub invalid_samples: u64,
    /// Sensor reads that failed outright
    pub sensor_errors: u64,
    /// Reports handed to a transport successfully
    pub transmissions: u64,
    /// Transmit ticks with an empty window
    pub empty_windows: u64,
    /// Reports the transport refused
    pub send_failures: u64,
    /// Mesh packets forwarded upstream
    pub relayed: u64,
    /// Mesh packets dropped by the decoder
    pub rejected: u64,
    /// Status reports emitted
    pub status_reports: u64,
}

/// What a transmit tick did with the closed window
#[derive(Debug, Clone, PartialEq)]
pub enum Transmission {
    /// Packet sent to a mesh peer
    Mesh { dest: MacAddress, bytes: usize },
    /// JSON published on the uplink
    Uplink { topic: String },
    /// Summary logged locally
    Local,
    /// Window had no valid samples; nothing sent
    SkippedEmpty,
    /// Transport or payload failure; the window is gone
    Failed(StationError),
}

/// Outcome of one [`Station::tick`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// A sensor read was attempted
    pub sampled: bool,
    /// Set when the transmit interval elapsed
    pub transmission: Option<Transmission>,
    /// Set when a status report was emitted
    pub status: Option<StatusReport>,
}

/// Outcome of [`Station::handle_mesh_packet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Forwarded on `topic`
    Relayed { topic: String },
    /// This role does not relay
    NotRelaying,
}

/// One station: role, aggregation and transmit scheduling
#[derive(Debug)]
pub struct Station<C: Clock + Clone> {
    router: RoleRouter,
    config: StationConfig,
    clock: C,
    aggregator: SampleAggregator<C>,
    encoder: PacketEncoder,
    decoder: PacketDecoder,
    last_sample_ms: Option<u64>,
    last_transmit_ms: u64,
    last_status_ms: u64,
    stats: StationStats,
}

impl<C: Clock + Clone> Station<C> {
    /// Build a station around a fixed role
    ///
    /// `router` must have been built from `config`: same timing and, when
    /// configured, the same station id.
    pub fn new(router: RoleRouter, config: StationConfig, clock: C) -> Result<Self> {
        config.validate()?;
        if router.timing() != &config.timing {
            return Err(ConfigError::RouterMismatch { field: "timing" }.into());
        }
        if let Some(id) = &config.station_id {
            if router.station_id().as_str() != id {
                return Err(ConfigError::RouterMismatch { field: "station_id" }.into());
            }
        }

        let profile = *router.profile();
        let now = clock.now_ms();
        info!(
            "Station {} starting as {}: sample every {} ms, transmit every {} ms",
            router.station_id(),
            profile.role,
            profile.sample_interval_ms,
            profile.transmit_interval_ms
        );
        if let Some(location) = &config.location {
            info!("Station {} located at {}", router.station_id(), location);
        }

        Ok(Self {
            aggregator: SampleAggregator::with_window(clock.clone(), profile.transmit_interval_ms),
            router,
            config,
            clock,
            encoder: PacketEncoder::new(),
            decoder: PacketDecoder::new(),
            last_sample_ms: None,
            last_transmit_ms: now,
            last_status_ms: now,
            stats: StationStats::default(),
        })
    }

    /// Run one pass of the loop
    pub fn tick(&mut self, io: &mut StationIo<'_>) -> TickReport {
        let now = self.clock.now_ms();
        let profile = *self.router.profile();
        let mut report = TickReport::default();

        let sample_due = match self.last_sample_ms {
            None => true,
            Some(last) => now.saturating_sub(last) >= profile.sample_interval_ms,
        };
        if sample_due {
            self.last_sample_ms = Some(now);
            report.sampled = true;
            self.sample(io.sensors, now);
        }

        if now.saturating_sub(self.last_transmit_ms) >= profile.transmit_interval_ms {
            self.last_transmit_ms = now;
            report.transmission = Some(self.transmit(io));
        }

        if now.saturating_sub(self.last_status_ms) >= self.config.timing.status_interval_ms {
            self.last_status_ms = now;
            report.status = Some(self.report_status(io, now));
        }

        report
    }

    fn sample(&mut self, sensors: &mut dyn SensorSource, now: u64) {
        match sensors.read_all(now) {
            Ok(sample) => {
                self.stats.samples += 1;
                if !sample.is_valid {
                    self.stats.invalid_samples += 1;
                    debug!("Invalid reading at {} ms", now);
                }
                self.aggregator.add_sample(&sample);
            }
            Err(err) => {
                self.stats.sensor_errors += 1;
                warn!("Sensor read failed at {} ms: {}", now, err);
            }
        }
    }

    fn transmit(&mut self, io: &mut StationIo<'_>) -> Transmission {
        let summary = self.aggregator.get_and_reset();
        if summary.is_empty() {
            self.stats.empty_windows += 1;
            debug!("Window closed with no valid samples, nothing sent");
            return Transmission::SkippedEmpty;
        }

        let outcome = match self.router.profile().transmit_path {
            TransmitPath::Mesh => self.send_mesh(&summary, io),
            TransmitPath::Uplink => self.send_uplink(&summary, io.uplink),
            TransmitPath::LocalOnly => {
                info!("Window summary for {}:\n{}", self.router.station_id(), summary);
                Ok(Transmission::Local)
            }
        };

        match outcome {
            Ok(transmission) => {
                self.stats.transmissions += 1;
                transmission
            }
            Err(err) => {
                self.stats.send_failures += 1;
                warn!("Transmission failed: {}", err);
                Transmission::Failed(err)
            }
        }
    }

    fn send_mesh(
        &mut self,
        summary: &WindowSummary,
        io: &mut StationIo<'_>,
    ) -> Result<Transmission> {
        self.encoder.set_battery_mv(io.battery.battery_millivolts());
        let bytes = self
            .encoder
            .encode_bytes(summary, self.router.station_id());
        let dest = self.config.hub_address;

        io.mesh.send_bytes(&dest, &bytes)?;
        info!(
            "Sent {} samples to {} over mesh ({} bytes)",
            summary.sample_count,
            dest,
            bytes.len()
        );
        Ok(Transmission::Mesh {
            dest,
            bytes: bytes.len(),
        })
    }

    fn send_uplink(
        &mut self,
        summary: &WindowSummary,
        uplink: &mut dyn Uplink,
    ) -> Result<Transmission> {
        let id = self.router.station_id().as_str();
        let json = payload::summary_json(id, summary)?;
        let topic = payload::weather_topic(&self.config.topic_prefix, id);

        uplink.publish(&topic, &json)?;
        info!("Published {} samples on {}", summary.sample_count, topic);
        Ok(Transmission::Uplink { topic })
    }

    fn report_status(&mut self, io: &mut StationIo<'_>, now: u64) -> StatusReport {
        let battery_mv = io.battery.battery_millivolts();
        let battery_state = self.config.battery.classify(battery_mv);
        match battery_state {
            BatteryState::Normal => {}
            BatteryState::Low => warn!("Low battery: {} mV", battery_mv),
            BatteryState::Critical => warn!("Critical battery: {} mV", battery_mv),
        }

        let report = StatusReport {
            station_id: self.router.station_id().to_string(),
            role: self.router.role().name().to_string(),
            timestamp: now,
            battery_mv,
            battery_state,
            location: self.config.location,
            window_samples: self.aggregator.sample_count(),
            samples: self.stats.samples,
            sensor_errors: self.stats.sensor_errors,
            transmissions: self.stats.transmissions,
            send_failures: self.stats.send_failures,
            relayed: self.stats.relayed,
            rejected: self.stats.rejected,
        };
        self.stats.status_reports += 1;

        if self.router.uses_uplink() {
            let topic = payload::status_topic(&self.config.topic_prefix, &report.station_id);
            let published = payload::status_json(&report)
                .and_then(|json| uplink_publish(io.uplink, &topic, &json));
            if let Err(err) = published {
                warn!("Status publish failed: {}", err);
            }
        } else {
            debug!(
                "Status: battery {} mV, {} samples in window",
                report.battery_mv, report.window_samples
            );
        }

        report
    }

    /// Hub receive path for one mesh frame
    ///
    /// Packets failing the length or checksum check, or carrying a station
    /// id that cannot appear in a topic, are rejected whole and counted;
    /// nothing of them is forwarded.
    pub fn handle_mesh_packet(
        &mut self,
        src: &MacAddress,
        bytes: &[u8],
        uplink: &mut dyn Uplink,
    ) -> Result<RelayOutcome> {
        if !self.router.should_relay() {
            debug!("Ignoring {}-byte mesh frame from {}", bytes.len(), src);
            return Ok(RelayOutcome::NotRelaying);
        }

        let packet = match self.decoder.decode(bytes) {
            Ok(packet) => packet,
            Err(err) => {
                self.stats.rejected += 1;
                return Err(err.into());
            }
        };

        let measurements = packet.measurements();
        if let Err(err) = StationId::parse(&measurements.station_id) {
            self.stats.rejected += 1;
            warn!("Rejected mesh packet from {}: {}", src, err);
            return Err(err.into());
        }
        let json = payload::relay_json(&measurements, self.router.station_id().as_str())?;
        let topic = payload::weather_topic(&self.config.topic_prefix, &measurements.station_id);

        if let Err(err) = uplink.publish(&topic, &json) {
            self.stats.send_failures += 1;
            return Err(err.into());
        }

        self.stats.relayed += 1;
        info!("Relayed {} from {} to {}", measurements.station_id, src, topic);
        Ok(RelayOutcome::Relayed { topic })
    }

    /// Role and identity
    pub fn router(&self) -> &RoleRouter {
        &self.router
    }

    /// Station id in use
    pub fn station_id(&self) -> &StationId {
        self.router.station_id()
    }

    /// Live aggregation state
    pub fn aggregator(&self) -> &SampleAggregator<C> {
        &self.aggregator
    }

    /// Running counters
    pub fn stats(&self) -> StationStats {
        self.stats
    }

    /// Decoder counters for the receive path
    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Configuration in use
    pub fn config(&self) -> &StationConfig {
        &self.config
    }
}

fn uplink_publish(uplink: &mut dyn Uplink, topic: &str, payload: &str) -> Result<()> {
    uplink.publish(topic, payload).map_err(StationError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::TimingConfig;
    use crate::error::{DecodeError, SensorError};
    use crate::reading::RawSample;
    use crate::role::StationRole;
    use crate::transport::{FixedBattery, MemoryMeshLink, MemoryUplink, ScriptedSensors};

    const HUB_MAC: MacAddress = MacAddress::new([0x24, 0x6f, 0x28, 0x00, 0x00, 0x01]);
    const SAT_MAC: MacAddress = MacAddress::new([0x24, 0x6f, 0x28, 0xaa, 0xbb, 0xcc]);

    struct Rig {
        sensors: ScriptedSensors,
        mesh: MemoryMeshLink,
        uplink: MemoryUplink,
        battery: FixedBattery,
    }

    impl Rig {
        fn new(samples: usize) -> Self {
            let sample = RawSample::new(0)
                .with_climate(20.0, 50.0, 1013.0)
                .with_wind(2.0, 90);
            Self {
                sensors: ScriptedSensors::new(vec![sample; samples]),
                mesh: MemoryMeshLink::new(),
                uplink: MemoryUplink::new(),
                battery: FixedBattery(3900),
            }
        }

        fn io(&mut self) -> StationIo<'_> {
            StationIo {
                sensors: &mut self.sensors,
                mesh: &mut self.mesh,
                uplink: &mut self.uplink,
                battery: &mut self.battery,
            }
        }
    }

    fn station(role: StationRole, mac: MacAddress, clock: &ManualClock) -> Station<ManualClock> {
        let config = StationConfig::new().with_hub_address(HUB_MAC);
        let router = RoleRouter::with_role(role, mac, &config).unwrap();
        Station::new(router, config, clock.clone()).unwrap()
    }

    #[test]
    fn test_first_tick_samples_immediately() {
        let clock = ManualClock::new(0);
        let mut sat = station(StationRole::Satellite, SAT_MAC, &clock);
        let mut rig = Rig::new(10);

        let report = sat.tick(&mut rig.io());
        assert!(report.sampled);
        assert!(report.transmission.is_none());
        assert_eq!(sat.aggregator().sample_count(), 1);

        // not due again until the interval elapses
        clock.advance(2_999);
        assert!(!sat.tick(&mut rig.io()).sampled);
        clock.advance(1);
        assert!(sat.tick(&mut rig.io()).sampled);
    }

    #[test]
    fn test_satellite_sends_packet_to_hub() {
        let clock = ManualClock::new(0);
        let mut sat = station(StationRole::Satellite, SAT_MAC, &clock);
        let mut rig = Rig::new(20);

        for _ in 0..10 {
            sat.tick(&mut rig.io());
            clock.advance(3_000);
        }
        let report = sat.tick(&mut rig.io());

        assert_eq!(
            report.transmission,
            Some(Transmission::Mesh {
                dest: HUB_MAC,
                bytes: 40
            })
        );
        let frame = rig.mesh.pop_outgoing().unwrap();
        assert_eq!(frame.dest, HUB_MAC);

        let packet = crate::decoder::decode(&frame.bytes).unwrap();
        assert_eq!(packet.station_id(), "28AABBCC");
        assert_eq!(packet.temperature, 2000);
        assert_eq!(packet.battery_mv, 3900);
        assert!(packet.is_valid());
        assert_eq!(sat.stats().transmissions, 1);
        assert_eq!(sat.aggregator().sample_count(), 0);
    }

    #[test]
    fn test_hub_publishes_summary() {
        let clock = ManualClock::new(0);
        let mut hub = station(StationRole::Hub, HUB_MAC, &clock);
        let mut rig = Rig::new(200);

        while clock.now_ms() < 300_000 {
            hub.tick(&mut rig.io());
            clock.advance(3_000);
        }
        let report = hub.tick(&mut rig.io());

        let topic = "wxstation/weather/WX28000001/weather".to_string();
        assert_eq!(
            report.transmission,
            Some(Transmission::Uplink {
                topic: topic.clone()
            })
        );
        let published: Vec<_> = rig.uplink.on_topic(&topic).collect();
        assert_eq!(published.len(), 1);
        let v: serde_json::Value = serde_json::from_str(&published[0].payload).unwrap();
        assert_eq!(v["station_id"], "WX28000001");
        assert_eq!(v["data"]["temperature"]["value"], 20.0);
        assert!(rig.mesh.pending_outgoing() == 0);
    }

    #[test]
    fn test_empty_window_not_transmitted() {
        let clock = ManualClock::new(0);
        let mut sat = station(StationRole::Satellite, SAT_MAC, &clock);
        let mut rig = Rig::new(0);

        clock.advance(30_000);
        let report = sat.tick(&mut rig.io());
        assert_eq!(report.transmission, Some(Transmission::SkippedEmpty));
        assert_eq!(rig.mesh.pending_outgoing(), 0);
        assert_eq!(sat.stats().sensor_errors, 1);
        assert_eq!(sat.stats().empty_windows, 1);
    }

    #[test]
    fn test_invalid_readings_excluded() {
        let clock = ManualClock::new(0);
        let mut sat = station(StationRole::Satellite, SAT_MAC, &clock);
        let mut rig = Rig::new(0);
        rig.sensors.push(Ok(RawSample::invalid(0)));
        rig.sensors.push(Err(SensorError::NotInitialised));

        sat.tick(&mut rig.io());
        clock.advance(3_000);
        sat.tick(&mut rig.io());

        let stats = sat.stats();
        assert_eq!(stats.samples, 1);
        assert_eq!(stats.invalid_samples, 1);
        assert_eq!(stats.sensor_errors, 1);
        assert_eq!(sat.aggregator().sample_count(), 0);
    }

    #[test]
    fn test_send_failure_reported() {
        let clock = ManualClock::new(0);
        let mut sat = station(StationRole::Satellite, SAT_MAC, &clock);
        let mut rig = Rig::new(20);
        rig.mesh.close();

        sat.tick(&mut rig.io());
        clock.advance(30_000);
        let report = sat.tick(&mut rig.io());

        assert!(matches!(
            report.transmission,
            Some(Transmission::Failed(StationError::Transport(_)))
        ));
        assert_eq!(sat.stats().send_failures, 1);
    }

    #[test]
    fn test_standalone_logs_locally() {
        let clock = ManualClock::new(0);
        let mut bench = station(StationRole::Standalone, SAT_MAC, &clock);
        let mut rig = Rig::new(20);

        for _ in 0..10 {
            bench.tick(&mut rig.io());
            clock.advance(1_000);
        }
        let report = bench.tick(&mut rig.io());
        assert_eq!(report.transmission, Some(Transmission::Local));
        assert_eq!(rig.mesh.pending_outgoing(), 0);
        assert!(rig.uplink.published().is_empty());
    }

    #[test]
    fn test_hub_relays_mesh_packet() {
        let clock = ManualClock::new(0);
        let mut hub = station(StationRole::Hub, HUB_MAC, &clock);
        let mut uplink = MemoryUplink::new();

        let id = StationId::from_mac(&SAT_MAC);
        let sample = RawSample::new(1000).with_climate(15.5, 70.0, 995.0);
        let bytes = PacketEncoder::with_battery(3700).encode_bytes(&sample, &id);

        let outcome = hub.handle_mesh_packet(&SAT_MAC, &bytes, &mut uplink).unwrap();
        assert_eq!(
            outcome,
            RelayOutcome::Relayed {
                topic: "wxstation/weather/28AABBCC/weather".to_string()
            }
        );

        let v: serde_json::Value = serde_json::from_str(&uplink.published()[0].payload).unwrap();
        assert_eq!(v["station_id"], "28AABBCC");
        assert_eq!(v["temperature"], 15.5);
        assert_eq!(v["relayed_by"], "WX28000001");
        assert_eq!(hub.stats().relayed, 1);
    }

    #[test]
    fn test_hub_rejects_bad_packets() {
        let clock = ManualClock::new(0);
        let mut hub = station(StationRole::Hub, HUB_MAC, &clock);
        let mut uplink = MemoryUplink::new();

        let id = StationId::from_mac(&SAT_MAC);
        let mut bytes = PacketEncoder::new().encode_bytes(&RawSample::new(0), &id);
        bytes[16] ^= 0x04;

        let err = hub.handle_mesh_packet(&SAT_MAC, &bytes, &mut uplink).unwrap_err();
        assert!(matches!(
            err,
            StationError::Decode(DecodeError::ChecksumMismatch { .. })
        ));
        let err = hub.handle_mesh_packet(&SAT_MAC, &bytes[..12], &mut uplink).unwrap_err();
        assert!(matches!(
            err,
            StationError::Decode(DecodeError::WrongLength { .. })
        ));

        assert!(uplink.published().is_empty());
        assert_eq!(hub.stats().rejected, 2);
        assert_eq!(hub.decoder_stats().corrupted, 1);
        assert_eq!(hub.decoder_stats().malformed, 1);
    }

    fn forged_packet(id: &[u8]) -> [u8; crate::protocol::PACKET_SIZE] {
        let sample = RawSample::new(0).with_climate(10.0, 50.0, 1000.0);
        let id_field = StationId::from_mac(&SAT_MAC);
        let mut bytes = PacketEncoder::new().encode_bytes(&sample, &id_field);
        bytes[1..10].fill(0);
        bytes[1..1 + id.len()].copy_from_slice(id);
        bytes[39] = crate::protocol::xor_checksum(&bytes[..39]);
        bytes
    }

    #[test]
    fn test_hub_rejects_unpublishable_ids() {
        let clock = ManualClock::new(0);
        let mut hub = station(StationRole::Hub, HUB_MAC, &clock);
        let mut uplink = MemoryUplink::new();

        let ids: [&[u8]; 5] = [b"x/#", b"", b"a+b", b"sp ace", &[0xc3, 0x84]];
        for id in ids {
            let bytes = forged_packet(id);
            let err = hub.handle_mesh_packet(&SAT_MAC, &bytes, &mut uplink).unwrap_err();
            assert!(matches!(
                err,
                StationError::Config(ConfigError::InvalidStationId { .. })
            ));
        }

        assert!(uplink.published().is_empty());
        assert_eq!(hub.stats().rejected, 5);
        assert_eq!(hub.stats().relayed, 0);

        let outcome = hub
            .handle_mesh_packet(&SAT_MAC, &forged_packet(b"RIDGE-1"), &mut uplink)
            .unwrap();
        assert_eq!(
            outcome,
            RelayOutcome::Relayed {
                topic: "wxstation/weather/RIDGE-1/weather".to_string()
            }
        );
    }

    #[test]
    fn test_satellite_does_not_relay() {
        let clock = ManualClock::new(0);
        let mut sat = station(StationRole::Satellite, SAT_MAC, &clock);
        let mut uplink = MemoryUplink::new();
        let outcome = sat.handle_mesh_packet(&HUB_MAC, &[0u8; 40], &mut uplink).unwrap();
        assert_eq!(outcome, RelayOutcome::NotRelaying);
        assert!(uplink.published().is_empty());
    }

    #[test]
    fn test_hub_status_report() {
        let clock = ManualClock::new(0);
        let mut hub = station(StationRole::Hub, HUB_MAC, &clock);
        let mut rig = Rig::new(100);

        hub.tick(&mut rig.io());
        clock.advance(60_000);
        let report = hub.tick(&mut rig.io());

        let status = report.status.unwrap();
        assert_eq!(status.role, "hub");
        assert_eq!(status.battery_mv, 3900);
        assert_eq!(status.window_samples, 2);
        assert_eq!(
            rig.uplink
                .on_topic("wxstation/weather/WX28000001/status")
                .count(),
            1
        );
    }

    #[test]
    fn test_status_flags_low_battery() {
        let clock = ManualClock::new(0);
        let config = StationConfig::new()
            .with_hub_address(HUB_MAC)
            .with_location(crate::config::Location::new(47.37, 8.54, 408));
        let router = RoleRouter::with_role(StationRole::Hub, HUB_MAC, &config).unwrap();
        let mut hub = Station::new(router, config, clock.clone()).unwrap();
        let mut rig = Rig::new(100);

        rig.battery = FixedBattery(3_200);
        clock.advance(60_000);
        let status = hub.tick(&mut rig.io()).status.unwrap();
        assert_eq!(status.battery_state, BatteryState::Low);
        assert_eq!(status.location.map(|l| l.elevation_m), Some(408));

        rig.battery = FixedBattery(2_900);
        clock.advance(60_000);
        let status = hub.tick(&mut rig.io()).status.unwrap();
        assert_eq!(status.battery_state, BatteryState::Critical);

        let published: Vec<_> = rig
            .uplink
            .on_topic("wxstation/weather/WX28000001/status")
            .collect();
        let v: serde_json::Value = serde_json::from_str(&published[1].payload).unwrap();
        assert_eq!(v["battery_state"], "critical");
        assert_eq!(v["location"]["latitude"], 47.37);
    }

    #[test]
    fn test_router_must_match_config() {
        let clock = ManualClock::new(0);
        let fast = TimingConfig::default().scaled_down(10);
        let router_config = StationConfig::new().with_timing(fast);
        let router = RoleRouter::with_role(StationRole::Hub, HUB_MAC, &router_config).unwrap();
        assert_eq!(
            Station::new(router, StationConfig::new(), clock.clone()).unwrap_err(),
            StationError::Config(ConfigError::RouterMismatch { field: "timing" })
        );

        let config = StationConfig::new();
        let router = RoleRouter::with_role(StationRole::Hub, HUB_MAC, &config).unwrap();
        let config = config.with_station_id("OTHER");
        assert_eq!(
            Station::new(router, config, clock).unwrap_err(),
            StationError::Config(ConfigError::RouterMismatch {
                field: "station_id"
            })
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let clock = ManualClock::new(0);
        let timing = TimingConfig {
            sample_interval_ms: 0,
            ..Default::default()
        };
        let config = StationConfig::new().with_timing(timing);
        let router = RoleRouter::with_role(StationRole::Hub, HUB_MAC, &config).unwrap();
        assert!(matches!(
            Station::new(router, config, clock),
            Err(StationError::Config(_))
        ));
    }
}
