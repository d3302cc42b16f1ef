// WXStation Node - Fleet runner
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Runs a hub and its satellites as tokio tasks.
//!
//! Each station lives in its own task and is the only writer of its
//! aggregator. Satellites reach the hub through the channel mesh; the hub
//! publishes through a [`LogUplink`].

use crate::clock::AcceleratedClock;
use crate::error::Result;
use crate::mesh::{mesh_channel, BenchMesh, MeshEnvelope};
use crate::uplink::LogUplink;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use wxstation::{
    Clock, FixedBattery, MacAddress, MemoryMeshLink, PinLevel, RoleRouter, Station,
    StationConfig, StationIo, StationRole, StationStats, TickReport, Transmission,
};
use wxstation_sim::{SimConfig, WeatherSensors};

/// Hub address on the bench mesh
pub const HUB_MAC: MacAddress = MacAddress::new([0x24, 0x6f, 0x28, 0x10, 0x00, 0x01]);

/// Shortest real-time pause between loop passes
const MIN_TICK: Duration = Duration::from_micros(100);

/// Frames the hub inbox holds before satellites start losing them
const MESH_QUEUE: usize = 256;

/// Address of satellite `n` (1-based)
pub fn satellite_mac(n: u8) -> MacAddress {
    MacAddress::new([0x24, 0x6f, 0x28, 0x20, 0x00, n])
}

/// Bench run settings.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Number of satellites next to the hub
    pub satellites: u8,
    /// Clock speed multiplier
    pub speed: f64,
    /// Simulated run time
    pub duration_ms: u64,
    /// Simulated time between loop passes
    pub tick_ms: u64,
    /// Run a single standalone station instead of a hub and satellites
    pub standalone: bool,
    /// Battery voltage every station reports
    pub battery_mv: u16,
    pub sim: SimConfig,
    pub station: StationConfig,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            satellites: 3,
            speed: 60.0,
            duration_ms: 900_000,
            tick_ms: 1_000,
            standalone: false,
            battery_mv: 3900,
            sim: SimConfig::default(),
            station: StationConfig::new().with_hub_address(HUB_MAC),
        }
    }
}

/// Final counters of one station.
#[derive(Debug, Clone, Serialize)]
pub struct StationReport {
    pub station_id: String,
    pub role: &'static str,
    pub stats: StationStats,
    pub sensor_reads: u64,
    pub sensor_dropouts: u64,
    pub mesh_messages: u64,
    pub mesh_lost: u64,
    pub uplink_messages: u64,
}

/// Final counters of a run.
#[derive(Debug, Clone, Serialize)]
pub struct FleetReport {
    pub simulated_ms: u64,
    pub stations: Vec<StationReport>,
}

impl FleetReport {
    /// Reports of the stations running `role`.
    pub fn by_role(&self, role: StationRole) -> impl Iterator<Item = &StationReport> + '_ {
        self.stations.iter().filter(move |s| s.role == role.name())
    }
}

/// Everything one station task owns.
struct StationTask<M> {
    station: Station<AcceleratedClock>,
    sensors: WeatherSensors,
    mesh: M,
    uplink: LogUplink,
    battery: FixedBattery,
}

impl<M: BenchMesh> StationTask<M> {
    fn tick(&mut self) {
        let mut io = StationIo {
            sensors: &mut self.sensors,
            mesh: &mut self.mesh,
            uplink: &mut self.uplink,
            battery: &mut self.battery,
        };
        let report = self.station.tick(&mut io);
        log_tick(self.station.station_id().as_str(), &report);
    }

    fn report(&self) -> StationReport {
        let mesh = self.mesh.link_metrics();
        StationReport {
            station_id: self.station.station_id().to_string(),
            role: self.station.router().role().name(),
            stats: self.station.stats(),
            sensor_reads: self.sensors.reads(),
            sensor_dropouts: self.sensors.dropouts(),
            mesh_messages: mesh.messages_sent,
            mesh_lost: mesh.messages_lost,
            uplink_messages: self.uplink.metrics().messages_sent,
        }
    }
}

fn log_tick(station_id: &str, report: &TickReport) {
    match &report.transmission {
        Some(Transmission::Failed(err)) => warn!(station_id, error = %err, "transmit failed"),
        Some(Transmission::SkippedEmpty) => debug!(station_id, "empty window"),
        Some(other) => debug!(station_id, ?other, "transmitted"),
        None => {}
    }
    if let Some(status) = &report.status {
        debug!(station_id, samples = status.samples, "status");
    }
}

fn build_station(
    router: RoleRouter,
    index: u64,
    clock: AcceleratedClock,
    config: &FleetConfig,
) -> Result<(Station<AcceleratedClock>, WeatherSensors)> {
    let station = Station::new(router, config.station.clone(), clock)?;
    let sensors = config.sim.sensors_for(index)?;
    Ok((station, sensors))
}

/// Run the configured fleet to completion.
pub async fn run_fleet(config: FleetConfig) -> Result<FleetReport> {
    let clock = AcceleratedClock::new(config.speed);
    let tick = clock.real_duration(config.tick_ms).max(MIN_TICK);
    let end_ms = config.duration_ms;

    if config.standalone {
        let router = RoleRouter::with_role(StationRole::Standalone, HUB_MAC, &config.station)?;
        let (station, sensors) = build_station(router, 0, clock, &config)?;
        let task = StationTask {
            station,
            sensors,
            mesh: MemoryMeshLink::new(),
            uplink: LogUplink::new(),
            battery: FixedBattery(config.battery_mv),
        };
        let report = tokio::spawn(run_station(task, clock, tick, end_ms)).await?;
        return Ok(FleetReport {
            simulated_ms: clock.now_ms(),
            stations: vec![report],
        });
    }

    let (sender, inbox) = mesh_channel(MESH_QUEUE);
    let max_payload = config.station.mesh_max_payload;

    let hub_router = RoleRouter::detect(&PinLevel::Low, &HUB_MAC, &config.station)?;
    let (station, sensors) = build_station(hub_router, 0, clock, &config)?;
    let hub = StationTask {
        station,
        sensors,
        mesh: MemoryMeshLink::new(),
        uplink: LogUplink::new(),
        battery: FixedBattery(config.battery_mv),
    };

    let mut satellites = Vec::with_capacity(config.satellites as usize);
    for n in 1..=config.satellites {
        let mac = satellite_mac(n);
        let router = RoleRouter::detect(&PinLevel::High, &mac, &config.station)?;
        let (station, sensors) = build_station(router, n as u64, clock, &config)?;
        let task = StationTask {
            station,
            sensors,
            mesh: sender.link(mac, max_payload),
            uplink: LogUplink::new(),
            battery: FixedBattery(config.battery_mv),
        };
        satellites.push(tokio::spawn(run_station(task, clock, tick, end_ms)));
    }
    // the hub inbox closes once every satellite has finished
    drop(sender);

    info!(
        satellites = config.satellites,
        speed = config.speed,
        duration_ms = end_ms,
        "fleet started"
    );

    let hub_handle = tokio::spawn(run_hub(hub, inbox, clock, tick, end_ms));

    let mut stations = Vec::with_capacity(satellites.len() + 1);
    for handle in satellites {
        stations.push(handle.await?);
    }
    stations.insert(0, hub_handle.await?);

    Ok(FleetReport {
        simulated_ms: clock.now_ms(),
        stations,
    })
}

async fn run_station<M: BenchMesh>(
    mut task: StationTask<M>,
    clock: AcceleratedClock,
    tick: Duration,
    end_ms: u64,
) -> StationReport {
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if clock.now_ms() >= end_ms {
            break;
        }
        task.tick();
    }

    task.report()
}

async fn run_hub(
    mut hub: StationTask<MemoryMeshLink>,
    mut inbox: mpsc::Receiver<MeshEnvelope>,
    clock: AcceleratedClock,
    tick: Duration,
    end_ms: u64,
) -> StationReport {
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticking = true;
    let mut inbox_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick(), if ticking => {
                if clock.now_ms() >= end_ms {
                    ticking = false;
                } else {
                    hub.tick();
                }
            }
            frame = inbox.recv(), if inbox_open => match frame {
                Some(envelope) => relay(&mut hub, &envelope),
                None => inbox_open = false,
            },
            else => break,
        }
    }

    hub.report()
}

fn relay(hub: &mut StationTask<MemoryMeshLink>, envelope: &MeshEnvelope) {
    let own = hub.station.router().mac_address();
    if envelope.dest != own && !envelope.dest.is_broadcast() {
        debug!(src = %envelope.src, dest = %envelope.dest, "frame for another peer");
        return;
    }
    if let Err(err) = hub
        .station
        .handle_mesh_packet(&envelope.src, &envelope.bytes, &mut hub.uplink)
    {
        warn!(src = %envelope.src, error = %err, "mesh frame dropped");
    }
}
