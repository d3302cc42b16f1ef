// WXStation - Remote weather station telemetry core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Collaborator interfaces
//!
//! Sensors, radios, the uplink client and the battery monitor sit outside the
//! core. This module defines the traits the station loop talks to, plus
//! in-memory implementations for tests and simulation.

use crate::error::{SensorError, TransportError};
use crate::reading::RawSample;
use crate::role::MacAddress;
use std::collections::VecDeque;

/// Counters kept by the in-memory links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMetrics {
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Total messages accepted
    pub messages_sent: u64,
    /// Sends rejected by the link
    pub send_failures: u64,
    /// Messages dropped in flight
    pub messages_lost: u64,
}

/// Sensor bus
pub trait SensorSource {
    /// Read every sensor once
    ///
    /// A partial failure should come back as a sample with `is_valid`
    /// cleared; an error means nothing could be read at all.
    fn read_all(&mut self, now_ms: u64) -> Result<RawSample, SensorError>;
}

/// Short-range peer-to-peer radio
pub trait MeshLink {
    /// Send raw bytes to a peer
    fn send_bytes(&mut self, dest: &MacAddress, bytes: &[u8]) -> Result<(), TransportError>;

    /// Whether the radio is up
    fn is_available(&self) -> bool {
        true
    }
}

/// Broker uplink
pub trait Uplink {
    /// Publish a text payload on `topic`
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError>;

    /// Whether the session is up
    fn is_connected(&self) -> bool {
        true
    }
}

/// Battery voltage source
pub trait BatteryMonitor {
    /// Current voltage in millivolts
    fn battery_millivolts(&mut self) -> u16;
}

/// Hardware network address source
pub trait HardwareId {
    /// Six-byte address
    fn mac_address(&self) -> MacAddress;
}

impl HardwareId for MacAddress {
    fn mac_address(&self) -> MacAddress {
        *self
    }
}

impl<T: SensorSource + ?Sized> SensorSource for Box<T> {
    fn read_all(&mut self, now_ms: u64) -> Result<RawSample, SensorError> {
        (**self).read_all(now_ms)
    }
}

impl<T: MeshLink + ?Sized> MeshLink for Box<T> {
    fn send_bytes(&mut self, dest: &MacAddress, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).send_bytes(dest, bytes)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<T: Uplink + ?Sized> Uplink for Box<T> {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        (**self).publish(topic, payload)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

/// Battery that always reports the same voltage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBattery(pub u16);

impl BatteryMonitor for FixedBattery {
    fn battery_millivolts(&mut self) -> u16 {
        self.0
    }
}

/// Sensor source that replays a fixed script, then reports not responding
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensors {
    script: VecDeque<Result<RawSample, SensorError>>,
}

impl ScriptedSensors {
    /// Replay `samples` in order
    pub fn new(samples: impl IntoIterator<Item = RawSample>) -> Self {
        Self {
            script: samples.into_iter().map(Ok).collect(),
        }
    }

    /// Queue one more result
    pub fn push(&mut self, result: Result<RawSample, SensorError>) {
        self.script.push_back(result);
    }

    /// Results left to replay
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl SensorSource for ScriptedSensors {
    fn read_all(&mut self, now_ms: u64) -> Result<RawSample, SensorError> {
        match self.script.pop_front() {
            Some(Ok(mut sample)) => {
                sample.timestamp_ms = now_ms;
                Ok(sample)
            }
            Some(Err(err)) => Err(err),
            None => Err(SensorError::NotResponding {
                name: "script".to_string(),
            }),
        }
    }
}

/// One frame handed to the mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshFrame {
    pub dest: MacAddress,
    pub bytes: Vec<u8>,
}

/// In-memory mesh radio with a payload cap and bounded queue
#[derive(Debug)]
pub struct MemoryMeshLink {
    outgoing: VecDeque<MeshFrame>,
    max_payload: usize,
    max_buffer_size: usize,
    is_open: bool,
    metrics: LinkMetrics,
}

impl MemoryMeshLink {
    /// Create a link with the default 250-byte payload cap
    pub fn new() -> Self {
        Self::with_max_payload(crate::config::DEFAULT_MESH_MAX_PAYLOAD)
    }

    /// Create with a custom payload cap
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            outgoing: VecDeque::new(),
            max_payload,
            max_buffer_size: 1000,
            is_open: true,
            metrics: LinkMetrics::default(),
        }
    }

    /// Limit the number of queued frames
    pub fn with_buffer_size(mut self, max_frames: usize) -> Self {
        self.max_buffer_size = max_frames;
        self
    }

    /// Take the oldest queued frame
    pub fn pop_outgoing(&mut self) -> Option<MeshFrame> {
        self.outgoing.pop_front()
    }

    /// Take every queued frame
    pub fn drain(&mut self) -> Vec<MeshFrame> {
        self.outgoing.drain(..).collect()
    }

    /// Number of queued frames
    pub fn pending_outgoing(&self) -> usize {
        self.outgoing.len()
    }

    /// Link counters
    pub fn metrics(&self) -> LinkMetrics {
        self.metrics.clone()
    }

    /// Bring the radio down
    pub fn close(&mut self) {
        self.is_open = false;
    }
}

impl Default for MemoryMeshLink {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshLink for MemoryMeshLink {
    fn send_bytes(&mut self, dest: &MacAddress, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.is_open {
            self.metrics.send_failures += 1;
            return Err(TransportError::Disconnected {
                reason: "Mesh radio is down".to_string(),
            });
        }

        if bytes.len() > self.max_payload {
            self.metrics.send_failures += 1;
            return Err(TransportError::PayloadTooLarge {
                size: bytes.len(),
                max: self.max_payload,
            });
        }

        if self.outgoing.len() >= self.max_buffer_size {
            self.metrics.send_failures += 1;
            return Err(TransportError::BufferFull);
        }

        self.outgoing.push_back(MeshFrame {
            dest: *dest,
            bytes: bytes.to_vec(),
        });
        self.metrics.bytes_sent += bytes.len() as u64;
        self.metrics.messages_sent += 1;

        Ok(())
    }

    fn is_available(&self) -> bool {
        self.is_open
    }
}

/// Mesh link that silently drops a share of frames
#[derive(Debug)]
pub struct LossyMeshLink {
    inner: MemoryMeshLink,
    loss_rate: f32,
    rng_state: u64,
}

impl LossyMeshLink {
    /// Create a lossy link with given loss rate (0.0-1.0)
    pub fn new(loss_rate: f32) -> Self {
        Self {
            inner: MemoryMeshLink::new(),
            loss_rate: loss_rate.clamp(0.0, 1.0),
            rng_state: 12345,
        }
    }

    /// Underlying queue
    pub fn inner_mut(&mut self) -> &mut MemoryMeshLink {
        &mut self.inner
    }

    /// Link counters, including dropped frames
    pub fn metrics(&self) -> LinkMetrics {
        self.inner.metrics()
    }

    /// Simple PRNG for deterministic testing
    fn next_random(&mut self) -> f32 {
        self.rng_state = self.rng_state.wrapping_mul(1103515245).wrapping_add(12345);
        ((self.rng_state >> 16) & 0x7fff) as f32 / 32767.0
    }
}

impl MeshLink for LossyMeshLink {
    fn send_bytes(&mut self, dest: &MacAddress, bytes: &[u8]) -> Result<(), TransportError> {
        // connectionless radio: a lost frame still looks sent
        if self.next_random() < self.loss_rate {
            self.inner.metrics.bytes_sent += bytes.len() as u64;
            self.inner.metrics.messages_sent += 1;
            self.inner.metrics.messages_lost += 1;
            return Ok(());
        }
        self.inner.send_bytes(dest, bytes)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

/// A message captured by [`MemoryUplink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: String,
}

/// In-memory uplink that records every publish
#[derive(Debug, Default)]
pub struct MemoryUplink {
    published: Vec<PublishedMessage>,
    disconnected: bool,
    metrics: LinkMetrics,
}

impl MemoryUplink {
    /// Create a connected uplink
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the broker session
    pub fn disconnect(&mut self) {
        self.disconnected = true;
    }

    /// Restore the session
    pub fn reconnect(&mut self) {
        self.disconnected = false;
    }

    /// Everything published so far
    pub fn published(&self) -> &[PublishedMessage] {
        &self.published
    }

    /// Messages published on `topic`
    pub fn on_topic<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a PublishedMessage> {
        self.published.iter().filter(move |m| m.topic == topic)
    }

    /// Take every recorded message
    pub fn take(&mut self) -> Vec<PublishedMessage> {
        std::mem::take(&mut self.published)
    }

    /// Link counters
    pub fn metrics(&self) -> LinkMetrics {
        self.metrics.clone()
    }
}

impl Uplink for MemoryUplink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        if self.disconnected {
            self.metrics.send_failures += 1;
            return Err(TransportError::Disconnected {
                reason: "Broker session lost".to_string(),
            });
        }

        self.published.push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
        });
        self.metrics.bytes_sent += payload.len() as u64;
        self.metrics.messages_sent += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.disconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUB: MacAddress = MacAddress::new([0x24, 0x6f, 0, 0, 0, 1]);

    #[test]
    fn test_mesh_send_queues_frame() {
        let mut link = MemoryMeshLink::new();
        link.send_bytes(&HUB, &[1, 2, 3]).unwrap();

        assert_eq!(link.pending_outgoing(), 1);
        let frame = link.pop_outgoing().unwrap();
        assert_eq!(frame.dest, HUB);
        assert_eq!(frame.bytes, vec![1, 2, 3]);

        let metrics = link.metrics();
        assert_eq!(metrics.bytes_sent, 3);
        assert_eq!(metrics.messages_sent, 1);
    }

    #[test]
    fn test_mesh_payload_cap() {
        let mut link = MemoryMeshLink::with_max_payload(40);
        assert!(link.send_bytes(&HUB, &[0u8; 40]).is_ok());
        assert_eq!(
            link.send_bytes(&HUB, &[0u8; 41]),
            Err(TransportError::PayloadTooLarge { size: 41, max: 40 })
        );
        assert_eq!(link.metrics().send_failures, 1);
    }

    #[test]
    fn test_mesh_buffer_full() {
        let mut link = MemoryMeshLink::new().with_buffer_size(2);
        link.send_bytes(&HUB, &[1]).unwrap();
        link.send_bytes(&HUB, &[2]).unwrap();
        assert_eq!(link.send_bytes(&HUB, &[3]), Err(TransportError::BufferFull));
        assert_eq!(link.drain().len(), 2);
    }

    #[test]
    fn test_mesh_closed() {
        let mut link = MemoryMeshLink::new();
        link.close();
        assert!(!link.is_available());
        assert!(matches!(
            link.send_bytes(&HUB, &[1]),
            Err(TransportError::Disconnected { .. })
        ));
    }

    #[test]
    fn test_lossy_mesh() {
        let mut link = LossyMeshLink::new(0.5);
        for i in 0..100u8 {
            link.send_bytes(&HUB, &[i]).unwrap();
        }

        let delivered = link.inner_mut().drain().len();
        assert!(delivered < 100);
        assert!(delivered > 0);
        assert_eq!(link.metrics().messages_lost as usize, 100 - delivered);
    }

    #[test]
    fn test_uplink_records_publishes() {
        let mut uplink = MemoryUplink::new();
        uplink.publish("a/b", "{}").unwrap();
        uplink.publish("a/c", "[]").unwrap();

        assert_eq!(uplink.published().len(), 2);
        assert_eq!(uplink.on_topic("a/c").count(), 1);
        assert_eq!(uplink.metrics().bytes_sent, 4);
    }

    #[test]
    fn test_uplink_disconnected() {
        let mut uplink = MemoryUplink::new();
        uplink.disconnect();
        assert!(!uplink.is_connected());
        assert!(uplink.publish("t", "x").is_err());
        uplink.reconnect();
        assert!(uplink.publish("t", "x").is_ok());
        assert_eq!(uplink.take().len(), 1);
        assert!(uplink.published().is_empty());
    }

    #[test]
    fn test_scripted_sensors() {
        let sample = RawSample::new(0).with_climate(20.0, 50.0, 1000.0);
        let mut sensors = ScriptedSensors::new(vec![sample]);
        sensors.push(Err(SensorError::NotInitialised));

        let sample = sensors.read_all(3000).unwrap();
        assert_eq!(sample.timestamp_ms, 3000);
        assert_eq!(sensors.read_all(6000), Err(SensorError::NotInitialised));
        assert!(matches!(
            sensors.read_all(9000),
            Err(SensorError::NotResponding { .. })
        ));
        assert_eq!(sensors.remaining(), 0);
    }

    #[test]
    fn test_fixed_battery_and_hardware_id() {
        let mut battery = FixedBattery(3700);
        assert_eq!(battery.battery_millivolts(), 3700);
        assert_eq!(HUB.mac_address(), HUB);
    }
}
