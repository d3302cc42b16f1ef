// WXStation Node - In-process mesh
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Mesh radio over a tokio channel.
//!
//! Every satellite holds a [`ChannelMeshLink`] feeding the hub's single
//! receiver, so the hub task stays the only writer of its aggregator.

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;
use wxstation::{LinkMetrics, MacAddress, MemoryMeshLink, MeshLink, TransportError};

/// One frame in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshEnvelope {
    pub src: MacAddress,
    pub dest: MacAddress,
    pub bytes: Vec<u8>,
}

/// Create a mesh channel holding up to `capacity` frames.
pub fn mesh_channel(capacity: usize) -> (MeshSender, mpsc::Receiver<MeshEnvelope>) {
    let (tx, rx) = mpsc::channel(capacity);
    (MeshSender { tx }, rx)
}

/// Cloneable handle used to create per-station links.
#[derive(Debug, Clone)]
pub struct MeshSender {
    tx: mpsc::Sender<MeshEnvelope>,
}

impl MeshSender {
    /// Link for the station with address `src`.
    pub fn link(&self, src: MacAddress, max_payload: usize) -> ChannelMeshLink {
        ChannelMeshLink {
            src,
            tx: self.tx.clone(),
            max_payload,
            metrics: LinkMetrics::default(),
        }
    }
}

/// Non-blocking mesh link; a full channel counts as a lost frame.
#[derive(Debug)]
pub struct ChannelMeshLink {
    src: MacAddress,
    tx: mpsc::Sender<MeshEnvelope>,
    max_payload: usize,
    metrics: LinkMetrics,
}

impl ChannelMeshLink {
    /// Link statistics.
    pub fn metrics(&self) -> LinkMetrics {
        self.metrics.clone()
    }
}

/// Mesh links the runner can report on.
pub trait BenchMesh: MeshLink + Send + 'static {
    fn link_metrics(&self) -> LinkMetrics;
}

impl BenchMesh for ChannelMeshLink {
    fn link_metrics(&self) -> LinkMetrics {
        self.metrics()
    }
}

impl BenchMesh for MemoryMeshLink {
    fn link_metrics(&self) -> LinkMetrics {
        self.metrics()
    }
}

impl MeshLink for ChannelMeshLink {
    fn send_bytes(&mut self, dest: &MacAddress, bytes: &[u8]) -> Result<(), TransportError> {
        if bytes.len() > self.max_payload {
            self.metrics.send_failures += 1;
            return Err(TransportError::PayloadTooLarge {
                size: bytes.len(),
                max: self.max_payload,
            });
        }

        let envelope = MeshEnvelope {
            src: self.src,
            dest: *dest,
            bytes: bytes.to_vec(),
        };
        match self.tx.try_send(envelope) {
            Ok(()) => {
                self.metrics.bytes_sent += bytes.len() as u64;
                self.metrics.messages_sent += 1;
                debug!(src = %self.src, dest = %dest, len = bytes.len(), "mesh frame queued");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.messages_lost += 1;
                Err(TransportError::BufferFull)
            }
            Err(TrySendError::Closed(_)) => {
                self.metrics.send_failures += 1;
                Err(TransportError::Disconnected {
                    reason: "Hub receiver closed".to_string(),
                })
            }
        }
    }

    fn is_available(&self) -> bool {
        !self.tx.is_closed()
    }
}
