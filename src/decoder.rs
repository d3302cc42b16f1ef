//! Packet decoder
//!
//! A received buffer is accepted only when its length is exactly
//! [`PACKET_SIZE`](crate::protocol::PACKET_SIZE) and its XOR checksum
//! matches. Anything else is rejected as a whole.

use crate::error::DecodeError;
use crate::protocol::WirePacket;
use log::{debug, warn};

/// Decode and verify one packet
pub fn decode(bytes: &[u8]) -> Result<WirePacket, DecodeError> {
    WirePacket::from_bytes(bytes)
}

/// Counters kept by [`PacketDecoder`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Packets that passed both checks
    pub accepted: u64,
    /// Rejected for length
    pub malformed: u64,
    /// Rejected for checksum
    pub corrupted: u64,
}

impl DecoderStats {
    /// All rejected packets
    pub fn rejected(&self) -> u64 {
        self.malformed + self.corrupted
    }
}

/// Decoder that tracks acceptance counters
#[derive(Debug, Clone, Default)]
pub struct PacketDecoder {
    stats: DecoderStats,
}

impl PacketDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a packet, updating the counters
    pub fn decode(&mut self, bytes: &[u8]) -> Result<WirePacket, DecodeError> {
        match decode(bytes) {
            Ok(packet) => {
                self.stats.accepted += 1;
                debug!("Decoded {}", packet);
                Ok(packet)
            }
            Err(err) => {
                match err {
                    DecodeError::WrongLength { .. } => self.stats.malformed += 1,
                    DecodeError::ChecksumMismatch { .. } => self.stats.corrupted += 1,
                }
                warn!("Rejected {}-byte packet: {}", bytes.len(), err);
                Err(err)
            }
        }
    }

    /// Counters so far
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Reset counters
    pub fn reset_stats(&mut self) {
        self.stats = DecoderStats::default();
    }
}
