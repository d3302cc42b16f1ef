// WXStation Node - Logging uplink
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Uplink that writes every publish to the log instead of a broker.

use tracing::info;
use wxstation::{LinkMetrics, TransportError, Uplink};

/// Logs publishes at info level and keeps counters.
#[derive(Debug, Default)]
pub struct LogUplink {
    metrics: LinkMetrics,
}

impl LogUplink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> LinkMetrics {
        self.metrics.clone()
    }
}

impl Uplink for LogUplink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        info!(topic, payload, "publish");
        self.metrics.bytes_sent += payload.len() as u64;
        self.metrics.messages_sent += 1;
        Ok(())
    }
}
