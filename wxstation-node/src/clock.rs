// WXStation Node - Accelerated clock
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Wall clock running `speed` times faster than real time.

use std::time::Instant;
use wxstation::Clock;

/// Shared accelerated clock; copies agree on the time.
#[derive(Debug, Clone, Copy)]
pub struct AcceleratedClock {
    start: Instant,
    speed: f64,
}

impl AcceleratedClock {
    /// Start now with the given speed multiplier.
    pub fn new(speed: f64) -> Self {
        Self {
            start: Instant::now(),
            speed,
        }
    }

    /// Real time that covers `simulated_ms`.
    pub fn real_duration(&self, simulated_ms: u64) -> std::time::Duration {
        std::time::Duration::from_secs_f64(simulated_ms as f64 / 1000.0 / self.speed)
    }
}

impl Clock for AcceleratedClock {
    fn now_ms(&self) -> u64 {
        (self.start.elapsed().as_secs_f64() * 1000.0 * self.speed) as u64
    }
}
