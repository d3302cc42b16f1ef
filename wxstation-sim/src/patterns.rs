// WXStation Sim - Signal patterns
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Signal pattern generators for synthetic weather channels.
//!
//! Each sensor channel is driven by one pattern. Patterns can be summed
//! with `Composite`, e.g. a diurnal temperature curve plus a random walk.

use rand::prelude::*;
use rand_distr::{LogNormal, Normal, Poisson};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Signal pattern definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPattern {
    /// Constant value.
    Constant { value: f64 },

    /// Sinusoidal wave.
    ///
    /// `value = offset + amplitude * sin(2*PI*t/period_ms + phase)`
    Sine {
        amplitude: f64,
        period_ms: u64,
        phase: f64,
        offset: f64,
    },

    /// Random walk (Brownian motion), stateful.
    RandomWalk { start: f64, step_std: f64 },

    /// Step function. Levels are (timestamp_ms, value) pairs; a value
    /// persists until the next timestamp.
    Step { levels: Vec<(u64, f64)> },

    /// Log-normal distributed values (gusty wind).
    LogNormal { mu: f64, sigma: f64 },

    /// Poisson events scaled by `scale` (rain bursts).
    Poisson { lambda: f64, scale: f64 },

    /// 24-hour cycle, Gaussian-shaped around `peak_hour`.
    Diurnal {
        min: f64,
        max: f64,
        peak_hour: f64,
        spread: f64,
    },

    /// Half-sine between sunrise and sunset, zero at night.
    Daylight {
        max: f64,
        sunrise_hour: f64,
        sunset_hour: f64,
    },

    /// Sum of multiple patterns.
    Composite(Vec<SignalPattern>),
}

impl SignalPattern {
    /// Evaluate the pattern at a given timestamp.
    ///
    /// A `RandomWalk` evaluated here does not accumulate; use
    /// [`PatternState::evaluate`] for that.
    pub fn evaluate(&self, timestamp_ms: u64, rng: &mut (impl Rng + ?Sized)) -> f64 {
        match self {
            SignalPattern::Constant { value } => *value,

            SignalPattern::Sine {
                amplitude,
                period_ms,
                phase,
                offset,
            } => {
                if *period_ms == 0 {
                    return *offset;
                }
                let t = timestamp_ms as f64;
                offset + amplitude * (2.0 * PI * t / *period_ms as f64 + phase).sin()
            }

            SignalPattern::RandomWalk { start, step_std } => start + gaussian(*step_std, rng),

            SignalPattern::Step { levels } => {
                let mut current = levels.first().map(|(_, v)| *v).unwrap_or(0.0);
                for (ts, val) in levels {
                    if timestamp_ms >= *ts {
                        current = *val;
                    } else {
                        break;
                    }
                }
                current
            }

            SignalPattern::LogNormal { mu, sigma } => {
                if !is_spread(*sigma) {
                    return 0.0;
                }
                LogNormal::new(*mu, *sigma)
                    .map(|dist| dist.sample(rng))
                    .unwrap_or(0.0)
            }

            SignalPattern::Poisson { lambda, scale } => {
                if !lambda.is_finite() || *lambda <= 0.0 {
                    return 0.0;
                }
                Poisson::new(*lambda)
                    .map(|dist| dist.sample(rng) * scale)
                    .unwrap_or(0.0)
            }

            SignalPattern::Diurnal {
                min,
                max,
                peak_hour,
                spread,
            } => {
                let hour = (timestamp_ms as f64 / MS_PER_HOUR) % 24.0;
                let diff = (hour - peak_hour).abs();
                let diff = if diff > 12.0 { 24.0 - diff } else { diff };
                let factor = (-diff * diff / (2.0 * spread * spread)).exp();
                min + (max - min) * factor
            }

            SignalPattern::Daylight {
                max,
                sunrise_hour,
                sunset_hour,
            } => {
                let hour = (timestamp_ms as f64 / MS_PER_HOUR) % 24.0;
                let day = sunset_hour - sunrise_hour;
                if day <= 0.0 || hour <= *sunrise_hour || hour >= *sunset_hour {
                    return 0.0;
                }
                max * (PI * (hour - sunrise_hour) / day).sin()
            }

            SignalPattern::Composite(patterns) => {
                patterns.iter().map(|p| p.evaluate(timestamp_ms, rng)).sum()
            }
        }
    }

    /// Check parameters that the distributions would reject.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            SignalPattern::RandomWalk { step_std, .. } if step_std.is_nan() || *step_std < 0.0 => {
                Err(format!("step_std must be >= 0, got {}", step_std))
            }
            SignalPattern::LogNormal { sigma, .. } if sigma.is_nan() || *sigma < 0.0 => {
                Err(format!("sigma must be >= 0, got {}", sigma))
            }
            SignalPattern::Poisson { lambda, .. } if !lambda.is_finite() => {
                Err(format!("lambda must be finite, got {}", lambda))
            }
            SignalPattern::Diurnal { spread, .. } if spread.is_nan() || *spread <= 0.0 => {
                Err(format!("spread must be > 0, got {}", spread))
            }
            SignalPattern::Daylight {
                sunrise_hour,
                sunset_hour,
                ..
            } if !(0.0..24.0).contains(sunrise_hour)
                || !(*sunrise_hour..=24.0).contains(sunset_hour)
                || sunset_hour <= sunrise_hour =>
            {
                Err(format!(
                    "daylight needs 0 <= sunrise < sunset <= 24, got {}..{}",
                    sunrise_hour, sunset_hour
                ))
            }
            SignalPattern::Composite(patterns) => patterns.iter().try_for_each(|p| p.validate()),
            _ => Ok(()),
        }
    }

    /// Diurnal temperature curve peaking mid-afternoon.
    pub fn temperature_diurnal(min: f64, max: f64) -> Self {
        SignalPattern::Diurnal {
            min,
            max,
            peak_hour: 14.0,
            spread: 4.0,
        }
    }

    /// Daylight curve from 06:00 to 18:00, zero at night, peaking at noon.
    pub fn daylight(max: f64) -> Self {
        SignalPattern::Daylight {
            max,
            sunrise_hour: 6.0,
            sunset_hour: 18.0,
        }
    }

    /// `base` plus a random walk around zero.
    pub fn drifting(base: SignalPattern, step_std: f64) -> Self {
        SignalPattern::Composite(vec![
            base,
            SignalPattern::RandomWalk {
                start: 0.0,
                step_std,
            },
        ])
    }
}

/// Negative or NaN spreads sample as zero.
fn is_spread(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn gaussian(std_dev: f64, rng: &mut (impl Rng + ?Sized)) -> f64 {
    if !is_spread(std_dev) {
        return 0.0;
    }
    Normal::new(0.0, std_dev)
        .map(|n| n.sample(rng))
        .unwrap_or(0.0)
}

/// State for patterns that need history.
#[derive(Debug, Clone, Default)]
pub struct PatternState {
    /// Current value for random walk.
    pub random_walk_value: f64,
    /// One state per child of a composite.
    pub children: Vec<PatternState>,
}

impl PatternState {
    /// Create state initialized for a pattern.
    pub fn for_pattern(pattern: &SignalPattern) -> Self {
        match pattern {
            SignalPattern::RandomWalk { start, .. } => Self {
                random_walk_value: *start,
                children: Vec::new(),
            },
            SignalPattern::Composite(patterns) => Self {
                random_walk_value: 0.0,
                children: patterns.iter().map(Self::for_pattern).collect(),
            },
            _ => Self::default(),
        }
    }

    /// Evaluate pattern with state update.
    pub fn evaluate(
        &mut self,
        pattern: &SignalPattern,
        timestamp_ms: u64,
        rng: &mut (impl Rng + ?Sized),
    ) -> f64 {
        match pattern {
            SignalPattern::RandomWalk { step_std, .. } => {
                self.random_walk_value += gaussian(*step_std, rng);
                self.random_walk_value
            }

            SignalPattern::Composite(patterns) => {
                if self.children.len() != patterns.len() {
                    *self = Self::for_pattern(pattern);
                }
                patterns
                    .iter()
                    .zip(self.children.iter_mut())
                    .map(|(p, state)| state.evaluate(p, timestamp_ms, rng))
                    .sum()
            }

            _ => pattern.evaluate(timestamp_ms, rng),
        }
    }
}
