// WXStation Node - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use thiserror::Error;
use wxstation::{ConfigError, StationError};
use wxstation_sim::SimError;

/// Errors that stop a bench run.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Station error: {0}")]
    Station(#[from] StationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulator error: {0}")]
    Sim(#[from] SimError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Station task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, NodeError>;
