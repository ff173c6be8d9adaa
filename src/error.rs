//! Error taxonomy for configuration and setup failures
//!
//! Simulation itself never fails once a battle has been set up; every error
//! here is raised before the first frame runs.

use thiserror::Error;

/// Errors raised while configuring or setting up battles.
#[derive(Debug, Error)]
pub enum SimError {
    /// A weapon type was requested that the registry does not know.
    #[error("unknown weapon type: {0}")]
    UnknownWeapon(String),
    /// A configuration value is out of its legal range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown stage preset: {0}")]
    UnknownPreset(String),
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
