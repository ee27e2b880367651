//! World configuration.

use mudforge_tick::HeartbeatConfig;
use serde::{Deserialize, Serialize};

/// Settings for a [`World`](crate::World).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub heartbeat: HeartbeatConfig,

    /// Pulses buffered per mob before further pulses to it are dropped.
    /// Values below 1 are treated as 1.
    pub pulse_capacity: usize,
}

impl WorldConfig {
    pub const DEFAULT_PULSE_CAPACITY: usize = 10;

    /// A world without a heartbeat task. Pulses are issued with
    /// [`World::pulse`](crate::World::pulse).
    pub fn manual() -> Self {
        Self {
            heartbeat: HeartbeatConfig::manual(),
            ..Default::default()
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            heartbeat: HeartbeatConfig::default(),
            pulse_capacity: Self::DEFAULT_PULSE_CAPACITY,
        }
    }
}
