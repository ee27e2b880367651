use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// How the heartbeat recovers after waking up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OverrunPolicy {
    /// Forget the missed beats and schedule the next one a full period from now.
    #[default]
    Skip,
    /// Fire missed beats back to back, at most `max_burst` of them.
    CatchUp { max_burst: u32 },
    /// Keep the original cadence; a late beat does not shift later ones.
    Fixed,
}

/// Heartbeat configuration.
///
/// Every field has a default so a partial JSON object is enough:
///
/// ```json
/// { "rate_hz": 4, "policy": { "mode": "catch_up", "max_burst": 2 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Beats per second. 0 selects manual mode.
    pub rate_hz: u32,
    pub policy: OverrunPolicy,
    /// Fraction of the period (0.0..=1.0) a pulse fan-out may use before a
    /// warning is logged.
    pub budget_warn_threshold: f64,
    /// Upper bound of the random delay added to the first beat.
    pub initial_jitter_us: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            rate_hz: 10,
            policy: OverrunPolicy::default(),
            budget_warn_threshold: 0.5,
            initial_jitter_us: 1_000,
        }
    }
}

impl HeartbeatConfig {
    pub const MAX_RATE_HZ: u32 = 1_000;

    pub fn with_rate(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            ..Default::default()
        }
    }

    /// A config for worlds that are pulsed by hand.
    pub fn manual() -> Self {
        Self::with_rate(0)
    }

    /// Clamp out-of-range values. Applied by [`crate::Heartbeat::new`].
    pub fn validated(mut self) -> Self {
        if self.rate_hz > Self::MAX_RATE_HZ {
            warn!(
                rate = self.rate_hz,
                max = Self::MAX_RATE_HZ,
                "heartbeat rate too high, clamping"
            );
            self.rate_hz = Self::MAX_RATE_HZ;
        }
        if !self.budget_warn_threshold.is_finite() {
            self.budget_warn_threshold = 1.0;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    pub fn is_manual(&self) -> bool {
        self.rate_hz == 0
    }

    /// Time between beats, or `None` in manual mode.
    pub fn period(&self) -> Option<Duration> {
        match self.rate_hz {
            0 => None,
            hz => Some(Duration::from_secs_f64(1.0 / f64::from(hz))),
        }
    }
}
