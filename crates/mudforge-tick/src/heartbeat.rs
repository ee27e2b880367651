use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

use crate::config::{HeartbeatConfig, OverrunPolicy};

// ---------------------------------------------------------------------------
// Beat
// ---------------------------------------------------------------------------

/// One beat of the heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beat {
    /// Starts at 1 and increases by one per beat.
    pub number: u64,
    pub period: Duration,
    /// Woke up more than a tenth of a period after the deadline.
    pub late: bool,
    /// Beats given up on because of lateness.
    pub skipped: u64,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeartbeatStats {
    pub beats: u64,
    pub late_beats: u64,
    pub skipped_beats: u64,
    /// Moving average (alpha 0.2) of the fan-out time reported through
    /// [`Heartbeat::record_fanout_end`].
    pub avg_fanout: Duration,
    pub max_fanout: Duration,
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

/// Fixed-rate beat source for a single world.
#[derive(Debug)]
pub struct Heartbeat {
    config: HeartbeatConfig,
    period: Option<Duration>,
    number: u64,
    deadline: Option<TokioInstant>,
    fanout_started: Option<Instant>,
    stats: HeartbeatStats,
}

impl Heartbeat {
    /// The first beat is delayed by up to `initial_jitter_us` so that worlds
    /// started together do not beat in lockstep.
    pub fn new(config: HeartbeatConfig) -> Self {
        let config = config.validated();
        let period = config.period();

        let deadline = period.map(|p| {
            let jitter = match config.initial_jitter_us {
                0 => Duration::ZERO,
                max => Duration::from_micros(rand::rng().random_range(0..max)),
            };
            TokioInstant::now() + p + jitter
        });

        match period {
            None => debug!("heartbeat in manual mode"),
            Some(p) => debug!(
                rate_hz = config.rate_hz,
                period_ms = p.as_secs_f64() * 1000.0,
                policy = ?config.policy,
                "heartbeat configured"
            ),
        }

        Self {
            config,
            period,
            number: 0,
            deadline,
            fanout_started: None,
            stats: HeartbeatStats::default(),
        }
    }

    pub fn with_rate(rate_hz: u32) -> Self {
        Self::new(HeartbeatConfig::with_rate(rate_hz))
    }

    /// Sleep until the next beat is due.
    ///
    /// In manual mode this never resolves.
    pub async fn wait_for_beat(&mut self) -> Beat {
        let (Some(deadline), Some(period)) = (self.deadline, self.period) else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        let now = TokioInstant::now();
        self.number += 1;
        self.fanout_started = Some(Instant::now());

        let late_by = now.saturating_duration_since(deadline);
        let late = late_by > period / 10;
        let behind = if late {
            (late_by.as_nanos() / period.as_nanos()) as u64
        } else {
            0
        };

        let (next, skipped) = match self.config.policy {
            OverrunPolicy::Skip => (now + period, behind),
            OverrunPolicy::CatchUp { max_burst } if behind <= u64::from(max_burst) => {
                (deadline + period, 0)
            }
            OverrunPolicy::CatchUp { max_burst } => {
                (now + period, behind - u64::from(max_burst))
            }
            OverrunPolicy::Fixed => {
                let steps = u32::try_from(behind + 1).unwrap_or(u32::MAX);
                (deadline + period * steps, behind)
            }
        };
        self.deadline = Some(next);

        if skipped > 0 {
            warn!(
                beat = self.number,
                skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                policy = ?self.config.policy,
                "heartbeat fell behind"
            );
        }

        self.stats.beats += 1;
        self.stats.late_beats += u64::from(late);
        self.stats.skipped_beats += skipped;

        trace!(beat = self.number, late, "beat");

        Beat {
            number: self.number,
            period,
            late,
            skipped,
        }
    }

    /// Report that the work triggered by the latest beat is done.
    ///
    /// Logs a warning when the work used more than the configured share of
    /// the period. Does nothing if no beat is outstanding.
    pub fn record_fanout_end(&mut self) {
        let Some(started) = self.fanout_started.take() else {
            return;
        };
        let elapsed = started.elapsed();

        if let Some(period) = self.period {
            let used = elapsed.as_secs_f64() / period.as_secs_f64();
            if used >= self.config.budget_warn_threshold {
                warn!(
                    beat = self.number,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    period_ms = period.as_secs_f64() * 1000.0,
                    "pulse fan-out is using most of the period"
                );
            }
        }

        self.stats.max_fanout = self.stats.max_fanout.max(elapsed);
        let avg = self.stats.avg_fanout.as_secs_f64();
        self.stats.avg_fanout = Duration::from_secs_f64(avg * 0.8 + elapsed.as_secs_f64() * 0.2);
    }

    pub fn is_manual(&self) -> bool {
        self.period.is_none()
    }

    /// Beats fired so far.
    pub fn beats(&self) -> u64 {
        self.number
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn rate_hz(&self) -> u32 {
        self.config.rate_hz
    }

    pub fn stats(&self) -> &HeartbeatStats {
        &self.stats
    }
}
