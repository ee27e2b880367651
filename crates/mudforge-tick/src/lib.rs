//! Heartbeat timing for Mudforge worlds.
//!
//! A world advances in discrete pulses. [`Heartbeat`] decides *when* the
//! next pulse is due; the world decides *who* receives it. Keeping the two
//! apart lets tests drive a world by hand while production runs a fixed
//! cadence.
//!
//! # Manual mode
//!
//! A rate of 0 puts the heartbeat in manual mode: [`Heartbeat::wait_for_beat`]
//! pends forever and the owner is expected to pulse the world itself.
//!
//! # Usage
//!
//! ```ignore
//! let mut heartbeat = Heartbeat::new(HeartbeatConfig::with_rate(10));
//! loop {
//!     let beat = heartbeat.wait_for_beat().await;
//!     world.pulse();
//!     heartbeat.record_fanout_end();
//! }
//! ```

mod config;
mod heartbeat;

pub use config::{HeartbeatConfig, OverrunPolicy};
pub use heartbeat::{Beat, Heartbeat, HeartbeatStats};
