//! Rooms, mobs and the tick-driven world scheduler for Mudforge.
//!
//! A [`World`] owns an immutable [`RoomGraph`] and a registry of mob pulse
//! channels. Its heartbeat sends each registered [`Mob`] a [`Pulse`]; on
//! every pulse a mob runs at most one queued [`Action`], in the order the
//! actions were enqueued.
//!
//! # Key types
//!
//! - [`RoomGraphBuilder`] / [`RoomGraph`]: validated topology
//! - [`Room`]: occupant list behind a per-room lock
//! - [`Mob`]: command queue and pulse loop
//! - [`World`]: registration, broadcast, heartbeat, shutdown
//! - [`Action`]: the things a mob can be told to do
//!
//! # Locking
//!
//! Mob placement lock, then room locks in ascending [`RoomId`] order. The
//! world registry lock is never held while taking either.

mod action;
mod config;
mod direction;
mod error;
mod graph;
mod mob;
mod room;
mod world;

pub use action::{Action, ActionContext, ActionFn, CustomAction};
pub use config::WorldConfig;
pub use direction::Direction;
pub use error::{MovementRejected, RegistrationError, TopologyError};
pub use graph::{Exit, ExitRef, RoomGraph, RoomGraphBuilder, RoomId};
pub use mob::{Mob, MobId, MobPhase, OutputSink, Pulse};
pub use room::{Occupant, Room};
pub use world::{PulseReport, World, WorldStats};
