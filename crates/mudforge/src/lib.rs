//! # Mudforge
//!
//! A tick-driven multiplayer text world server.
//!
//! Players connect over telnet (or WebSocket), pick a name and get a mob in
//! the world's start room. Every line they type becomes an action on their
//! mob's queue, and the world heartbeat lets each mob run one action per
//! pulse.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mudforge::prelude::*;
//!
//! # async fn start() -> Result<(), MudError> {
//! let mut rooms = RoomGraphBuilder::new();
//! let hall = rooms.add_room("Hall", "A long hall.");
//! let yard = rooms.add_room("Yard", "Grass, mostly.");
//! rooms.connect_direction(hall, Direction::North, yard)?;
//!
//! let server = MudServer::builder()
//!     .bind("0.0.0.0:4000")
//!     .graph(rooms.build()?)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{ConfigError, MapConfig, ServerConfig, TransportKind};
pub use error::MudError;
pub use server::{MudServer, MudServerBuilder, SHUTDOWN_GRACE, SHUTDOWN_NOTICE};

/// Installs a `tracing` subscriber that honours `RUST_LOG` and defaults to
/// `info`. Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub mod prelude {
    pub use crate::{
        MapConfig, MudError, MudServer, MudServerBuilder, ServerConfig, TransportKind,
        init_tracing,
    };
    pub use mudforge_command::{AliasConfig, CommandTable};
    pub use mudforge_map::{Legend, TextMap, compile};
    pub use mudforge_tick::{HeartbeatConfig, OverrunPolicy};
    pub use mudforge_world::{
        Action, ActionContext, Direction, Mob, OutputSink, Room, RoomGraph, RoomGraphBuilder,
        World, WorldConfig,
    };
}
