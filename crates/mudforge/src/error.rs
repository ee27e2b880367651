//! Unified error type for the Mudforge server.

use mudforge_command::CommandError;
use mudforge_map::MapError;
use mudforge_transport::TransportError;
use mudforge_world::{RegistrationError, TopologyError};

use crate::config::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MudError {
    /// Listening, reading or writing a connection failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A mob could not join the world.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The command table rejected an alias.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The world map failed to load or compile.
    #[error(transparent)]
    Map(#[from] MapError),

    /// A hand-built room graph failed validation.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// The server configuration could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
