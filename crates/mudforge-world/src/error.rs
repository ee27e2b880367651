//! Error types for the world layer.

use crate::graph::RoomId;
use crate::mob::MobId;

/// Why a mob could not obtain a pulse from the world.
///
/// Fatal to the spawn attempt: the mob stays unregistered and its loop is
/// never started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("Unable to register - world is not running.")]
    NotRunning,

    #[error("the name {0} is already taken")]
    NameTaken(String),

    /// The mob is registered already, or has been despawned.
    #[error("mob {0} has already been spawned")]
    AlreadySpawned(MobId),
}

/// A move that the topology does not allow.
///
/// The display text is what the player sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MovementRejected {
    #[error("You are nowhere.")]
    Nowhere,

    #[error("You can't go that way!")]
    NoExit(String),

    #[error("You can't go that way!")]
    Dangling,

    #[error("You are no longer in the world.")]
    Despawned,
}

/// A room graph that cannot be published to a world.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("the room graph has no rooms")]
    NoRooms,

    #[error("room {0} does not exist")]
    UnknownRoom(RoomId),

    #[error("exit {exit:?} of room {room} leads nowhere")]
    DanglingExit { room: String, exit: String },

    #[error("exit {exit:?} of room {room} is not paired back")]
    AsymmetricExit { room: String, exit: String },
}
