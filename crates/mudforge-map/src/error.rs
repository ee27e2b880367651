//! Error types for the map compiler.

use mudforge_world::{Direction, TopologyError};

/// Errors produced while reading or compiling a text map.
///
/// Line and column numbers are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// No room is reachable from a grid cell in the given direction.
    /// Raised by [`TextMap::neighbor`](crate::TextMap::neighbor).
    #[error("line {line}, column {column}: no room to the {direction}")]
    NoRoomInDirection {
        line: usize,
        column: usize,
        direction: Direction,
    },

    /// A connector that does not join two rooms (strict mode only).
    #[error("line {line}, column {column}: connector {symbol:?} does not join two rooms")]
    DanglingConnector {
        line: usize,
        column: usize,
        symbol: char,
    },

    #[error("the map contains no rooms")]
    NoRooms,

    /// The legend refers to a symbol that is not on the map.
    #[error("symbol {0:?} does not appear on the map")]
    UnknownSymbol(char),

    /// The legend needs a single room for a symbol that appears several times.
    #[error("symbol {0:?} appears more than once on the map")]
    AmbiguousSymbol(char),

    #[error("failed to read map: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}
