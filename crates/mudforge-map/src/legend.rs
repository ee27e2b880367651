//! Names, descriptions and extra links for map symbols.

use std::collections::BTreeMap;

use mudforge_world::Direction;
use serde::{Deserialize, Serialize};

pub const GENERIC_ROOM_DESCRIPTION: &str = "This is a boring generic room.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSpec {
    pub name: String,
    #[serde(default = "generic_description")]
    pub description: String,
}

fn generic_description() -> String {
    GENERIC_ROOM_DESCRIPTION.to_string()
}

/// A link the grid cannot draw, such as up and down.
///
/// Both symbols must appear exactly once on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub from: char,
    pub direction: Direction,
    pub to: char,
}

/// How to turn map symbols into rooms.
///
/// ```json
/// {
///   "rooms": { "T": { "name": "Town Square", "description": "Busy." } },
///   "links": [ { "from": "T", "direction": "down", "to": "S" } ],
///   "start": "T",
///   "strict": true
/// }
/// ```
///
/// Symbols without an entry become rooms named after the symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Legend {
    pub rooms: BTreeMap<char, RoomSpec>,
    pub links: Vec<LinkSpec>,
    /// Symbol of the start room. Defaults to the first room on the map.
    pub start: Option<char>,
    /// Reject connectors that do not join two rooms instead of ignoring them.
    pub strict: bool,
}

impl Legend {
    pub(crate) fn room_for(&self, symbol: char) -> (String, String) {
        match self.rooms.get(&symbol) {
            Some(spec) => (spec.name.clone(), spec.description.clone()),
            None => (symbol.to_string(), generic_description()),
        }
    }
}
