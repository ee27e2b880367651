//! Room graph: the immutable topology a world is built on.
//!
//! Exits are half-links. Each one points at its paired exit in the
//! destination room, so "A north to B" always has a "B south to A". The
//! builder tolerates unpaired exits while the graph is being assembled;
//! [`RoomGraphBuilder::build`] refuses to publish one.

use std::sync::Arc;

use crate::direction::Direction;
use crate::error::TopologyError;
use crate::mob::MobId;
use crate::room::Room;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Index of a room inside its graph. Also the global lock order for rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(pub u32);

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "room-{}", self.0)
    }
}

impl RoomId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position of an exit: the room it belongs to and its slot in that room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitRef {
    pub room: RoomId,
    pub index: usize,
}

// ---------------------------------------------------------------------------
// Exit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Exit {
    names: Vec<String>,
    owner: RoomId,
    pair: ExitRef,
}

impl Exit {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// First alias, or `"Void"` for an exit without names.
    pub fn primary_name(&self) -> &str {
        self.names.first().map_or("Void", String::as_str)
    }

    pub fn owner(&self) -> RoomId {
        self.owner
    }

    /// The exit leading back.
    pub fn pair(&self) -> ExitRef {
        self.pair
    }

    pub fn destination(&self) -> RoomId {
        self.pair.room
    }

    pub fn matches(&self, alias: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(alias))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct PendingRoom {
    name: String,
    description: String,
    exits: Vec<PendingExit>,
}

#[derive(Debug)]
struct PendingExit {
    names: Vec<String>,
    pair: Option<ExitRef>,
}

/// Assembles rooms and exits, then validates them into a [`RoomGraph`].
#[derive(Debug, Default)]
pub struct RoomGraphBuilder {
    rooms: Vec<PendingRoom>,
    start: Option<RoomId>,
}

impl RoomGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_room(&mut self, name: impl Into<String>, description: impl Into<String>) -> RoomId {
        let id = RoomId(self.rooms.len() as u32);
        self.rooms.push(PendingRoom {
            name: name.into(),
            description: description.into(),
            exits: Vec::new(),
        });
        id
    }

    /// Add an unpaired exit to `room`. It must be linked before [`build`](Self::build).
    pub fn add_exit<S: Into<String>>(
        &mut self,
        room: RoomId,
        names: impl IntoIterator<Item = S>,
    ) -> Result<ExitRef, TopologyError> {
        let pending = self
            .rooms
            .get_mut(room.index())
            .ok_or(TopologyError::UnknownRoom(room))?;
        pending.exits.push(PendingExit {
            names: names.into_iter().map(Into::into).collect(),
            pair: None,
        });
        Ok(ExitRef {
            room,
            index: pending.exits.len() - 1,
        })
    }

    /// Pair two exits with each other. Re-linking an exit overwrites its
    /// previous pairing; the abandoned partner then fails validation.
    pub fn link(&mut self, a: ExitRef, b: ExitRef) -> Result<(), TopologyError> {
        self.exit_mut(a)?;
        self.exit_mut(b)?.pair = Some(a);
        self.exit_mut(a)?.pair = Some(b);
        Ok(())
    }

    /// Create a paired exit between two rooms.
    pub fn connect<S: Into<String>, T: Into<String>>(
        &mut self,
        from: RoomId,
        names: impl IntoIterator<Item = S>,
        to: RoomId,
        back_names: impl IntoIterator<Item = T>,
    ) -> Result<(), TopologyError> {
        if to.index() >= self.rooms.len() {
            return Err(TopologyError::UnknownRoom(to));
        }
        let out = self.add_exit(from, names)?;
        let back = self.add_exit(to, back_names)?;
        self.link(out, back)
    }

    /// Connect `from` to `to` in `direction`, and `to` back in the opposite one.
    pub fn connect_direction(
        &mut self,
        from: RoomId,
        direction: Direction,
        to: RoomId,
    ) -> Result<(), TopologyError> {
        self.connect(from, direction.aliases(), to, direction.opposite().aliases())
    }

    /// Where newly spawned mobs appear. Defaults to the first room added.
    pub fn set_start(&mut self, room: RoomId) -> Result<(), TopologyError> {
        if room.index() >= self.rooms.len() {
            return Err(TopologyError::UnknownRoom(room));
        }
        self.start = Some(room);
        Ok(())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn build(self) -> Result<RoomGraph, TopologyError> {
        if self.rooms.is_empty() {
            return Err(TopologyError::NoRooms);
        }

        for (index, room) in self.rooms.iter().enumerate() {
            for (slot, exit) in room.exits.iter().enumerate() {
                let here = ExitRef {
                    room: RoomId(index as u32),
                    index: slot,
                };
                let describe = || (room.name.clone(), exit_label(exit));
                let Some(pair) = exit.pair else {
                    let (room, exit) = describe();
                    return Err(TopologyError::DanglingExit { room, exit });
                };
                let back = self
                    .rooms
                    .get(pair.room.index())
                    .and_then(|r| r.exits.get(pair.index))
                    .and_then(|e| e.pair);
                if back != Some(here) {
                    let (room, exit) = describe();
                    return Err(TopologyError::AsymmetricExit { room, exit });
                }
            }
        }

        let start = self.start.unwrap_or(RoomId(0));
        let rooms = self
            .rooms
            .into_iter()
            .enumerate()
            .map(|(index, pending)| {
                let id = RoomId(index as u32);
                let exits = pending
                    .exits
                    .into_iter()
                    .filter_map(|e| {
                        e.pair.map(|pair| Exit {
                            names: e.names,
                            owner: id,
                            pair,
                        })
                    })
                    .collect();
                Arc::new(Room::new(id, pending.name, pending.description, exits))
            })
            .collect();

        Ok(RoomGraph { rooms, start })
    }

    fn exit_mut(&mut self, at: ExitRef) -> Result<&mut PendingExit, TopologyError> {
        self.rooms
            .get_mut(at.room.index())
            .ok_or(TopologyError::UnknownRoom(at.room))?
            .exits
            .get_mut(at.index)
            .ok_or(TopologyError::UnknownRoom(at.room))
    }
}

fn exit_label(exit: &PendingExit) -> String {
    exit.names.first().cloned().unwrap_or_else(|| "Void".to_string())
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A validated, immutable set of rooms. Only occupancy changes after build.
#[derive(Debug)]
pub struct RoomGraph {
    rooms: Vec<Arc<Room>>,
    start: RoomId,
}

impl RoomGraph {
    pub fn room(&self, id: RoomId) -> Option<&Arc<Room>> {
        self.rooms.get(id.index())
    }

    pub fn rooms(&self) -> &[Arc<Room>] {
        &self.rooms
    }

    pub fn start(&self) -> &Arc<Room> {
        &self.rooms[self.start.index()]
    }

    pub fn start_id(&self) -> RoomId {
        self.start
    }

    /// Case-insensitive lookup by room name.
    pub fn find(&self, name: &str) -> Option<&Arc<Room>> {
        self.rooms.iter().find(|r| r.name().eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Occupants of every room, captured atomically across the whole graph.
    ///
    /// Room locks are taken in ascending id order, the same order movement
    /// uses, so the snapshot never shows a mob mid-move.
    pub fn census(&self) -> Vec<(RoomId, Vec<MobId>)> {
        let guards: Vec<_> = self.rooms.iter().map(|r| r.lock_occupants()).collect();
        self.rooms
            .iter()
            .zip(guards.iter())
            .map(|(room, occupants)| (room.id(), occupants.iter().map(|o| o.id).collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_rooms() -> (RoomGraphBuilder, RoomId, RoomId) {
        let mut builder = RoomGraphBuilder::new();
        let a = builder.add_room("A", "First room.");
        let b = builder.add_room("B", "Second room.");
        (builder, a, b)
    }

    #[test]
    fn test_build_empty_graph_fails() {
        let err = RoomGraphBuilder::new().build().unwrap_err();
        assert_eq!(err, TopologyError::NoRooms);
    }

    #[test]
    fn test_connect_direction_creates_symmetric_pair() {
        let (mut builder, a, b) = two_rooms();
        builder.connect_direction(a, Direction::North, b).unwrap();
        let graph = builder.build().unwrap();

        let north = graph.room(a).unwrap().find_exit("N").unwrap();
        assert_eq!(north.destination(), b);
        assert_eq!(north.primary_name(), "north");

        let south = graph.room(b).unwrap().find_exit("south").unwrap();
        assert_eq!(south.destination(), a);
        assert_eq!(south.pair(), ExitRef { room: a, index: 0 });
    }

    #[test]
    fn test_build_rejects_dangling_exit() {
        let (mut builder, a, _) = two_rooms();
        builder.add_exit(a, ["portal"]).unwrap();
        let err = builder.build().unwrap_err();
        assert_eq!(
            err,
            TopologyError::DanglingExit {
                room: "A".into(),
                exit: "portal".into()
            }
        );
    }

    #[test]
    fn test_build_rejects_asymmetric_exit() {
        let (mut builder, a, b) = two_rooms();
        let c = builder.add_room("C", "Third room.");
        let out = builder.add_exit(a, ["door"]).unwrap();
        let back_b = builder.add_exit(b, ["door"]).unwrap();
        let back_c = builder.add_exit(c, ["door"]).unwrap();
        builder.link(out, back_b).unwrap();
        builder.link(out, back_c).unwrap();

        let err = builder.build().unwrap_err();
        assert!(matches!(err, TopologyError::AsymmetricExit { ref room, .. } if room == "B"));
    }

    #[test]
    fn test_connect_to_unknown_room_fails() {
        let (mut builder, a, _) = two_rooms();
        let err = builder
            .connect_direction(a, Direction::East, RoomId(9))
            .unwrap_err();
        assert_eq!(err, TopologyError::UnknownRoom(RoomId(9)));
        // Nothing half-built was left behind.
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_start_defaults_to_first_room() {
        let (builder, a, _) = two_rooms();
        let graph = builder.build().unwrap();
        assert_eq!(graph.start_id(), a);
        assert_eq!(graph.start().name(), "A");
    }

    #[test]
    fn test_set_start_and_find() {
        let (mut builder, _, b) = two_rooms();
        builder.set_start(b).unwrap();
        assert!(builder.set_start(RoomId(5)).is_err());
        let graph = builder.build().unwrap();
        assert_eq!(graph.start_id(), b);
        assert_eq!(graph.find("a").map(|r| r.id()), Some(RoomId(0)));
        assert!(graph.find("nowhere").is_none());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_exit_without_names_is_void() {
        let (mut builder, a, b) = two_rooms();
        builder
            .connect(a, Vec::<String>::new(), b, ["back"])
            .unwrap();
        let graph = builder.build().unwrap();
        assert_eq!(graph.room(a).unwrap().exits()[0].primary_name(), "Void");
    }
}
