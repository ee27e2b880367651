//! Rooms: fixed exits plus a lock-protected occupant list.
//!
//! Every membership change goes through [`Room::enter`] or [`Room::leave`],
//! which update the mob's location under the same locks, so a mob's
//! location and the occupant lists always agree.
//!
//! Lock order: a mob's placement lock first, then room locks in ascending
//! [`RoomId`] order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::graph::{Exit, RoomId};
use crate::mob::{Mob, MobId, MobPhase, OutputSink};

/// A mob as seen from inside a room.
#[derive(Debug, Clone)]
pub struct Occupant {
    pub id: MobId,
    pub name: Arc<str>,
    pub sink: OutputSink,
}

#[derive(Debug)]
pub struct Room {
    id: RoomId,
    name: String,
    description: String,
    exits: Vec<Exit>,
    occupants: Mutex<Vec<Occupant>>,
}

impl Room {
    pub(crate) fn new(id: RoomId, name: String, description: String, exits: Vec<Exit>) -> Self {
        Self {
            id,
            name,
            description,
            exits,
            occupants: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn exits(&self) -> &[Exit] {
        &self.exits
    }

    /// Case-insensitive exit lookup by any of its aliases.
    pub fn find_exit(&self, alias: &str) -> Option<&Exit> {
        self.exits.iter().find(|e| e.matches(alias))
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Put `mob` in this room and make it the mob's location.
    ///
    /// A mob already in another room is moved in one step: both rooms are
    /// locked together, so no observer sees it in neither or in both.
    /// Entering the current room again changes nothing. Returns `false`
    /// for a mob that was never spawned or has been despawned.
    pub fn enter(self: &Arc<Self>, mob: &Mob) -> bool {
        let mut placement = mob.lock_placement();
        if matches!(placement.phase, MobPhase::Unregistered | MobPhase::Despawned) {
            return false;
        }

        match placement.room.as_ref() {
            Some(current) if current.id == self.id => return true,
            Some(current) => {
                let (mut from, mut to) = lock_pair(current, self);
                remove_first(&mut from, mob.id());
                to.push(mob.occupant());
            }
            None => self.lock_occupants().push(mob.occupant()),
        }
        placement.room = Some(Arc::clone(self));

        tracing::trace!(mob = %mob.id(), room = %self.id, "entered room");
        true
    }

    /// Remove `mob` from this room. Absent mobs are not an error.
    pub fn leave(&self, mob: &Mob) -> bool {
        let mut placement = mob.lock_placement();
        self.remove_occupant(mob.id());
        if placement.room.as_ref().is_some_and(|r| r.id == self.id) {
            placement.room = None;
        }
        true
    }

    /// Drop an occupant entry. Callers hold the mob's placement lock.
    pub(crate) fn remove_occupant(&self, id: MobId) -> bool {
        remove_first(&mut self.lock_occupants(), id)
    }

    pub(crate) fn lock_occupants(&self) -> MutexGuard<'_, Vec<Occupant>> {
        self.occupants.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, id: MobId) -> bool {
        self.lock_occupants().iter().any(|o| o.id == id)
    }

    pub fn occupant_count(&self) -> usize {
        self.lock_occupants().len()
    }

    pub fn occupant_names(&self) -> Vec<String> {
        self.lock_occupants()
            .iter()
            .map(|o| o.name.to_string())
            .collect()
    }

    /// Output sinks of everyone in the room right now.
    pub fn broadcast_targets(&self) -> Vec<OutputSink> {
        self.lock_occupants()
            .iter()
            .map(|o| o.sink.clone())
            .collect()
    }

    /// Send `text` to every occupant except `except`.
    ///
    /// Delivery happens while the occupant list is locked, so the recipients
    /// are exactly the occupants at that instant. Sinks never block.
    pub(crate) fn emit(&self, text: &str, except: Option<MobId>) -> usize {
        let occupants = self.lock_occupants();
        let mut delivered = 0;
        for occupant in occupants.iter().filter(|o| Some(o.id) != except) {
            if occupant.sink.send(text) {
                delivered += 1;
            }
        }
        delivered
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    pub fn list_exits(&self) -> String {
        if self.exits.is_empty() {
            return "You can't see any exits.".to_string();
        }
        let names: Vec<&str> = self.exits.iter().map(Exit::primary_name).collect();
        format!("Visible Exits: {}", names.join(", "))
    }

    /// Full render: header, description, occupants, exits.
    pub fn display(&self) -> String {
        self.display_for(None)
    }

    /// Like [`display`](Self::display) but leaves `viewer` out of the
    /// occupant list.
    pub fn display_for(&self, viewer: Option<MobId>) -> String {
        let mut out = format!(
            "|{}|\n----\n{}\n----\n",
            self.name, self.description
        );

        let others: Vec<Arc<str>> = self
            .lock_occupants()
            .iter()
            .filter(|o| Some(o.id) != viewer)
            .map(|o| Arc::clone(&o.name))
            .collect();
        if !others.is_empty() {
            out.push_str("You see:\n");
            for name in others {
                out.push_str("- ");
                out.push_str(&name);
                out.push('\n');
            }
        }

        out.push_str(&self.list_exits());
        out
    }
}

fn remove_first(occupants: &mut Vec<Occupant>, id: MobId) -> bool {
    match occupants.iter().position(|o| o.id == id) {
        Some(index) => {
            occupants.remove(index);
            true
        }
        None => false,
    }
}

/// Lock two distinct rooms in ascending id order, returned as (from, to).
fn lock_pair<'a>(
    from: &'a Room,
    to: &'a Room,
) -> (MutexGuard<'a, Vec<Occupant>>, MutexGuard<'a, Vec<Occupant>>) {
    if from.id < to.id {
        let first = from.lock_occupants();
        (first, to.lock_occupants())
    } else {
        let first = to.lock_occupants();
        (from.lock_occupants(), first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, RoomGraph, RoomGraphBuilder};

    fn graph() -> RoomGraph {
        let mut builder = RoomGraphBuilder::new();
        let a = builder.add_room("Hall", "A long hall.");
        let b = builder.add_room("Yard", "An empty yard.");
        builder.connect_direction(a, Direction::North, b).unwrap();
        builder.build().unwrap()
    }

    fn mob(name: &str) -> (Mob, tokio::sync::mpsc::UnboundedReceiver<String>) {
        let (sink, rx) = OutputSink::channel();
        let mob = Mob::new(sink);
        mob.set_name(name);
        mob.lock_placement().phase = MobPhase::Running;
        (mob, rx)
    }

    #[test]
    fn test_enter_refuses_unspawned_and_despawned_mobs() {
        let graph = graph();
        let hall = &graph.rooms()[0];
        let (sink, _rx) = OutputSink::channel();
        let ghost = Mob::new(sink);

        assert!(!hall.enter(&ghost));
        assert!(ghost.location().is_none());
        assert_eq!(hall.occupant_count(), 0);

        let (al, _al_rx) = mob("Al");
        al.lock_placement().phase = MobPhase::Despawned;
        assert!(!hall.enter(&al));
        assert_eq!(hall.emit("anyone?", None), 0);
    }

    #[test]
    fn test_enter_sets_location_and_membership_once() {
        let graph = graph();
        let hall = &graph.rooms()[0];
        let (al, _rx) = mob("Al");

        assert!(hall.enter(&al));
        assert!(hall.enter(&al));
        assert_eq!(al.location().map(|r| r.id()), Some(hall.id()));
        assert_eq!(hall.occupant_count(), 1);
    }

    #[test]
    fn test_enter_other_room_moves() {
        let graph = graph();
        let (hall, yard) = (&graph.rooms()[0], &graph.rooms()[1]);
        let (al, _rx) = mob("Al");

        hall.enter(&al);
        yard.enter(&al);
        assert!(!hall.contains(al.id()));
        assert!(yard.contains(al.id()));
        assert_eq!(al.location().map(|r| r.id()), Some(yard.id()));
    }

    #[test]
    fn test_leave_is_idempotent() {
        let graph = graph();
        let hall = &graph.rooms()[0];
        let (al, _rx) = mob("Al");

        hall.enter(&al);
        assert!(hall.leave(&al));
        assert!(hall.leave(&al));
        assert!(!hall.contains(al.id()));
        assert!(al.location().is_none());
    }

    #[test]
    fn test_leave_other_room_keeps_location() {
        let graph = graph();
        let (hall, yard) = (&graph.rooms()[0], &graph.rooms()[1]);
        let (al, _rx) = mob("Al");

        hall.enter(&al);
        yard.leave(&al);
        assert_eq!(al.location().map(|r| r.id()), Some(hall.id()));
        assert!(hall.contains(al.id()));
    }

    #[test]
    fn test_emit_skips_excluded_occupant() {
        let graph = graph();
        let hall = &graph.rooms()[0];
        let (al, mut al_rx) = mob("Al");
        let (bo, mut bo_rx) = mob("Bo");
        hall.enter(&al);
        hall.enter(&bo);

        assert_eq!(hall.emit("hello", Some(al.id())), 1);
        assert_eq!(bo_rx.try_recv().unwrap(), "hello");
        assert!(al_rx.try_recv().is_err());
        assert_eq!(hall.broadcast_targets().len(), 2);
    }

    #[test]
    fn test_list_exits_renders_primary_names() {
        let graph = graph();
        assert_eq!(graph.rooms()[0].list_exits(), "Visible Exits: north");

        let mut builder = RoomGraphBuilder::new();
        builder.add_room("Cell", "Bare walls.");
        let lonely = builder.build().unwrap();
        assert_eq!(lonely.rooms()[0].list_exits(), "You can't see any exits.");
    }

    #[test]
    fn test_display_lists_others_not_viewer() {
        let graph = graph();
        let hall = &graph.rooms()[0];
        let (al, _a) = mob("Al");
        let (bo, _b) = mob("Bo");
        hall.enter(&al);
        hall.enter(&bo);

        let text = hall.display_for(Some(al.id()));
        assert!(text.starts_with("|Hall|\n----\nA long hall.\n----\n"));
        assert!(text.contains("You see:\n- Bo\n"));
        assert!(!text.contains("- Al"));
        assert!(text.ends_with("Visible Exits: north"));

        assert!(hall.display().contains("- Al"));
    }
}
