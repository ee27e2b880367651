//! The world scheduler: room graph, mob registry and heartbeat.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use mudforge_tick::Heartbeat;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::config::WorldConfig;
use crate::error::{MovementRejected, RegistrationError};
use crate::graph::{RoomGraph, RoomId};
use crate::mob::{Mob, MobId, Pulse};
use crate::room::Room;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Outcome of a single pulse fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseReport {
    pub tick: u64,
    pub delivered: usize,
    /// Mobs whose pulse channel was full; they sit this tick out.
    pub dropped: usize,
    /// Registry entries removed because their mob loop had gone away.
    pub pruned: usize,
}

/// Counters since the world was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub ticks: u64,
    pub pulses_delivered: u64,
    pub pulses_dropped: u64,
    pub registered: usize,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Cleared when the registry lets go of the mob, however that happens.
/// The mob loop reads it on every pulse without touching the world lock.
#[derive(Debug, Clone)]
pub(crate) struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub(crate) fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

struct Entry {
    id: MobId,
    name: Arc<str>,
    pulse: mpsc::Sender<Pulse>,
    live: Liveness,
}

impl Drop for Entry {
    fn drop(&mut self) {
        self.live.0.store(false, Ordering::Release);
    }
}

/// Everything the world lock protects.
struct Registry {
    running: bool,
    tick: u64,
    /// Pulse order.
    entries: Vec<Entry>,
    /// Lowercased name of every registered mob.
    names: HashMap<MobId, String>,
    /// The inverse of `names`.
    owners: HashMap<String, MobId>,
    heartbeat: Option<JoinHandle<()>>,
    stats: WorldStats,
}

impl Registry {
    fn forget(&mut self, id: MobId) {
        if let Some(key) = self.names.remove(&id) {
            self.owners.remove(&key);
        }
    }

    fn clear(&mut self) -> usize {
        let closed = self.entries.len();
        self.entries.clear();
        self.names.clear();
        self.owners.clear();
        self.stats.registered = 0;
        closed
    }
}

pub(crate) struct WorldInner {
    graph: RoomGraph,
    config: WorldConfig,
    registry: Mutex<Registry>,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Handle to a world. Cheap to clone. Independent worlds share nothing but
/// the mob id counter.
#[derive(Clone)]
pub struct World {
    inner: Arc<WorldInner>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("rooms", &self.inner.graph.len())
            .field("running", &self.is_running())
            .field("registered", &self.registered_count())
            .finish()
    }
}

impl World {
    pub fn new(graph: RoomGraph, config: WorldConfig) -> Self {
        Self {
            inner: Arc::new(WorldInner {
                graph,
                config,
                registry: Mutex::new(Registry {
                    running: false,
                    tick: 0,
                    entries: Vec::new(),
                    names: HashMap::new(),
                    owners: HashMap::new(),
                    heartbeat: None,
                    stats: WorldStats::default(),
                }),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<WorldInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<WorldInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Begin accepting registrations and start the heartbeat.
    ///
    /// Returns `false` (and logs a warning) if already running. A stopped
    /// world can be started again. Unless the heartbeat is manual this spawns
    /// a task, so it must be called inside a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut registry = self.registry();
        if registry.running {
            tracing::warn!("world already running, ignoring start");
            return false;
        }
        registry.running = true;

        let heartbeat = &self.inner.config.heartbeat;
        if !heartbeat.is_manual() {
            let beats = Heartbeat::new(heartbeat.clone());
            registry.heartbeat = Some(tokio::spawn(run_heartbeat(self.downgrade(), beats)));
        }

        tracing::info!(
            rooms = self.inner.graph.len(),
            rate_hz = heartbeat.rate_hz,
            "world started"
        );
        true
    }

    /// Stop the heartbeat and close every registered pulse channel.
    ///
    /// Mob loops drain out on their own: queued actions are discarded and an
    /// action already executing completes. Await [`Mob::stopped`] for a
    /// barrier. Returns `false` if the world was not running.
    pub fn stop(&self) -> bool {
        let closed = {
            let mut registry = self.registry();
            if !registry.running {
                return false;
            }
            registry.running = false;
            if let Some(task) = registry.heartbeat.take() {
                task.abort();
            }
            registry.clear()
        };

        tracing::info!(closed, "world stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.registry().running
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Hand `mob` a pulse channel under its current name. Only accepted
    /// while running.
    ///
    /// Names are unique among registered mobs, compared case-insensitively.
    pub fn register(&self, mob: &Mob) -> Result<mpsc::Receiver<Pulse>, RegistrationError> {
        self.enroll(mob, &mob.name()).map(|(pulses, _)| pulses)
    }

    /// Register `mob` as `name` without touching the mob itself.
    pub(crate) fn enroll(
        &self,
        mob: &Mob,
        name: &str,
    ) -> Result<(mpsc::Receiver<Pulse>, Liveness), RegistrationError> {
        let id = mob.id();
        let key = name.to_lowercase();
        let mut registry = self.registry();
        if !registry.running {
            return Err(RegistrationError::NotRunning);
        }
        if registry.names.contains_key(&id) {
            return Err(RegistrationError::AlreadySpawned(id));
        }
        if registry.owners.contains_key(&key) {
            return Err(RegistrationError::NameTaken(name.to_string()));
        }

        let (tx, rx) = mpsc::channel(self.inner.config.pulse_capacity.max(1));
        let live = Liveness(Arc::new(AtomicBool::new(true)));
        registry.entries.push(Entry {
            id,
            name: Arc::from(name),
            pulse: tx,
            live: live.clone(),
        });
        registry.names.insert(id, key.clone());
        registry.owners.insert(key, id);
        let registered = registry.entries.len();
        registry.stats.registered = registered;

        tracing::debug!(mob = %id, name, registered, "mob registered");
        Ok((rx, live))
    }

    /// Drop a mob's pulse sender, closing its channel.
    pub fn unregister(&self, id: MobId) -> bool {
        let mut registry = self.registry();
        if !registry.names.contains_key(&id) {
            return false;
        }
        registry.forget(id);
        if let Some(index) = registry.entries.iter().position(|e| e.id == id) {
            registry.entries.remove(index);
        }
        let registered = registry.entries.len();
        registry.stats.registered = registered;
        true
    }

    pub fn is_registered(&self, id: MobId) -> bool {
        self.registry().names.contains_key(&id)
    }

    pub fn registered_count(&self) -> usize {
        self.registry().entries.len()
    }

    /// Names of registered mobs, in registration order.
    pub fn registered_names(&self) -> Vec<String> {
        self.registry()
            .entries
            .iter()
            .map(|e| e.name.to_string())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Pulses
    // -----------------------------------------------------------------------

    /// Send the next tick to every registered mob, in registration order.
    ///
    /// Never waits: a mob whose channel is full misses this tick. Returns
    /// `None` when the world is not running. The heartbeat task calls this;
    /// worlds with a manual heartbeat call it directly.
    pub fn pulse(&self) -> Option<PulseReport> {
        let mut registry = self.registry();
        if !registry.running {
            return None;
        }
        registry.tick += 1;
        let tick = registry.tick;

        let (mut delivered, mut dropped) = (0, 0);
        let mut gone = Vec::new();
        registry.entries.retain(|entry| match entry.pulse.try_send(Pulse { tick }) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                dropped += 1;
                tracing::debug!(mob = %entry.id, tick, "pulse channel full, tick dropped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                gone.push(entry.id);
                false
            }
        });
        let pruned = gone.len();
        for id in gone {
            registry.forget(id);
        }

        let registered = registry.entries.len();
        let stats = &mut registry.stats;
        stats.ticks += 1;
        stats.pulses_delivered += delivered as u64;
        stats.pulses_dropped += dropped as u64;
        stats.registered = registered;

        Some(PulseReport {
            tick,
            delivered,
            dropped,
            pruned,
        })
    }

    /// Ticks issued so far.
    pub fn tick(&self) -> u64 {
        self.registry().tick
    }

    pub fn stats(&self) -> WorldStats {
        self.registry().stats
    }

    // -----------------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------------

    pub fn graph(&self) -> &RoomGraph {
        &self.inner.graph
    }

    pub fn config(&self) -> &WorldConfig {
        &self.inner.config
    }

    pub fn start_room(&self) -> &Arc<Room> {
        self.inner.graph.start()
    }

    pub fn room(&self, id: RoomId) -> Option<&Arc<Room>> {
        self.inner.graph.room(id)
    }

    /// Deliver `text` to every mob in `room` at this instant.
    pub fn broadcast(&self, text: &str, room: RoomId) -> usize {
        self.room(room).map_or(0, |r| r.emit(text, None))
    }

    /// Like [`broadcast`](Self::broadcast), skipping one mob.
    pub fn broadcast_except(&self, text: &str, room: RoomId, except: MobId) -> usize {
        self.room(room).map_or(0, |r| r.emit(text, Some(except)))
    }

    /// Move `mob` through the exit named `alias` in its current room.
    pub fn move_mob(&self, mob: &Mob, alias: &str) -> Result<Arc<Room>, MovementRejected> {
        let from = mob.location().ok_or(MovementRejected::Nowhere)?;
        let exit = from
            .find_exit(alias)
            .ok_or_else(|| MovementRejected::NoExit(alias.to_string()))?;
        let to = self
            .room(exit.destination())
            .ok_or(MovementRejected::Dangling)?;
        if !to.enter(mob) {
            return Err(MovementRejected::Despawned);
        }
        tracing::trace!(mob = %mob.id(), from = %from.id(), to = %to.id(), "mob moved");
        Ok(Arc::clone(to))
    }
}

// ---------------------------------------------------------------------------
// Heartbeat task
// ---------------------------------------------------------------------------

async fn run_heartbeat(world: Weak<WorldInner>, mut heartbeat: Heartbeat) {
    tracing::debug!(rate_hz = heartbeat.rate_hz(), "heartbeat started");
    loop {
        let beat = heartbeat.wait_for_beat().await;
        let Some(world) = World::upgrade(&world) else {
            break;
        };
        let Some(report) = world.pulse() else {
            break;
        };
        heartbeat.record_fanout_end();

        if report.dropped > 0 {
            tracing::warn!(tick = report.tick, dropped = report.dropped, "mobs missed a pulse");
        }
        tracing::trace!(
            beat = beat.number,
            tick = report.tick,
            delivered = report.delivered,
            "pulse sent"
        );
    }
    tracing::debug!("heartbeat stopped");
}
