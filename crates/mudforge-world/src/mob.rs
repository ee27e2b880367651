//! Mobs: controllable entities with a FIFO command queue and a pulse loop.
//!
//! The connection layer enqueues [`Action`]s; the mob's own task pops at
//! most one of them per pulse received from the world. A mob moves through
//! [`MobPhase`] in one direction only.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::{mpsc, watch};

use crate::action::{Action, ActionContext};
use crate::error::RegistrationError;
use crate::room::{Occupant, Room};
use crate::world::{Liveness, World, WorldInner};

/// Counter for generating unique mob IDs.
static NEXT_MOB_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// Identity and output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MobId(pub u64);

impl std::fmt::Display for MobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mob-{}", self.0)
    }
}

/// One-way text channel from the world to whoever controls a mob.
///
/// Unbounded: sending never blocks, and text for a vanished reader is
/// silently dropped.
#[derive(Debug, Clone)]
pub struct OutputSink(mpsc::UnboundedSender<String>);

impl OutputSink {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self(sender)
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    /// Returns `false` if the reader is gone.
    pub fn send(&self, text: impl Into<String>) -> bool {
        self.0.send(text.into()).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// A heartbeat tick as delivered to a single mob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub tick: u64,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobPhase {
    /// Created, not yet known to any world.
    Unregistered,
    /// Registered; the loop is starting and the mob is being placed.
    Spawned,
    /// Placed in its start room and receiving pulses.
    Running,
    /// Removed from the world. Terminal.
    Despawned,
}

impl std::fmt::Display for MobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unregistered => write!(f, "Unregistered"),
            Self::Spawned => write!(f, "Spawned"),
            Self::Running => write!(f, "Running"),
            Self::Despawned => write!(f, "Despawned"),
        }
    }
}

/// Phase and location, guarded together so they never disagree.
#[derive(Debug)]
pub(crate) struct Placement {
    pub(crate) phase: MobPhase,
    pub(crate) room: Option<Arc<Room>>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Progress {
    /// Last pulse the loop finished handling.
    pulse: u64,
    finished: bool,
}

// ---------------------------------------------------------------------------
// Mob
// ---------------------------------------------------------------------------

/// Handle to a mob. Cheap to clone; all clones refer to the same mob.
#[derive(Clone)]
pub struct Mob {
    inner: Arc<MobInner>,
}

struct MobInner {
    id: MobId,
    name: Mutex<Arc<str>>,
    sink: OutputSink,
    queue: Mutex<VecDeque<Action>>,
    placement: Mutex<Placement>,
    progress: watch::Sender<Progress>,
}

impl std::fmt::Debug for Mob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mob")
            .field("id", &self.inner.id)
            .field("name", &self.name())
            .field("phase", &self.phase())
            .finish()
    }
}

impl Mob {
    pub fn new(sink: OutputSink) -> Self {
        let id = MobId(NEXT_MOB_ID.fetch_add(1, Ordering::Relaxed));
        let (progress, _) = watch::channel(Progress::default());
        Self {
            inner: Arc::new(MobInner {
                id,
                name: Mutex::new(Arc::from("")),
                sink,
                queue: Mutex::new(VecDeque::new()),
                placement: Mutex::new(Placement {
                    phase: MobPhase::Unregistered,
                    room: None,
                }),
                progress,
            }),
        }
    }

    pub fn id(&self) -> MobId {
        self.inner.id
    }

    pub fn name(&self) -> Arc<str> {
        Arc::clone(&self.inner.name.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn set_name(&self, name: &str) {
        *self.inner.name.lock().unwrap_or_else(PoisonError::into_inner) = Arc::from(name);
    }

    pub fn phase(&self) -> MobPhase {
        self.lock_placement().phase
    }

    pub fn location(&self) -> Option<Arc<Room>> {
        self.lock_placement().room.clone()
    }

    pub fn sink(&self) -> &OutputSink {
        &self.inner.sink
    }

    /// Write a line to this mob's own output.
    pub fn tell(&self, text: impl Into<String>) -> bool {
        self.inner.sink.send(text)
    }

    /// Actions waiting to run.
    pub fn queued(&self) -> usize {
        self.lock_queue().len()
    }

    // -----------------------------------------------------------------------
    // Spawn / despawn
    // -----------------------------------------------------------------------

    /// Name the mob, register it with `world`, start its loop and place it
    /// in the start room.
    ///
    /// On error the mob stays [`MobPhase::Unregistered`], keeps its old
    /// name and may try again, for example under a different name. Must be
    /// called inside a Tokio runtime.
    pub fn spawn(&self, name: &str, world: &World) -> Result<(), RegistrationError> {
        if self.phase() != MobPhase::Unregistered {
            return Err(RegistrationError::AlreadySpawned(self.id()));
        }
        let start = Arc::clone(world.start_room());

        let (pulses, live) = world.enroll(self, name)?;
        {
            let mut placement = self.lock_placement();
            if placement.phase != MobPhase::Unregistered {
                drop(placement);
                world.unregister(self.id());
                return Err(RegistrationError::AlreadySpawned(self.id()));
            }
            placement.phase = MobPhase::Spawned;
        }
        self.set_name(name);

        tokio::spawn(run(self.clone(), world.downgrade(), pulses, live));

        if start.enter(self) {
            let mut placement = self.lock_placement();
            if placement.phase == MobPhase::Spawned {
                placement.phase = MobPhase::Running;
            }
        }

        tracing::info!(mob = %self.id(), name, room = start.name(), "mob spawned");
        Ok(())
    }

    /// Take the mob out of the world for good.
    ///
    /// Removes it from its room, throws away queued actions and unregisters
    /// it, which closes its pulse channel. An action that is executing right
    /// now still finishes. Returns `false` if it was already despawned.
    pub fn despawn(&self, world: &World) -> bool {
        let registered = {
            let mut placement = self.lock_placement();
            let previous = placement.phase;
            if previous == MobPhase::Despawned {
                return false;
            }
            placement.phase = MobPhase::Despawned;
            if let Some(room) = placement.room.take() {
                room.remove_occupant(self.id());
            }
            previous != MobPhase::Unregistered
        };

        let discarded = std::mem::take(&mut *self.lock_queue()).len();
        if registered {
            world.unregister(self.id());
        } else {
            self.mark_finished();
        }

        tracing::info!(mob = %self.id(), name = %self.name(), discarded, "mob despawned");
        true
    }

    // -----------------------------------------------------------------------
    // Command queue
    // -----------------------------------------------------------------------

    /// Append an action. Returns `false` and drops it once despawned.
    pub fn enqueue(&self, action: Action) -> bool {
        let placement = self.lock_placement();
        if placement.phase == MobPhase::Despawned {
            return false;
        }
        self.lock_queue().push_back(action);
        true
    }

    fn pop_action(&self) -> Option<Action> {
        self.lock_queue().pop_front()
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    /// Wait until the loop has handled pulse `tick` (or a later one).
    ///
    /// Returns `false` if the loop ended first.
    pub async fn wait_for_pulse(&self, tick: u64) -> bool {
        let mut rx = self.inner.progress.subscribe();
        match rx.wait_for(|p| p.pulse >= tick || p.finished).await {
            Ok(progress) => progress.pulse >= tick,
            Err(_) => false,
        }
    }

    /// Wait until the mob's loop has ended.
    pub async fn stopped(&self) {
        let mut rx = self.inner.progress.subscribe();
        let _ = rx.wait_for(|p| p.finished).await;
    }

    pub fn is_finished(&self) -> bool {
        self.inner.progress.borrow().finished
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    pub(crate) fn lock_placement(&self) -> MutexGuard<'_, Placement> {
        self.inner
            .placement
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Action>> {
        self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn occupant(&self) -> Occupant {
        Occupant {
            id: self.id(),
            name: self.name(),
            sink: self.inner.sink.clone(),
        }
    }

    /// Final cleanup once the loop has stopped receiving pulses.
    fn retire(&self) {
        {
            let mut placement = self.lock_placement();
            placement.phase = MobPhase::Despawned;
            if let Some(room) = placement.room.take() {
                room.remove_occupant(self.id());
            }
        }
        self.lock_queue().clear();
        self.mark_finished();
    }

    fn mark_finished(&self) {
        self.inner.progress.send_modify(|p| p.finished = true);
    }
}

// ---------------------------------------------------------------------------
// Pulse loop
// ---------------------------------------------------------------------------

/// Runs until the pulse channel closes, the mob leaves the registry, or the
/// world is dropped.
async fn run(
    mob: Mob,
    world: Weak<WorldInner>,
    mut pulses: mpsc::Receiver<Pulse>,
    live: Liveness,
) {
    tracing::debug!(mob = %mob.id(), "mob loop started");

    while let Some(pulse) = pulses.recv().await {
        // Pulses still buffered after despawn or world stop are not acted on.
        if !live.is_live() {
            break;
        }
        let Some(world) = World::upgrade(&world) else {
            break;
        };

        if let Some(action) = mob.pop_action() {
            let ctx = ActionContext {
                world: &world,
                mob: &mob,
                pulse,
            };
            let acted = action.execute(&ctx);
            tracing::trace!(
                mob = %mob.id(),
                tick = pulse.tick,
                action = action.name(),
                acted,
                "action executed"
            );
        }

        mob.inner.progress.send_modify(|p| p.pulse = pulse.tick);
    }

    mob.retire();
    tracing::debug!(mob = %mob.id(), "mob loop stopped");
}
