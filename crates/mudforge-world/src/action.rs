//! Actions: what a mob can be told to do, and how each one runs.
//!
//! Actions run on the mob's own loop, one per pulse. They never fail; every
//! problem is reported to the player as text and the action returns
//! `false`.

use std::sync::Arc;

use crate::mob::{Mob, Pulse};
use crate::world::World;

/// Everything an executing action may touch.
pub struct ActionContext<'a> {
    pub world: &'a World,
    pub mob: &'a Mob,
    pub pulse: Pulse,
}

/// Signature of a user-defined action. The `&str` is the argument text.
pub type ActionFn = dyn Fn(&ActionContext<'_>, &str) -> bool + Send + Sync;

/// A named action supplied by the embedding application.
#[derive(Clone)]
pub struct CustomAction {
    name: Arc<str>,
    args: String,
    run: Arc<ActionFn>,
}

impl CustomAction {
    pub fn new(
        name: &str,
        args: impl Into<String>,
        run: impl Fn(&ActionContext<'_>, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name),
            args: args.into(),
            run: Arc::new(run),
        }
    }

    /// Rebind a shared handler to new argument text.
    pub fn from_shared(name: Arc<str>, args: impl Into<String>, run: Arc<ActionFn>) -> Self {
        Self {
            name,
            args: args.into(),
            run,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &str {
        &self.args
    }
}

impl std::fmt::Debug for CustomAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomAction")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    /// Describe the current room.
    Look,
    /// List the current room's exits.
    Exits,
    /// Leave through the named exit.
    Move { exit: String },
    /// Speak to the room.
    Say(String),
    /// List everyone in the world.
    Who,
    /// Leave the world.
    Quit,
    /// Input nobody understood; carries the original text.
    Unrecognized(String),
    Custom(CustomAction),
}

impl Action {
    pub fn name(&self) -> &str {
        match self {
            Self::Look => "look",
            Self::Exits => "exits",
            Self::Move { .. } => "move",
            Self::Say(_) => "say",
            Self::Who => "who",
            Self::Quit => "quit",
            Self::Unrecognized(_) => "unrecognized",
            Self::Custom(custom) => custom.name(),
        }
    }

    /// Run the action. Returns whether it did anything.
    pub fn execute(&self, ctx: &ActionContext<'_>) -> bool {
        match self {
            Self::Look => look(ctx),
            Self::Exits => exits(ctx),
            Self::Move { exit } => walk(ctx, exit),
            Self::Say(text) => say(ctx, text),
            Self::Who => {
                let names = ctx.world.registered_names();
                ctx.mob.tell(format!("Players online ({}): {}", names.len(), names.join(", ")))
            }
            Self::Quit => quit(ctx),
            Self::Unrecognized(_) => {
                ctx.mob.tell("I don't know how to do that!");
                false
            }
            Self::Custom(custom) => (custom.run)(ctx, custom.args()),
        }
    }
}

fn look(ctx: &ActionContext<'_>) -> bool {
    match ctx.mob.location() {
        Some(room) => ctx.mob.tell(room.display_for(Some(ctx.mob.id()))),
        None => {
            ctx.mob.tell("You are nowhere.");
            false
        }
    }
}

fn exits(ctx: &ActionContext<'_>) -> bool {
    match ctx.mob.location() {
        Some(room) => ctx.mob.tell(room.list_exits()),
        None => {
            ctx.mob.tell("You are nowhere.");
            false
        }
    }
}

fn walk(ctx: &ActionContext<'_>, exit: &str) -> bool {
    let (world, mob) = (ctx.world, ctx.mob);
    let from = mob.location();

    match world.move_mob(mob, exit) {
        Ok(to) => {
            let name = mob.name();
            if let Some(from) = from {
                let way = from.find_exit(exit).map_or(exit, |e| e.primary_name());
                world.broadcast(&format!("{name} leaves {way}."), from.id());
            }
            world.broadcast_except(&format!("{name} arrives."), to.id(), mob.id());
            mob.tell(to.display_for(Some(mob.id())));
            true
        }
        Err(rejected) => {
            tracing::trace!(mob = %mob.id(), exit, %rejected, "move rejected");
            mob.tell(rejected.to_string());
            false
        }
    }
}

fn say(ctx: &ActionContext<'_>, text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        ctx.mob.tell("Say what?");
        return false;
    }
    let Some(room) = ctx.mob.location() else {
        ctx.mob.tell("You are nowhere.");
        return false;
    };
    ctx.mob.tell(format!("You say, \"{text}\""));
    ctx.world.broadcast_except(
        &format!("{} says, \"{text}\"", ctx.mob.name()),
        room.id(),
        ctx.mob.id(),
    );
    true
}

fn quit(ctx: &ActionContext<'_>) -> bool {
    ctx.mob.tell("Goodbye!");
    if let Some(room) = ctx.mob.location() {
        ctx.world.broadcast_except(
            &format!("{} leaves the world.", ctx.mob.name()),
            room.id(),
            ctx.mob.id(),
        );
    }
    ctx.mob.despawn(ctx.world)
}
