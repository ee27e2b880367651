//! Per-connection handler: name prompt, spawn, and the input loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Send the greeting and ask for a name until one is accepted
//!   2. Spawn a mob under that name and start a writer task that drains
//!      the mob's output into the connection
//!   3. Loop: parse each line into an action and queue it on the mob
//!   4. On disconnect, quit or world shutdown: despawn and flush output

use std::sync::Arc;

use mudforge_transport::{Connection, TransportError};
use mudforge_world::{Mob, OutputSink, RegistrationError, World};

use crate::MudError;
use crate::server::ServerState;

pub(crate) const NAME_PROMPT: &str = "By what name shall you be known?";
const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 20;

/// Despawns the mob when the handler exits, including by panic.
struct DespawnGuard {
    mob: Mob,
    world: World,
}

impl Drop for DespawnGuard {
    fn drop(&mut self) {
        self.mob.despawn(&self.world);
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Connection>(
    conn: C,
    state: Arc<ServerState>,
) -> Result<(), MudError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    conn.send_line(&state.greeting).await?;

    let (sink, mut output) = OutputSink::channel();
    let mob = Mob::new(sink);
    if !choose_name(&*conn, &mob, &state.world).await? {
        tracing::debug!(%conn_id, "connection closed before spawn");
        return Ok(());
    }
    let guard = DespawnGuard {
        mob: mob.clone(),
        world: state.world.clone(),
    };
    tracing::info!(%conn_id, mob = %mob.id(), name = %mob.name(), "player entered");

    let writer_conn = Arc::clone(&conn);
    let writer = tokio::spawn(async move {
        while let Some(text) = output.recv().await {
            if let Err(e) = writer_conn.send_line(&text).await {
                tracing::debug!(conn_id = %writer_conn.id(), error = %e, "write failed");
                break;
            }
        }
    });

    mob.tell(format!("Welcome, {}!", mob.name()));
    if let Some(room) = mob.location() {
        mob.tell(room.display_for(Some(mob.id())));
        state.world.broadcast_except(
            &format!("{} has entered the world.", mob.name()),
            room.id(),
            mob.id(),
        );
    }

    loop {
        tokio::select! {
            line = conn.recv_line() => match line {
                Ok(Some(line)) => {
                    let room = mob.location();
                    if let Some(action) = state.commands.parse(&line, room.as_deref()) {
                        tracing::trace!(mob = %mob.id(), action = action.name(), "queued");
                        if !mob.enqueue(action) {
                            break;
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!(%conn_id, mob = %mob.id(), "connection closed cleanly");
                    break;
                }
                Err(TransportError::LineTooLong { max }) => {
                    mob.tell(format!("That line is too long (max {max} characters)."));
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
            () = mob.stopped() => {
                tracing::debug!(%conn_id, mob = %mob.id(), "mob stopped");
                break;
            }
        }
    }

    // Every sender of the output channel must be gone before the writer
    // sees the end of it.
    drop(guard);
    mob.stopped().await;
    drop(mob);
    if writer.await.is_err() {
        tracing::debug!(%conn_id, "writer task panicked");
    }
    conn.close().await?;
    Ok(())
}

/// Prompts until `mob` spawns under a valid, free name.
///
/// Returns `false` if the client hung up first.
async fn choose_name<C: Connection>(conn: &C, mob: &Mob, world: &World) -> Result<bool, MudError> {
    loop {
        conn.send_line(NAME_PROMPT).await?;
        let line = match conn.recv_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(false),
            Err(TransportError::LineTooLong { .. }) => {
                conn.send_line("That name is far too long.").await?;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let name = line.trim();
        if let Err(reason) = validate_name(name) {
            conn.send_line(reason).await?;
            continue;
        }

        match mob.spawn(name, world) {
            Ok(()) => return Ok(true),
            Err(RegistrationError::NameTaken(_)) => {
                conn.send_line("That name is already in use.").await?;
            }
            Err(e) => {
                conn.send_line(&e.to_string()).await?;
                return Err(e.into());
            }
        }
    }
}

/// A name is a single word of letters.
pub(crate) fn validate_name(name: &str) -> Result<(), &'static str> {
    let len = name.chars().count();
    if len < MIN_NAME_LEN {
        return Err("That name is too short.");
    }
    if len > MAX_NAME_LEN {
        return Err("That name is far too long.");
    }
    if !name.chars().all(char::is_alphabetic) {
        return Err("A name may only contain letters.");
    }
    Ok(())
}
