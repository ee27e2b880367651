//! `MudServer` builder and accept loop.
//!
//! This is the entry point for running a Mudforge world. It ties together
//! all the layers: transport → command table → world.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mudforge_command::CommandTable;
use mudforge_map::MapError;
use mudforge_transport::{TelnetTransport, Transport, WebSocketTransport};
use mudforge_world::{RoomGraph, World};
use tokio::task::JoinSet;

use crate::config::ServerConfig;
use crate::handler::handle_connection;
use crate::MudError;

/// Broadcast to every room just before the world stops.
pub const SHUTDOWN_NOTICE: &str = "The world is shutting down.";

/// How long connections get to flush their output after the world stops.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) world: World,
    pub(crate) commands: CommandTable,
    pub(crate) greeting: String,
}

/// Builder for configuring and starting a Mudforge server.
///
/// # Example
///
/// ```rust,ignore
/// use mudforge::prelude::*;
///
/// let server = MudServer::builder()
///     .config(ServerConfig::load("mudforge.json")?)
///     .graph(graph)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct MudServerBuilder {
    config: ServerConfig,
    graph: Option<RoomGraph>,
    commands: Option<CommandTable>,
}

impl MudServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            graph: None,
            commands: None,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    /// Uses `graph` instead of compiling the configured map file.
    pub fn graph(mut self, graph: RoomGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Replaces the standard command table, for example to add custom
    /// actions. Configured aliases are still applied on top.
    pub fn commands(mut self, commands: CommandTable) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Binds a telnet listener and starts the world.
    pub async fn build(self) -> Result<MudServer<TelnetTransport>, MudError> {
        let transport = TelnetTransport::bind(&self.config.bind)
            .await?
            .max_line_len(self.config.max_line_len);
        self.finish(transport)
    }

    /// Binds a WebSocket listener and starts the world.
    pub async fn build_websocket(self) -> Result<MudServer<WebSocketTransport>, MudError> {
        let transport = WebSocketTransport::bind(&self.config.bind)
            .await?
            .max_line_len(self.config.max_line_len);
        self.finish(transport)
    }

    fn finish<T: Transport>(self, transport: T) -> Result<MudServer<T>, MudError> {
        let graph = match self.graph {
            Some(graph) => graph,
            None => self.config.map.compile()?.ok_or(MapError::NoRooms)?,
        };
        let mut commands = self.commands.unwrap_or_default();
        commands.apply(&self.config.aliases)?;

        let world = World::new(graph, self.config.world.clone());
        world.start();

        let state = Arc::new(ServerState {
            world,
            commands,
            greeting: self.config.greeting,
        });
        Ok(MudServer { transport, state })
    }
}

impl Default for MudServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Mudforge server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct MudServer<T: Transport> {
    transport: T,
    state: Arc<ServerState>,
}

impl MudServer<TelnetTransport> {
    pub fn builder() -> MudServerBuilder {
        MudServerBuilder::new()
    }
}

impl<T: Transport> MudServer<T> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The world this server drives.
    pub fn world(&self) -> &World {
        &self.state.world
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), MudError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then stops the
    /// world. Connected players are told, their mobs are despawned and
    /// their connections close once pending output is flushed. Returns when
    /// every connection has closed, or after [`SHUTDOWN_GRACE`] with the
    /// stragglers aborted.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), MudError> {
        let Self {
            mut transport,
            state,
        } = self;
        tracing::info!(addr = ?transport.local_addr().ok(), "Mudforge server running");
        tokio::pin!(shutdown);
        let mut handlers = JoinSet::new();

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&state);
                        handlers.spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                Some(finished) = handlers.join_next(), if !handlers.is_empty() => {
                    if let Err(e) = finished {
                        tracing::warn!(error = %e, "connection handler panicked");
                    }
                }
            }
        }

        for room in state.world.graph().rooms() {
            state.world.broadcast(SHUTDOWN_NOTICE, room.id());
        }
        state.world.stop();

        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while handlers.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!(remaining = handlers.len(), "connections still open, aborting");
            handlers.abort_all();
        }
        tracing::info!(stats = ?state.world.stats(), "Mudforge server stopped");
        Ok(())
    }
}
