//! Line-oriented transports for Mudforge.
//!
//! A MUD speaks in lines of text. The [`Transport`] and [`Connection`]
//! traits hide whether those lines arrive over a raw telnet socket or a
//! WebSocket, so the server can drive both the same way.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
mod line;
mod telnet;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use telnet::{TelnetConnection, TelnetTransport};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Longest line a peer may send before [`TransportError::LineTooLong`].
pub const DEFAULT_MAX_LINE_LEN: usize = 1024;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }

    pub(crate) fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;

    /// The address the listener is bound to.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// A single connection exchanging lines of text with a player.
///
/// Both halves may be used from different tasks at once: one task can sit
/// in [`recv_line`](Self::recv_line) while another writes output.
pub trait Connection: Send + Sync + 'static {
    /// Sends `text` to the peer, terminated by a line break.
    ///
    /// Embedded newlines are kept, so a multi-line room description can
    /// go out in one call.
    fn send_line(&self, text: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next line from the peer, without its line terminator
    /// and with control characters removed.
    ///
    /// Returns `Ok(None)` when the peer has closed the connection.
    fn recv_line(&self) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// The remote address of the peer.
    fn peer_addr(&self) -> SocketAddr;
}
