//! Plain TCP transport for telnet and MUD clients.

use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::line::{LineReader, to_crlf};
use crate::{Connection, ConnectionId, DEFAULT_MAX_LINE_LEN, Transport, TransportError};

/// A [`Transport`] accepting raw TCP connections.
pub struct TelnetTransport {
    listener: TcpListener,
    max_line_len: usize,
}

impl TelnetTransport {
    /// Binds a listener to `addr`, such as `"0.0.0.0:4000"`.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "telnet transport listening");
        Ok(Self {
            listener,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        })
    }

    /// Sets the longest line accepted from a client.
    pub fn max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max.max(1);
        self
    }
}

impl Transport for TelnetTransport {
    type Connection = TelnetConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "failed to set TCP_NODELAY");
        }

        let (read, write) = stream.into_split();
        let id = ConnectionId::next();
        tracing::debug!(%id, %peer, "accepted telnet connection");

        Ok(TelnetConnection {
            id,
            peer,
            reader: Mutex::new(LineReader::new(read, self.max_line_len)),
            writer: Mutex::new(write),
        })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// One telnet client.
///
/// Reading and writing lock separate halves of the socket.
pub struct TelnetConnection {
    id: ConnectionId,
    peer: SocketAddr,
    reader: Mutex<LineReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
}

impl Connection for TelnetConnection {
    async fn send_line(&self, text: &str) -> Result<(), TransportError> {
        let data = to_crlf(text);
        let mut writer = self.writer.lock().await;
        writer
            .write_all(data.as_bytes())
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv_line(&self) -> Result<Option<String>, TransportError> {
        self.reader.lock().await.read_line().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
