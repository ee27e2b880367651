//! Integration tests for the telnet transport.
//!
//! A real listener on an OS-assigned port and a plain TCP client.

use mudforge_transport::{Connection, TelnetTransport, Transport, TransportError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

// =========================================================================
// Helpers
// =========================================================================

async fn pair(max_line_len: Option<usize>) -> (TcpStream, mudforge_transport::TelnetConnection) {
    let mut transport = TelnetTransport::bind("127.0.0.1:0").await.expect("should bind");
    if let Some(max) = max_line_len {
        transport = transport.max_line_len(max);
    }
    let addr = transport.local_addr().unwrap();

    let server = tokio::spawn(async move { transport.accept().await.expect("should accept") });
    let client = TcpStream::connect(addr).await.expect("client should connect");
    let conn = server.await.expect("task should complete");
    (client, conn)
}

// =========================================================================
// Lines
// =========================================================================

#[tokio::test]
async fn test_telnet_send_and_receive_lines() {
    let (client, conn) = pair(None).await;
    assert!(conn.id().into_inner() > 0);
    assert!(conn.peer_addr().ip().is_loopback());

    let (read, mut write) = client.into_split();
    let mut lines = BufReader::new(read).lines();

    conn.send_line("|Hall|\n----").await.unwrap();
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("|Hall|"));
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("----"));

    write.write_all(b"look\r\nsay hi\n").await.unwrap();
    assert_eq!(conn.recv_line().await.unwrap().as_deref(), Some("look"));
    assert_eq!(conn.recv_line().await.unwrap().as_deref(), Some("say hi"));
}

#[tokio::test]
async fn test_telnet_recv_returns_none_on_client_close() {
    let (client, conn) = pair(None).await;
    drop(client);
    assert_eq!(conn.recv_line().await.unwrap(), None);
}

#[tokio::test]
async fn test_telnet_line_too_long_then_recovers() {
    let (mut client, conn) = pair(Some(16)).await;
    client
        .write_all(b"this line is far too long for the limit\nwho\n")
        .await
        .unwrap();

    let err = conn.recv_line().await.unwrap_err();
    assert!(matches!(err, TransportError::LineTooLong { max: 16 }));
    assert_eq!(conn.recv_line().await.unwrap().as_deref(), Some("who"));
}

#[tokio::test]
async fn test_telnet_close_ends_client_stream() {
    let (client, conn) = pair(None).await;
    conn.close().await.unwrap();

    let mut lines = BufReader::new(client).lines();
    assert_eq!(lines.next_line().await.unwrap(), None);
}
