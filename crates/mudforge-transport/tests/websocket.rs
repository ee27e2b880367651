//! Integration tests for the WebSocket transport.
//!
//! These spin up a real server on an OS-assigned port and talk to it with
//! a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use mudforge_transport::{Connection, Transport, TransportError, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn pair(max_line_len: usize) -> (Client, mudforge_transport::WebSocketConnection) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind")
            .max_line_len(max_line_len);
        let addr = transport.local_addr().unwrap();

        let server = tokio::spawn(async move { transport.accept().await.expect("should accept") });
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        (client, server.await.expect("task should complete"))
    }

    #[tokio::test]
    async fn test_websocket_lines_are_text_messages() {
        let (mut client, conn) = pair(256).await;

        conn.send_line("Visible Exits: north\n").await.unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), "Visible Exits: north");

        client.send(Message::text("say hello\r\n")).await.unwrap();
        assert_eq!(conn.recv_line().await.unwrap().as_deref(), Some("say hello"));

        client.send(Message::binary(b"look".to_vec())).await.unwrap();
        assert_eq!(conn.recv_line().await.unwrap().as_deref(), Some("look"));

        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_websocket_rejects_long_message() {
        let (mut client, conn) = pair(4).await;
        client.send(Message::text("far too long")).await.unwrap();
        assert!(matches!(
            conn.recv_line().await,
            Err(TransportError::LineTooLong { max: 4 })
        ));
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (mut client, conn) = pair(256).await;
        client.send(Message::Close(None)).await.unwrap();
        assert_eq!(conn.recv_line().await.expect("recv should not error"), None);
    }
}
