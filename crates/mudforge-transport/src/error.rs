/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing to the peer failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading from the peer failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The peer sent more than `max` bytes without a line break.
    #[error("line longer than {max} bytes")]
    LineTooLong { max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_too_long_display_names_limit() {
        let err = TransportError::LineTooLong { max: 512 };
        assert_eq!(err.to_string(), "line longer than 512 bytes");
    }

    #[test]
    fn test_io_variants_keep_source() {
        use std::error::Error;
        let err = TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe",
        ));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("pipe"));
    }
}
