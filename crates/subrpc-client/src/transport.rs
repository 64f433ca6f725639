use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Connection-level failures reported by a transport.
///
/// These are distinct from application errors: an [`ErrorPayload`] rides
/// inside a successfully delivered response, while a `TransportError` means
/// the exchange itself never completed.
///
/// [`ErrorPayload`]: subrpc_common::protocol::ErrorPayload
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("no responder listening on {0}")]
    NoResponders(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("too many pending requests (cap {0})")]
    PendingLimit(usize),
    #[error("transport closed")]
    Closed,
}

/// Request/reply contract the client depends on.
///
/// A transport publishes an opaque envelope to a subject and hands back the
/// single reply. It never inspects the bytes it carries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes the underlying connection. Called once during client
    /// initialization.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Publishes `payload` to `destination` and waits for one reply.
    ///
    /// Implementations report [`TransportError::Timeout`] when no reply
    /// arrives within `timeout`.
    async fn request(
        &self,
        destination: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError>;

    /// Tears down the connection. Requests issued afterwards fail with
    /// [`TransportError::Closed`].
    async fn close(&self) -> Result<(), TransportError>;
}
