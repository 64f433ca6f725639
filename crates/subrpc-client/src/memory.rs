//! In-process message bus and the [`Transport`] that rides on it.
//!
//! The bus gives tests and single-process demos a real request/reply broker
//! without any sockets: handlers subscribe to subjects, transports publish to
//! them and await the reply. Timeouts, missing responders, pending-message
//! caps, and closed connections all behave like their networked equivalents.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, oneshot};
use tracing::debug;

use crate::config::TransportConfig;
use crate::transport::{Transport, TransportError};

type Handler = Arc<dyn Fn(Vec<u8>) -> Pin<Box<dyn Future<Output = Vec<u8>> + Send>> + Send + Sync>;

/// Subject-addressed request/reply bus shared by transports and handlers.
#[derive(Clone, Default)]
pub struct MemoryBus {
    handlers: Arc<RwLock<HashMap<String, Handler>>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` as the responder for `subject`, replacing any
    /// previous one.
    pub fn subscribe<F, Fut>(&self, subject: impl Into<String>, handler: F)
    where
        F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<u8>> + Send + 'static,
    {
        let subject = subject.into();
        debug!(subject = %subject, "subscribing responder");
        let handler: Handler = Arc::new(move |payload| Box::pin(handler(payload)));
        self.handlers.write().unwrap().insert(subject, handler);
    }

    /// Drops the responder for `subject`.
    pub fn unsubscribe(&self, subject: &str) {
        self.handlers.write().unwrap().remove(subject);
    }

    fn responder(&self, subject: &str) -> Option<Handler> {
        self.handlers.read().unwrap().get(subject).cloned()
    }
}

/// [`Transport`] implementation backed by a [`MemoryBus`].
pub struct MemoryTransport {
    bus: MemoryBus,
    max_pending: usize,
    pending: AtomicUsize,
    closed: AtomicBool,
    close_signal: Notify,
}

impl MemoryTransport {
    pub fn new(bus: MemoryBus, config: &TransportConfig) -> Self {
        Self {
            bus,
            max_pending: config.max_pending_msgs,
            pending: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            close_signal: Notify::new(),
        }
    }

    /// Requests currently waiting on a reply.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> (Self, usize) {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        (Self(counter), now)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    async fn request(
        &self,
        destination: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        let Some(handler) = self.bus.responder(destination) else {
            return Err(TransportError::NoResponders(destination.to_string()));
        };

        let (_guard, pending) = PendingGuard::enter(&self.pending);
        if pending > self.max_pending {
            return Err(TransportError::PendingLimit(self.max_pending));
        }

        let (tx, rx) = oneshot::channel();
        let payload = payload.to_vec();
        tokio::spawn(async move {
            let reply = handler(payload).await;
            let _ = tx.send(reply);
        });

        tokio::select! {
            reply = tokio::time::timeout(timeout, rx) => match reply {
                Ok(Ok(reply)) => Ok(reply),
                // The responder dropped its reply channel.
                Ok(Err(_)) => Err(TransportError::Closed),
                Err(_) => Err(TransportError::Timeout(timeout)),
            },
            _ = self.close_signal.notified() => Err(TransportError::Closed),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        self.close_signal.notify_waiters();
        Ok(())
    }
}
