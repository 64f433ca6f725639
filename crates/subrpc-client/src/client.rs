use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use subrpc_common::protocol::{EnvelopeCodec, Request, Response};
use subrpc_common::wire::{DecodeError, EncodeError};
use thiserror::Error;
use tokio::sync::{Notify, watch};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::discovery::{Discovery, DiscoveryError};
use crate::identity::ServerIdentity;
use crate::route::{Route, RouteError};
use crate::transport::{Transport, TransportError};

/// Lifecycle of an [`RpcClient`].
///
/// The client moves strictly forward: `Uninitialized` during
/// [`initialize`], `Ready` once both collaborators are up, `ShuttingDown`
/// while [`shutdown`] drains, and `Terminated` forever after.
///
/// [`initialize`]: RpcClient::initialize
/// [`shutdown`]: RpcClient::shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Ready,
    ShuttingDown,
    Terminated,
}

/// Errors produced by [`RpcClient::initialize`].
#[derive(Debug, Error)]
pub enum InitError {
    #[error("transport unavailable: {0}")]
    TransportUnavailable(TransportError),
    #[error("discovery unavailable: {0}")]
    DiscoveryUnavailable(DiscoveryError),
}

/// Errors produced by [`RpcClient::send_rpc`].
///
/// Only transport and client faults surface here. An application error
/// reported by the remote handler is not an `RpcError`: it arrives as a
/// successful [`Response`] carrying an error payload.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid route: {0}")]
    InvalidRoute(#[from] RouteError),
    #[error("failed to encode request: {0}")]
    EncodeFailed(#[from] EncodeError),
    #[error("failed to decode response: {0}")]
    DecodeFailed(#[from] DecodeError),
    #[error("no server found for route {0}")]
    RouteNotFound(Route),
    #[error("discovery failed: {0}")]
    Discovery(DiscoveryError),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport failed: {0}")]
    Transport(TransportError),
    #[error("client is shut down")]
    ClientClosed,
}

/// Errors produced by [`RpcClient::shutdown`].
///
/// Teardown always runs to completion; when several steps fail, the first
/// failure is the one reported.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("failed to deregister from discovery: {0}")]
    Deregister(DiscoveryError),
    #[error("failed to close transport: {0}")]
    CloseTransport(TransportError),
}

/// Route-addressed RPC client.
///
/// The client owns no sockets itself: a [`Transport`] carries encoded
/// envelopes to a subject and a [`Discovery`] backend maps routes to
/// subjects. Cloning is cheap and every clone shares one lifecycle; any
/// number of [`send_rpc`] calls may run concurrently on shared references.
///
/// [`send_rpc`]: RpcClient::send_rpc
#[derive(Clone)]
pub struct RpcClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("identity", &self.inner.identity)
            .field("state", &*self.inner.state.read().unwrap())
            .finish_non_exhaustive()
    }
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    discovery: Arc<dyn Discovery>,
    identity: ServerIdentity,
    config: ClientConfig,
    codec: EnvelopeCodec,
    state: RwLock<ClientState>,
    in_flight: AtomicUsize,
    drained: Notify,
    shutdown_signal: watch::Sender<bool>,
}

/// Tracks one outstanding call and wakes the drain barrier when the last
/// one finishes.
struct InFlightGuard<'a> {
    inner: &'a ClientInner,
}

impl<'a> InFlightGuard<'a> {
    fn enter(inner: &'a ClientInner) -> Self {
        inner.in_flight.fetch_add(1, Ordering::SeqCst);
        Self { inner }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}

impl RpcClient {
    /// Connects the transport, registers `identity` with discovery, and
    /// returns a `Ready` client.
    ///
    /// Each step is bounded by the configured connection timeout. When
    /// registration fails the already-connected transport is closed again,
    /// so a failed initialization holds no resources.
    pub async fn initialize(
        transport: Arc<dyn Transport>,
        discovery: Arc<dyn Discovery>,
        config: ClientConfig,
        identity: ServerIdentity,
    ) -> Result<Self, InitError> {
        let (shutdown_signal, _) = watch::channel(false);
        let inner = Arc::new(ClientInner {
            transport,
            discovery,
            identity,
            config,
            codec: EnvelopeCodec::new(),
            state: RwLock::new(ClientState::Uninitialized),
            in_flight: AtomicUsize::new(0),
            drained: Notify::new(),
            shutdown_signal,
        });
        let client = Self { inner };

        let timeout = client.inner.config.transport.connection_timeout();
        info!(
            id = %client.inner.identity.id,
            kind = %client.inner.identity.kind,
            "connecting transport"
        );
        match tokio::time::timeout(timeout, client.inner.transport.connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(InitError::TransportUnavailable(e)),
            Err(_) => {
                return Err(InitError::TransportUnavailable(TransportError::Timeout(timeout)));
            }
        }

        let registered =
            tokio::time::timeout(timeout, client.inner.discovery.register(&client.inner.identity))
                .await
                .unwrap_or(Err(DiscoveryError::Timeout(timeout)));
        if let Err(e) = registered {
            let _ = client.inner.transport.close().await;
            return Err(InitError::DiscoveryUnavailable(e));
        }

        *client.inner.state.write().unwrap() = ClientState::Ready;
        info!("client ready");
        Ok(client)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ClientState {
        *self.inner.state.read().unwrap()
    }

    /// Identity this client registered with.
    pub fn identity(&self) -> &ServerIdentity {
        &self.inner.identity
    }

    /// Calls in flight right now.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Sends `request` to a server that owns `route` and waits for its
    /// response.
    ///
    /// The call resolves the route through discovery, encodes the envelope,
    /// performs one request/reply exchange bounded by the configured request
    /// timeout, and decodes the reply. A handler-reported failure is a
    /// successful call: inspect [`Response::error`] or use
    /// [`Response::into_result`].
    ///
    /// Once a shutdown has begun the call fails with
    /// [`RpcError::ClientClosed`] without touching the transport.
    pub async fn send_rpc(&self, route: &str, request: Request) -> Result<Response, RpcError> {
        if self.state() != ClientState::Ready {
            return Err(RpcError::ClientClosed);
        }
        let route: Route = route.parse()?;

        let _guard = InFlightGuard::enter(&self.inner);
        // A shutdown may have started between the state check and the guard.
        if self.state() != ClientState::Ready {
            return Err(RpcError::ClientClosed);
        }

        let payload = self.inner.codec.request_to_vec(&request)?;
        let destination = match self.inner.discovery.resolve(&route).await {
            Ok(destination) => destination,
            Err(DiscoveryError::NoServers { .. }) => return Err(RpcError::RouteNotFound(route)),
            Err(e) => return Err(RpcError::Discovery(e)),
        };

        let timeout = self.inner.config.transport.request_timeout();
        debug!(route = %route, destination = %destination, bytes = payload.len(), "sending rpc");
        let reply = tokio::time::timeout(
            timeout,
            self.inner.transport.request(&destination, &payload, timeout),
        )
        .await;
        let reply = match reply {
            Ok(Ok(reply)) => reply,
            Ok(Err(TransportError::Timeout(elapsed))) => return Err(RpcError::Timeout(elapsed)),
            Ok(Err(TransportError::Closed)) if self.state() != ClientState::Ready => {
                return Err(RpcError::ClientClosed);
            }
            Ok(Err(e)) => return Err(RpcError::Transport(e)),
            Err(_) => return Err(RpcError::Timeout(timeout)),
        };

        let response = self.inner.codec.decode_response(&reply)?;
        debug!(route = %route, bytes = reply.len(), error = response.is_err(), "rpc completed");
        Ok(response)
    }

    /// Resolves once a shutdown signal arrives.
    ///
    /// Two sources complete the wait: SIGINT delivered to the process, or a
    /// call to [`request_shutdown`]. The method only observes the signal;
    /// callers follow up with [`shutdown`].
    ///
    /// [`request_shutdown`]: RpcClient::request_shutdown
    /// [`shutdown`]: RpcClient::shutdown
    pub async fn wait_for_shutdown_signal(&self) {
        let mut requested = self.inner.shutdown_signal.subscribe();
        let ctrl_c = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler; only request_shutdown can complete the wait.
                std::future::pending::<()>().await;
            }
        };
        let request_seen = async {
            while !*requested.borrow_and_update() {
                if requested.changed().await.is_err() {
                    break;
                }
            }
        };
        tokio::select! {
            _ = ctrl_c => info!("termination signal received"),
            _ = request_seen => info!("shutdown requested"),
        }
    }

    /// Completes every pending and future [`wait_for_shutdown_signal`] call.
    ///
    /// [`wait_for_shutdown_signal`]: RpcClient::wait_for_shutdown_signal
    pub fn request_shutdown(&self) {
        // send_replace latches the value even while nobody is waiting yet.
        self.inner.shutdown_signal.send_replace(true);
    }

    /// Drains in-flight calls and tears the client down.
    ///
    /// New calls are refused immediately. Calls already in flight get up to
    /// `deadline` to finish; whatever is still pending afterwards is
    /// abandoned and surfaces to its caller as [`RpcError::Timeout`] or
    /// [`RpcError::ClientClosed`]. The client then deregisters from
    /// discovery and closes the transport, reaching `Terminated` whether or
    /// not those steps succeed. Repeated calls are no-ops.
    pub async fn shutdown(&self, deadline: Duration) -> Result<(), ShutdownError> {
        {
            let mut state = self.inner.state.write().unwrap();
            if *state != ClientState::Ready {
                return Ok(());
            }
            *state = ClientState::ShuttingDown;
        }
        info!(deadline_ms = deadline.as_millis() as u64, "shutting down");

        let drained = tokio::time::timeout(deadline, async {
            loop {
                let notified = self.inner.drained.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.inner.in_flight.load(Ordering::SeqCst) == 0 {
                    break;
                }
                notified.await;
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                abandoned = self.inner.in_flight.load(Ordering::SeqCst),
                "drain deadline passed with calls still in flight"
            );
        }

        let mut result = Ok(());
        if let Err(e) = self.inner.discovery.deregister(&self.inner.identity).await {
            warn!(error = %e, "failed to deregister from discovery");
            result = Err(ShutdownError::Deregister(e));
        }
        if let Err(e) = self.inner.transport.close().await {
            warn!(error = %e, "failed to close transport");
            if result.is_ok() {
                result = Err(ShutdownError::CloseTransport(e));
            }
        }

        *self.inner.state.write().unwrap() = ClientState::Terminated;
        info!("client terminated");
        result
    }
}
