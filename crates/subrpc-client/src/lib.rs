//! Route-addressed RPC client for subrpc clusters.
//!
//! An [`RpcClient`] sends encoded envelopes to whichever server owns a route:
//! a [`Discovery`] backend maps the route's kind to a transport subject and a
//! [`Transport`] performs the request/reply exchange. Both collaborators sit
//! behind traits, so tests and single-process demos run on the in-process
//! [`memory`] bus while deployments plug in a real broker.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use subrpc_client::{
//!     ClientConfig, MemoryBus, MemoryTransport, RpcClient, ServerIdentity, StaticDiscovery,
//! };
//! use subrpc_client::protocol::{Message, Request};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::default();
//!     let bus = MemoryBus::new();
//!     let transport = Arc::new(MemoryTransport::new(bus.clone(), &config.transport));
//!     let discovery = Arc::new(StaticDiscovery::new(&config.discovery));
//!
//!     let client = RpcClient::initialize(
//!         transport,
//!         discovery,
//!         config.clone(),
//!         ServerIdentity::new("demo-1", "demo"),
//!     )
//!     .await?;
//!
//!     let request = Request::user(Message::request("room.room.join", b"hi".to_vec()));
//!     let response = client.send_rpc("room.room.join", request).await?;
//!     println!("reply: {:?}", response.into_result());
//!
//!     client.shutdown(config.transport.shutdown_deadline()).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod discovery;
pub mod identity;
pub mod memory;
pub mod route;
pub mod transport;

/// Envelope types re-exported from `subrpc-common`.
pub use subrpc_common::protocol;

pub use client::{ClientState, InitError, RpcClient, RpcError, ShutdownError};
pub use config::{ClientConfig, DiscoveryConfig, LogLevel, TransportConfig};
pub use discovery::{Discovery, DiscoveryError, StaticDiscovery};
pub use identity::ServerIdentity;
pub use memory::{MemoryBus, MemoryTransport};
pub use route::{Route, RouteError};
pub use transport::{Transport, TransportError};
