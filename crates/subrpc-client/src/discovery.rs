use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::identity::ServerIdentity;
use crate::route::Route;

/// Failures reported by a discovery backend.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery backend unavailable: {0}")]
    Unavailable(String),
    #[error("discovery request timed out after {0:?}")]
    Timeout(Duration),
    #[error("no {kind} server registered")]
    NoServers { kind: String },
}

/// Membership contract the client depends on.
///
/// A backend keeps track of which servers exist, what kind they are, and
/// which transport subject reaches each one.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Announces `server` to the cluster.
    async fn register(&self, server: &ServerIdentity) -> Result<(), DiscoveryError>;

    /// Withdraws `server` from the cluster.
    async fn deregister(&self, server: &ServerIdentity) -> Result<(), DiscoveryError>;

    /// Resolves a route to the transport subject of a server able to handle
    /// it. Fails with [`DiscoveryError::NoServers`] when no server of the
    /// route's kind is registered.
    async fn resolve(&self, route: &Route) -> Result<String, DiscoveryError>;
}

/// Subject a server listens on for routed calls.
pub fn rpc_subject(prefix: &str, kind: &str, id: &str) -> String {
    format!("{prefix}.rpc.{kind}.{id}")
}

/// Table-backed [`Discovery`] with round-robin resolution.
///
/// Registrations live in process memory, so this backend suits tests and
/// single-process deployments; a clustered deployment would put an etcd-backed
/// implementation behind the same trait.
pub struct StaticDiscovery {
    prefix: String,
    servers: Mutex<HashMap<String, VecDeque<ServerIdentity>>>,
}

impl StaticDiscovery {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            servers: Mutex::new(HashMap::new()),
        }
    }

    /// Subject `server` is expected to listen on.
    pub fn subject_for(&self, server: &ServerIdentity) -> String {
        rpc_subject(&self.prefix, &server.kind, &server.id)
    }

    /// Registered servers of `kind`, in current rotation order.
    pub fn servers_of_kind(&self, kind: &str) -> Vec<ServerIdentity> {
        let servers = self.servers.lock().unwrap();
        servers.get(kind).map(|g| g.iter().cloned().collect()).unwrap_or_default()
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn register(&self, server: &ServerIdentity) -> Result<(), DiscoveryError> {
        let mut servers = self.servers.lock().unwrap();
        let group = servers.entry(server.kind.clone()).or_default();
        if !group.iter().any(|s| s.id == server.id) {
            debug!(id = %server.id, kind = %server.kind, "registering server");
            group.push_back(server.clone());
        }
        Ok(())
    }

    async fn deregister(&self, server: &ServerIdentity) -> Result<(), DiscoveryError> {
        let mut servers = self.servers.lock().unwrap();
        if let Some(group) = servers.get_mut(&server.kind) {
            group.retain(|s| s.id != server.id);
            if group.is_empty() {
                servers.remove(&server.kind);
            }
        }
        Ok(())
    }

    async fn resolve(&self, route: &Route) -> Result<String, DiscoveryError> {
        let mut servers = self.servers.lock().unwrap();
        let group = servers
            .get_mut(route.kind())
            .filter(|g| !g.is_empty())
            .ok_or_else(|| DiscoveryError::NoServers { kind: route.kind().to_string() })?;

        // Rotate: move first to back, answer with it.
        let server = group.pop_front().ok_or_else(|| DiscoveryError::NoServers {
            kind: route.kind().to_string(),
        })?;
        group.push_back(server.clone());
        Ok(rpc_subject(&self.prefix, &server.kind, &server.id))
    }
}
