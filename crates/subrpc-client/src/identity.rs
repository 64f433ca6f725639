use serde::{Deserialize, Serialize};

/// Identity a client announces to the discovery backend.
///
/// This is registration data, not part of the RPC envelope: peers use it to
/// find the server and decide whether it can answer a given route kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerIdentity {
    /// Unique id within the cluster.
    pub id: String,
    /// Server kind, matched against the first route segment.
    pub kind: String,
    /// Free-form metadata published alongside the identity, typically JSON.
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub hostname: String,
    /// Whether the server accepts connections from outside the cluster.
    #[serde(default)]
    pub frontend: bool,
}

impl ServerIdentity {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            metadata: String::new(),
            hostname: String::new(),
            frontend: false,
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn frontend(mut self, frontend: bool) -> Self {
        self.frontend = frontend;
        self
    }
}
