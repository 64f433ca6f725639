use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Verbosity requested at initialization, mapped onto `tracing` levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive form understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Broker-facing knobs.
///
/// The client itself reads the timeouts and the concurrency cap; transport
/// implementations read the rest when they set up their connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Address of the message broker.
    pub addr: String,
    /// Upper bound for establishing the connection.
    pub connection_timeout_ms: u64,
    /// Upper bound for a single request/reply exchange.
    pub request_timeout_ms: u64,
    /// Default drain window granted to [`shutdown`].
    ///
    /// [`shutdown`]: crate::client::RpcClient::shutdown
    pub shutdown_deadline_ms: u64,
    /// Ceiling on concurrently outstanding calls a server-side worker pool
    /// would take on.
    pub max_concurrent_rpcs: usize,
    /// Reconnection attempts before the transport gives up.
    pub max_reconnection_attempts: u32,
    /// Replies a transport may buffer before refusing new requests.
    pub max_pending_msgs: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:4222".to_string(),
            connection_timeout_ms: 5000,
            request_timeout_ms: 5000,
            shutdown_deadline_ms: 5000,
            max_concurrent_rpcs: 100,
            max_reconnection_attempts: 20,
            max_pending_msgs: 50,
        }
    }
}

impl TransportConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn shutdown_deadline(&self) -> Duration {
        Duration::from_millis(self.shutdown_deadline_ms)
    }
}

/// Discovery-backend knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Backend endpoints, `host:port`.
    pub endpoints: Vec<String>,
    /// Namespace prefix for every key and subject the cluster uses.
    pub prefix: String,
    /// How long a registration stays alive without a renewal.
    pub lease_ttl_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["localhost:2379".to_string()],
            prefix: "subrpc".to_string(),
            lease_ttl_ms: 60_000,
        }
    }
}

impl DiscoveryConfig {
    pub fn lease_ttl(&self) -> Duration {
        Duration::from_millis(self.lease_ttl_ms)
    }
}

/// Everything [`initialize`] needs beyond the collaborators themselves.
///
/// [`initialize`]: crate::client::RpcClient::initialize
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub log_level: LogLevel,
}
