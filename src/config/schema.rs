//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! proxy. All types derive Serde traits for deserialization from config
//! files; every section has defaults so a minimal config works.

use serde::{Deserialize, Serialize};

/// Root configuration for the search proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Ordered backend node list. The first node is the primary; the
    /// rest are secondaries in trial order.
    pub nodes: Vec<NodeConfig>,

    /// Identity and access settings.
    pub access: AccessConfig,

    /// Cluster failover settings.
    pub cluster: ClusterConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:59200").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum concurrent in-flight requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:59200".to_string(),
            tls: None,
            max_connections: 10_000,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// A single backend node.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    /// Node host name or address.
    pub host: String,

    /// Node port.
    #[serde(default = "default_node_port")]
    pub port: u16,
}

fn default_node_port() -> u16 {
    9200
}

/// Identity and access settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AccessConfig {
    /// `host[:port]` patterns permitted to skip the authentication
    /// challenge. Authorization still applies.
    pub allow_from: Vec<String>,

    /// `host[:port]` patterns of upstream proxies whose forwarding
    /// headers are believed.
    pub trusted_proxies: Vec<String>,

    /// Roles granted to anonymous clients admitted via `allow_from`.
    /// Empty means anonymous clients are denied after the waived
    /// challenge.
    pub anonymous_roles: Vec<String>,

    /// Static user database for the built-in authorizer.
    pub users: Vec<UserConfig>,
}

/// One static user entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Cluster failover settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Seconds before a failed node is worth another attempt.
    pub cooldown_secs: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self { cooldown_secs: 900 }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-node forward attempt timeout (connect + response) in seconds.
    /// Expiry counts as a node failure for retry purposes.
    pub forward_secs: u64,

    /// Total client request timeout in seconds, across all attempts.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            forward_secs: 30,
            request_secs: 60,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes. Bodies are buffered so a
    /// request can be replayed against the next candidate node.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
