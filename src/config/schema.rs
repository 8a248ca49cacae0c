//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the routing proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single backend every request is forwarded to.
    pub backend: BackendConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Response body buffering limits.
    pub body: BodyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Declarative modifiers, applied in file order.
    pub modifiers: Vec<ModifierConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL: scheme, host, optional base path and base query
    /// (e.g., "http://127.0.0.1:3000/api?token=abc").
    pub url: String,

    /// Forward the client's Host header unchanged. When false, Host is set
    /// to the backend authority.
    pub preserve_host: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000".to_string(),
            preserve_host: true,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Body buffering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Largest response body a body modifier will buffer, in bytes.
    pub max_buffer_bytes: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            max_buffer_bytes: 16 * 1024 * 1024, // 16MB
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

/// A declarative modifier.
///
/// ```toml
/// [[modifiers]]
/// matching_path = "^/api/"
/// disable_encoding = true
/// request_headers.set = { "x-proxied" = "1" }
/// response_headers.remove = ["server"]
/// body_replace = [{ pattern = "http://internal", replacement = "https://public" }]
/// ```
///
/// `matching_path` is required: an empty pattern matches every path, so it
/// must be written out explicitly.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ModifierConfig {
    /// Regular expression matched against the decoded request path.
    pub matching_path: String,

    /// Force an empty Accept-Encoding on matching requests.
    #[serde(default)]
    pub disable_encoding: bool,

    /// Header edits applied to the outbound request.
    #[serde(default)]
    pub request_headers: HeaderRules,

    /// Header edits applied to the backend response.
    #[serde(default)]
    pub response_headers: HeaderRules,

    /// Regex replacements applied to the buffered response body, in order.
    #[serde(default)]
    pub body_replace: Vec<BodyReplace>,
}

/// Header edits. Removals run before sets.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HeaderRules {
    pub set: BTreeMap<String, String>,
    pub remove: Vec<String>,
}

impl HeaderRules {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }
}

/// One body replacement. `replacement` may reference groups as `$1` or `${name}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BodyReplace {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}
