//! Configuration schema definitions.
//!
//! All sections default, so an empty file yields a mainnet relay on
//! `127.0.0.1:8080`. The signing key is never part of this file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::blockchain::network::{NetworkKind, NetworkProfile};
use crate::pipeline::SessionSettings;
use crate::resilience::RetryPolicy;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Target network and endpoint overrides.
    pub network: NetworkConfig,

    /// Node call timeouts and session timing.
    pub node: NodeConfig,

    /// Sequence-mismatch retry settings.
    pub dispatch: DispatchConfig,

    /// HTTP surface.
    pub server: ServerConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

impl RelayConfig {
    /// Network profile with this file's overrides applied.
    pub fn profile(&self) -> NetworkProfile {
        let mut profile = NetworkProfile::for_kind(self.network.kind);
        if let Some(endpoint) = &self.network.lcd_endpoint {
            profile.lcd_endpoint = endpoint.clone();
        }
        profile.failover_endpoints = self.network.failover_endpoints.clone();
        if let Some(gas_price) = self.network.gas_price {
            profile.gas_price = gas_price;
        }
        if let Some(buffer) = self.network.gas_fee_buffer {
            profile.gas_fee_buffer = buffer;
        }
        profile
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NetworkConfig {
    /// `mainnet` or `testnet`.
    pub kind: NetworkKind,

    /// Replaces the profile's REST gateway.
    pub lcd_endpoint: Option<String>,

    /// Tried in order when the primary is unreachable.
    pub failover_endpoints: Vec<String>,

    pub gas_price: Option<u64>,

    pub gas_fee_buffer: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Upper bound on every node call.
    pub rpc_timeout_secs: u64,

    /// Blocks added to the latest height for the timeout height.
    pub timeout_height_offset: u64,

    /// Seconds before the latest height is re-read.
    pub timeout_height_refresh_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let session = SessionSettings::default();
        Self {
            rpc_timeout_secs: 10,
            timeout_height_offset: session.timeout_height_offset,
            timeout_height_refresh_secs: session.timeout_height_refresh.as_secs(),
        }
    }
}

impl NodeConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            timeout_height_offset: self.timeout_height_offset,
            timeout_height_refresh: Duration::from_secs(self.timeout_height_refresh_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Retries after a sequence mismatch (0 disables).
    pub sequence_retries: u32,

    pub retry_base_delay_ms: u64,

    pub retry_max_delay_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            sequence_retries: policy.max_retries,
            retry_base_delay_ms: policy.base_delay_ms,
            retry_max_delay_ms: policy.max_delay_ms,
        }
    }
}

impl DispatchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.sequence_retries,
            base_delay_ms: self.retry_base_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Whole-request timeout, covering simulate + broadcast.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Emit JSON lines instead of human-readable logs.
    pub json_logs: bool,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.network.kind, NetworkKind::Mainnet);
        assert_eq!(config.node.rpc_timeout(), Duration::from_secs(10));
        assert_eq!(config.node.session_settings(), SessionSettings::default());
        assert_eq!(config.dispatch.retry_policy(), RetryPolicy::default());
        assert_eq!(config.profile(), NetworkProfile::mainnet());
    }

    #[test]
    fn test_profile_overrides() {
        let config: RelayConfig = toml::from_str(
            r#"
            [network]
            kind = "testnet"
            lcd_endpoint = "http://127.0.0.1:1317"
            failover_endpoints = ["http://127.0.0.1:1318"]
            gas_fee_buffer = 17000

            [observability]
            json_logs = true
            "#,
        )
        .unwrap();

        let profile = config.profile();
        assert_eq!(profile.chain_id, "injective-888");
        assert_eq!(profile.lcd_endpoint, "http://127.0.0.1:1317");
        assert_eq!(profile.endpoints().count(), 2);
        assert_eq!(profile.gas_fee_buffer, 17_000);
        assert_eq!(profile.gas_price, 500_000_000);
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_unknown_network_is_a_parse_error() {
        assert!(toml::from_str::<RelayConfig>("[network]\nkind = \"devnet\"").is_err());
    }
}
