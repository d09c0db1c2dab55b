//! Remote node client with timeout and error classification.
//!
//! # Responsibilities
//! - Fetch account numbers, latest height
//! - Simulate and broadcast raw transactions
//! - Classify failures: transport faults vs. business rejections
//! - Fail over across endpoints for calls that are safe to repeat

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::network::NetworkProfile;
use crate::blockchain::types::{
    AccountInfo, BlockchainError, BlockchainResult, BroadcastReceipt, SimulationResult,
};
use crate::observability::metrics;

/// gRPC status code the REST gateway reports for missing accounts.
const GRPC_NOT_FOUND: u64 = 5;

/// Operations the transaction pipeline needs from a node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Account number and sequence for `address`.
    async fn fetch_account(&self, address: &str) -> BlockchainResult<AccountInfo>;

    /// Latest committed block height.
    async fn latest_height(&self) -> BlockchainResult<u64>;

    /// Dry-run a signed transaction to estimate gas.
    async fn simulate(&self, tx_bytes: &[u8]) -> BlockchainResult<SimulationResult>;

    /// Submit a signed transaction and wait for the mempool check.
    async fn broadcast_sync(&self, tx_bytes: &[u8]) -> BlockchainResult<BroadcastReceipt>;

    /// Check if the node is reachable.
    async fn is_healthy(&self) -> bool {
        let healthy = self.latest_height().await.is_ok();
        metrics::record_node_health(healthy);
        healthy
    }
}

/// Why a single HTTP exchange produced no response.
enum CallError {
    /// Request never reached the node.
    Unreachable(String),
    /// Request may have been delivered; response lost or timed out.
    Lost(String),
}

/// Parsed HTTP response.
struct NodeResponse {
    status: StatusCode,
    body: Value,
}

impl NodeResponse {
    /// Error message in the gateway's `{code, message}` shape.
    fn error_message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    fn grpc_code(&self) -> Option<u64> {
        self.body.get("code").and_then(Value::as_u64)
    }
}

/// Node client speaking the Cosmos REST gateway.
#[derive(Clone)]
pub struct LcdNodeClient {
    http: reqwest::Client,
    endpoints: Vec<url::Url>,
    timeout_duration: Duration,
}

impl LcdNodeClient {
    /// Create a client for the profile's endpoints.
    ///
    /// Invalid failover URLs are skipped; an invalid primary URL is an error.
    pub fn new(network: &NetworkProfile, rpc_timeout: Duration) -> BlockchainResult<Self> {
        let mut endpoints = Vec::new();

        let primary: url::Url = network.lcd_endpoint.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid node URL '{}': {}", network.lcd_endpoint, e))
        })?;
        endpoints.push(primary);

        for url_str in &network.failover_endpoints {
            match url_str.parse() {
                Ok(url) => endpoints.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover node URL"),
            }
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| BlockchainError::Rpc(format!("HTTP client setup failed: {}", e)))?;

        tracing::info!(
            endpoint = %network.lcd_endpoint,
            chain_id = %network.chain_id,
            failovers = endpoints.len() - 1,
            "Node client initialized"
        );

        Ok(Self {
            http,
            endpoints,
            timeout_duration: rpc_timeout,
        })
    }

    fn url(&self, base: &url::Url, path: &str) -> String {
        format!("{}{}", base.as_str().trim_end_matches('/'), path)
    }

    async fn exchange(&self, request: reqwest::RequestBuilder) -> Result<NodeResponse, CallError> {
        let call = async {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        match timeout(self.timeout_duration, call).await {
            Ok(Ok((status, text))) => {
                let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
                Ok(NodeResponse { status, body })
            }
            Ok(Err(e)) if e.is_connect() || e.is_builder() => Err(CallError::Unreachable(e.to_string())),
            Ok(Err(e)) => Err(CallError::Lost(e.to_string())),
            Err(_) => Err(CallError::Lost(format!(
                "no response within {} seconds",
                self.timeout_duration.as_secs()
            ))),
        }
    }

    /// Run a repeatable request against each endpoint until one answers.
    async fn with_failover<F>(&self, op: &'static str, build: F) -> BlockchainResult<NodeResponse>
    where
        F: Fn(&url::Url) -> reqwest::RequestBuilder,
    {
        let mut timed_out = false;
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            match self.exchange(build(endpoint)).await {
                Ok(response) if is_gateway_failure(response.status) => {
                    tracing::warn!(provider_idx = i, op, status = %response.status, "Node gateway error, trying next endpoint");
                }
                Ok(response) => {
                    metrics::record_node_request(op, true);
                    return Ok(response);
                }
                Err(CallError::Unreachable(e)) => {
                    tracing::warn!(provider_idx = i, op, error = %e, "Node unreachable, trying next endpoint");
                }
                Err(CallError::Lost(e)) => {
                    timed_out = true;
                    tracing::warn!(provider_idx = i, op, error = %e, "Node request failed, trying next endpoint");
                }
            }
        }

        metrics::record_node_request(op, false);
        if timed_out {
            Err(BlockchainError::Timeout(self.timeout_duration.as_secs()))
        } else {
            Err(BlockchainError::Rpc(format!("All node endpoints failed ({})", op)))
        }
    }
}

fn is_gateway_failure(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Read a u64 that the gateway may encode as a JSON string or number.
fn json_u64(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

pub(crate) fn parse_account(body: &Value) -> BlockchainResult<AccountInfo> {
    let account = body
        .get("account")
        .ok_or_else(|| BlockchainError::Rpc("account response missing 'account'".into()))?;
    // EthAccount nests the fields under base_account.
    let base = account.get("base_account").unwrap_or(account);

    let account_number = json_u64(base, "account_number")
        .ok_or_else(|| BlockchainError::Rpc("account response missing account_number".into()))?;
    let sequence = json_u64(base, "sequence").unwrap_or(0);

    Ok(AccountInfo {
        account_number,
        sequence,
    })
}

pub(crate) fn parse_latest_height(body: &Value) -> BlockchainResult<u64> {
    ["sdk_block", "block"]
        .iter()
        .filter_map(|key| body.get(*key))
        .filter_map(|block| block.get("header"))
        .find_map(|header| json_u64(header, "height"))
        .ok_or_else(|| BlockchainError::Rpc("block response missing header height".into()))
}

pub(crate) fn parse_broadcast(body: &Value) -> BlockchainResult<BroadcastReceipt> {
    let tx_response = body
        .get("tx_response")
        .and_then(Value::as_object)
        .ok_or_else(|| BlockchainError::Rpc("broadcast response missing tx_response".into()))?;

    let as_value = Value::Object(tx_response.clone());
    let tx_hash = tx_response
        .get("txhash")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let text = |key: &str| {
        tx_response
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let mut echo: Map<String, Value> = tx_response.clone();
    for key in ["txhash", "height", "code", "codespace", "raw_log"] {
        echo.remove(key);
    }

    Ok(BroadcastReceipt {
        tx_hash,
        height: json_u64(&as_value, "height").unwrap_or(0),
        code: json_u64(&as_value, "code").unwrap_or(0) as u32,
        codespace: text("codespace"),
        raw_log: text("raw_log"),
        echo,
    })
}

#[async_trait]
impl NodeClient for LcdNodeClient {
    async fn fetch_account(&self, address: &str) -> BlockchainResult<AccountInfo> {
        let path = format!("/cosmos/auth/v1beta1/accounts/{}", address);
        let response = self
            .with_failover("fetch_account", |base| self.http.get(self.url(base, &path)))
            .await?;

        let missing = response.status == StatusCode::NOT_FOUND
            || response.grpc_code() == Some(GRPC_NOT_FOUND)
            || response.error_message().is_some_and(|m| m.contains("not found"));
        if missing {
            return Err(BlockchainError::AccountNotFound(address.to_string()));
        }
        if !response.status.is_success() {
            let message = response.error_message().unwrap_or("account query failed");
            return Err(BlockchainError::Rpc(message.to_string()));
        }

        parse_account(&response.body)
    }

    async fn latest_height(&self) -> BlockchainResult<u64> {
        let response = self
            .with_failover("latest_height", |base| {
                self.http.get(self.url(base, "/cosmos/base/tendermint/v1beta1/blocks/latest"))
            })
            .await?;

        if !response.status.is_success() {
            let message = response.error_message().unwrap_or("latest block query failed");
            return Err(BlockchainError::Rpc(message.to_string()));
        }
        parse_latest_height(&response.body)
    }

    async fn simulate(&self, tx_bytes: &[u8]) -> BlockchainResult<SimulationResult> {
        let payload = json!({ "tx_bytes": BASE64_STANDARD.encode(tx_bytes) });
        let response = self
            .with_failover("simulate", |base| {
                self.http.post(self.url(base, "/cosmos/tx/v1beta1/simulate")).json(&payload)
            })
            .await?;

        if !response.status.is_success() {
            return match response.error_message() {
                Some(message) => Err(BlockchainError::Simulation(message.to_string())),
                None => Err(BlockchainError::Rpc(format!(
                    "simulation returned HTTP {}",
                    response.status
                ))),
            };
        }

        let gas_used = response
            .body
            .get("gas_info")
            .and_then(|info| json_u64(info, "gas_used"))
            .ok_or_else(|| BlockchainError::Rpc("simulation response missing gas_used".into()))?;

        Ok(SimulationResult { gas_used })
    }

    async fn broadcast_sync(&self, tx_bytes: &[u8]) -> BlockchainResult<BroadcastReceipt> {
        let payload = json!({
            "tx_bytes": BASE64_STANDARD.encode(tx_bytes),
            "mode": "BROADCAST_MODE_SYNC",
        });

        // Only move to the next endpoint while the request provably never left.
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            let request = self
                .http
                .post(self.url(endpoint, "/cosmos/tx/v1beta1/txs"))
                .json(&payload);

            match self.exchange(request).await {
                Ok(response) if response.status.is_success() => {
                    metrics::record_node_request("broadcast", true);
                    return parse_broadcast(&response.body);
                }
                Ok(response) if is_gateway_failure(response.status) => {
                    metrics::record_node_request("broadcast", false);
                    return Err(BlockchainError::BroadcastAmbiguous(format!(
                        "gateway returned HTTP {}",
                        response.status
                    )));
                }
                Ok(response) => {
                    metrics::record_node_request("broadcast", true);
                    let message = response
                        .error_message()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("broadcast returned HTTP {}", response.status));
                    return Err(BlockchainError::Broadcast(message));
                }
                Err(CallError::Unreachable(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "Node unreachable for broadcast, trying next endpoint");
                }
                Err(CallError::Lost(e)) => {
                    metrics::record_node_request("broadcast", false);
                    return Err(BlockchainError::BroadcastAmbiguous(e));
                }
            }
        }

        metrics::record_node_request("broadcast", false);
        Err(BlockchainError::Rpc("All node endpoints unreachable (broadcast)".to_string()))
    }
}

impl std::fmt::Debug for LcdNodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LcdNodeClient")
            .field("endpoints", &self.endpoints.iter().map(url::Url::as_str).collect::<Vec<_>>())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_eth_account() {
        let body = json!({
            "account": {
                "@type": "/injective.types.v1beta1.EthAccount",
                "base_account": {
                    "address": "inj1...",
                    "account_number": "7",
                    "sequence": "0"
                },
                "code_hash": "xdJGAYb3IzySfn2y3McDwOUAtlPKgic7e/rYBF2FpHA="
            }
        });
        let account = parse_account(&body).unwrap();
        assert_eq!(account.account_number, 7);
        assert_eq!(account.sequence, 0);
    }

    #[test]
    fn test_parse_base_account_without_sequence() {
        let body = json!({
            "account": { "@type": "/cosmos.auth.v1beta1.BaseAccount", "account_number": 12 }
        });
        let account = parse_account(&body).unwrap();
        assert_eq!(account, AccountInfo { account_number: 12, sequence: 0 });
        assert!(parse_account(&json!({})).is_err());
    }

    #[test]
    fn test_parse_latest_height() {
        let body = json!({ "sdk_block": { "header": { "height": "1200" } } });
        assert_eq!(parse_latest_height(&body).unwrap(), 1200);

        let body = json!({ "block": { "header": { "height": "99" } } });
        assert_eq!(parse_latest_height(&body).unwrap(), 99);
    }

    #[test]
    fn test_parse_broadcast_response() {
        let body = json!({
            "tx_response": {
                "height": "0",
                "txhash": "5A1F",
                "codespace": "sdk",
                "code": 32,
                "raw_log": "account sequence mismatch, expected 3, got 2: incorrect account sequence",
                "gas_wanted": "0"
            }
        });
        let receipt = parse_broadcast(&body).unwrap();
        assert_eq!(receipt.tx_hash, "5A1F");
        assert_eq!(receipt.code, 32);
        assert!(receipt.raw_log.contains("incorrect account sequence"));
        assert!(receipt.echo.contains_key("gas_wanted"));
        assert!(!receipt.echo.contains_key("txhash"));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_network_error() {
        let mut network = NetworkProfile::testnet();
        network.lcd_endpoint = "http://127.0.0.1:9".to_string();
        let client = LcdNodeClient::new(&network, Duration::from_secs(2)).unwrap();

        let err = client.latest_height().await.unwrap_err();
        assert!(err.is_network());
        assert!(!client.is_healthy().await);
    }

    #[test]
    fn test_invalid_primary_url() {
        let mut network = NetworkProfile::testnet();
        network.lcd_endpoint = "not a url".to_string();
        assert!(LcdNodeClient::new(&network, Duration::from_secs(1)).is_err());
    }
}
