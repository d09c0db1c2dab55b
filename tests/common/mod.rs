//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::{StatusCode, Uri};
use axum::Json;
use prost::Message;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use inj_relay::blockchain::proto::{AuthInfo, TxRaw};
use inj_relay::blockchain::types::{
    AccountInfo, BlockchainError, BlockchainResult, BroadcastReceipt, SimulationResult,
    WRONG_SEQUENCE_CODE,
};
use inj_relay::blockchain::{NetworkProfile, NodeClient, SigningIdentity};
use inj_relay::pipeline::{SessionSettings, TxPipeline};

/// Anvil's first account.
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
/// Anvil's second account.
pub const OTHER_PRIVATE_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

pub fn identity() -> SigningIdentity {
    SigningIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap()
}

pub fn other_identity() -> SigningIdentity {
    SigningIdentity::from_private_key(OTHER_PRIVATE_KEY).unwrap()
}

/// Testnet profile with the gas buffer used by the reference scenarios.
pub fn network() -> NetworkProfile {
    let mut network = NetworkProfile::testnet();
    network.gas_fee_buffer = 17_000;
    network
}

/// What the node saw for one signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenTx {
    pub sequence: u64,
    pub gas_limit: u64,
    pub fee_amount: String,
}

fn inspect(tx_bytes: &[u8]) -> SeenTx {
    let raw = TxRaw::decode(tx_bytes).expect("node received a valid TxRaw");
    let auth = AuthInfo::decode(raw.auth_info_bytes.as_slice()).expect("valid AuthInfo");
    let fee = auth.fee.unwrap_or_default();
    SeenTx {
        sequence: auth.signer_infos[0].sequence,
        gas_limit: fee.gas_limit,
        fee_amount: fee.amount.first().map(|c| c.amount.clone()).unwrap_or_default(),
    }
}

fn mismatch(expected: u64, got: u64) -> String {
    format!(
        "account sequence mismatch, expected {}, got {}: incorrect account sequence",
        expected, got
    )
}

#[derive(Debug, Default)]
struct NodeState {
    account_number: u64,
    chain_sequence: u64,
    height: u64,
    gas_used: u64,
    account_fetches: usize,
    offline: bool,
    simulated: Vec<SeenTx>,
    broadcast: Vec<SeenTx>,
    simulate_failures: VecDeque<BlockchainError>,
    broadcast_failures: VecDeque<BlockchainError>,
    rejections: VecDeque<(u32, String)>,
}

/// In-memory node that enforces sequencing like a real chain.
///
/// Accepted broadcasts advance the chain-side sequence; a transaction signed
/// with any other sequence is refused with code 32. Failures can be queued
/// for the next simulate or broadcast call.
#[derive(Debug, Clone)]
pub struct ScriptedNode {
    state: Arc<Mutex<NodeState>>,
    broadcast_delay: Duration,
}

impl ScriptedNode {
    pub fn new(account_number: u64, sequence: u64, gas_used: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(NodeState {
                account_number,
                chain_sequence: sequence,
                height: 1_000,
                gas_used,
                ..Default::default()
            })),
            broadcast_delay: Duration::ZERO,
        }
    }

    pub fn with_broadcast_delay(mut self, delay: Duration) -> Self {
        self.broadcast_delay = delay;
        self
    }

    pub fn fail_next_simulate(&self, err: BlockchainError) {
        self.state.lock().unwrap().simulate_failures.push_back(err);
    }

    pub fn fail_next_broadcast(&self, err: BlockchainError) {
        self.state.lock().unwrap().broadcast_failures.push_back(err);
    }

    /// Answer the next broadcast with a non-zero code.
    pub fn reject_next_broadcast(&self, code: u32, raw_log: &str) {
        self.state.lock().unwrap().rejections.push_back((code, raw_log.to_string()));
    }

    /// Make account and height queries fail as if the node were down.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// Another process spent sequence numbers behind the relay's back.
    pub fn advance_chain_sequence(&self, by: u64) {
        self.state.lock().unwrap().chain_sequence += by;
    }

    pub fn chain_sequence(&self) -> u64 {
        self.state.lock().unwrap().chain_sequence
    }

    pub fn account_fetches(&self) -> usize {
        self.state.lock().unwrap().account_fetches
    }

    pub fn simulated(&self) -> Vec<SeenTx> {
        self.state.lock().unwrap().simulated.clone()
    }

    pub fn broadcast(&self) -> Vec<SeenTx> {
        self.state.lock().unwrap().broadcast.clone()
    }

    pub fn pipeline(&self, identity: SigningIdentity) -> Arc<TxPipeline> {
        Arc::new(
            TxPipeline::new(identity, network(), Arc::new(self.clone()))
                .with_settings(SessionSettings::default()),
        )
    }
}

#[async_trait]
impl NodeClient for ScriptedNode {
    async fn fetch_account(&self, _address: &str) -> BlockchainResult<AccountInfo> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(BlockchainError::Rpc("connection refused".into()));
        }
        state.account_fetches += 1;
        Ok(AccountInfo {
            account_number: state.account_number,
            sequence: state.chain_sequence,
        })
    }

    async fn latest_height(&self) -> BlockchainResult<u64> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(BlockchainError::Rpc("connection refused".into()));
        }
        Ok(state.height)
    }

    async fn simulate(&self, tx_bytes: &[u8]) -> BlockchainResult<SimulationResult> {
        let seen = inspect(tx_bytes);
        let mut state = self.state.lock().unwrap();
        state.simulated.push(seen.clone());
        if let Some(err) = state.simulate_failures.pop_front() {
            return Err(err);
        }
        if seen.sequence != state.chain_sequence {
            return Err(BlockchainError::Simulation(mismatch(state.chain_sequence, seen.sequence)));
        }
        Ok(SimulationResult {
            gas_used: state.gas_used,
        })
    }

    async fn broadcast_sync(&self, tx_bytes: &[u8]) -> BlockchainResult<BroadcastReceipt> {
        if !self.broadcast_delay.is_zero() {
            tokio::time::sleep(self.broadcast_delay).await;
        }

        let seen = inspect(tx_bytes);
        let mut state = self.state.lock().unwrap();
        state.broadcast.push(seen.clone());
        if let Some(err) = state.broadcast_failures.pop_front() {
            return Err(err);
        }

        let (code, raw_log) = if let Some(rejection) = state.rejections.pop_front() {
            rejection
        } else if seen.sequence != state.chain_sequence {
            (WRONG_SEQUENCE_CODE, mismatch(state.chain_sequence, seen.sequence))
        } else {
            state.chain_sequence += 1;
            (0, String::new())
        };

        Ok(BroadcastReceipt {
            tx_hash: format!("{:064X}", state.broadcast.len()),
            height: 0,
            code,
            codespace: if code == 0 { String::new() } else { "sdk".to_string() },
            raw_log,
            echo: serde_json::Map::new(),
        })
    }
}

/// One canned answer from [`NodeBackend`].
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Programmable REST gateway on a loopback port.
///
/// Every request is recorded by path before the reply (and its delay) is
/// produced, so a request the client gave up on still counts as received.
pub struct NodeBackend {
    pub url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl NodeBackend {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let respond = Arc::new(respond);

        let recorded = hits.clone();
        let app = axum::Router::new().fallback(move |uri: Uri| {
            let recorded = recorded.clone();
            let respond = respond.clone();
            async move {
                let path = uri.path().to_string();
                recorded.lock().unwrap().push(path.clone());
                let reply = respond(&path);
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                (StatusCode::from_u16(reply.status).unwrap(), Json(reply.body))
            }
        });

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{}", addr),
            hits,
        }
    }

    /// Requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().iter().filter(|p| p.as_str() == path).count()
    }
}

/// A loopback address with nothing listening on it.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
